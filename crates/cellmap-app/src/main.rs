mod cli;
mod session;
mod views;

use std::sync::Arc;

use cellmap_common::TowerId;
use cellmap_config::{CoordinatorConfig, FileStore, KeyValueStore, MemoryStore};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use session::SessionOptions;

fn load_config(args: &cli::Args) -> CoordinatorConfig {
    let loaded = match args.config {
        Some(ref path) => {
            tracing::info!("Using config override: {}", path.display());
            cellmap_config::load_config_from(path)
        }
        None => cellmap_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        CoordinatorConfig::default()
    })
}

fn open_store(args: &cli::Args) -> Arc<dyn KeyValueStore> {
    let opened = match args.store {
        Some(ref path) => FileStore::open(path),
        None => FileStore::open_default(),
    };
    match opened {
        Ok(store) => {
            tracing::info!("Preferences stored in {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!("Preference store unavailable, nothing will persist: {e}");
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("cellmap=info");
    let filter = EnvFilter::from_default_env();
    let filter = match log_directive.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(e) => {
            eprintln!("invalid --log-level '{log_directive}': {e}");
            filter.add_directive(LevelFilter::INFO.into())
        }
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("cellmap v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args);
    tracing::info!(
        "Config loaded (channel: {}, grace: {}ms)",
        config.channel.name,
        config.timing.grace_period_ms
    );
    if args.print_config {
        println!("{}", cellmap_config::config_to_json(&config));
        return;
    }

    let store = open_store(&args);
    let options = SessionOptions {
        towers: args.towers.iter().map(|id| TowerId::new(id.as_str())).collect(),
        displays: args.displays,
        block_popups: args.block_popups,
        prefer_secondary: args.prefer_secondary,
    };

    match session::run(config, store, options).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("Failed to serialize session report: {e}"),
        },
        Err(e) => {
            tracing::error!("Session failed: {e}");
            std::process::exit(1);
        }
    }
    tracing::info!("Shutdown complete");
}
