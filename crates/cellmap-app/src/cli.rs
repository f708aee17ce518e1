use std::path::PathBuf;

use clap::Parser;

/// cellmap: a cell-tower map whose detail, monitor and console windows stay
/// in sync. Runs a scripted session against simulated windows.
#[derive(Parser, Debug)]
#[command(name = "cellmap", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (e.g. debug, cellmap=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Preference store path override.
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Set and persist the secondary-display preference before the session.
    #[arg(long)]
    pub prefer_secondary: Option<bool>,

    /// Number of simulated displays; 0 simulates a host without a
    /// window-management API.
    #[arg(long, default_value_t = 2)]
    pub displays: usize,

    /// Simulate a popup blocker refusing every new window.
    #[arg(long)]
    pub block_popups: bool,

    /// Towers to walk through, in order.
    #[arg(default_values_t = [String::from("NL-0001"), String::from("NL-0002")])]
    pub towers: Vec<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["cellmap"]).unwrap();
        assert_eq!(args.displays, 2);
        assert!(!args.block_popups);
        assert!(!args.print_config);
        assert_eq!(args.prefer_secondary, None);
        assert_eq!(args.towers, vec!["NL-0001", "NL-0002"]);
    }

    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "cellmap",
            "--config",
            "/tmp/cellmap.toml",
            "--log-level",
            "debug",
            "--store",
            "/tmp/storage.toml",
            "--prefer-secondary",
            "true",
            "--displays",
            "3",
            "--block-popups",
            "T-1",
            "T-2",
            "T-3",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/cellmap.toml")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.store, Some(PathBuf::from("/tmp/storage.toml")));
        assert_eq!(args.prefer_secondary, Some(true));
        assert_eq!(args.displays, 3);
        assert!(args.block_popups);
        assert_eq!(args.towers, vec!["T-1", "T-2", "T-3"]);
    }

    #[test]
    fn print_config_flag() {
        let args = Args::try_parse_from(["cellmap", "--print-config"]).unwrap();
        assert!(args.print_config);
    }

    #[test]
    fn rejects_non_boolean_preference() {
        assert!(Args::try_parse_from(["cellmap", "--prefer-secondary", "maybe"]).is_err());
    }
}
