//! Configuration validation.
//!
//! Collects every violation so one message reports them all.

use crate::schema::CoordinatorConfig;
use cellmap_common::{ConfigError, WindowRole};

/// Upper bound on the post-open grace period.
pub const MAX_GRACE_PERIOD_MS: u64 = 2000;

/// Smallest accepted window edge.
pub const MIN_WINDOW_EDGE: u32 = 100;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CoordinatorConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if config.channel.name.trim().is_empty() {
        errors.push("channel.name must not be empty".into());
    }

    if config.timing.grace_period_ms > MAX_GRACE_PERIOD_MS {
        errors.push(format!(
            "timing.grace_period_ms = {} is out of range [0, {MAX_GRACE_PERIOD_MS}]",
            config.timing.grace_period_ms
        ));
    }

    for role in WindowRole::ALL {
        let spec = config.windows.spec(role);
        if spec.document.trim().is_empty() {
            errors.push(format!("windows.{role}.document must not be empty"));
        }
        if spec.target.trim().is_empty() {
            errors.push(format!("windows.{role}.target must not be empty"));
        }
        validate_min(&mut errors, &format!("windows.{role}.width"), spec.width);
        validate_min(&mut errors, &format!("windows.{role}.height"), spec.height);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_min(errors: &mut Vec<String>, name: &str, value: u32) {
    if value < MIN_WINDOW_EDGE {
        errors.push(format!("{name} = {value} is below minimum {MIN_WINDOW_EDGE}"));
    }
}
