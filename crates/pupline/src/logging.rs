//! Logging setup for the CLI.
//!
//! Logs go to stderr so stdout stays free for JSON reports.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber. `RUST_LOG` overrides the level.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` section of the policy.
///
/// CLI flags can only raise verbosity or switch to JSON, never turn them off.
pub fn init_from_config(policy: &pupline_core::Policy, verbose_override: bool, json_logs_override: bool) {
    let (verbose, json_format) = resolve(policy, verbose_override, json_logs_override);
    init(verbose, json_format);
}

fn resolve(policy: &pupline_core::Policy, verbose: bool, json_logs: bool) -> (bool, bool) {
    let level = policy.logging.level.to_lowercase();
    let verbose = verbose || level == "debug" || level == "trace";
    let json_format = json_logs || policy.logging.format.eq_ignore_ascii_case("json");
    (verbose, json_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pupline_core::Policy;

    #[test]
    fn test_resolve_uses_config_defaults() {
        assert_eq!(resolve(&Policy::default(), false, false), (false, false));
    }

    #[test]
    fn test_resolve_config_can_enable_debug_and_json() {
        let mut policy = Policy::default();
        policy.logging.level = "DEBUG".into();
        policy.logging.format = "json".into();
        assert_eq!(resolve(&policy, false, false), (true, true));
    }

    #[test]
    fn test_resolve_flags_override() {
        assert_eq!(resolve(&Policy::default(), true, true), (true, true));
    }
}
