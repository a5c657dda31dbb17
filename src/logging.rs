//! Logger bootstrap for the binary and tests.
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Default filter: other crates (Bevy included) at `warn`, this crate at
/// `level`.
fn default_filter(level: LevelFilter) -> String {
    format!("warn,{}={level}", env!("CARGO_CRATE_NAME"))
}

/// Initializes the global logger.
///
/// When `verbose` is `true`, state transitions and waypoint decisions are
/// printed at debug level. Otherwise only discoveries and session milestones
/// are shown. `RUST_LOG` replaces the default filter entirely.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter(level)));
    builder.format_timestamp_millis();

    // A logger may already be installed by an earlier test.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LevelFilter::Debug, "warn,crane=DEBUG")]
    #[case(LevelFilter::Info, "warn,crane=INFO")]
    fn filter_keeps_other_crates_quiet(#[case] level: LevelFilter, #[case] expected: &str) {
        assert_eq!(default_filter(level), expected);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn init_is_idempotent(#[case] verbose: bool) {
        init(verbose);
        init(verbose);
        log::debug!("logger initialised twice without panicking");
    }
}
