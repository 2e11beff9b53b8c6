use std::env;
use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, prelude::*};

use crate::config::{LogFormat, Logging};

pub fn init_tracing(logging: &Logging) {
    let (level, env_filter) = parse_rust_log(logging.level);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let format = match logging.format {
        LogFormat::Auto if std::io::stderr().is_terminal() => layer.pretty().boxed(),
        LogFormat::Auto | LogFormat::Simplified => layer.compact().without_time().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(format.with_filter(level))
        .with(env_filter)
        .init();
}

/// Returns the maximum level to log and the filter for individual targets.
pub fn parse_rust_log(default_level: LevelFilter) -> (LevelFilter, EnvFilter) {
    // Try to parse RUST_LOG as a simple level filter and apply default levels internally.
    // Otherwise, use it literally if the user knows which overrides they want to run.
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        Err(_) => default_level,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        s3perf=TRACE,\
        s3perf_cli=TRACE,\
        s3perf_core=TRACE,\
        ",
    );

    (level, env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_level() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RUST_LOG", "debug");
            let (level, filter) = parse_rust_log(LevelFilter::INFO);
            assert_eq!(level, LevelFilter::DEBUG);
            assert!(filter.to_string().to_lowercase().contains("s3perf_core=trace"));
            Ok(())
        });
    }

    #[test]
    fn rust_log_directives() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RUST_LOG", "reqwest=debug");
            let (level, filter) = parse_rust_log(LevelFilter::INFO);
            assert_eq!(level, LevelFilter::TRACE);
            assert_eq!(filter.to_string().to_lowercase(), "reqwest=debug");
            Ok(())
        });
    }
}
