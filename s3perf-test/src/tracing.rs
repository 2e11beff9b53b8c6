use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is not set: everything from the benchmark crates, errors from
/// the rest.
const DEFAULT_DIRECTIVES: &str = "error,s3perf=trace,s3perf_core=trace,s3perf_cli=trace";

/// Initialize the logger for testing.
///
/// Output goes to the test runner's capture, so it is only shown for failing tests. Set `RUST_LOG`
/// to look at other crates, for example `RUST_LOG=reqwest=debug` while debugging the fake servers.
/// Calling this more than once is harmless.
///
/// # Example
///
/// ```
/// s3perf_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .without_time()
        .compact()
        .try_init()
        .ok();
}
