use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// `#[traced_test]` filters on the crate under test, which for an
/// integration test is the test crate rather than `keyguard`. Call this at
/// the start of each test instead.
///
/// Only one global subscriber can exist per process, so later calls are
/// no-ops.
pub fn tracing_logger() {
    let info_env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("self=trace,keyguard=trace"));
    let subscriber = FmtSubscriber::builder()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_env_filter(info_env_filter)
        .with_thread_ids(true)
        .finish();

    let _result = tracing::subscriber::set_global_default(subscriber);
}
