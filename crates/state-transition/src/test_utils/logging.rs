use tracing_subscriber::{fmt, EnvFilter};

/// Installs a test-friendly tracing subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test: only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).with_test_writer().try_init();
}
