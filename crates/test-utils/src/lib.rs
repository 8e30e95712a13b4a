pub mod builders;
pub mod status;
pub mod workers;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs are captured per test through `with_test_writer()` and only shown for
/// failing tests (or with `-- --nocapture`). Levels come from `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_names(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Supervisor settings with millisecond polling, so monitor loops turn over
/// quickly in tests.
pub fn fast_supervisor() -> trakem2_core::config::SupervisorConfig {
    trakem2_core::config::SupervisorConfig {
        fast_poll_ms: 10,
        medium_poll_ms: 10,
        slow_poll_ms: 10,
        ..Default::default()
    }
}
