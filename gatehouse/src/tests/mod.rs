
mod classifier_tests;
mod credentials_tests;
mod login_tests;

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a tracing subscriber once for the whole test binary. Controlled by
/// `RUST_LOG`; quiet by default.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
