use std::sync::Once;

static INIT: Once = Once::new();

/// Routes `log` output through the test harness. Set `RUST_LOG=trace` to see
/// schema resolution and fast-path decisions.
pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}
