use crate::logging::LogSink;
use crate::models::TabId;

/// Emits console lines as `tracing` events on the `netlog::console` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, tab: TabId, payload: &str) {
        tracing::info!(target: "netlog::console", tab = %tab, payload, "console.log");
    }

    fn error(&self, tab: TabId, payload: &str) {
        tracing::error!(target: "netlog::console", tab = %tab, payload, "console.error");
    }
}
