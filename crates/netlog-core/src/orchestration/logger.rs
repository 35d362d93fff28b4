use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{FinishedRequest, NetworkEventSource, request_task};
use crate::config::PanelConfig;
use crate::logging::LogSink;
use crate::models::TaskOutcome;
use crate::orchestration::{ExchangeReporter, OrchestrationResult, SerialTaskQueue};

/// Process-wide service that orders finished requests and reports them.
///
/// Build one at startup and hand clones of it to whatever registers with the
/// host's network events. Must be built inside a Tokio runtime; after that
/// [`NetworkLogger::submit`] may be called from any thread.
#[derive(Clone)]
pub struct NetworkLogger {
    queue: SerialTaskQueue<TaskOutcome>,
}

impl NetworkLogger {
    pub fn new(config: &PanelConfig, sink: Arc<dyn LogSink>) -> Self {
        let queue = SerialTaskQueue::new();
        let reporter = ExchangeReporter::new(config, sink);
        queue.register_callback(move |result| reporter.report(result));
        Self { queue }
    }

    /// Registers with `source` so each finished request is queued.
    pub fn attach(&self, source: &dyn NetworkEventSource) {
        let logger = self.clone();
        source.on_request_finished(Arc::new(move |event| logger.submit(event)));
    }

    pub fn submit(&self, event: Box<dyn FinishedRequest>) {
        tracing::trace!(
            method = %event.request().method,
            url = %event.request().url,
            "queueing finished request"
        );
        self.queue.add(request_task(event));
    }

    pub fn queue(&self) -> &SerialTaskQueue<TaskOutcome> {
        &self.queue
    }

    pub async fn wait_for_idle(&self, timeout: Option<Duration>) -> OrchestrationResult<()> {
        self.queue.wait_for_idle(timeout).await
    }
}
