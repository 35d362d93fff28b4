use tokio::sync::oneshot;

use crate::adapters::FinishedRequest;
use crate::models::{CapturedExchange, CoreError, CoreErrorKind, TaskOutcome};
use crate::orchestration::{DeferredTask, deferred};

/// Wraps a finished request in a task that fetches its body once the queue
/// gets to it.
pub fn request_task(event: Box<dyn FinishedRequest>) -> DeferredTask<TaskOutcome> {
    deferred(move || resolve_request(event))
}

/// Fetches the response body and tags the result.
///
/// Never fails: any error from the host is folded into
/// [`TaskOutcome::Failure`] so the queue only ever sees data.
pub async fn resolve_request(event: Box<dyn FinishedRequest>) -> TaskOutcome {
    let method = event.request().method.clone();
    let url = event.request().url.clone();

    match fetch_exchange(event).await {
        Ok(exchange) => TaskOutcome::Success(exchange),
        Err(error) => {
            tracing::warn!(
                method = %method,
                url = %url,
                kind = ?error.kind,
                message = %error.message,
                "failed to resolve response body"
            );
            TaskOutcome::failure(format!("{method} {url}: {error}"))
        }
    }
}

async fn fetch_exchange(event: Box<dyn FinishedRequest>) -> Result<CapturedExchange, CoreError> {
    let request = event.request().clone();
    let (sender, receiver) = oneshot::channel();

    // The body arrives through the callback, not the return value.
    event.get_content(Box::new(move |body| {
        let _ = sender.send(body);
    }))?;

    let body = receiver.await.map_err(|_| {
        CoreError::new(
            CoreErrorKind::ContentUnavailable,
            "content callback was dropped without delivering a body",
        )
    })?;

    Ok(CapturedExchange::from_request(request, body))
}
