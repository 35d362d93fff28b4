pub mod har;
pub mod request_task;

use std::sync::Arc;

use crate::models::{CoreError, RequestMetadata};

pub use har::{HarReplaySource, ReplayLatency};
pub use request_task::{request_task, resolve_request};

/// Receives the response body exactly once.
pub type ContentCallback = Box<dyn FnOnce(String) + Send>;

/// One finished network exchange as the host reports it.
pub trait FinishedRequest: Send {
    fn request(&self) -> &RequestMetadata;

    /// Asks the host for the response body, which is later passed to
    /// `callback`. An `Err` means the body will never arrive.
    fn get_content(self: Box<Self>, callback: ContentCallback) -> Result<(), CoreError>;
}

pub type RequestListener = Arc<dyn Fn(Box<dyn FinishedRequest>) + Send + Sync>;

pub trait NetworkEventSource: Send + Sync {
    fn on_request_finished(&self, listener: RequestListener);
}
