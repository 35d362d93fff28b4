pub mod logger;
pub mod reporter;
pub mod serial_queue;

pub use logger::NetworkLogger;
pub use reporter::ExchangeReporter;
pub use serial_queue::{
    DeferredTask, QueueSnapshot, ResultCallback, SerialTaskQueue, TaskFuture, deferred,
};

use crate::models::CoreError;

pub type OrchestrationResult<T> = Result<T, CoreError>;
