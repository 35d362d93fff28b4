pub mod error;
pub mod outcome;
pub mod request;
pub mod tab;

pub use error::{CoreError, CoreErrorKind};
pub use outcome::TaskOutcome;
pub use request::{CapturedExchange, QueryParam, RequestMetadata};
pub use tab::TabId;
