use serde::{Deserialize, Serialize};

use crate::models::CapturedExchange;

/// Tagged result of resolving one finished request.
///
/// Serialized with a boolean discriminant, `{"success": true, "data": {..}}` or
/// `{"success": false, "message": ".."}`, which is the shape the panel has
/// always shipped across the devtools boundary.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "OutcomeRecord", try_from = "OutcomeRecord")]
pub enum TaskOutcome {
    Success(CapturedExchange),
    Failure { message: String },
}

impl TaskOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct OutcomeRecord {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<CapturedExchange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl From<TaskOutcome> for OutcomeRecord {
    fn from(outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Success(data) => Self {
                success: true,
                data: Some(data),
                message: None,
            },
            TaskOutcome::Failure { message } => Self {
                success: false,
                data: None,
                message: Some(message),
            },
        }
    }
}

impl TryFrom<OutcomeRecord> for TaskOutcome {
    type Error = String;

    fn try_from(record: OutcomeRecord) -> Result<Self, Self::Error> {
        match (record.success, record.data, record.message) {
            (true, Some(data), _) => Ok(Self::Success(data)),
            (true, None, _) => Err("successful outcome is missing 'data'".to_string()),
            (false, _, Some(message)) => Ok(Self::Failure { message }),
            (false, _, None) => Err("failed outcome is missing 'message'".to_string()),
        }
    }
}
