use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Deserialize;

use crate::adapters::{ContentCallback, FinishedRequest, NetworkEventSource, RequestListener};
use crate::models::{CoreError, CoreErrorKind, QueryParam, RequestMetadata};
use crate::orchestration::OrchestrationResult;

#[derive(Clone, Debug, Deserialize)]
struct HarDocument {
    log: HarLog,
}

#[derive(Clone, Debug, Deserialize)]
struct HarLog {
    #[serde(default)]
    entries: Vec<HarEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct HarEntry {
    request: HarRequest,
    #[serde(default)]
    response: HarResponse,
    #[serde(default)]
    time: f64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarRequest {
    method: String,
    url: String,
    #[serde(default)]
    query_string: Vec<QueryParam>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct HarResponse {
    #[serde(default)]
    content: HarContent,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct HarContent {
    text: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplayLatency {
    /// Delay each body by the entry's recorded `time`.
    Recorded,
    Fixed(Duration),
}

/// Replays the entries of a HAR capture as finished-request events.
pub struct HarReplaySource {
    entries: Vec<HarEntry>,
    latency: ReplayLatency,
    listeners: Mutex<Vec<RequestListener>>,
}

impl HarReplaySource {
    pub fn from_json(json: &str) -> OrchestrationResult<Self> {
        let document: HarDocument = serde_json::from_str(json).map_err(|error| {
            CoreError::new(
                CoreErrorKind::ParseFailure,
                format!("invalid HAR document: {error}"),
            )
        })?;

        Ok(Self {
            entries: document.log.entries,
            latency: ReplayLatency::Recorded,
            listeners: Mutex::new(Vec::new()),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> OrchestrationResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|error| {
            CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("failed to read HAR file '{}': {error}", path.display()),
            )
        })?;
        Self::from_json(&json)
    }

    pub fn latency(mut self, latency: ReplayLatency) -> Self {
        self.latency = latency;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emits every entry, in file order, to every registered listener.
    pub fn replay(&self) -> usize {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for entry in &self.entries {
            for listener in &listeners {
                let event: Box<dyn FinishedRequest> = Box::new(self.finished_request(entry));
                listener(event);
            }
        }

        tracing::debug!(
            entries = self.entries.len(),
            listeners = listeners.len(),
            "replayed HAR entries"
        );
        self.entries.len()
    }

    fn finished_request(&self, entry: &HarEntry) -> HarFinishedRequest {
        let delay = match self.latency {
            ReplayLatency::Recorded if entry.time.is_finite() && entry.time > 0.0 => {
                Duration::from_micros((entry.time * 1000.0).round() as u64)
            }
            ReplayLatency::Recorded => Duration::ZERO,
            ReplayLatency::Fixed(duration) => duration,
        };

        HarFinishedRequest {
            request: RequestMetadata {
                method: entry.request.method.clone(),
                url: entry.request.url.clone(),
                query_string: entry.request.query_string.clone(),
            },
            body: entry.response.content.text.clone(),
            delay,
        }
    }
}

impl NetworkEventSource for HarReplaySource {
    fn on_request_finished(&self, listener: RequestListener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

struct HarFinishedRequest {
    request: RequestMetadata,
    body: Option<String>,
    delay: Duration,
}

impl FinishedRequest for HarFinishedRequest {
    fn request(&self) -> &RequestMetadata {
        &self.request
    }

    fn get_content(self: Box<Self>, callback: ContentCallback) -> Result<(), CoreError> {
        let Some(body) = self.body else {
            return Err(CoreError::new(
                CoreErrorKind::ContentUnavailable,
                "response body was not captured",
            ));
        };

        let handle = tokio::runtime::Handle::try_current().map_err(|error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("no runtime to deliver response body: {error}"),
            )
        })?;

        let delay = self.delay;
        handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            callback(body);
        });

        Ok(())
    }
}
