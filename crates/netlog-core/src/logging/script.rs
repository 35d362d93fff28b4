use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::logging::{ConsoleLevel, LogSink, render_console_call};
use crate::models::TabId;

/// Message asking the privileged context to evaluate `code` in a tab.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleRequest {
    pub tab_id: TabId,
    pub code: String,
}

pub trait ScriptChannel: Send + Sync {
    fn send_request(&self, request: ConsoleRequest);
}

/// [`LogSink`] that turns every line into a console script and ships it over
/// a [`ScriptChannel`].
pub struct ConsoleScriptSink<C> {
    channel: C,
}

impl<C: ScriptChannel> ConsoleScriptSink<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    fn send(&self, level: ConsoleLevel, tab: TabId, payload: &str) {
        self.channel.send_request(ConsoleRequest {
            tab_id: tab,
            code: render_console_call(level, payload),
        });
    }
}

impl<C: ScriptChannel> LogSink for ConsoleScriptSink<C> {
    fn log(&self, tab: TabId, payload: &str) {
        self.send(ConsoleLevel::Log, tab, payload);
    }

    fn error(&self, tab: TabId, payload: &str) {
        self.send(ConsoleLevel::Error, tab, payload);
    }
}

/// Writes each request as one JSON line.
pub struct JsonLinesChannel<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesChannel<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ScriptChannel for JsonLinesChannel<W> {
    fn send_request(&self, request: ConsoleRequest) {
        let line = match serde_json::to_string(&request) {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(
                    tab = %request.tab_id,
                    error = %error,
                    "failed to encode console request"
                );
                return;
            }
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            tracing::warn!(
                tab = %request.tab_id,
                error = %error,
                "failed to write console request"
            );
        }
    }
}
