pub mod script;
pub mod tracing_sink;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::TabId;

pub use script::{ConsoleRequest, ConsoleScriptSink, JsonLinesChannel, ScriptChannel};
pub use tracing_sink::TracingLogSink;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Log,
    Error,
}

impl ConsoleLevel {
    pub fn method(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Error => "error",
        }
    }
}

/// One-way log output to a context outside the panel.
///
/// `payload` is a JSON array holding the arguments of a single console call.
/// Delivery is fire-and-forget: implementations report their own failures.
pub trait LogSink: Send + Sync {
    fn log(&self, tab: TabId, payload: &str);

    fn error(&self, tab: TabId, payload: &str);

    fn emit(&self, level: ConsoleLevel, tab: TabId, payload: &str) {
        match level {
            ConsoleLevel::Log => self.log(tab, payload),
            ConsoleLevel::Error => self.error(tab, payload),
        }
    }
}

pub fn encode_arguments(args: &[Value]) -> String {
    Value::Array(args.to_vec()).to_string()
}

/// Renders the script that replays one console call in the inspected page,
/// e.g. `console.log(...["GET","https://example.test"]);`.
pub fn render_console_call(level: ConsoleLevel, payload: &str) -> String {
    format!("console.{}(...{payload});", level.method())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ConsoleLevel, encode_arguments, render_console_call};

    #[test]
    fn renders_spread_console_call() {
        let payload = encode_arguments(&[
            json!("GET"),
            json!("https://example.test/a?b=1"),
            json!([]),
        ]);
        assert_eq!(
            render_console_call(ConsoleLevel::Log, &payload),
            r#"console.log(...["GET","https://example.test/a?b=1",[]]);"#
        );
    }

    #[test]
    fn error_level_uses_console_error() {
        let payload = encode_arguments(&[json!("quote \" and\nnewline")]);
        assert_eq!(
            render_console_call(ConsoleLevel::Error, &payload),
            r#"console.error(...["quote \" and\nnewline"]);"#
        );
    }
}
