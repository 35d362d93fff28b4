use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::PanelConfig;
use crate::logging::{ConsoleLevel, LogSink, encode_arguments};
use crate::models::{CapturedExchange, TabId, TaskOutcome};
use crate::orchestration::OrchestrationResult;

const TRUNCATION_MARKER: char = '…';

/// Turns queue results into console lines for one tab.
pub struct ExchangeReporter {
    sink: Arc<dyn LogSink>,
    tab: TabId,
    log_response_body: bool,
    max_response_chars: Option<usize>,
}

impl ExchangeReporter {
    pub fn new(config: &PanelConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            tab: config.tab_id,
            log_response_body: config.log_response_body,
            max_response_chars: config.max_response_chars,
        }
    }

    pub fn report(&self, result: OrchestrationResult<TaskOutcome>) {
        match result {
            Ok(TaskOutcome::Success(exchange)) => self.report_exchange(&exchange),
            Ok(TaskOutcome::Failure { message }) => {
                self.emit(ConsoleLevel::Error, &[json!(message)])
            }
            Err(error) => self.emit(ConsoleLevel::Error, &[json!(error.to_string())]),
        }
    }

    fn report_exchange(&self, exchange: &CapturedExchange) {
        let query: Vec<Value> = exchange
            .query_string
            .iter()
            .map(|param| json!({ "name": param.name, "value": param.value }))
            .collect();

        self.emit(
            ConsoleLevel::Log,
            &[
                json!(exchange.method),
                json!(exchange.url),
                Value::Array(query),
            ],
        );

        if self.log_response_body {
            let body = truncate(&exchange.response, self.max_response_chars);
            self.emit(ConsoleLevel::Log, &[json!(body)]);
        }
    }

    fn emit(&self, level: ConsoleLevel, args: &[Value]) {
        self.sink.emit(level, self.tab, &encode_arguments(args));
    }
}

fn truncate(body: &str, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if body.chars().count() > limit => {
            let mut truncated: String = body.chars().take(limit).collect();
            truncated.push(TRUNCATION_MARKER);
            truncated
        }
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("héllo wörld", Some(4)), "héll…");
        assert_eq!(truncate("short", Some(5)), "short");
        assert_eq!(truncate("unbounded", None), "unbounded");
    }
}
