use serde::{Deserialize, Serialize};

use crate::models::{CoreError, CoreErrorKind, TabId};

pub const TAB_ID_ENV: &str = "NETLOG_TAB_ID";
pub const LOG_BODY_ENV: &str = "NETLOG_LOG_BODY";
pub const MAX_BODY_CHARS_ENV: &str = "NETLOG_MAX_BODY_CHARS";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    pub tab_id: TabId,
    pub log_response_body: bool,
    /// Bodies longer than this many characters are truncated in the log.
    pub max_response_chars: Option<usize>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            tab_id: TabId::default(),
            log_response_body: true,
            max_response_chars: None,
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults overridden by whatever `lookup` returns
    /// for the `NETLOG_*` keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(TAB_ID_ENV) {
            let tab_id = raw
                .trim()
                .parse::<i64>()
                .map_err(|error| invalid_value(TAB_ID_ENV, &raw, &error.to_string()))?;
            config.tab_id = TabId(tab_id);
        }

        if let Some(raw) = lookup(LOG_BODY_ENV) {
            config.log_response_body = parse_flag(&raw)
                .ok_or_else(|| invalid_value(LOG_BODY_ENV, &raw, "expected a boolean"))?;
        }

        if let Some(raw) = lookup(MAX_BODY_CHARS_ENV) {
            let trimmed = raw.trim();
            config.max_response_chars = if trimmed.is_empty() {
                None
            } else {
                let limit = trimmed
                    .parse::<usize>()
                    .map_err(|error| invalid_value(MAX_BODY_CHARS_ENV, &raw, &error.to_string()))?;
                Some(limit)
            };
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid_value(key: &str, raw: &str, reason: &str) -> CoreError {
    CoreError::new(
        CoreErrorKind::InvalidInput,
        format!("invalid value '{raw}' for {key}: {reason}"),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{LOG_BODY_ENV, MAX_BODY_CHARS_ENV, PanelConfig, TAB_ID_ENV};
    use crate::models::{CoreErrorKind, TabId};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = PanelConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PanelConfig::default());
        assert!(config.log_response_body);
    }

    #[test]
    fn reads_overrides() {
        let config = PanelConfig::from_lookup(lookup(&[
            (TAB_ID_ENV, " 42 "),
            (LOG_BODY_ENV, "off"),
            (MAX_BODY_CHARS_ENV, "128"),
        ]))
        .unwrap();

        assert_eq!(config.tab_id, TabId(42));
        assert!(!config.log_response_body);
        assert_eq!(config.max_response_chars, Some(128));
    }

    #[test]
    fn rejects_malformed_values() {
        let error = PanelConfig::from_lookup(lookup(&[(TAB_ID_ENV, "tab-1")])).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
        assert!(error.message.contains(TAB_ID_ENV));

        let error = PanelConfig::from_lookup(lookup(&[(LOG_BODY_ENV, "maybe")])).unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    }

    #[test]
    fn deserializes_partial_json() {
        let config: PanelConfig = serde_json::from_str(r#"{"tabId": 3}"#).unwrap();
        assert_eq!(config.tab_id, TabId(3));
        assert!(config.log_response_body);
    }
}
