//! Trigger event types
//!
//! A drill is started by a small JSON event, either from a schedule or by an
//! operator. Only `cluster_identifier` changes what the drill does.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Who started the drill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TriggerSource {
    Scheduled,
    Manual,
    #[serde(other)]
    Other,
}

/// Requested depth of the drill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TestType {
    Full,
    Quick,
    #[serde(other)]
    Other,
}

/// Event payload that starts a drill
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Overrides the configured source cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<TriggerSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_type: Option<TestType>,
}

impl TriggerEvent {
    /// Load an event from a file, or from stdin when `path` is `-`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = if path == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| ConfigError::io(path, e))?;
            buf
        } else {
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?
        };
        Self::parse(path, &raw)
    }

    /// Parse an event. Blank input is an empty event.
    pub fn parse(path: &str, raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|source| ConfigError::InvalidEvent {
            path: path.to_string(),
            source,
        })
    }
}

/// Pick the source cluster: explicit override, then event, then configuration.
///
/// Blank values count as absent.
pub fn resolve_cluster_identifier(
    cli: Option<&str>,
    event: &TriggerEvent,
    configured: Option<&str>,
) -> Option<String> {
    [cli, event.cluster_identifier.as_deref(), configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|id| !id.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_event() {
        let event = TriggerEvent::parse(
            "event.json",
            r#"{"cluster_identifier": "prod-db", "source": "manual", "test_type": "quick"}"#,
        )
        .unwrap();
        assert_eq!(event.cluster_identifier.as_deref(), Some("prod-db"));
        assert_eq!(event.source, Some(TriggerSource::Manual));
        assert_eq!(event.test_type, Some(TestType::Quick));
    }

    #[test]
    fn tolerates_unknown_hints_and_fields() {
        let event = TriggerEvent::parse(
            "-",
            r#"{"source": "aws.events", "detail-type": "Scheduled Event"}"#,
        )
        .unwrap();
        assert_eq!(event.source, Some(TriggerSource::Other));
        assert!(event.cluster_identifier.is_none());
    }

    #[test]
    fn blank_input_is_empty_event() {
        assert_eq!(TriggerEvent::parse("-", "  \n").unwrap(), TriggerEvent::default());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            TriggerEvent::parse("event.json", "{not json"),
            Err(ConfigError::InvalidEvent { .. })
        ));
    }

    #[test]
    fn cluster_identifier_precedence() {
        let event = TriggerEvent {
            cluster_identifier: Some("from-event".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_cluster_identifier(Some("from-cli"), &event, Some("configured")).as_deref(),
            Some("from-cli")
        );
        assert_eq!(
            resolve_cluster_identifier(None, &event, Some("configured")).as_deref(),
            Some("from-event")
        );
        assert_eq!(
            resolve_cluster_identifier(Some(" "), &TriggerEvent::default(), Some("configured"))
                .as_deref(),
            Some("configured")
        );
        assert_eq!(
            resolve_cluster_identifier(None, &TriggerEvent::default(), None),
            None
        );
    }
}
