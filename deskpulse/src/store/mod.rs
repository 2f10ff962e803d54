use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod postgresql;

/// A message record exactly as the store hands it out.
///
/// Timestamps and directions are kept as strings so that a single bad record
/// can be skipped by the engine instead of failing the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    #[serde(alias = "messageId")]
    pub id: String,
    #[serde(alias = "groupId")]
    pub conversation_id: String,
    pub direction: String,
    pub timestamp: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Customer,
    Team,
    Other,
}

impl Direction {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "client" | "customer" => Direction::Customer,
            "team" | "agent" => Direction::Team,
            _ => Direction::Other,
        }
    }
}

/// A stored message with its timestamp parsed and shifted into the reporting offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub direction: Direction,
    pub timestamp: DateTime<FixedOffset>,
    /// Timestamp string as it was stored, echoed back in alerts.
    pub raw_timestamp: String,
    pub text: Option<String>,
    pub sender_name: Option<String>,
}

impl Message {
    pub fn is_customer(&self) -> bool {
        self.direction == Direction::Customer
    }

    pub fn is_team(&self) -> bool {
        self.direction == Direction::Team
    }

    pub fn from_stored(
        stored: &StoredMessage,
        offset: FixedOffset,
    ) -> Result<Self, TimestampError> {
        let instant = parse_timestamp(&stored.timestamp)?;
        Ok(Self {
            id: stored.id.clone(),
            conversation_id: stored.conversation_id.clone(),
            direction: Direction::parse(&stored.direction),
            timestamp: instant.with_timezone(&offset),
            raw_timestamp: stored.timestamp.clone(),
            text: stored.text.clone(),
            sender_name: stored.sender_name.clone(),
        })
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unparseable timestamp '{0}'")]
pub struct TimestampError(pub String);

/// Parses an RFC 3339 timestamp (`Z` suffix accepted). Timestamps without an
/// offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| TimestampError(value.to_string()))
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to message store: {0}")]
    Connection(String),

    #[error("message store query failed: {0}")]
    Query(String),

    #[error("message store is not ready: {0}")]
    NotReady(String),

    #[error("failed to load seed data: {0}")]
    Seed(String),
}

/// Source of the full message history.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Returns every message visible to `tenant` (all tenants when `None`).
    /// Pagination is internal to the implementation; no ordering is promised.
    async fn list_all_messages(
        &self,
        tenant: Option<&str>,
    ) -> Result<Vec<StoredMessage>, StoreError>;
}

/// Lookup of the human readable name of a conversation group.
#[async_trait]
pub trait GroupNameResolver: Send + Sync {
    /// Returns an empty string when the group is unknown or the lookup fails.
    async fn resolve_name(&self, conversation_id: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn stored(timestamp: &str) -> StoredMessage {
        StoredMessage {
            id: "m1".to_string(),
            conversation_id: "g1".to_string(),
            direction: "client".to_string(),
            timestamp: timestamp.to_string(),
            text: Some("oi".to_string()),
            sender_name: Some("Ana".to_string()),
            tenant: None,
        }
    }

    #[test]
    fn test_direction_aliases() {
        assert_eq!(Direction::parse("client"), Direction::Customer);
        assert_eq!(Direction::parse("Customer"), Direction::Customer);
        assert_eq!(Direction::parse("team"), Direction::Team);
        assert_eq!(Direction::parse("agent"), Direction::Team);
        assert_eq!(Direction::parse("system"), Direction::Other);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let zulu = parse_timestamp("2025-03-10T13:00:00Z").unwrap();
        let offset = parse_timestamp("2025-03-10T10:00:00-03:00").unwrap();
        let naive = parse_timestamp("2025-03-10T13:00:00.250").unwrap();
        assert_eq!(zulu, offset);
        assert_eq!(naive.timestamp_millis() - zulu.timestamp_millis(), 250);
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn test_from_stored_shifts_into_reporting_offset() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let message = Message::from_stored(&stored("2025-03-10T13:05:00Z"), offset).unwrap();
        assert_eq!(message.timestamp.hour(), 10);
        assert_eq!(message.raw_timestamp, "2025-03-10T13:05:00Z");
        assert!(message.is_customer());
    }

    #[test]
    fn test_stored_message_accepts_source_field_names() {
        let json = r#"{"messageId":"abc","groupId":"g9","direction":"team","timestamp":"2025-03-10T13:05:00Z"}"#;
        let message: StoredMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, "abc");
        assert_eq!(message.conversation_id, "g9");
        assert_eq!(message.text, None);
    }
}
