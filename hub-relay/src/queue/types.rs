//! Message format published to the detail topic.

use serde_json::Value;

/// Content type of every published message.
pub const MESSAGE_CONTENT_TYPE: &str = "application/json";

/// One detail record ready for publishing.
///
/// The body is the compact JSON text of the record fetched for
/// `message_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    /// Identifier the record was fetched for
    pub message_id: String,
    /// Serialized record
    pub body: Vec<u8>,
}

impl TopicMessage {
    /// Serialize a fetched detail record.
    pub fn from_record(id: &str, record: &Value) -> Result<Self, serde_json::Error> {
        Ok(Self {
            message_id: id.to_string(),
            body: serde_json::to_vec(record)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_record_is_compact_json() {
        let message =
            TopicMessage::from_record("123", &json!({"id": "123", "name": "Widget"})).unwrap();

        assert_eq!(message.message_id, "123");
        assert_eq!(message.body, br#"{"id":"123","name":"Widget"}"#.to_vec());
    }
}
