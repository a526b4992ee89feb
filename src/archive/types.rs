//! Data structures for the message records found in chat-export archives.
//!
//! Only the fields needed to derive user/role associations are modelled.
//! Everything else in a message (content, timestamps, attachments, ...)
//! is ignored by serde during decoding.

use serde::{Deserialize, Deserializer};

/// One chat message from the target array of an export document.
///
/// `author` is required: a message without it fails to decode and is
/// skipped as a record-level error.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    pub author: Author,
}

/// The author block of a message.
///
/// All fields fall back to their empty value when missing or `null`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nickname: String,
    /// Roles held by the author at the time the message was exported
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<Role>,
}

/// A role attached to a message author.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Role {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl Author {
    /// Nickname when set, otherwise the account name.
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.name
        } else {
            &self.nickname
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_message() {
        let json = r##"{
            "id": "1100000000000000000",
            "type": "Default",
            "timestamp": "2024-03-01T12:00:00+00:00",
            "content": "hello",
            "author": {
                "id": "42",
                "name": "alice",
                "discriminator": "0000",
                "nickname": "Alice W.",
                "isBot": false,
                "roles": [
                    {"id": "10", "name": "mod", "color": "#FF0000", "position": 3},
                    {"id": "11", "name": "member"}
                ]
            },
            "reactions": []
        }"##;

        let msg: MessageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(msg.author.id, "42");
        assert_eq!(msg.author.name, "alice");
        assert_eq!(msg.author.display_name(), "Alice W.");
        assert_eq!(msg.author.roles.len(), 2);
        assert_eq!(msg.author.roles[1].name, "member");
    }

    #[test]
    fn test_missing_and_null_fields_default_to_empty() {
        let json = r#"{"author": {"id": "7", "name": "bob", "nickname": null, "roles": null}}"#;
        let msg: MessageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(msg.author.nickname, "");
        assert!(msg.author.roles.is_empty());
        assert_eq!(msg.author.display_name(), "bob");

        let msg: MessageRecord = serde_json::from_str(r#"{"author": {}}"#).unwrap();
        assert_eq!(msg.author, Author::default());
    }

    #[test]
    fn test_missing_author_is_an_error() {
        assert!(serde_json::from_str::<MessageRecord>(r#"{"content": "hi"}"#).is_err());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        assert!(serde_json::from_str::<MessageRecord>(r#"{"author": {"id": 42}}"#).is_err());
        assert!(serde_json::from_str::<MessageRecord>(r#"{"author": "alice"}"#).is_err());
    }
}
