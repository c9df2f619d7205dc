use serde::{Deserialize, Serialize};

/// Document type under 'chats/{conversation_id}/messages/{message_id}'.
/// Messages are append-only.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub text: String,

    /// Milliseconds since epoch.
    pub sent_at: i64,
}

impl ChatMessage {
    /// Deterministic conversation id for two users.
    pub fn conversation_id(a: &str, b: &str) -> String {
        let mut ids = [a, b];
        ids.sort();
        ids.join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_is_sorted_pair() {
        assert_eq!(ChatMessage::conversation_id("u2", "u1"), "u1_u2");
        assert_eq!(
            ChatMessage::conversation_id("u1", "u2"),
            ChatMessage::conversation_id("u2", "u1")
        );
    }
}
