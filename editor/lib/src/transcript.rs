use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Content of a reply placeholder until the reply arrives
pub const WAITING_FOR_REPLY: &str = "Waiting for reply...";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub pending: bool,
}

/// Handle on a reply placeholder, consumed when the reply is recorded.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingReply(u64);

/// Append-only chat log of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript::default()
    }

    fn push(&mut self, role: Role, content: String, pending: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            role,
            content,
            pending,
        });
        id
    }

    pub fn push_user(&mut self, content: &str) {
        self.push(Role::User, content.to_string(), false);
    }

    /// Append a placeholder for a reply that is on its way.
    pub fn begin_reply(&mut self) -> PendingReply {
        PendingReply(self.push(Role::Ai, WAITING_FOR_REPLY.to_string(), true))
    }

    /// Replace the placeholder of `reply` in place with `content`.
    pub fn resolve(&mut self, reply: PendingReply, content: String) -> Result<(), SessionError> {
        let message = self
            .messages
            .iter_mut()
            .find(|message| message.id == reply.0 && message.pending)
            .ok_or(SessionError::UnknownReply(reply.0))?;
        message.content = content;
        message.pending = false;
        Ok(())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_waiting(&self) -> bool {
        self.messages.iter().any(|message| message.pending)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_replaces_placeholder_in_place() {
        let mut transcript = Transcript::new();
        transcript.push_user("hello");
        let reply = transcript.begin_reply();

        assert!(transcript.is_waiting());
        assert_eq!(transcript.messages()[1].content, WAITING_FOR_REPLY);

        transcript.resolve(reply, "hi!".to_string()).unwrap();

        assert!(!transcript.is_waiting());
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[1].role, Role::Ai);
        assert_eq!(transcript.messages()[1].content, "hi!");
    }

    #[test]
    fn test_overlapping_replies_keep_their_slot() {
        let mut transcript = Transcript::new();
        transcript.push_user("first");
        let first = transcript.begin_reply();
        transcript.push_user("second");
        let second = transcript.begin_reply();

        transcript.resolve(second, "answer 2".to_string()).unwrap();
        transcript.resolve(first, "answer 1".to_string()).unwrap();

        let contents: Vec<&str> = transcript
            .messages()
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "answer 1", "second", "answer 2"]);
    }

    #[test]
    fn test_unknown_reply() {
        let mut transcript = Transcript::new();

        assert_eq!(
            transcript.resolve(PendingReply(7), "late".to_string()),
            Err(SessionError::UnknownReply(7))
        );
        assert!(transcript.is_empty());
    }
}
