//! Bounded, ordered storage for the chat transcript.

use std::collections::VecDeque;

use serde_json::Value;

use crate::error::Result;
use crate::observability::{MESSAGES_APPENDED, MESSAGES_EVICTED, VALIDATION_ERRORS};
use crate::types::{ChatMessage, Role};

/// Default number of messages kept per session.
pub const MAX_MESSAGES: usize = 100;

/// An ordered transcript that never grows past its capacity.
///
/// Insertion order is display order. When the log is full, appending evicts
/// the oldest message first, so the log behaves as a ring buffer. Messages
/// are never edited in place.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl MessageLog {
    /// Creates an empty log holding up to [`MAX_MESSAGES`] messages.
    pub fn new() -> Self {
        Self::with_capacity(MAX_MESSAGES)
    }

    /// Creates an empty log with a custom bound. A bound of zero is raised
    /// to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a message, evicting the oldest one when the log is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContent`](crate::Error::EmptyContent) when `content` is blank after
    /// trimming. The log is unchanged on error.
    pub fn append(&mut self, role: Role, content: &str) -> Result<()> {
        let message = ChatMessage::new(role, content).inspect_err(|_| VALIDATION_ERRORS.click())?;
        self.push(message);
        Ok(())
    }

    /// Appends a message whose role is given by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRole`](crate::Error::InvalidRole) for roles other than `user`,
    /// `assistant` and `system`, and [`Error::EmptyContent`](crate::Error::EmptyContent) for blank
    /// content.
    pub fn append_str(&mut self, role: &str, content: &str) -> Result<()> {
        let message =
            ChatMessage::from_parts(role, content).inspect_err(|_| VALIDATION_ERRORS.click())?;
        self.push(message);
        Ok(())
    }

    /// Appends untyped content received from an external payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContentType`](crate::Error::InvalidContentType) when `content` is not a string.
    pub fn append_value(&mut self, role: Role, content: &Value) -> Result<()> {
        let message =
            ChatMessage::from_value(role, content).inspect_err(|_| VALIDATION_ERRORS.click())?;
        self.push(message);
        Ok(())
    }

    /// Appends several messages at once.
    ///
    /// Every message is validated before any is stored, so either all are
    /// appended or none are. Eviction repeats until the bound holds again.
    pub fn extend<'a, I>(&mut self, messages: I) -> Result<()>
    where
        I: IntoIterator<Item = (Role, &'a str)>,
    {
        let validated = messages
            .into_iter()
            .map(|(role, content)| ChatMessage::new(role, content))
            .collect::<Result<Vec<_>>>()
            .inspect_err(|_| VALIDATION_ERRORS.click())?;
        for message in validated {
            self.push(message);
        }
        Ok(())
    }

    fn push(&mut self, message: ChatMessage) {
        while self.messages.len() >= self.capacity {
            if let Some(evicted) = self.messages.pop_front() {
                MESSAGES_EVICTED.click();
                tracing::debug!(role = %evicted.role(), "evicted oldest message");
            }
        }
        self.messages.push_back(message);
        MESSAGES_APPENDED.click();
    }

    /// The number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when no messages are stored.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The maximum number of stored messages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// The most recent message.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }

    /// The message at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a ChatMessage;
    type IntoIter = std::collections::vec_deque::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn contents(log: &MessageLog) -> Vec<&str> {
        log.iter().map(ChatMessage::content).collect()
    }

    #[test]
    fn append_grows_by_one() {
        let mut log = MessageLog::new();
        assert!(log.is_empty());
        log.append(Role::User, "Hello").unwrap();
        assert_eq!(log.len(), 1);
        log.append(Role::Assistant, "Hi there").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap().role(), Role::Assistant);
        assert_eq!(log.get(0).unwrap().content(), "Hello");
    }

    #[test]
    fn whitespace_content_leaves_log_unchanged() {
        let mut log = MessageLog::new();
        log.append(Role::User, "keep").unwrap();
        for content in ["", " ", "\t\n", "   \r\n  "] {
            let err = log.append(Role::User, content).unwrap_err();
            assert!(matches!(err, Error::EmptyContent));
        }
        assert_eq!(contents(&log), vec!["keep"]);
    }

    #[test]
    fn invalid_role_leaves_log_unchanged() {
        let mut log = MessageLog::new();
        for role in ["robot", "USER", "tool", ""] {
            let err = log.append_str(role, "hello").unwrap_err();
            assert!(matches!(err, Error::InvalidRole { .. }), "{role:?}");
        }
        assert!(log.is_empty());
        log.append_str("system", "be kind").unwrap();
        assert_eq!(log.last().unwrap().role(), Role::System);
    }

    #[test]
    fn non_string_content_leaves_log_unchanged() {
        let mut log = MessageLog::new();
        for value in [json!(null), json!(4), json!(["a"]), json!({"text": "a"})] {
            let err = log.append_value(Role::Assistant, &value).unwrap_err();
            assert!(matches!(err, Error::InvalidContentType { .. }), "{value}");
        }
        assert!(log.is_empty());
        log.append_value(Role::Assistant, &json!("4")).unwrap();
        assert_eq!(contents(&log), vec!["4"]);
    }

    #[test]
    fn full_log_evicts_oldest() {
        let mut log = MessageLog::new();
        for i in 1..=MAX_MESSAGES + 1 {
            log.append(Role::User, &format!("message {i}")).unwrap();
            assert!(log.len() <= MAX_MESSAGES);
        }
        assert_eq!(log.len(), MAX_MESSAGES);
        let expected: Vec<String> = (2..=MAX_MESSAGES + 1)
            .map(|i| format!("message {i}"))
            .collect();
        assert_eq!(contents(&log), expected);
    }

    #[test]
    fn append_at_capacity_keeps_length() {
        let mut log = MessageLog::with_capacity(3);
        log.extend([(Role::User, "a"), (Role::Assistant, "b"), (Role::User, "c")])
            .unwrap();
        assert_eq!(log.len(), 3);
        log.append(Role::Assistant, "d").unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(contents(&log), vec!["b", "c", "d"]);
    }

    #[test]
    fn extend_past_capacity_keeps_newest() {
        let mut log = MessageLog::with_capacity(2);
        log.append(Role::User, "old").unwrap();
        log.extend([(Role::User, "x"), (Role::Assistant, "y"), (Role::User, "z")])
            .unwrap();
        assert_eq!(contents(&log), vec!["y", "z"]);
    }

    #[test]
    fn extend_is_all_or_nothing() {
        let mut log = MessageLog::with_capacity(5);
        log.append(Role::User, "first").unwrap();
        let err = log
            .extend([(Role::User, "ok"), (Role::Assistant, "  ")])
            .unwrap_err();
        assert!(matches!(err, Error::EmptyContent));
        assert_eq!(contents(&log), vec!["first"]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut log = MessageLog::with_capacity(0);
        assert_eq!(log.capacity(), 1);
        log.append(Role::User, "a").unwrap();
        log.append(Role::User, "b").unwrap();
        assert_eq!(contents(&log), vec!["b"]);
    }
}
