use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_MESSAGES: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Gif,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user: String,
    pub user_id: String,
    pub text: String,
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gif_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub is_pinned: bool,
    pub is_edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl ChatMessage {
    /// A fresh, unpinned, unedited message stamped with the current time.
    pub fn new(user_id: &str, user: &str, text: String, kind: MessageKind) -> Self {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            user_id: user_id.to_string(),
            text,
            timestamp: now_millis(),
            kind,
            gif_url: None,
            file_url: None,
            file_name: None,
            file_size: None,
            is_pinned: false,
            is_edited: false,
            reply_to: None,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Bounded chat log. Oldest entries are dropped once `capacity` is exceeded.
#[derive(Debug)]
pub struct MessageLog {
    entries: VecDeque<ChatMessage>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(MAX_MESSAGES)
    }
}

impl MessageLog {
    pub fn with_capacity(capacity: usize) -> Self {
        MessageLog {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `message`, returning whatever fell off the front.
    pub fn push(&mut self, message: ChatMessage) -> Option<ChatMessage> {
        self.entries.push_back(message);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Replaces the text of `id` when `author` wrote it.
    pub fn edit(&mut self, id: &str, author: &str, text: &str) -> bool {
        match self.entries.iter_mut().find(|m| m.id == id) {
            Some(message) if message.user_id == author => {
                message.text = text.to_string();
                message.is_edited = true;
                true
            }
            _ => false,
        }
    }

    /// Removes `id` when `author` wrote it.
    pub fn delete(&mut self, id: &str, author: &str) -> bool {
        let Some(index) = self.entries.iter().position(|m| m.id == id) else {
            return false;
        };
        if self.entries[index].user_id != author {
            return false;
        }
        self.entries.remove(index);
        true
    }

    /// Flips the pinned flag of `id`, returning the new value.
    pub fn toggle_pin(&mut self, id: &str) -> Option<bool> {
        let message = self.entries.iter_mut().find(|m| m.id == id)?;
        message.is_pinned = !message.is_pinned;
        Some(message.is_pinned)
    }

    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(author: &str, body: &str) -> ChatMessage {
        ChatMessage::new(author, author, body.to_string(), MessageKind::Text)
    }

    #[test]
    fn evicts_oldest_first() {
        let mut log = MessageLog::with_capacity(3);
        let first = text("a", "1");
        let first_id = first.id.clone();
        assert!(log.push(first).is_none());
        log.push(text("a", "2"));
        log.push(text("a", "3"));

        let evicted = log.push(text("a", "4")).expect("capacity exceeded");
        assert_eq!(evicted.id, first_id);
        assert_eq!(log.len(), 3);
        let bodies: Vec<_> = log.snapshot().into_iter().map(|m| m.text).collect();
        assert_eq!(bodies, ["2", "3", "4"]);
    }

    #[test]
    fn default_capacity_holds_five_hundred() {
        let mut log = MessageLog::default();
        for i in 0..=MAX_MESSAGES {
            log.push(text("a", &i.to_string()));
            assert!(log.len() <= MAX_MESSAGES);
        }
        assert_eq!(log.len(), MAX_MESSAGES);
        assert_eq!(log.snapshot()[0].text, "1");
    }

    #[test]
    fn edit_requires_author() {
        let mut log = MessageLog::default();
        let message = text("a", "hello");
        let id = message.id.clone();
        log.push(message);

        assert!(!log.edit(&id, "b", "hijacked"));
        assert_eq!(log.get(&id).map(|m| m.text.as_str()), Some("hello"));
        assert!(!log.get(&id).is_some_and(|m| m.is_edited));

        assert!(log.edit(&id, "a", "hello there"));
        let edited = log.get(&id).expect("still present");
        assert_eq!(edited.text, "hello there");
        assert!(edited.is_edited);
    }

    #[test]
    fn delete_requires_author() {
        let mut log = MessageLog::default();
        let message = text("a", "bye");
        let id = message.id.clone();
        log.push(message);

        assert!(!log.delete(&id, "b"));
        assert_eq!(log.len(), 1);
        assert!(log.delete(&id, "a"));
        assert!(log.is_empty());
        assert!(!log.delete(&id, "a"));
    }

    #[test]
    fn toggle_pin_twice_restores() {
        let mut log = MessageLog::default();
        let message = text("a", "pin me");
        let id = message.id.clone();
        log.push(message);

        assert_eq!(log.toggle_pin(&id), Some(true));
        assert_eq!(log.toggle_pin(&id), Some(false));
        assert_eq!(log.toggle_pin("missing"), None);
    }

    #[test]
    fn wire_shape_uses_camel_case() {
        let mut message = text("conn-1", "hi");
        message.id = "m1".into();
        message.timestamp = 42;
        message.reply_to = Some("m0".into());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "m1",
                "user": "conn-1",
                "userId": "conn-1",
                "text": "hi",
                "timestamp": 42,
                "type": "text",
                "isPinned": false,
                "isEdited": false,
                "replyTo": "m0"
            })
        );
    }
}
