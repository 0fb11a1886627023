//! Append-only chat/system log for one conversational context.
//!
//! DESIGN
//! ======
//! A session keeps one log for the lobby and one for the current room. Entries
//! are never mutated once appended; each gets a per-log sequence number so a
//! host polling once per frame can ask for "everything since N" instead of
//! diffing the whole log.

use std::fmt;

use serde::Serialize;

// =============================================================================
// MESSAGE KIND
// =============================================================================

/// Classification of a system message by the engine's numeric type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    PlayerInfo,
    ServerMessage,
    Warning,
    Error,
    /// Unknown code from the server; rendered as plain text.
    Other,
}

impl MessageKind {
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::PlayerInfo,
            1 => Self::ServerMessage,
            2 => Self::Warning,
            3 => Self::Error,
            _ => Self::Other,
        }
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryKind {
    Chat { sender: String, text: String },
    PlayerJoined { name: String },
    PlayerLeft { name: String, reason: String },
    Message { kind: MessageKind, code: i32, text: String },
}

/// A single appended log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Position in the owning log, starting at 0.
    pub seq: u64,
    #[serde(flatten)]
    pub entry: EntryKind,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry {
            EntryKind::Chat { sender, text } => write!(f, "<{sender}> {text}"),
            EntryKind::PlayerJoined { name } => write!(f, "* {name} has joined"),
            EntryKind::PlayerLeft { name, reason } if reason.is_empty() => write!(f, "* {name} has left"),
            EntryKind::PlayerLeft { name, reason } => write!(f, "* {name} has left ({reason})"),
            EntryKind::Message { kind, text, .. } => match kind {
                MessageKind::ServerMessage => write!(f, "*** {text}"),
                MessageKind::Warning => write!(f, "Warning: {text}"),
                MessageKind::Error => write!(f, "Error: {text}"),
                MessageKind::PlayerInfo | MessageKind::Other => f.write_str(text),
            },
        }
    }
}

// =============================================================================
// MESSAGE LOG
// =============================================================================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_chat(&mut self, sender: &str, text: &str) -> &LogEntry {
        self.push(EntryKind::Chat { sender: sender.to_owned(), text: text.to_owned() })
    }

    pub fn append_player_join(&mut self, name: &str) -> &LogEntry {
        self.push(EntryKind::PlayerJoined { name: name.to_owned() })
    }

    pub fn append_player_leave(&mut self, name: &str, reason: &str) -> &LogEntry {
        self.push(EntryKind::PlayerLeft { name: name.to_owned(), reason: reason.to_owned() })
    }

    pub fn append_message(&mut self, code: i32, text: &str) -> &LogEntry {
        self.push(EntryKind::Message { kind: MessageKind::from_code(code), code, text: text.to_owned() })
    }

    fn push(&mut self, entry: EntryKind) -> &LogEntry {
        let seq = self.entries.len() as u64;
        self.entries.push(LogEntry { seq, entry });
        &self.entries[self.entries.len() - 1]
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries with `seq >= from`. Empty if `from` is past the end.
    #[must_use]
    pub fn entries_since(&self, from: u64) -> &[LogEntry] {
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(self.entries.len());
        &self.entries[start..]
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rendered display lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// JSON array snapshot of every entry, oldest first.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod tests;
