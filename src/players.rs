//! Lobby presence: the set of players currently in the lobby.
//!
//! The server is untrusted input, so join/leave events may arrive duplicated
//! or out of order. A join for a present name and a leave for an absent name
//! are both no-ops; callers get a `bool` telling them whether anything changed.

use std::collections::BTreeSet;

use serde::Serialize;

/// Unique player names, iterated in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlayerList {
    names: BTreeSet<String>,
}

impl PlayerList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player. Returns `false` if the name was already present.
    pub fn add(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_owned())
    }

    /// Remove a player. Returns `false` if the name was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Owned snapshot of the current names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// JSON array snapshot of the names, sorted.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "players_test.rs"]
mod tests;
