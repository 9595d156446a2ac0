//! Bury list: content hashes hidden until the next day.

use serde::{Deserialize, Serialize};

/// Content hashes of cards buried during a session.
///
/// The session only records; persisting the list and clearing it at the
/// start of a new day is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuryList {
    hashes: Vec<String>,
}

impl BuryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hash. Empty and duplicate hashes are ignored.
    ///
    /// Returns true if the hash was added.
    pub fn record(&mut self, hash: impl Into<String>) -> bool {
        let hash = hash.into();
        if hash.is_empty() || self.contains(&hash) {
            return false;
        }
        self.hashes.push(hash);
        true
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.iter().any(|h| h == hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Hashes in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hashes.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.hashes
    }
}

impl From<Vec<String>> for BuryList {
    fn from(hashes: Vec<String>) -> Self {
        let mut list = Self::new();
        for hash in hashes {
            list.record(hash);
        }
        list
    }
}
