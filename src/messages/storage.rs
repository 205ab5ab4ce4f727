use super::types::{ConversationTurn, Speaker};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Inner {
    turns: Vec<ConversationTurn>,
    next_sequence: u64,
}

/// Append-only transcript of a voice session.
///
/// Clones share the same underlying turns, so presentation code can hold a
/// read handle. Only the voice controller appends or clears.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    inner: Arc<RwLock<Inner>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Append a turn, assigning the next sequence number.
    pub(crate) fn append(&self, speaker: Speaker, text: impl Into<String>) -> ConversationTurn {
        let mut inner = self.inner.write();
        let turn = ConversationTurn {
            speaker,
            text: text.into(),
            sequence: inner.next_sequence,
            timestamp: Utc::now(),
        };
        inner.next_sequence += 1;
        inner.turns.push(turn.clone());
        turn
    }

    /// Empty the store and restart sequencing at 0.
    pub(crate) fn clear(&self) {
        let mut inner = self.inner.write();
        inner.turns.clear();
        inner.next_sequence = 0;
    }

    /// Ordered snapshot of every turn
    pub fn all(&self) -> Vec<ConversationTurn> {
        self.inner.read().turns.clone()
    }

    /// Turns with a sequence number at or after `sequence`
    pub fn since(&self, sequence: u64) -> Vec<ConversationTurn> {
        self.inner
            .read()
            .turns
            .iter()
            .filter(|t| t.sequence >= sequence)
            .cloned()
            .collect()
    }

    pub fn last(&self) -> Option<ConversationTurn> {
        self.inner.read().turns.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().turns.is_empty()
    }

    /// Serialize the transcript for export
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.inner.read().turns)
    }
}

impl Default for TranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}
