//! Append-only message transcript with a transient typing placeholder.

use chrono::Utc;
use shared::domain::{Speaker, TranscriptEntry};

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    awaiting_reply: bool,
}

impl Transcript {
    /// Appends an entry. The typing placeholder is cleared first, so it can
    /// never survive past the entry it was standing in for.
    pub fn push(&mut self, speaker: Speaker, content: impl Into<String>) -> TranscriptEntry {
        self.awaiting_reply = false;
        let entry = TranscriptEntry {
            speaker,
            content: content.into(),
            sent_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        entry
    }

    /// Shows the typing placeholder. Returns false when it was already
    /// showing, so callers do not announce it twice.
    pub fn begin_awaiting_reply(&mut self) -> bool {
        if self.awaiting_reply {
            return false;
        }
        self.awaiting_reply = true;
        true
    }

    /// Hides the typing placeholder. Returns whether it was showing.
    pub fn end_awaiting_reply(&mut self) -> bool {
        std::mem::take(&mut self.awaiting_reply)
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }
}
