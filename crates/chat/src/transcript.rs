//! Per-ticket message transcript
//!
//! An ordered, deduplicated collection of chat messages for one
//! ticket. Three sources feed it — the initial history fetch, the live
//! channel, and the local optimistic send path — and all three must
//! converge on a single set regardless of arrival order.

use helpdesk_shared::ChatMessage;
use uuid::Uuid;

/// One transcript slot: a message plus its optimistic marker
///
/// `provisional_id` is `Some` only while a locally-sent message waits
/// for the store to confirm it. Promotion clears the marker and swaps
/// in the authoritative copy; the two states are mutually exclusive.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub message: ChatMessage,
    pub provisional_id: Option<Uuid>,
}

impl TranscriptEntry {
    /// Entry for a message the store has already persisted
    pub fn confirmed(message: ChatMessage) -> Self {
        Self {
            message,
            provisional_id: None,
        }
    }

    /// Entry for a locally-created message awaiting confirmation
    pub fn provisional(provisional_id: Uuid, message: ChatMessage) -> Self {
        Self {
            message,
            provisional_id: Some(provisional_id),
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.provisional_id.is_some()
    }
}

/// Deduplicated transcript for a single ticket
///
/// Entries are kept in arrival order internally; [`Transcript::ordered`]
/// re-sorts by timestamp on every read so the observed order is always
/// ascending `created_at`, ties broken by insertion order.
#[derive(Debug)]
pub struct Transcript {
    ticket_id: Uuid,
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new(ticket_id: Uuid) -> Self {
        Self {
            ticket_id,
            entries: Vec::new(),
        }
    }

    pub fn ticket_id(&self) -> Uuid {
        self.ticket_id
    }

    /// Insert a message unless it is already present
    ///
    /// Duplicate delivery (history overlapping the live feed, re-join
    /// replay) is expected; a confirmed id or provisional id already in
    /// the transcript makes this a no-op. Entries for a different
    /// ticket are rejected outright.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert_or_merge(&mut self, entry: TranscriptEntry) -> bool {
        if entry.message.ticket_id != self.ticket_id {
            tracing::warn!(
                ticket_id = %self.ticket_id,
                message_ticket_id = %entry.message.ticket_id,
                "Dropped message addressed to a different ticket"
            );
            return false;
        }

        let duplicate = match entry.provisional_id {
            None => self
                .entries
                .iter()
                .any(|e| !e.is_provisional() && e.message.id == entry.message.id),
            Some(provisional_id) => self
                .entries
                .iter()
                .any(|e| e.provisional_id == Some(provisional_id)),
        };

        if duplicate {
            tracing::debug!(
                ticket_id = %self.ticket_id,
                message_id = %entry.message.id,
                "Skipped duplicate message"
            );
            return false;
        }

        self.entries.push(entry);
        true
    }

    /// Replace a provisional entry with its confirmed counterpart
    ///
    /// No-op if no entry carries `provisional_id` (e.g. it was already
    /// discarded). If the confirmed id is already present — the fetch
    /// or live feed beat the promote here — the provisional is dropped
    /// instead, so confirmed ids stay unique. Returns `true` if the
    /// transcript changed.
    pub fn promote(&mut self, provisional_id: Uuid, confirmed: ChatMessage) -> bool {
        if self.contains(confirmed.id) {
            tracing::debug!(
                ticket_id = %self.ticket_id,
                provisional_id = %provisional_id,
                message_id = %confirmed.id,
                "Confirmed copy already present; dropping provisional"
            );
            return self.discard(provisional_id);
        }

        match self
            .entries
            .iter_mut()
            .find(|e| e.provisional_id == Some(provisional_id))
        {
            Some(entry) => {
                tracing::debug!(
                    ticket_id = %self.ticket_id,
                    provisional_id = %provisional_id,
                    message_id = %confirmed.id,
                    "Promoted provisional message"
                );
                *entry = TranscriptEntry::confirmed(confirmed);
                true
            }
            None => false,
        }
    }

    /// Remove a provisional entry (failed send rollback)
    ///
    /// Returns `true` if an entry was removed.
    pub fn discard(&mut self, provisional_id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.provisional_id != Some(provisional_id));
        self.entries.len() < before
    }

    /// Messages in display order: ascending `created_at`, stable on ties
    ///
    /// Sorting happens on every call and never mutates stored order, so
    /// a promotion that changes a timestamp is reflected on the next
    /// read without any re-indexing.
    pub fn ordered(&self) -> impl Iterator<Item = &ChatMessage> {
        let mut sorted: Vec<&TranscriptEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|e| e.message.created_at);
        sorted.into_iter().map(|e| &e.message)
    }

    /// True if a confirmed message with this id is present
    pub fn contains(&self, message_id: Uuid) -> bool {
        self.entries
            .iter()
            .any(|e| !e.is_provisional() && e.message.id == message_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
