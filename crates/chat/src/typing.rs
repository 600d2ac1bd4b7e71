//! Per-ticket typing indicators
//!
//! Ephemeral set of display names currently composing in one ticket,
//! driven by remote channel events and local draft transitions. No
//! timeout expiry: a peer that vanishes mid-keystroke stays listed
//! until its stop event arrives (accepted limitation).

use uuid::Uuid;

/// Tracks who is typing in one conversation, excluding the local user
#[derive(Debug)]
pub struct TypingTracker {
    local_user_id: Uuid,
    /// Display names in first-seen order, each at most once
    names: Vec<String>,
    local_typing: bool,
}

impl TypingTracker {
    pub fn new(local_user_id: Uuid) -> Self {
        Self {
            local_user_id,
            names: Vec::new(),
            local_typing: false,
        }
    }

    /// Record a remote typing event; self-originated events are ignored
    ///
    /// Returns `true` if the set changed.
    pub fn remote_started(&mut self, user_id: Uuid, name: &str) -> bool {
        if user_id == self.local_user_id || self.names.iter().any(|n| n == name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Record a remote stop-typing event
    ///
    /// Returns `true` if the set changed.
    pub fn remote_stopped(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() < before
    }

    /// Update the local composing state from the current draft
    ///
    /// Returns `true` on a transition (the caller then announces it on
    /// the bridge); repeated keystrokes while already typing are quiet.
    pub fn set_local_typing(&mut self, typing: bool) -> bool {
        if self.local_typing == typing {
            return false;
        }
        self.local_typing = typing;
        true
    }

    pub fn is_local_typing(&self) -> bool {
        self.local_typing
    }

    /// Names currently typing, in stable display order
    pub fn identities(&self) -> &[String] {
        &self.names
    }

    /// Drop all remote typing state (session teardown)
    pub fn clear(&mut self) {
        self.names.clear();
        self.local_typing = false;
    }
}
