//! Per-session unlock slots.
//!
//! A slot holds the decrypted content of one locked note together with the
//! password that opened it, so reads and the following save do not need the
//! password again. Slots live only in memory and are wiped on drop.

use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Default idle timeout before a slot is treated as gone (1 hour).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

pub struct UnlockSlot {
    plaintext: Zeroizing<String>,
    password: Zeroizing<String>,
    last_accessed: Instant,
}

impl UnlockSlot {
    fn new(plaintext: String, password: String) -> Self {
        Self {
            plaintext: Zeroizing::new(plaintext),
            password: Zeroizing::new(password),
            last_accessed: Instant::now(),
        }
    }

    pub fn plaintext(&self) -> &str {
        &self.plaintext
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_accessed.elapsed() > timeout
    }
}

impl std::fmt::Debug for UnlockSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockSlot")
            .field("plaintext", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Unlock state of one user session, keyed by note id.
#[derive(Debug)]
pub struct Session {
    slots: HashMap<Uuid, UnlockSlot>,
    idle_timeout: Duration,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_timeout(idle_timeout: Duration) -> Self {
        Self {
            slots: HashMap::new(),
            idle_timeout,
        }
    }

    /// Stores the outcome of a successful unlock, replacing any previous slot.
    pub fn store(&mut self, note_id: Uuid, plaintext: String, password: String) {
        self.slots.insert(note_id, UnlockSlot::new(plaintext, password));
    }

    /// Returns the live slot for `note_id`, refreshing its idle timer.
    /// An expired slot is dropped and reported as absent.
    pub fn slot(&mut self, note_id: &Uuid) -> Option<&UnlockSlot> {
        self.drop_if_expired(note_id);
        let slot = self.slots.get_mut(note_id)?;
        slot.last_accessed = Instant::now();
        Some(&*slot)
    }

    /// Like [`Session::slot`] but leaves the idle timer alone. Used by passive
    /// readers such as a preview that is redrawn on every tick.
    pub fn peek(&mut self, note_id: &Uuid) -> Option<&UnlockSlot> {
        self.drop_if_expired(note_id);
        self.slots.get(note_id)
    }

    fn drop_if_expired(&mut self, note_id: &Uuid) {
        let expired = self
            .slots
            .get(note_id)
            .is_some_and(|slot| slot.is_expired(self.idle_timeout));
        if expired {
            debug!("Unlock slot for {note_id} expired");
            self.slots.remove(note_id);
        }
    }

    pub fn clear_note(&mut self, note_id: &Uuid) {
        self.slots.remove(note_id);
    }

    pub fn is_unlocked(&self, note_id: &Uuid) -> bool {
        self.slots
            .get(note_id)
            .is_some_and(|slot| !slot.is_expired(self.idle_timeout))
    }

    /// Logout: forget every unlocked note.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod session_test;
