//! Conversion of notes from the legacy layout (title and content both sealed)
//! to the current one (title in clear, content sealed).
//!
//! Notes stamped [`ContentFormat::ContentOnly`] are skipped exactly. Unmarked
//! notes are classified by whether their title parses as a cipher token, which
//! is a best-effort guess; every note this pass migrates gets stamped so the
//! guess is never needed for it again.

use crate::cipher::{self, EncryptionKey};
use crate::error::AppError;
use crate::note::{ContentFormat, Note};
use crate::store::NoteStore;
use chrono::Utc;
use log::{error, info, warn};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Wrong password or corrupted ciphertext.
    Decryption,
    /// The title looks sealed but the content does not.
    AmbiguousFormat,
    Encryption,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Decryption => write!(f, "incorrect password or corrupted data"),
            FailureReason::AmbiguousFormat => {
                write!(f, "title looks encrypted but content does not")
            }
            FailureReason::Encryption => write!(f, "re-encryption failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Migrated { title: String },
    /// Dry run: would have been migrated.
    WouldMigrate { title: String },
    AlreadyMigrated,
    Failed(FailureReason),
}

#[derive(Debug, Clone)]
pub struct NoteReport {
    pub note_id: Uuid,
    pub outcome: MigrationOutcome,
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub notes: Vec<NoteReport>,
}

impl MigrationReport {
    /// Notes converted, or that would be in a dry run.
    pub fn migrated(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                MigrationOutcome::Migrated { .. } | MigrationOutcome::WouldMigrate { .. }
            )
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, MigrationOutcome::AlreadyMigrated))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, MigrationOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&MigrationOutcome) -> bool) -> usize {
        self.notes.iter().filter(|n| pred(&n.outcome)).count()
    }
}

/// Legacy plaintext recovered from a note.
struct Recovered {
    title: String,
    content: String,
}

fn recover_legacy(note: &Note, key: &EncryptionKey) -> Result<Option<Recovered>, FailureReason> {
    if note.format == ContentFormat::ContentOnly || !cipher::looks_like_ciphertext(&note.title) {
        return Ok(None);
    }
    let title = cipher::decrypt_with_key(&note.title, key).map_err(|_| FailureReason::Decryption)?;
    if !cipher::looks_like_ciphertext(&note.content) {
        return Err(FailureReason::AmbiguousFormat);
    }
    let content =
        cipher::decrypt_with_key(&note.content, key).map_err(|_| FailureReason::Decryption)?;
    Ok(Some(Recovered { title, content }))
}

fn migrate_note(note: &mut Note, key: &EncryptionKey, dry_run: bool) -> MigrationOutcome {
    let recovered = match recover_legacy(note, key) {
        Ok(Some(recovered)) => recovered,
        Ok(None) => return MigrationOutcome::AlreadyMigrated,
        Err(reason) => return MigrationOutcome::Failed(reason),
    };

    if dry_run {
        return MigrationOutcome::WouldMigrate {
            title: recovered.title,
        };
    }

    match cipher::encrypt_with_key(&recovered.content, key) {
        Ok(sealed) => {
            note.title = recovered.title.clone();
            note.content = sealed;
            note.format = ContentFormat::ContentOnly;
            note.updated_at = Utc::now();
            MigrationOutcome::Migrated {
                title: recovered.title,
            }
        }
        Err(e) => {
            error!("Re-encrypting note {} failed: {e}", note.id);
            MigrationOutcome::Failed(FailureReason::Encryption)
        }
    }
}

/// Migrates every locked note of `user_id`. Per-note failures are recorded and
/// the batch continues; a wrong password migrates nothing and writes nothing.
pub fn migrate_user_notes(
    store: &mut NoteStore,
    user_id: u64,
    password: &str,
    dry_run: bool,
) -> Result<MigrationReport, AppError> {
    let key = cipher::derive_key(password, &cipher::salt_for_user(user_id))?;
    let note_ids = store.locked_note_ids_for_user(user_id);
    info!(
        "Checking {} locked notes of user {user_id}{}",
        note_ids.len(),
        if dry_run { " (dry run)" } else { "" }
    );

    let mut notes = Vec::with_capacity(note_ids.len());
    for note_id in note_ids {
        let Some(note) = store.get_mut(&note_id) else {
            continue;
        };
        let outcome = migrate_note(note, &key, dry_run);
        match &outcome {
            MigrationOutcome::Migrated { .. } => info!("Note {note_id}: migrated"),
            MigrationOutcome::WouldMigrate { .. } => info!("Note {note_id}: would be migrated"),
            MigrationOutcome::AlreadyMigrated => info!("Note {note_id}: already in current format"),
            MigrationOutcome::Failed(reason) => warn!("Note {note_id}: {reason}"),
        }
        notes.push(NoteReport { note_id, outcome });
    }

    Ok(MigrationReport { notes })
}

#[cfg(test)]
mod migration_test;
