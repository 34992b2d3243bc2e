use crate::error::AppError;
use crate::note::{Note, NoteVersion};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// JSON-backed record store for notes and their version history.
#[derive(Serialize, Deserialize, Default)]
pub struct NoteStore {
    notes: HashMap<Uuid, Note>,
    /// Append-only; insertion order is chronological.
    versions: Vec<NoteVersion>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl NoteStore {
    /// Loads the store at `path`, or starts empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let mut store = if path.exists() {
            let data = fs::read_to_string(path)?;
            if data.trim().is_empty() {
                NoteStore::default()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            debug!("No store at {}, starting empty", path.display());
            NoteStore::default()
        };
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// A store that is never written anywhere.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn save(&self) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        info!("Store saved to {}", path.display());
        Ok(())
    }

    pub fn insert(&mut self, note: Note) {
        self.notes.insert(note.id, note);
    }

    pub fn get(&self, id: &Uuid) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Note> {
        self.notes.get_mut(id)
    }

    /// Removes a note together with its history.
    pub fn remove(&mut self, id: &Uuid) -> Option<Note> {
        self.versions.retain(|v| v.note_id != *id);
        self.notes.remove(id)
    }

    /// Notes owned by `owner_id`, most recently updated first.
    pub fn notes_for_user(&self, owner_id: u64) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self
            .notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        notes
    }

    pub fn locked_note_ids_for_user(&self, owner_id: u64) -> Vec<Uuid> {
        self.notes_for_user(owner_id)
            .into_iter()
            .filter(|n| n.is_locked)
            .map(|n| n.id)
            .collect()
    }

    pub fn owners_with_locked_notes(&self) -> Vec<u64> {
        self.notes
            .values()
            .filter(|n| n.is_locked)
            .map(|n| n.owner_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn push_version(&mut self, version: NoteVersion) {
        self.versions.push(version);
    }

    /// History of one note, oldest first.
    pub fn versions_for(&self, note_id: &Uuid) -> Vec<&NoteVersion> {
        self.versions.iter().filter(|v| v.note_id == *note_id).collect()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
