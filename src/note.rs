use crate::cipher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    #[default]
    Markdown,
    /// Drawing canvas. Never lockable.
    Canvas,
}

/// Which encryption layout a stored note uses.
///
/// Notes written before the marker existed deserialize as `Unmarked` and can
/// only be classified by inspecting their title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    #[default]
    Unmarked,
    /// Title in clear, content sealed when locked.
    ContentOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: u64,
    pub title: String,
    /// Plaintext when unlocked, a cipher token when locked.
    pub content: String,
    pub is_locked: bool,
    #[serde(default)]
    pub kind: NoteKind,
    /// Reserved for client-side encryption. Server-side keys salt with `owner_id`.
    #[serde(default)]
    pub salt: String,
    #[serde(default)]
    pub format: ContentFormat,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new<S: Into<String>>(owner_id: u64, title: S, kind: NoteKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            content: String::new(),
            is_locked: false,
            kind,
            salt: String::new(),
            format: ContentFormat::ContentOnly,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot of the current title, content and flags.
    pub fn snapshot(&self) -> NoteVersion {
        NoteVersion {
            note_id: self.id,
            title: self.title.clone(),
            content: self.content.clone(),
            is_locked: self.is_locked,
            format: self.format,
            created_at: Utc::now(),
        }
    }
}

/// Immutable copy of a note taken right before it was overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteVersion {
    pub note_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_locked: bool,
    #[serde(default)]
    pub format: ContentFormat,
    pub created_at: DateTime<Utc>,
}

impl NoteVersion {
    /// Title safe to print. Snapshots taken before migration may still hold a
    /// sealed title, shown as `[sealed]`.
    pub fn display_title(&self) -> &str {
        if self.format == ContentFormat::Unmarked && cipher::looks_like_ciphertext(&self.title) {
            "[sealed]"
        } else {
            &self.title
        }
    }
}
