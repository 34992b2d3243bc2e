//! Lock/unlock workflow over the note store.
//!
//! Per (note, session) a locked note is either awaiting its password or
//! unlocked in the session, which is the case exactly when the [`Session`]
//! holds a live slot for it. Every save snapshots the previous state into the
//! history first and clears the slot afterwards, so the next access to a
//! locked note asks for the password again.
//!
//! Notes owned by someone other than `principal` are reported as
//! [`AppError::NotFound`].

use crate::cipher;
use crate::error::AppError;
use crate::note::{ContentFormat, Note, NoteKind, NoteVersion};
use crate::session::Session;
use crate::store::NoteStore;
use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

/// What the caller may show for a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteView {
    Plain { title: String, content: String },
    Unlocked { title: String, content: String },
    /// Locked and not unlocked in this session. Only the title is available.
    PasswordRequired { title: String },
}

#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub kind: NoteKind,
    /// Locks the note on creation when present.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NoteEdit {
    pub title: String,
    pub content: String,
    pub lock: bool,
    /// Needed when locking a note that is currently unlocked. For a note that is
    /// already locked the password cached in the session is used unless this is set.
    pub password: Option<String>,
}

fn owned_note<'a>(
    store: &'a NoteStore,
    principal: u64,
    note_id: &Uuid,
) -> Result<&'a Note, AppError> {
    match store.get(note_id) {
        Some(note) if note.owner_id == principal => Ok(note),
        Some(_) => {
            warn!("User {principal} attempted to access note {note_id} they do not own");
            Err(AppError::NotFound(*note_id))
        }
        None => Err(AppError::NotFound(*note_id)),
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required.".to_string()));
    }
    Ok(())
}

fn non_empty(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

pub fn create_note(
    store: &mut NoteStore,
    principal: u64,
    new: NewNote,
) -> Result<Uuid, AppError> {
    validate_title(&new.title)?;

    let mut note = Note::new(principal, new.title, new.kind);
    match new.password.as_deref() {
        Some(password) => {
            if note.kind == NoteKind::Canvas {
                return Err(AppError::Validation(
                    "Canvas notes cannot be locked.".to_string(),
                ));
            }
            let password = non_empty(Some(password)).ok_or_else(|| {
                AppError::Validation("Password is required to lock a note.".to_string())
            })?;
            note.content = cipher::encrypt(&new.content, password, principal)?;
            note.is_locked = true;
        }
        None => note.content = new.content,
    }

    let id = note.id;
    info!("Created note {id} (locked: {})", note.is_locked);
    store.insert(note);
    Ok(id)
}

/// Resolves what may be displayed without prompting. Never runs the cipher.
/// Counts as activity on the note's unlock slot.
pub fn open_note(
    store: &NoteStore,
    session: &mut Session,
    principal: u64,
    note_id: &Uuid,
) -> Result<NoteView, AppError> {
    view_note(store, session, principal, note_id, true)
}

/// Same as [`open_note`] without refreshing the idle timer, so an unlocked
/// note that is only being displayed still expires.
pub fn preview_note(
    store: &NoteStore,
    session: &mut Session,
    principal: u64,
    note_id: &Uuid,
) -> Result<NoteView, AppError> {
    view_note(store, session, principal, note_id, false)
}

fn view_note(
    store: &NoteStore,
    session: &mut Session,
    principal: u64,
    note_id: &Uuid,
    touch: bool,
) -> Result<NoteView, AppError> {
    let note = owned_note(store, principal, note_id)?;
    if !note.is_locked {
        return Ok(NoteView::Plain {
            title: note.title.clone(),
            content: note.content.clone(),
        });
    }

    let slot = if touch {
        session.slot(note_id)
    } else {
        session.peek(note_id)
    };
    match slot {
        Some(slot) => Ok(NoteView::Unlocked {
            title: note.title.clone(),
            content: slot.plaintext().to_string(),
        }),
        None => Ok(NoteView::PasswordRequired {
            title: note.title.clone(),
        }),
    }
}

/// Decrypts a locked note with `password` and caches the result in `session`.
///
/// A wrong password leaves the session untouched and yields
/// [`AppError::Authentication`].
pub fn unlock(
    store: &NoteStore,
    session: &mut Session,
    principal: u64,
    note_id: &Uuid,
    password: Option<&str>,
) -> Result<(), AppError> {
    let note = owned_note(store, principal, note_id)?;
    if !note.is_locked {
        return Err(AppError::Validation("This note is not locked.".to_string()));
    }
    let password = non_empty(password)
        .ok_or_else(|| AppError::Validation("Password is required.".to_string()))?;

    match cipher::decrypt(&note.content, password, note.owner_id) {
        Ok(plaintext) => {
            session.store(*note_id, plaintext, password.to_string());
            info!("Unlocked note {note_id}");
            Ok(())
        }
        Err(e) => {
            warn!("Failed unlock attempt for note {note_id}");
            Err(e)
        }
    }
}

/// Writes a new title/content/lock state.
///
/// Saving a note that is currently locked requires it to be unlocked in the
/// session, otherwise [`AppError::SessionExpired`] is returned and nothing is
/// written.
pub fn save_note(
    store: &mut NoteStore,
    session: &mut Session,
    principal: u64,
    note_id: &Uuid,
    edit: NoteEdit,
) -> Result<(), AppError> {
    validate_title(&edit.title)?;
    let note = owned_note(store, principal, note_id)?;

    if edit.lock && note.kind == NoteKind::Canvas {
        return Err(AppError::Validation(
            "Canvas notes cannot be locked.".to_string(),
        ));
    }

    let sealing_password: Option<Zeroizing<String>> = if note.is_locked {
        let slot = session.slot(note_id).ok_or(AppError::SessionExpired)?;
        edit.lock.then(|| {
            let password = non_empty(edit.password.as_deref()).unwrap_or(slot.password());
            Zeroizing::new(password.to_string())
        })
    } else if edit.lock {
        let password = non_empty(edit.password.as_deref()).ok_or_else(|| {
            AppError::Validation("Password is required to lock a note.".to_string())
        })?;
        Some(Zeroizing::new(password.to_string()))
    } else {
        None
    };

    let content = match &sealing_password {
        Some(password) => cipher::encrypt(&edit.content, password, note.owner_id)?,
        None => edit.content,
    };

    let snapshot: NoteVersion = note.snapshot();
    store.push_version(snapshot);

    let note = store.get_mut(note_id).ok_or(AppError::NotFound(*note_id))?;
    note.title = edit.title;
    note.content = content;
    note.is_locked = edit.lock;
    note.format = ContentFormat::ContentOnly;
    note.updated_at = Utc::now();

    session.clear_note(note_id);
    info!("Saved note {note_id} (locked: {})", edit.lock);
    Ok(())
}

/// Re-encrypts new content of a locked note with the password cached by the
/// last unlock, keeping title and lock. Returns the stored token.
pub fn save_locked(
    store: &mut NoteStore,
    session: &mut Session,
    principal: u64,
    note_id: &Uuid,
    new_plaintext: &str,
) -> Result<String, AppError> {
    let note = owned_note(store, principal, note_id)?;
    if !note.is_locked {
        return Err(AppError::Validation("This note is not locked.".to_string()));
    }
    let edit = NoteEdit {
        title: note.title.clone(),
        content: new_plaintext.to_string(),
        lock: true,
        password: None,
    };

    save_note(store, session, principal, note_id, edit)?;
    store
        .get(note_id)
        .map(|n| n.content.clone())
        .ok_or(AppError::NotFound(*note_id))
}

pub fn delete_note(
    store: &mut NoteStore,
    session: &mut Session,
    principal: u64,
    note_id: &Uuid,
) -> Result<Note, AppError> {
    owned_note(store, principal, note_id)?;
    session.clear_note(note_id);
    let note = store.remove(note_id).ok_or(AppError::NotFound(*note_id))?;
    debug!("Deleted note {note_id}");
    Ok(note)
}

/// Saved versions of a note, oldest first.
pub fn note_history(
    store: &NoteStore,
    principal: u64,
    note_id: &Uuid,
) -> Result<Vec<NoteVersion>, AppError> {
    owned_note(store, principal, note_id)?;
    Ok(store.versions_for(note_id).into_iter().cloned().collect())
}
