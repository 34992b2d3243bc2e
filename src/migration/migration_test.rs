#![cfg(test)]

use super::*;
use crate::note::NoteKind;
use crate::session::Session;
use crate::workflow::{self, NewNote};

const USER: u64 = 7;
const PASSWORD: &str = "legacy-pass";

/// A note written by the old scheme: title and content both sealed, no format marker.
fn legacy_note(store: &mut NoteStore, title: &str, content: &str) -> Result<Uuid, AppError> {
    let mut note = Note::new(USER, cipher::encrypt(title, PASSWORD, USER)?, NoteKind::Markdown);
    note.content = cipher::encrypt(content, PASSWORD, USER)?;
    note.is_locked = true;
    note.format = ContentFormat::Unmarked;
    let id = note.id;
    store.insert(note);
    Ok(id)
}

fn current_note(store: &mut NoteStore, title: &str, content: &str) -> Result<Uuid, AppError> {
    workflow::create_note(
        store,
        USER,
        NewNote {
            title: title.to_string(),
            content: content.to_string(),
            password: Some(PASSWORD.to_string()),
            ..NewNote::default()
        },
    )
}

#[test]
fn test_migrates_legacy_notes() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    let first = legacy_note(&mut store, "Bank PINs", "1234")?;
    let second = legacy_note(&mut store, "Diary", "Dear diary, 日本")?;

    let report = migrate_user_notes(&mut store, USER, PASSWORD, false)?;
    assert_eq!(report.migrated(), 2);
    assert_eq!(report.failed(), 0);

    let expected = [
        (first, "Bank PINs", "1234"),
        (second, "Diary", "Dear diary, 日本"),
    ];
    for (id, title, body) in expected {
        let note = store.get(&id).ok_or(AppError::NotFound(id))?;
        assert_eq!(note.title, title);
        assert_eq!(note.format, ContentFormat::ContentOnly);
        assert!(cipher::looks_like_ciphertext(&note.content));
        assert_eq!(cipher::decrypt(&note.content, PASSWORD, USER)?, body);
    }
    Ok(())
}

#[test]
fn test_migrated_notes_open_through_workflow() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    let mut session = Session::new();
    let id = legacy_note(&mut store, "Old", "still readable")?;
    migrate_user_notes(&mut store, USER, PASSWORD, false)?;

    workflow::unlock(&store, &mut session, USER, &id, Some(PASSWORD))?;
    assert_eq!(
        workflow::open_note(&store, &mut session, USER, &id)?,
        workflow::NoteView::Unlocked {
            title: "Old".to_string(),
            content: "still readable".to_string(),
        }
    );
    Ok(())
}

#[test]
fn test_current_format_notes_are_skipped() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    let id = current_note(&mut store, "Fresh", "new style")?;
    let before = store.get(&id).map(|n| n.content.clone());

    let report = migrate_user_notes(&mut store, USER, PASSWORD, false)?;
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.migrated(), 0);
    assert_eq!(store.get(&id).map(|n| n.content.clone()), before);
    Ok(())
}

#[test]
fn test_unmarked_plain_title_is_skipped_by_heuristic() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    let id = current_note(&mut store, "Shopping list", "eggs")?;
    if let Some(note) = store.get_mut(&id) {
        note.format = ContentFormat::Unmarked;
    }

    let report = migrate_user_notes(&mut store, USER, PASSWORD, false)?;
    assert_eq!(report.notes[0].outcome, MigrationOutcome::AlreadyMigrated);
    Ok(())
}

#[test]
fn test_rerun_is_idempotent() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    legacy_note(&mut store, "Once", "only once")?;

    assert_eq!(migrate_user_notes(&mut store, USER, PASSWORD, false)?.migrated(), 1);
    let second = migrate_user_notes(&mut store, USER, PASSWORD, false)?;
    assert_eq!(second.migrated(), 0);
    assert_eq!(second.skipped(), 1);
    Ok(())
}

#[test]
fn test_wrong_password_fails_everything_and_writes_nothing() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    let ids = [
        legacy_note(&mut store, "One", "a")?,
        legacy_note(&mut store, "Two", "b")?,
        legacy_note(&mut store, "Three", "c")?,
    ];
    let before: Vec<_> = ids
        .iter()
        .filter_map(|id| store.get(id).map(|n| (n.title.clone(), n.content.clone())))
        .collect();

    let report = migrate_user_notes(&mut store, USER, "not-the-password", false)?;
    assert_eq!(report.failed(), 3);
    assert!(
        report
            .notes
            .iter()
            .all(|n| n.outcome == MigrationOutcome::Failed(FailureReason::Decryption))
    );

    let after: Vec<_> = ids
        .iter()
        .filter_map(|id| store.get(id).map(|n| (n.title.clone(), n.content.clone())))
        .collect();
    assert_eq!(before, after);
    Ok(())
}

#[test]
fn test_dry_run_reports_without_writing() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    let id = legacy_note(&mut store, "Plans", "world domination")?;
    let before = store.get(&id).map(|n| n.title.clone());

    let report = migrate_user_notes(&mut store, USER, PASSWORD, true)?;
    assert_eq!(report.migrated(), 1);
    assert_eq!(
        report.notes[0].outcome,
        MigrationOutcome::WouldMigrate {
            title: "Plans".to_string()
        }
    );
    assert_eq!(store.get(&id).map(|n| n.title.clone()), before);
    assert_eq!(store.get(&id).map(|n| n.format), Some(ContentFormat::Unmarked));
    Ok(())
}

#[test]
fn test_ambiguous_note_fails_and_batch_continues() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    let ambiguous = legacy_note(&mut store, "Half", "ignored")?;
    if let Some(note) = store.get_mut(&ambiguous) {
        note.content = "plain text body".to_string();
    }
    let good = legacy_note(&mut store, "Whole", "fine")?;

    let report = migrate_user_notes(&mut store, USER, PASSWORD, false)?;
    let outcome_of = |id: Uuid| {
        report
            .notes
            .iter()
            .find(|n| n.note_id == id)
            .map(|n| n.outcome.clone())
    };
    assert_eq!(
        outcome_of(ambiguous),
        Some(MigrationOutcome::Failed(FailureReason::AmbiguousFormat))
    );
    assert_eq!(
        outcome_of(good),
        Some(MigrationOutcome::Migrated {
            title: "Whole".to_string()
        })
    );
    Ok(())
}

#[test]
fn test_other_users_notes_are_untouched() -> Result<(), AppError> {
    let mut store = NoteStore::in_memory();
    legacy_note(&mut store, "Mine", "body")?;

    let report = migrate_user_notes(&mut store, USER + 1, PASSWORD, false)?;
    assert!(report.notes.is_empty());
    Ok(())
}
