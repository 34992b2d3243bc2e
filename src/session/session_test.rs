#![cfg(test)]

use super::*;
use std::thread;

#[test]
fn test_store_and_read_slot() {
    let mut session = Session::new();
    let note_id = Uuid::new_v4();

    assert!(!session.is_unlocked(&note_id));
    assert!(session.slot(&note_id).is_none());

    session.store(note_id, "secret body".to_string(), "pw".to_string());
    assert!(session.is_unlocked(&note_id));

    let slot = session
        .slot(&note_id)
        .map(|s| (s.plaintext().to_string(), s.password().to_string()));
    assert_eq!(slot, Some(("secret body".to_string(), "pw".to_string())));
}

#[test]
fn test_idle_timeout_expires_slot() {
    let mut session = Session::with_timeout(Duration::from_millis(50));
    let note_id = Uuid::new_v4();
    session.store(note_id, "body".to_string(), "pw".to_string());
    assert!(session.is_unlocked(&note_id));

    thread::sleep(Duration::from_millis(100));

    assert!(!session.is_unlocked(&note_id));
    assert!(session.slot(&note_id).is_none());
}

#[test]
fn test_slot_refreshes_idle_timer() {
    let mut session = Session::with_timeout(Duration::from_millis(150));
    let note_id = Uuid::new_v4();
    session.store(note_id, "body".to_string(), "pw".to_string());

    for _ in 0..4 {
        thread::sleep(Duration::from_millis(60));
        assert!(session.slot(&note_id).is_some());
    }
}

#[test]
fn test_peek_does_not_refresh_idle_timer() {
    let mut session = Session::with_timeout(Duration::from_millis(150));
    let note_id = Uuid::new_v4();
    session.store(note_id, "body".to_string(), "pw".to_string());

    assert_eq!(session.peek(&note_id).map(|s| s.plaintext()), Some("body"));
    for _ in 0..5 {
        thread::sleep(Duration::from_millis(60));
        session.peek(&note_id);
    }

    assert!(session.peek(&note_id).is_none());
    assert!(!session.is_unlocked(&note_id));
}

#[test]
fn test_clear_forgets_everything() {
    let mut session = Session::new();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    session.store(first, "a".to_string(), "pw".to_string());
    session.store(second, "b".to_string(), "pw".to_string());

    session.clear_note(&first);
    assert!(!session.is_unlocked(&first));
    assert!(session.is_unlocked(&second));

    session.clear();
    assert!(!session.is_unlocked(&second));
}

#[test]
fn test_debug_output_hides_contents() {
    let mut session = Session::new();
    session.store(Uuid::new_v4(), "do not print".to_string(), "hunter2".to_string());
    let rendered = format!("{session:?}");
    assert!(!rendered.contains("do not print"));
    assert!(!rendered.contains("hunter2"));
}
