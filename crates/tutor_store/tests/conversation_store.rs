use std::fs;

use proptest::prelude::*;
use tutor_store::{
    starter_subjects, ConversationStore, DirSnapshots, MemorySnapshots, StoreError, SubjectIcon,
    MESSAGES_SNAPSHOT, NOTES_SNAPSHOT, SUBJECTS_SNAPSHOT,
};

fn store_in_tempdir() -> (tempfile::TempDir, ConversationStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = ConversationStore::open_dir(dir.path()).expect("store should open");
    (dir, store)
}

#[test]
fn first_run_seeds_starter_subjects_and_persists_them() {
    let (dir, store) = store_in_tempdir();

    assert!(store.messages().is_empty());
    assert!(store.notes().is_empty());
    assert_eq!(store.subjects(), starter_subjects().as_slice());
    assert!(dir.path().join(SUBJECTS_SNAPSHOT).exists());
    assert!(!dir.path().join(MESSAGES_SNAPSHOT).exists());
}

#[test]
fn empty_subject_snapshot_is_not_reseeded() {
    let backend = MemorySnapshots::new().with_blob(SUBJECTS_SNAPSHOT, "[]");
    let store = ConversationStore::open(backend.clone());

    assert!(store.subjects().is_empty());
    assert_eq!(backend.write_count(), 0);
}

#[test]
fn corrupt_snapshots_fall_back_to_empty_defaults() {
    let backend = MemorySnapshots::new()
        .with_blob(MESSAGES_SNAPSHOT, "{not json")
        .with_blob(SUBJECTS_SNAPSHOT, "[{\"name\": 3}]")
        .with_blob(NOTES_SNAPSHOT, "[]");
    let store = ConversationStore::open(backend);

    assert!(store.messages().is_empty());
    assert!(store.subjects().is_empty());
    assert!(store.notes().is_empty());
}

#[test]
fn unknown_icon_in_snapshot_reads_as_book_open() {
    let backend = MemorySnapshots::new().with_blob(
        SUBJECTS_SNAPSHOT,
        r#"[{"name": "Art", "icon": "Palette"}, {"name": "Math", "icon": "Brain"}]"#,
    );
    let store = ConversationStore::open(backend);

    assert_eq!(store.subjects()[0].icon, SubjectIcon::BookOpen);
    assert_eq!(store.subjects()[1].icon, SubjectIcon::Brain);
}

#[test]
fn snapshots_round_trip_through_reopen() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let (messages, subjects, notes) = {
        let mut store = ConversationStore::open_dir(dir.path()).expect("store should open");
        store.append_user_message("Explain photosynthesis").expect("user");
        store
            .append_or_extend_assistant_message("Plants turn light")
            .expect("assistant");
        store
            .append_or_extend_assistant_message("Plants turn light into sugar.")
            .expect("assistant");
        store.append_user_message("Thanks").expect("user");
        store.add_subject("History").expect("subject");
        store.set_active_subject("science").expect("select");
        store.save_note("chlorophyll absorbs red and blue").expect("note");
        store.save_note("stomata exchange gases").expect("note");
        (
            store.messages().to_vec(),
            store.subjects().to_vec(),
            store.notes().clone(),
        )
    };

    let reopened = ConversationStore::open_dir(dir.path()).expect("store should reopen");
    assert_eq!(reopened.messages(), messages.as_slice());
    assert_eq!(reopened.subjects(), subjects.as_slice());
    assert_eq!(reopened.notes(), &notes);
    assert_eq!(reopened.notes_for("Science").len(), 2);
    assert_eq!(reopened.active_subject(), None);
}

#[test]
fn snapshots_are_human_readable_json() {
    let (dir, mut store) = store_in_tempdir();
    store.append_user_message("hi").expect("user");

    let raw = fs::read_to_string(dir.path().join(MESSAGES_SNAPSHOT)).expect("snapshot");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(value[0]["text"], "hi");
    assert_eq!(value[0]["isUser"], true);
    assert!(raw.contains('\n'), "snapshot should be pretty-printed");
}

#[test]
fn add_subject_rejects_blank_and_case_insensitive_duplicates() {
    let mut store = ConversationStore::open(MemorySnapshots::new());

    assert!(matches!(
        store.add_subject("   "),
        Err(StoreError::EmptySubjectName)
    ));
    let error = store.add_subject("MATH").expect_err("duplicate");
    assert!(matches!(error, StoreError::DuplicateSubject { ref name } if name == "Math"));

    let added = store.add_subject("  Geography ").expect("new subject");
    assert_eq!(added.name, "Geography");
    assert_eq!(added.icon, SubjectIcon::cycled(3));
    assert_eq!(store.subjects().len(), 4);
}

#[test]
fn deleting_active_subject_cascades_notes_and_clears_selection() {
    let backend = MemorySnapshots::new();
    let mut store = ConversationStore::open(backend.clone());
    store.set_active_subject("Math").expect("select");
    store.save_note("pythagoras").expect("note");
    store.save_note("quadratic formula").expect("note");
    assert_eq!(store.notes_for("Math").len(), 2);

    let removed = store.delete_subject("math").expect("delete");

    assert_eq!(removed.name, "Math");
    assert!(store.notes_for("Math").is_empty());
    assert_eq!(store.active_subject(), None);
    assert!(store.subjects().iter().all(|subject| subject.name != "Math"));

    let reopened = ConversationStore::open(backend);
    assert!(reopened.notes().get("Math").is_none());
    assert_eq!(reopened.subjects().len(), 2);
}

#[test]
fn deleting_other_subject_keeps_active_selection() {
    let mut store = ConversationStore::open(MemorySnapshots::new());
    store.set_active_subject("Science").expect("select");
    store.delete_subject("Literature").expect("delete");
    assert_eq!(store.active_subject(), Some("Science"));

    assert!(matches!(
        store.delete_subject("Literature"),
        Err(StoreError::UnknownSubject { .. })
    ));
}

#[test]
fn failed_notes_write_during_delete_leaves_no_stray_notes_on_disk() {
    let backend = MemorySnapshots::new();
    let mut store = ConversationStore::open(backend.clone());
    store.set_active_subject("Math").expect("select");
    store.save_note("pythagoras").expect("note");
    store.save_note("quadratic formula").expect("note");

    backend.reject_writes_to(NOTES_SNAPSHOT);
    let error = store.delete_subject("Math").expect_err("notes write must fail");
    assert!(error.is_persistence());
    assert!(store.notes_for("Math").is_empty());

    let reopened = ConversationStore::open(backend);
    for key in reopened.notes().keys() {
        assert!(
            reopened.subjects().iter().any(|subject| &subject.name == key),
            "notes for {key} outlived their subject"
        );
    }
    for group in reopened.search_notes("") {
        assert!(reopened
            .subjects()
            .iter()
            .any(|subject| subject.name == group.subject));
    }
}

#[test]
fn notes_for_unregistered_subjects_are_dropped_on_open() {
    let backend = MemorySnapshots::new()
        .with_blob(SUBJECTS_SNAPSHOT, r#"[{"name": "Science", "icon": "Sparkles"}]"#)
        .with_blob(
            NOTES_SNAPSHOT,
            r#"{
                "Math": [{"id": "a", "content": "stray", "timestamp": "a"}],
                "Science": [{"id": "b", "content": "cells", "timestamp": "b"}]
            }"#,
        );
    let store = ConversationStore::open(backend.clone());

    assert!(store.notes().get("Math").is_none());
    assert_eq!(store.notes_for("Science").len(), 1);
    let groups = store.search_notes("");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].subject, "Science");

    let persisted = backend.blob(NOTES_SNAPSHOT).expect("pruned notes written");
    assert!(!persisted.contains("stray"));
    assert!(persisted.contains("cells"));
}

#[test]
fn save_note_requires_active_subject_and_content() {
    let mut store = ConversationStore::open(MemorySnapshots::new());

    assert!(matches!(
        store.save_note("orphan"),
        Err(StoreError::NoActiveSubject)
    ));
    store.set_active_subject("Literature").expect("select");
    assert!(matches!(store.save_note("  "), Err(StoreError::EmptyNote)));

    let note = store.save_note(" metaphor vs simile ").expect("note");
    assert_eq!(note.content, "metaphor vs simile");
    assert!(note.id.starts_with(&note.timestamp));

    store.clear_active_subject();
    assert!(matches!(
        store.save_note("again"),
        Err(StoreError::NoActiveSubject)
    ));
}

#[test]
fn delete_note_removes_only_the_matching_note() {
    let mut store = ConversationStore::open(MemorySnapshots::new());
    store.set_active_subject("Math").expect("select");
    let first = store.save_note("first").expect("note");
    store.save_note("second").expect("note");

    let removed = store.delete_note("math", &first.id).expect("delete");
    assert_eq!(removed.content, "first");
    assert_eq!(store.notes_for("Math").len(), 1);
    assert_eq!(store.notes_for("Math")[0].content, "second");

    let error = store.delete_note("Math", &first.id).expect_err("already gone");
    assert!(matches!(error, StoreError::UnknownNote { ref subject, .. } if subject == "Math"));
}

#[test]
fn search_notes_groups_matches_by_subject_order() {
    let mut store = ConversationStore::open(MemorySnapshots::new());
    store.set_active_subject("Science").expect("select");
    store.save_note("Cell membrane").expect("note");
    store.save_note("Mitochondria").expect("note");
    store.set_active_subject("Math").expect("select");
    store.save_note("cellular automata").expect("note");

    let matches = store.search_notes("CELL");
    let subjects = matches
        .iter()
        .map(|group| group.subject.as_str())
        .collect::<Vec<_>>();
    assert_eq!(subjects, vec!["Math", "Science"]);
    assert_eq!(matches[1].notes.len(), 1);
    assert_eq!(matches[1].notes[0].content, "Cell membrane");

    let everything = store.search_notes("");
    let total = everything.iter().map(|group| group.notes.len()).sum::<usize>();
    assert_eq!(total, 3);

    assert!(store.search_notes("zebra").is_empty());
}

#[test]
fn clear_conversation_rewrites_empty_log() {
    let backend = MemorySnapshots::new();
    let mut store = ConversationStore::open(backend.clone());
    store.append_user_message("hello").expect("user");
    store.clear_conversation().expect("clear");

    assert!(store.messages().is_empty());
    assert_eq!(backend.blob(MESSAGES_SNAPSHOT).as_deref(), Some("[]"));
}

#[test]
fn unwritable_data_root_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blocker = dir.path().join("file");
    fs::write(&blocker, "x").expect("blocker file");

    let error = DirSnapshots::new(blocker.join("data")).expect_err("cannot nest under a file");
    assert!(matches!(error, StoreError::Io { .. }));
}

#[derive(Debug, Clone)]
enum Step {
    User(String),
    Assistant(String),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Step::User),
        "[a-z]{0,6}".prop_map(Step::Assistant),
    ]
}

proptest! {
    #[test]
    fn log_never_holds_consecutive_assistant_messages(steps in prop::collection::vec(step(), 0..40)) {
        let mut store = ConversationStore::open(MemorySnapshots::new());
        for step in steps {
            match step {
                Step::User(text) => store.append_user_message(text).expect("user"),
                Step::Assistant(text) => {
                    store.append_or_extend_assistant_message(text).expect("assistant");
                }
            }
        }

        let consecutive = store
            .messages()
            .windows(2)
            .any(|pair| !pair[0].is_user && !pair[1].is_user);
        prop_assert!(!consecutive);
    }
}
