use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{display_timestamp, rfc3339_now};
use crate::error::StoreError;
use crate::paths::{MESSAGES_SNAPSHOT, NOTES_SNAPSHOT, SUBJECTS_SNAPSHOT};
use crate::schema::{Message, Note, NoteMap, Subject, SubjectIcon};
use crate::snapshot::{DirSnapshots, SnapshotBackend};

/// Outcome of [`ConversationStore::append_or_extend_assistant_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantUpdate {
    Appended,
    Extended,
}

/// Notes of one subject that matched a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMatches {
    pub subject: String,
    pub notes: Vec<Note>,
}

/// True when the trailing logged turn is a learner message.
///
/// An assistant reply may only start a new message right after a learner
/// turn; otherwise it extends the trailing assistant message. An empty log
/// has no trailing turn and answers `false`.
#[must_use]
pub fn last_message_is_user(log: &[Message]) -> bool {
    log.last().is_some_and(|message| message.is_user)
}

/// Subjects seeded on first run.
#[must_use]
pub fn starter_subjects() -> Vec<Subject> {
    vec![
        Subject::new("Math", SubjectIcon::Brain),
        Subject::new("Science", SubjectIcon::Sparkles),
        Subject::new("Literature", SubjectIcon::BookOpen),
    ]
}

/// Owner of the conversation log, subject registry and note collection.
///
/// Every mutation lands in memory first and is then followed by a full
/// snapshot write of the collection it touched. A failed write is returned
/// to the caller but the in-memory change stands.
pub struct ConversationStore {
    backend: Box<dyn SnapshotBackend>,
    messages: Vec<Message>,
    subjects: Vec<Subject>,
    notes: NoteMap,
    active_subject: Option<String>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("messages", &self.messages.len())
            .field("subjects", &self.subjects)
            .field("notes", &self.notes.len())
            .field("active_subject", &self.active_subject)
            .finish_non_exhaustive()
    }
}

impl ConversationStore {
    /// Open snapshots stored under `root`, creating the directory if needed.
    pub fn open_dir(root: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::open(DirSnapshots::new(root)?))
    }

    /// Load all three snapshots. Missing or unreadable ones fall back to
    /// empty defaults; starter subjects are seeded when no subject snapshot
    /// exists yet.
    pub fn open(backend: impl SnapshotBackend + 'static) -> Self {
        let backend: Box<dyn SnapshotBackend> = Box::new(backend);

        let messages = load_snapshot::<Vec<Message>>(backend.as_ref(), MESSAGES_SNAPSHOT)
            .unwrap_or_default();
        let mut notes =
            load_snapshot::<NoteMap>(backend.as_ref(), NOTES_SNAPSHOT).unwrap_or_default();
        let (subjects, seeded) =
            match load_snapshot::<Vec<Subject>>(backend.as_ref(), SUBJECTS_SNAPSHOT) {
                Snapshot::Missing => (starter_subjects(), true),
                loaded => (loaded.unwrap_or_default(), false),
            };

        let before = notes.len();
        notes.retain(|key, _| subjects.iter().any(|subject| subject.name == *key));
        let pruned = before - notes.len();

        let mut store = Self {
            backend,
            messages,
            subjects,
            notes,
            active_subject: None,
        };

        if seeded {
            if let Err(error) = store.persist_subjects() {
                tracing::warn!(%error, "failed to persist starter subjects");
            }
        }
        if pruned > 0 {
            tracing::warn!(pruned, "dropped notes filed under unknown subjects");
            if let Err(error) = store.persist_notes() {
                tracing::warn!(%error, "failed to persist pruned notes");
            }
        }

        tracing::debug!(
            messages = store.messages.len(),
            subjects = store.subjects.len(),
            note_subjects = store.notes.len(),
            "conversation store opened"
        );
        store
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    #[must_use]
    pub fn notes(&self) -> &NoteMap {
        &self.notes
    }

    #[must_use]
    pub fn notes_for(&self, subject: &str) -> &[Note] {
        self.notes.get(subject).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn active_subject(&self) -> Option<&str> {
        self.active_subject.as_deref()
    }

    #[must_use]
    pub fn last_message_is_user(&self) -> bool {
        last_message_is_user(&self.messages)
    }

    pub fn append_user_message(&mut self, text: impl Into<String>) -> Result<(), StoreError> {
        self.messages.push(Message::user(text, display_timestamp()));
        self.persist_messages()
    }

    /// Publish the current reply buffer.
    ///
    /// Appends a new assistant message unless the trailing message already
    /// is one, in which case its text is replaced by `text`. The timestamp
    /// of an extended message is left untouched.
    pub fn append_or_extend_assistant_message(
        &mut self,
        text: impl Into<String>,
    ) -> Result<AssistantUpdate, StoreError> {
        let text = text.into();
        let update = match self.messages.last_mut() {
            Some(last) if !last.is_user => {
                last.text = text;
                AssistantUpdate::Extended
            }
            _ => {
                self.messages.push(Message::assistant(text, display_timestamp()));
                AssistantUpdate::Appended
            }
        };
        self.persist_messages()?;
        Ok(update)
    }

    pub fn clear_conversation(&mut self) -> Result<(), StoreError> {
        self.messages.clear();
        self.persist_messages()
    }

    fn find_subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|subject| subject.matches_name(name))
    }

    pub fn add_subject(&mut self, name: &str) -> Result<Subject, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptySubjectName);
        }
        if let Some(existing) = self.find_subject(name) {
            return Err(StoreError::DuplicateSubject {
                name: existing.name.clone(),
            });
        }

        let subject = Subject::new(name, SubjectIcon::cycled(self.subjects.len()));
        self.subjects.push(subject.clone());
        self.persist_subjects()?;
        Ok(subject)
    }

    /// Remove a subject together with all of its notes. Clears the active
    /// selection when it pointed at the removed subject.
    ///
    /// Notes are written before the registry so a failed second write never
    /// leaves notes on disk for a subject that is gone.
    pub fn delete_subject(&mut self, name: &str) -> Result<Subject, StoreError> {
        let index = self
            .subjects
            .iter()
            .position(|subject| subject.matches_name(name))
            .ok_or_else(|| StoreError::UnknownSubject {
                name: name.trim().to_owned(),
            })?;
        let removed = self.subjects.remove(index);
        let had_notes = self.notes.remove(&removed.name).is_some();

        if self.active_subject.as_deref() == Some(removed.name.as_str()) {
            self.active_subject = None;
        }

        if had_notes {
            self.persist_notes()?;
        }
        self.persist_subjects()?;
        Ok(removed)
    }

    /// Select the subject new notes are filed under. Not persisted.
    pub fn set_active_subject(&mut self, name: &str) -> Result<&Subject, StoreError> {
        let index = self
            .subjects
            .iter()
            .position(|subject| subject.matches_name(name))
            .ok_or_else(|| StoreError::UnknownSubject {
                name: name.trim().to_owned(),
            })?;
        let subject = &self.subjects[index];
        self.active_subject = Some(subject.name.clone());
        Ok(subject)
    }

    pub fn clear_active_subject(&mut self) {
        self.active_subject = None;
    }

    /// File a note under the active subject.
    pub fn save_note(&mut self, content: &str) -> Result<Note, StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(StoreError::EmptyNote);
        }
        let subject = self
            .active_subject
            .clone()
            .ok_or(StoreError::NoActiveSubject)?;

        let created = rfc3339_now();
        let notes = self.notes.entry(subject).or_default();
        let mut id = created.clone();
        let mut suffix = 1;
        while notes.iter().any(|note| note.id == id) {
            id = format!("{created}-{suffix}");
            suffix += 1;
        }

        let note = Note {
            id,
            content: content.to_owned(),
            timestamp: created,
        };
        notes.push(note.clone());
        self.persist_notes()?;
        Ok(note)
    }

    pub fn delete_note(&mut self, subject: &str, id: &str) -> Result<Note, StoreError> {
        let key = self
            .find_subject(subject)
            .map(|found| found.name.clone())
            .unwrap_or_else(|| subject.trim().to_owned());
        let unknown = || StoreError::UnknownNote {
            subject: key.clone(),
            id: id.to_owned(),
        };

        let notes = self.notes.get_mut(&key).ok_or_else(unknown)?;
        let index = notes
            .iter()
            .position(|note| note.id == id)
            .ok_or_else(unknown)?;
        let removed = notes.remove(index);
        if notes.is_empty() {
            self.notes.remove(&key);
        }

        self.persist_notes()?;
        Ok(removed)
    }

    /// Case-insensitive substring search over note content, grouped by
    /// subject in registry order. Subjects without matches are omitted.
    #[must_use]
    pub fn search_notes(&self, query: &str) -> Vec<NoteMatches> {
        let needle = query.trim().to_lowercase();

        self.subjects
            .iter()
            .map(|subject| subject.name.as_str())
            .filter_map(|subject| {
                let notes = self
                    .notes_for(subject)
                    .iter()
                    .filter(|note| {
                        needle.is_empty() || note.content.to_lowercase().contains(&needle)
                    })
                    .cloned()
                    .collect::<Vec<_>>();
                (!notes.is_empty()).then(|| NoteMatches {
                    subject: subject.to_owned(),
                    notes,
                })
            })
            .collect()
    }

    fn persist_messages(&mut self) -> Result<(), StoreError> {
        write_snapshot(self.backend.as_mut(), MESSAGES_SNAPSHOT, &self.messages)
    }

    fn persist_subjects(&mut self) -> Result<(), StoreError> {
        write_snapshot(self.backend.as_mut(), SUBJECTS_SNAPSHOT, &self.subjects)
    }

    fn persist_notes(&mut self) -> Result<(), StoreError> {
        write_snapshot(self.backend.as_mut(), NOTES_SNAPSHOT, &self.notes)
    }
}

enum Snapshot<T> {
    Missing,
    Unusable,
    Loaded(T),
}

impl<T: Default> Snapshot<T> {
    fn unwrap_or_default(self) -> T {
        match self {
            Self::Loaded(value) => value,
            Self::Missing | Self::Unusable => T::default(),
        }
    }
}

fn load_snapshot<T: DeserializeOwned>(
    backend: &dyn SnapshotBackend,
    name: &'static str,
) -> Snapshot<T> {
    let contents = match backend.read(name) {
        Ok(Some(contents)) => contents,
        Ok(None) => return Snapshot::Missing,
        Err(error) => {
            tracing::warn!(snapshot = name, %error, "snapshot unreadable; using empty default");
            return Snapshot::Unusable;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => Snapshot::Loaded(value),
        Err(error) => {
            tracing::warn!(snapshot = name, %error, "snapshot corrupt; using empty default");
            Snapshot::Unusable
        }
    }
}

fn write_snapshot<T: Serialize + ?Sized>(
    backend: &mut dyn SnapshotBackend,
    name: &'static str,
    value: &T,
) -> Result<(), StoreError> {
    let contents = serde_json::to_string_pretty(value)
        .map_err(|source| StoreError::json_serialize(name, source))?;
    backend.write(name, &contents)
}
