mod clock;
mod error;
mod paths;
mod schema;
mod snapshot;
mod store;

pub use clock::{display_timestamp, rfc3339_now};
pub use error::StoreError;
pub use paths::{default_data_root, MESSAGES_SNAPSHOT, NOTES_SNAPSHOT, SUBJECTS_SNAPSHOT};
pub use schema::{Message, Note, NoteMap, Subject, SubjectIcon};
pub use snapshot::{DirSnapshots, MemorySnapshots, SnapshotBackend};
pub use store::{
    last_message_is_user, starter_subjects, AssistantUpdate, ConversationStore, NoteMatches,
};
