use std::path::PathBuf;

pub const MESSAGES_SNAPSHOT: &str = "messages.json";
pub const SUBJECTS_SNAPSHOT: &str = "subjects.json";
pub const NOTES_SNAPSHOT: &str = "notes.json";

const APP_DIR: &str = "tutor";

/// Platform data directory for snapshots, falling back to `./.tutor`.
#[must_use]
pub fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{APP_DIR}")))
}
