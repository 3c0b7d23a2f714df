use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {snapshot} snapshot: {source}")]
    JsonSerialize {
        snapshot: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot write to {snapshot} rejected by backend")]
    WriteRejected { snapshot: &'static str },

    #[error("subject name must not be blank")]
    EmptySubjectName,

    #[error("a subject named '{name}' already exists")]
    DuplicateSubject { name: String },

    #[error("no subject named '{name}'")]
    UnknownSubject { name: String },

    #[error("note content must not be blank")]
    EmptyNote,

    #[error("no active subject selected")]
    NoActiveSubject,

    #[error("no note '{id}' under subject '{subject}'")]
    UnknownNote { subject: String, id: String },
}

impl StoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(snapshot: &'static str, source: serde_json::Error) -> Self {
        Self::JsonSerialize { snapshot, source }
    }

    /// True for failures of the persistence boundary rather than of the request.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::JsonSerialize { .. } | Self::WriteRejected { .. }
        )
    }
}
