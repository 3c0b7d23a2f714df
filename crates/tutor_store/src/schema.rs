use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One conversational turn as persisted in the messages snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(rename = "isUser")]
    pub is_user: bool,
    pub timestamp: String,
}

impl Message {
    #[must_use]
    pub fn user(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            timestamp: timestamp.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            timestamp: timestamp.into(),
        }
    }
}

/// Display icon of a subject. Names outside the fixed set decode as `BookOpen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectIcon {
    Brain,
    Sparkles,
    #[serde(other)]
    BookOpen,
}

impl SubjectIcon {
    pub const ALL: [SubjectIcon; 3] = [Self::Brain, Self::Sparkles, Self::BookOpen];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brain => "Brain",
            Self::Sparkles => "Sparkles",
            Self::BookOpen => "BookOpen",
        }
    }

    /// Icon for the `index`-th subject added, cycling through the set.
    #[must_use]
    pub fn cycled(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub icon: SubjectIcon,
}

impl Subject {
    #[must_use]
    pub fn new(name: impl Into<String>, icon: SubjectIcon) -> Self {
        Self {
            name: name.into(),
            icon,
        }
    }

    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub content: String,
    pub timestamp: String,
}

/// Notes keyed by the owning subject's name, in creation order per subject.
pub type NoteMap = BTreeMap<String, Vec<Note>>;
