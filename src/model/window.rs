use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of one top-level window at enumeration time.
///
/// On KDE `title` carries the KWin caption and `process_name` the resource
/// class; elsewhere they are the window title and owning process (or X11
/// class). The record goes stale as soon as enumeration returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: String,
    pub title: String,
    pub process_name: String,
}

impl WindowRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            process_name: String::new(),
        }
    }

    pub fn with_process(mut self, process_name: impl Into<String>) -> Self {
        self.process_name = process_name.into();
        self
    }

    /// Process or class label, if the driver could determine one.
    pub fn process_label(&self) -> Option<&str> {
        if self.process_name.is_empty() {
            None
        } else {
            Some(&self.process_name)
        }
    }
}

impl fmt::Display for WindowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.process_name.is_empty() {
            write!(f, "\"{}\" [{}]", self.title, self.id)
        } else {
            write!(f, "\"{}\" ({}) [{}]", self.title, self.process_name, self.id)
        }
    }
}
