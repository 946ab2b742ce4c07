// entry.rs: Directory entries as seen by listing and tree operations.

use std::fmt;
use std::fs;
use std::path::Path;

/// Whether an entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// Classify the entry at `path`, following symlinks.
    ///
    /// Anything that is not a directory (including broken links) counts as a file.
    pub fn of(path: &Path) -> Self {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => EntryKind::Directory,
            _ => EntryKind::File,
        }
    }

    /// The marker used in listings: `[F]` or `[D]`.
    pub fn marker(self) -> &'static str {
        match self {
            EntryKind::File => "[F]",
            EntryKind::Directory => "[D]",
        }
    }
}

/// One child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Bare entry name (no directory part).
    pub name: String,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.marker(), self.name)
    }
}
