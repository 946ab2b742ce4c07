// walk.rs: Deterministic recursive directory walk.
//
// Used by both search and tree rendering. Entries at each level are visited
// in name order, a directory's children before its next sibling. Every
// directory is entered through its canonical path, and each canonical path is
// entered at most once, which keeps symlink loops from recursing forever.
// Symlinked directories whose target is outside the root are reported but
// never entered.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::entry::{DirectoryEntry, EntryKind};
use crate::error::StoreError;

/// Read the immediate children of `dir`, sorted by name.
pub fn read_sorted(dir: &Path) -> Result<Vec<DirectoryEntry>, StoreError> {
    Ok(read_children(dir)?
        .into_iter()
        .map(|(entry, _path)| entry)
        .collect())
}

/// Children of `dir` with their on-disk paths, sorted by raw file name.
///
/// The entry name is only for display and may be lossy; anything that goes
/// back to the filesystem uses the path.
fn read_children(dir: &Path) -> Result<Vec<(DirectoryEntry, PathBuf)>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|source| StoreError::io(dir, source))?;

    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::io(dir, source))?;
        children.push((entry.file_name(), entry.path()));
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(children
        .into_iter()
        .map(|(file_name, path)| {
            let entry = DirectoryEntry {
                name: file_name.to_string_lossy().into_owned(),
                kind: EntryKind::of(&path),
            };
            (entry, path)
        })
        .collect())
}

/// Join a root-relative prefix and a name with `/`.
fn join_relative(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Render `path` relative to `root` with `/` separators.
pub fn relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

/// A single depth-first walk below one start directory.
pub struct Walker<'r> {
    root: &'r Path,
    visited: HashSet<PathBuf>,
}

impl<'r> Walker<'r> {
    pub fn new(root: &'r Path) -> Self {
        Self {
            root,
            visited: HashSet::new(),
        }
    }

    /// Walk everything below `start` (which must be a resolved directory).
    ///
    /// `visit` receives the depth below `start` (0 for direct children), the
    /// entry and its root-relative path.
    pub fn walk<F>(&mut self, start: &Path, visit: &mut F) -> Result<(), StoreError>
    where
        F: FnMut(usize, &DirectoryEntry, &str),
    {
        let prefix = relative_to(self.root, start);
        self.visited.insert(start.to_path_buf());
        self.walk_dir(start, &prefix, 0, visit)
    }

    fn walk_dir<F>(
        &mut self,
        dir: &Path,
        prefix: &str,
        depth: usize,
        visit: &mut F,
    ) -> Result<(), StoreError>
    where
        F: FnMut(usize, &DirectoryEntry, &str),
    {
        for (entry, path) in read_children(dir)? {
            let relative = join_relative(prefix, &entry.name);
            visit(depth, &entry, &relative);

            if entry.is_dir() {
                if let Some(real) = self.enter(&path) {
                    self.walk_dir(&real, &relative, depth + 1, visit)?;
                }
            }
        }
        Ok(())
    }

    /// Decide whether to descend into `path`; returns its canonical form if so.
    fn enter(&mut self, path: &Path) -> Option<PathBuf> {
        let real = fs::canonicalize(path).ok()?;
        if !real.starts_with(self.root) {
            debug!(path = %path.display(), "not descending into link outside root");
            return None;
        }
        if !self.visited.insert(real.clone()) {
            debug!(path = %path.display(), "directory already visited");
            return None;
        }
        Some(real)
    }
}
