// store.rs: SandboxedFileStore: every filesystem operation, confined to a root.
//
// Each public method resolves its caller-supplied path(s) through
// `resolve::confine` first; nothing touches the filesystem with an
// unresolved path. The store keeps no state besides the canonical root,
// so one instance can be shared across threads.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::entry::DirectoryEntry;
use crate::error::StoreError;
use crate::pattern::SearchFilter;
use crate::resolve;
use crate::walk::{self, Walker};

/// Indentation added per nesting level in `directory_tree` output.
pub const TREE_INDENT: &str = "   ";

/// Filesystem access confined to a single root directory.
#[derive(Debug, Clone)]
pub struct SandboxedFileStore {
    root: PathBuf,
}

impl SandboxedFileStore {
    /// Open a store rooted at `root`.
    ///
    /// The root is canonicalized once here and never changes. It must exist
    /// and be a directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref();
        let root = fs::canonicalize(root).map_err(|source| StoreError::io(root, source))?;
        if !root.is_dir() {
            return Err(StoreError::NotADirectory { path: root });
        }
        info!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller path to a real path under the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        resolve::confine(&self.root, relative)
    }

    /// Read a whole file as UTF-8 text.
    pub fn read_file(&self, path: &str) -> Result<String, StoreError> {
        let full_path = self.resolve(path)?;
        debug!(path = %full_path.display(), "read_file");

        if !full_path.is_file() {
            return Err(StoreError::NotFound { path: full_path });
        }

        let bytes = fs::read(&full_path).map_err(|source| StoreError::io(&full_path, source))?;
        String::from_utf8(bytes).map_err(|_| StoreError::InvalidUtf8 { path: full_path })
    }

    /// Read several files. A failure for one path never affects the others;
    /// results come back in input order.
    pub fn read_multiple<S: AsRef<str>>(
        &self,
        paths: &[S],
    ) -> Vec<(String, Result<String, StoreError>)> {
        paths
            .iter()
            .map(|p| {
                let p = p.as_ref();
                (p.to_string(), self.read_file(p))
            })
            .collect()
    }

    /// Create or fully overwrite a file, creating missing parent directories.
    pub fn write_file(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let full_path = self.resolve(path)?;
        debug!(path = %full_path.display(), "write_file");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&full_path, content).map_err(|source| StoreError::Io {
            path: full_path.clone(),
            source,
        })?;

        info!(path = %full_path.display(), bytes = content.len(), "wrote file");
        Ok(())
    }

    /// Create a directory and any missing parents. Succeeds if it already exists.
    pub fn create_directory(&self, path: &str) -> Result<(), StoreError> {
        let full_path = self.resolve(path)?;
        debug!(path = %full_path.display(), "create_directory");

        if full_path.exists() && !full_path.is_dir() {
            return Err(StoreError::Io {
                path: full_path,
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "a non-directory entry occupies this path",
                ),
            });
        }

        fs::create_dir_all(&full_path).map_err(|source| StoreError::Io {
            path: full_path.clone(),
            source,
        })?;

        info!(path = %full_path.display(), "ensured directory");
        Ok(())
    }

    /// List the immediate children of a directory, sorted by name.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>, StoreError> {
        let full_path = self.resolve_dir(path)?;
        debug!(path = %full_path.display(), "list_directory");
        walk::read_sorted(&full_path)
    }

    /// Move a file or directory. Never overwrites an existing destination.
    pub fn move_file(&self, source: &str, destination: &str) -> Result<(), StoreError> {
        let src_path = self.resolve(source)?;
        let dst_path = self.resolve(destination)?;
        debug!(
            from = %src_path.display(),
            to = %dst_path.display(),
            "move_file"
        );

        if fs::symlink_metadata(&src_path).is_err() {
            return Err(StoreError::NotFound { path: src_path });
        }
        if fs::symlink_metadata(&dst_path).is_ok() {
            return Err(StoreError::AlreadyExists { path: dst_path });
        }

        if let Some(parent) = dst_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        crate::relocate::relocate(&src_path, &dst_path)?;

        info!(
            from = %src_path.display(),
            to = %dst_path.display(),
            "moved entry"
        );
        Ok(())
    }

    /// Find every entry below `path` whose name matches `pattern`
    /// (case-insensitive) and whose root-relative path matches none of
    /// `exclude` (case-sensitive).
    pub fn search_files<S: AsRef<str>>(
        &self,
        path: &str,
        pattern: &str,
        exclude: &[S],
    ) -> Result<Vec<String>, StoreError> {
        let start = self.resolve_dir(path)?;
        let filter = SearchFilter::new(pattern, exclude)?;
        debug!(path = %start.display(), pattern, "search_files");

        let mut matches = Vec::new();
        Walker::new(&self.root).walk(&start, &mut |_depth, entry, relative| {
            if filter.accepts(&entry.name, relative) {
                matches.push(relative.to_string());
            }
        })?;

        debug!(count = matches.len(), "search complete");
        Ok(matches)
    }

    /// Render everything below `path` as an indented `[D]`/`[F]` tree.
    pub fn directory_tree(&self, path: &str) -> Result<String, StoreError> {
        let start = self.resolve_dir(path)?;
        debug!(path = %start.display(), "directory_tree");

        let mut lines = Vec::new();
        Walker::new(&self.root).walk(&start, &mut |depth, entry, _relative| {
            lines.push(format!("{}{}", TREE_INDENT.repeat(depth), entry));
        })?;

        Ok(lines.join("\n"))
    }

    /// Resolve a path that must name an existing directory.
    fn resolve_dir(&self, path: &str) -> Result<PathBuf, StoreError> {
        let full_path = self.resolve(path)?;
        if !full_path.is_dir() {
            warn!(path = %full_path.display(), "expected a directory");
            return Err(StoreError::NotADirectory { path: full_path });
        }
        Ok(full_path)
    }
}
