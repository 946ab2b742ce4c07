// resolve.rs: Path confinement.
//
// Caller paths are untrusted. They are joined onto the root and resolved the
// way realpath(3) does it, one component at a time: `.` is dropped, `..` pops
// the last real component, and symlinks are replaced by their target. Unlike
// `fs::canonicalize`, components that do not exist yet are kept as-is, so
// write targets and move destinations resolve too. The fully resolved path
// must still sit under the root.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};

use tracing::warn;

use crate::error::StoreError;

/// Upper bound on symlinks followed while resolving a single path.
pub const MAX_SYMLINK_HOPS: usize = 40;

enum Segment {
    Prefix(OsString),
    RootDir,
    Parent,
    Name(OsString),
}

/// Push the components of `path` onto `stack` so that popping yields them in order.
fn push_segments(stack: &mut Vec<Segment>, path: &Path) {
    let mut segments: Vec<Segment> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => segments.push(Segment::Prefix(p.as_os_str().to_owned())),
            Component::RootDir => segments.push(Segment::RootDir),
            Component::CurDir => {}
            Component::ParentDir => segments.push(Segment::Parent),
            Component::Normal(name) => segments.push(Segment::Name(name.to_owned())),
        }
    }
    stack.extend(segments.into_iter().rev());
}

/// Resolve `path` to its real location.
///
/// Every existing prefix is replaced by its real path; the first missing
/// component and everything after it is appended lexically.
pub fn real_path(path: &Path) -> io::Result<PathBuf> {
    let mut pending = Vec::new();
    push_segments(&mut pending, path);

    let mut resolved = PathBuf::new();
    let mut hops = 0usize;

    while let Some(segment) = pending.pop() {
        match segment {
            Segment::Prefix(prefix) => resolved = PathBuf::from(prefix),
            Segment::RootDir => resolved.push(MAIN_SEPARATOR_STR),
            Segment::Parent => {
                resolved.pop();
            }
            Segment::Name(name) => {
                let candidate = resolved.join(&name);
                match fs::symlink_metadata(&candidate) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        hops += 1;
                        if hops > MAX_SYMLINK_HOPS {
                            return Err(io::Error::new(
                                io::ErrorKind::Other,
                                "too many levels of symbolic links",
                            ));
                        }
                        let target = fs::read_link(&candidate)?;
                        push_segments(&mut pending, &target);
                    }
                    // Existing entries are real once their parent is; missing
                    // ones (or ones under a non-directory) stay lexical.
                    _ => resolved = candidate,
                }
            }
        }
    }

    Ok(resolved)
}

/// Resolve `relative` against `root` and reject anything outside it.
///
/// `root` must already be canonical.
pub fn confine(root: &Path, relative: &str) -> Result<PathBuf, StoreError> {
    let joined = root.join(relative);
    let resolved = real_path(&joined).map_err(|source| StoreError::Io {
        path: joined.clone(),
        source,
    })?;

    if !resolved.starts_with(root) {
        warn!(requested = relative, "rejected path outside root");
        return Err(StoreError::AccessDenied {
            path: relative.to_string(),
        });
    }

    Ok(resolved)
}
