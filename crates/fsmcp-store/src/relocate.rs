// relocate.rs: Moving entries without exposing half-finished state.
//
// The fast path is a single rename. When source and destination live on
// different volumes the rename fails with EXDEV; we then copy into a
// temporary sibling of the destination (same volume, so the final publish
// is itself a rename) and only remove the source once the copy is in place.
// A directory source is first renamed into a scratch directory beside it, so
// deletion starts only after the source name is gone. The published copy is
// rolled back only while the source is still whole.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::StoreError;

/// Move `src` to `dst`. `dst` must not exist and its parent must.
pub fn relocate(src: &Path, dst: &Path) -> Result<(), StoreError> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %src.display(), to = %dst.display(), "cross-device move, copying");
            copy_then_remove(src, dst)
        }
        Err(source) => Err(StoreError::io(src, source)),
    }
}

/// Copy `src` into place at `dst`, then delete `src`.
pub(crate) fn copy_then_remove(src: &Path, dst: &Path) -> Result<(), StoreError> {
    let parent = dst
        .parent()
        .ok_or_else(|| StoreError::Unexpected(format!("{} has no parent", dst.display())))?;
    let meta = fs::symlink_metadata(src).map_err(|source| StoreError::io(src, source))?;

    if meta.is_dir() {
        let staging = tempfile::Builder::new()
            .prefix(".fsmcp-move-")
            .tempdir_in(parent)
            .map_err(|source| StoreError::io(parent, source))?;
        copy_tree(src, staging.path())?;

        if fs::symlink_metadata(dst).is_ok() {
            return Err(StoreError::AlreadyExists {
                path: dst.to_path_buf(),
            });
        }
        // On success `staging` no longer exists; its drop is a no-op.
        fs::rename(staging.path(), dst).map_err(|source| StoreError::io(dst, source))?;

        retire_directory(src, dst)?;
    } else {
        let mut staged = tempfile::Builder::new()
            .prefix(".fsmcp-move-")
            .tempfile_in(parent)
            .map_err(|source| StoreError::io(parent, source))?;
        let mut reader = File::open(src).map_err(|source| StoreError::io(src, source))?;
        io::copy(&mut reader, staged.as_file_mut())
            .map_err(|source| StoreError::io(staged.path(), source))?;
        fs::set_permissions(staged.path(), meta.permissions())
            .map_err(|source| StoreError::io(staged.path(), source))?;

        staged.persist_noclobber(dst).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                StoreError::AlreadyExists {
                    path: dst.to_path_buf(),
                }
            } else {
                StoreError::io(dst, e.error)
            }
        })?;

        if let Err(source) = fs::remove_file(src) {
            warn!(path = %src.display(), "could not remove moved file, rolling back");
            let _ = fs::remove_file(dst);
            return Err(StoreError::io(src, source));
        }
    }

    Ok(())
}

/// Remove directory `src` after its copy was published at `dst`.
///
/// `src` is renamed into a scratch directory first. If that rename fails the
/// source is untouched, so the copy is rolled back. Once it succeeds the move
/// is complete and a failure to delete the scratch directory is only logged.
fn retire_directory(src: &Path, dst: &Path) -> Result<(), StoreError> {
    let src_parent = src
        .parent()
        .ok_or_else(|| StoreError::Unexpected(format!("{} has no parent", src.display())))?;

    let retired = tempfile::Builder::new()
        .prefix(".fsmcp-retired-")
        .tempdir_in(src_parent)
        .and_then(|scratch| fs::rename(src, scratch.path().join("moved")).map(|()| scratch));

    match retired {
        Ok(scratch) => {
            let scratch_path = scratch.path().to_path_buf();
            if let Err(e) = scratch.close() {
                warn!(
                    path = %scratch_path.display(),
                    error = %e,
                    "moved directory left a partial copy behind"
                );
            }
            Ok(())
        }
        Err(source) => {
            warn!(path = %src.display(), "could not detach moved directory, rolling back");
            let _ = fs::remove_dir_all(dst);
            Err(StoreError::io(src, source))
        }
    }
}

/// Recursively copy the contents of directory `from` into existing directory `to`.
fn copy_tree(from: &Path, to: &Path) -> Result<(), StoreError> {
    let entries = fs::read_dir(from).map_err(|source| StoreError::io(from, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::io(from, source))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|source| StoreError::io(&src, source))?;

        if file_type.is_dir() {
            fs::create_dir(&dst).map_err(|source| StoreError::io(&dst, source))?;
            copy_tree(&src, &dst)?;
        } else if file_type.is_symlink() {
            copy_link(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(|source| StoreError::io(&src, source))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(src: &Path, dst: &Path) -> Result<(), StoreError> {
    let target = fs::read_link(src).map_err(|source| StoreError::io(src, source))?;
    std::os::unix::fs::symlink(target, dst).map_err(|source| StoreError::io(dst, source))
}

#[cfg(not(unix))]
fn copy_link(src: &Path, dst: &Path) -> Result<(), StoreError> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|source| StoreError::io(src, source))
}
