//! # fsmcp-store
//!
//! Confined filesystem access for the fsmcp server.
//!
//! A [`SandboxedFileStore`] owns one canonical root directory and exposes a
//! small set of operations (read, write, mkdir, list, move, search, tree).
//! Every caller-supplied path is resolved against the root before anything
//! touches the disk, and any resolution that lands outside the root fails
//! with [`StoreError::AccessDenied`].
//!
//! ## Key invariants
//!
//! - **Confinement**: `..`, absolute paths and symlinks are resolved to real
//!   locations first, then checked component-wise against the root.
//! - **No clobbering moves**: [`SandboxedFileStore::move_file`] never replaces
//!   an existing destination.
//! - **Closed error taxonomy**: every failure maps to one [`ErrorKind`].
//! - **Deterministic walks**: listings, searches and trees visit entries in
//!   name order and never enter the same real directory twice.

pub mod entry;
pub mod error;
pub mod pattern;
mod relocate;
pub mod resolve;
pub mod store;
mod walk;

pub use entry::{DirectoryEntry, EntryKind};
pub use error::{ErrorKind, StoreError};
pub use pattern::SearchFilter;
pub use store::{SandboxedFileStore, TREE_INDENT};
