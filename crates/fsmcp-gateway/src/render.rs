// render.rs: Turning store results into the text tool callers see.
//
// Everything here is pure string formatting. Errors are reduced to a fixed
// message per ErrorKind so no internal path or OS detail leaks to callers.

use fsmcp_store::{DirectoryEntry, ErrorKind, StoreError};

/// Separator between per-file blocks in `read_multiple_files` output.
pub const MULTI_READ_SEPARATOR: &str = "\n---\n";

/// Short caller-facing message for a store error.
pub fn user_message(err: &StoreError) -> &'static str {
    match err.kind() {
        ErrorKind::AccessDenied => "Error: Access denied",
        ErrorKind::NotFound => "Error: Not found",
        ErrorKind::NotADirectory => "Error: Not a directory",
        ErrorKind::AlreadyExists => "Error: Already exists",
        ErrorKind::Io => "Error: Could not complete filesystem operation",
        ErrorKind::Unexpected => "Error",
    }
}

/// Split a comma-separated argument, trimming items and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// One `[F] name` / `[D] name` line per entry.
pub fn listing(entries: &[DirectoryEntry]) -> String {
    entries
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One relative path per line.
pub fn matches(paths: &[String]) -> String {
    paths.join("\n")
}

/// `path:` header followed by content (or the error message), one block per file.
pub fn multi_read(results: &[(String, Result<String, StoreError>)]) -> String {
    results
        .iter()
        .map(|(path, result)| match result {
            Ok(content) => format!("{}:\n{}\n", path, content),
            Err(e) => format!("{}:\n{}\n", path, user_message(e)),
        })
        .collect::<Vec<_>>()
        .join(MULTI_READ_SEPARATOR)
}
