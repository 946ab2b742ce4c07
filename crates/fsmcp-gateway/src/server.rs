// server.rs: MCP tool server over a SandboxedFileStore.
//
// FileServer implements the rmcp ServerHandler trait. Each tool parses its
// string arguments, calls the store, and renders the outcome as text. Store
// errors are logged in full here and returned to the caller as a short
// message in an error result.
//
// Tools:
//   read_file          : full text of one file
//   read_multiple_files: several files, comma-separated, per-file errors
//   list_directory     : immediate children as [F]/[D] lines
//   search_files       : recursive name search with path exclusions
//   directory_tree     : indented [F]/[D] tree
//   write_file         : create or overwrite a file        (writes enabled)
//   create_directory   : mkdir -p                          (writes enabled)
//   move_file          : rename without overwriting        (writes enabled)
//
// The write tools live in their own router, merged in only when the config
// enables writes. With writes off they are neither listed nor callable.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;

use fsmcp_store::{SandboxedFileStore, StoreError};

use crate::config::ServerConfig;
use crate::error::GatewayError;
use crate::render;

// ── Tool parameter types ─────────────────────────────────────────

/// Parameters for tools that take a single file path.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileParams {
    /// Path relative to the served root (e.g., "docs/index.md").
    pub path: String,
}

/// Parameters for tools that take a directory path.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DirParams {
    /// Directory relative to the served root. Defaults to the root itself.
    #[serde(default = "default_dir")]
    pub path: String,
}

fn default_dir() -> String {
    ".".to_string()
}

/// Parameters for `read_multiple_files`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadMultipleParams {
    /// Comma-separated file paths (e.g., "index.md, guide/intro.md").
    pub paths: String,
}

/// Parameters for `search_files`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Directory to search under. Defaults to the root.
    #[serde(default = "default_dir")]
    pub path: String,
    /// Glob matched case-insensitively against entry names (e.g., "*.md").
    pub pattern: String,
    /// Comma-separated globs matched against root-relative paths to skip.
    #[serde(default)]
    pub exclude: String,
}

/// Parameters for `write_file`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    /// Path relative to the served root.
    pub path: String,
    /// Full new content of the file.
    pub content: String,
}

/// Parameters for `move_file`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveParams {
    /// Existing path to move.
    pub source: String,
    /// New path; must not exist yet.
    pub destination: String,
}

// ── MCP Server ───────────────────────────────────────────────────

/// The MCP file server. Holds the shared store and the tool router.
pub struct FileServer {
    store: Arc<SandboxedFileStore>,
    allow_writes: bool,
    tool_router: ToolRouter<Self>,
}

#[tool_router(router = read_tool_router)]
impl FileServer {
    /// Open the store on the configured root and register the tools.
    pub fn new(config: ServerConfig) -> Result<Self, GatewayError> {
        let store = SandboxedFileStore::open(&config.root)?;
        Ok(Self::with_store(store, config.allow_writes))
    }

    /// Build a server around an already-open store.
    pub fn with_store(store: SandboxedFileStore, allow_writes: bool) -> Self {
        let mut tool_router = Self::read_tool_router();
        if allow_writes {
            tool_router = tool_router + Self::write_tool_router();
        }
        tracing::info!(
            root = %store.root().display(),
            allow_writes,
            "file server configured"
        );
        Self {
            store: Arc::new(store),
            allow_writes,
            tool_router,
        }
    }

    /// The store backing this server.
    pub fn store(&self) -> &SandboxedFileStore {
        &self.store
    }

    /// Whether the mutating tools are exposed.
    pub fn allows_writes(&self) -> bool {
        self.allow_writes
    }

    #[tool(description = "Read the complete contents of a text file.")]
    fn read_file(
        &self,
        Parameters(params): Parameters<FileParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("read_file", self.store.read_file(&params.path))
    }

    #[tool(
        description = "Read several text files at once. Takes a comma-separated list of paths; a file that cannot be read is reported inline without failing the others."
    )]
    fn read_multiple_files(
        &self,
        Parameters(params): Parameters<ReadMultipleParams>,
    ) -> Result<CallToolResult, McpError> {
        let paths = render::split_list(&params.paths);
        let results = self.store.read_multiple(&paths);
        for (path, result) in &results {
            if let Err(e) = result {
                tracing::warn!(tool = "read_multiple_files", path = %path, error = %e, "read failed");
            }
        }
        Ok(CallToolResult::success(vec![Content::text(
            render::multi_read(&results),
        )]))
    }

    #[tool(
        description = "List the immediate contents of a directory. Each line is '[F] name' for files or '[D] name' for directories."
    )]
    fn list_directory(
        &self,
        Parameters(params): Parameters<DirParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .store
            .list_directory(&params.path)
            .map(|entries| render::listing(&entries));
        respond("list_directory", result)
    }

    #[tool(
        description = "Recursively search a directory for files and directories whose name matches a glob pattern (case-insensitive). Paths matching any of the comma-separated exclude patterns are skipped. Returns one root-relative path per line."
    )]
    fn search_files(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let exclude = render::split_list(&params.exclude);
        let result = self
            .store
            .search_files(&params.path, &params.pattern, &exclude)
            .map(|paths| render::matches(&paths));
        respond("search_files", result)
    }

    #[tool(
        description = "Show the full tree below a directory. Each line is '[F] name' or '[D] name', indented three spaces per level."
    )]
    fn directory_tree(
        &self,
        Parameters(params): Parameters<DirParams>,
    ) -> Result<CallToolResult, McpError> {
        respond("directory_tree", self.store.directory_tree(&params.path))
    }
}

#[tool_router(router = write_tool_router)]
impl FileServer {
    #[tool(
        description = "Create a file or completely overwrite an existing one. Missing parent directories are created."
    )]
    fn write_file(
        &self,
        Parameters(params): Parameters<WriteFileParams>,
    ) -> Result<CallToolResult, McpError> {
        self.ensure_writable()?;
        let result = self
            .store
            .write_file(&params.path, &params.content)
            .map(|()| "File written successfully.".to_string());
        respond("write_file", result)
    }

    #[tool(
        description = "Create a directory, including any missing parents. Succeeds if it already exists."
    )]
    fn create_directory(
        &self,
        Parameters(params): Parameters<FileParams>,
    ) -> Result<CallToolResult, McpError> {
        self.ensure_writable()?;
        let result = self
            .store
            .create_directory(&params.path)
            .map(|()| "Directory ensured.".to_string());
        respond("create_directory", result)
    }

    #[tool(
        description = "Move or rename a file or directory. Fails if the destination already exists; never overwrites."
    )]
    fn move_file(
        &self,
        Parameters(params): Parameters<MoveParams>,
    ) -> Result<CallToolResult, McpError> {
        self.ensure_writable()?;
        let result = self
            .store
            .move_file(&params.source, &params.destination)
            .map(|()| "Move successful.".to_string());
        respond("move_file", result)
    }
}

impl FileServer {
    /// Second gate behind the router: refuse mutations on a read-only server.
    fn ensure_writable(&self) -> Result<(), McpError> {
        if self.allow_writes {
            Ok(())
        } else {
            Err(McpError::invalid_request("editing is disabled", None))
        }
    }
}

// ── ServerHandler implementation ─────────────────────────────────

#[tool_handler]
impl ServerHandler for FileServer {
    fn get_info(&self) -> ServerInfo {
        let mode = if self.allow_writes {
            "Editing is enabled: write_file, create_directory and move_file are available."
        } else {
            "The server is read-only."
        };
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fsmcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Confined file server".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Serves files from a single directory. All paths are relative to that \
                 directory and cannot leave it. Use list_directory or directory_tree to \
                 explore, search_files to find files by name, and read_file or \
                 read_multiple_files to read them. {}",
                mode
            )),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Convert a store result into a tool result, logging failures in full.
fn respond(tool: &str, result: Result<String, StoreError>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => {
            tracing::warn!(tool, kind = %e.kind(), error = %e, "tool call failed");
            Ok(CallToolResult::error(vec![Content::text(
                render::user_message(&e),
            )]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_server(allow_writes: bool) -> (FileServer, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("index.md"), b"# Index").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/page.md"), b"# Page").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"notes").unwrap();
        let config = ServerConfig::for_root(dir.path()).with_writes(allow_writes);
        let server = FileServer::new(config).unwrap();
        (server, dir)
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text())
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }

    fn tool_names(server: &FileServer) -> Vec<String> {
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn read_only_server_lists_five_tools() {
        let (server, _dir) = test_server(false);
        assert_eq!(
            tool_names(&server),
            vec![
                "directory_tree",
                "list_directory",
                "read_file",
                "read_multiple_files",
                "search_files",
            ]
        );
    }

    #[test]
    fn writable_server_adds_write_tools() {
        let (server, _dir) = test_server(true);
        let names = tool_names(&server);
        assert_eq!(names.len(), 8, "got: {:?}", names);
        assert!(names.contains(&"write_file".to_string()));
        assert!(names.contains(&"create_directory".to_string()));
        assert!(names.contains(&"move_file".to_string()));
    }

    #[test]
    fn new_fails_on_missing_root() {
        let dir = tempdir().unwrap();
        let config = ServerConfig::for_root(dir.path().join("missing"));
        assert!(matches!(
            FileServer::new(config),
            Err(GatewayError::Store(_))
        ));
    }

    #[test]
    fn read_file_returns_content() {
        let (server, _dir) = test_server(false);
        let result = server
            .read_file(Parameters(FileParams {
                path: "index.md".into(),
            }))
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(text(&result), "# Index");
    }

    #[test]
    fn errors_are_short_messages() {
        let (server, _dir) = test_server(false);
        let result = server
            .read_file(Parameters(FileParams {
                path: "missing.md".into(),
            }))
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result), "Error: Not found");

        let result = server
            .read_file(Parameters(FileParams {
                path: "../outside".into(),
            }))
            .unwrap();
        assert_eq!(text(&result), "Error: Access denied");
    }

    #[test]
    fn read_multiple_reports_per_file() {
        let (server, _dir) = test_server(false);
        let result = server
            .read_multiple_files(Parameters(ReadMultipleParams {
                paths: "index.md, missing.md".into(),
            }))
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(
            text(&result),
            "index.md:\n# Index\n\n---\nmissing.md:\nError: Not found\n"
        );
    }

    #[test]
    fn list_directory_renders_markers() {
        let (server, _dir) = test_server(false);
        let result = server
            .list_directory(Parameters(DirParams { path: ".".into() }))
            .unwrap();
        assert_eq!(text(&result), "[F] index.md\n[F] notes.txt\n[D] sub");

        let result = server
            .list_directory(Parameters(DirParams {
                path: "notes.txt".into(),
            }))
            .unwrap();
        assert_eq!(text(&result), "Error: Not a directory");
    }

    #[test]
    fn search_files_splits_excludes() {
        let (server, _dir) = test_server(false);
        let result = server
            .search_files(Parameters(SearchParams {
                path: ".".into(),
                pattern: "*.md".into(),
                exclude: " sub/* , ".into(),
            }))
            .unwrap();
        assert_eq!(text(&result), "index.md");
    }

    #[test]
    fn directory_tree_renders_nesting() {
        let (server, _dir) = test_server(false);
        let result = server
            .directory_tree(Parameters(DirParams { path: ".".into() }))
            .unwrap();
        assert_eq!(
            text(&result),
            "[F] index.md\n[F] notes.txt\n[D] sub\n   [F] page.md"
        );
    }

    #[test]
    fn write_tools_refuse_when_disabled() {
        let (server, dir) = test_server(false);
        let result = server.write_file(Parameters(WriteFileParams {
            path: "new.txt".into(),
            content: "x".into(),
        }));
        assert!(result.is_err());
        assert!(!dir.path().join("new.txt").exists());
    }

    #[test]
    fn write_create_and_move_when_enabled() {
        let (server, _dir) = test_server(true);

        let result = server
            .write_file(Parameters(WriteFileParams {
                path: "drafts/a.md".into(),
                content: "draft".into(),
            }))
            .unwrap();
        assert_eq!(text(&result), "File written successfully.");

        let result = server
            .create_directory(Parameters(FileParams {
                path: "published".into(),
            }))
            .unwrap();
        assert_eq!(text(&result), "Directory ensured.");

        let result = server
            .move_file(Parameters(MoveParams {
                source: "drafts/a.md".into(),
                destination: "published/a.md".into(),
            }))
            .unwrap();
        assert_eq!(text(&result), "Move successful.");
        assert_eq!(server.store().read_file("published/a.md").unwrap(), "draft");

        let result = server
            .move_file(Parameters(MoveParams {
                source: "index.md".into(),
                destination: "notes.txt".into(),
            }))
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result), "Error: Already exists");
    }

    #[test]
    fn server_info_reflects_write_mode() {
        let (server, _dir) = test_server(false);
        let info = server.get_info();
        assert_eq!(info.server_info.name, "fsmcp");
        assert!(info.instructions.unwrap().contains("read-only"));

        let (server, _dir) = test_server(true);
        assert!(server
            .get_info()
            .instructions
            .unwrap()
            .contains("Editing is enabled"));
    }
}
