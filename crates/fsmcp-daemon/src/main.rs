//! # fsmcp
//!
//! Stdio MCP server exposing one directory tree.
//!
//! Every tool call is confined to the configured root. Mutating tools
//! (write_file, create_directory, move_file) exist only when editing is
//! explicitly enabled.
//!
//! ## Usage
//!
//! Typically started by the MCP client via `.mcp.json`:
//! ```json
//! {
//!   "mcpServers": {
//!     "docs": {
//!       "type": "stdio",
//!       "command": "fsmcp",
//!       "args": ["--root", "./docs"]
//!     }
//!   }
//! }
//! ```
//!
//! Settings resolve in order: flags, then `FILES_DIR` / `ALLOW_EDITING`,
//! then the file given with `--config`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::ServiceExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fsmcp_gateway::{ConfigLayer, FileServer, ServerConfig};

/// Confined filesystem MCP server.
#[derive(Parser)]
#[command(name = "fsmcp", version, about = "Confined filesystem MCP server")]
struct Cli {
    /// Directory to serve. Overrides FILES_DIR and the config file.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Expose write_file, create_directory and move_file.
    #[arg(long)]
    allow_writes: bool,

    /// Optional TOML file with `root` and `allow_writes` keys.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// The command-line layer of the configuration.
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            root: self.root.clone(),
            allow_writes: self.allow_writes.then_some(true),
        }
    }
}

/// Name the highest-precedence layer that supplied a root.
fn root_source(layers: &[(&'static str, &ConfigLayer)]) -> &'static str {
    layers
        .iter()
        .find(|(_, layer)| layer.root.is_some())
        .map(|(name, _)| *name)
        .unwrap_or("none")
}

fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let flags = cli.layer();
    let env = ConfigLayer::from_env();
    let file = match &cli.config {
        Some(path) => ConfigLayer::load(path)
            .with_context(|| format!("reading config file {}", path.display()))?,
        None => ConfigLayer::default(),
    };

    let source = root_source(&[("flags", &flags), ("environment", &env), ("config file", &file)]);
    let config = flags
        .or(env)
        .or(file)
        .finish()
        .context("no directory to serve: pass --root or set FILES_DIR")?;

    info!(
        root = %config.root.display(),
        source,
        editing = config.allow_writes,
        "configuration resolved"
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP stream; diagnostics go to stderr.
    let filter = EnvFilter::from_default_env()
        .add_directive("fsmcp=info".parse()?)
        .add_directive("fsmcp_gateway=info".parse()?)
        .add_directive("fsmcp_store=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let server = FileServer::new(config).context("opening served directory")?;

    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("starting stdio transport")?;
    info!("fsmcp serving on stdio");

    let reason = service.waiting().await?;
    info!(?reason, "fsmcp stopped");
    Ok(())
}
