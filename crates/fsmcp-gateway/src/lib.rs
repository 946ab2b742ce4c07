//! # fsmcp-gateway
//!
//! MCP front end for the confined file store.
//!
//! [`FileServer`] exposes a [`fsmcp_store::SandboxedFileStore`] as MCP tools.
//! Tool arguments arrive as plain strings, results go back as plain text,
//! and every store error is collapsed into a short message (full detail is
//! logged server-side with `tracing`).
//!
//! ## Key components
//!
//! - [`ServerConfig`] / [`ConfigLayer`]: root directory and write-enable
//!   flag, merged from CLI, environment and an optional TOML file.
//! - [`FileServer`]: the rmcp `ServerHandler`; write tools are only
//!   registered when writes are enabled.
//! - [`render`]: text formatting for listings, multi-file reads and errors.

pub mod config;
pub mod error;
pub mod render;
pub mod server;

pub use config::{ConfigLayer, ServerConfig};
pub use error::GatewayError;
pub use server::FileServer;
