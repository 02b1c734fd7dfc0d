//! TL Language Server Protocol (LSP) library
//!
//! Wraps `tl-analysis` with tower-lsp:
//! - `server.rs`: document lifecycle, debounced diagnostics and requests
//! - `convert.rs`: analysis types to `lsp_types`
//! - `settings.rs`: configuration to analyzer and server switches
//! - `resolver.rs`: imported modules read from disk

pub mod capabilities;
pub mod convert;
pub mod document;
pub mod logging;
pub mod resolver;
pub mod server;
pub mod settings;

pub use server::{run_server, serve, TlLspServer};
