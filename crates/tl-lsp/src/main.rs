//! TL Language Server Protocol (LSP) server
//!
//! Provides diagnostics, hover, completion, go-to-definition and document
//! outline for TL source files over stdio.

#[tokio::main]
async fn main() {
    tl_lsp::logging::init();
    tl_lsp::run_server().await;
}
