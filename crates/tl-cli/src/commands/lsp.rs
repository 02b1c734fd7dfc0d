//! LSP command - Language Server Protocol server
//!
//! Starts the TL language server in either stdio mode (default)
//! or TCP mode for editor integration.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Arguments for the LSP command
#[derive(Debug, Clone)]
pub struct LspArgs {
    /// Use TCP mode instead of stdio
    pub tcp: bool,
    /// Port for TCP mode (default: 9257)
    pub port: u16,
    /// Bind address for TCP mode
    pub host: String,
    /// Report connections on stderr
    pub verbose: bool,
}

impl Default for LspArgs {
    fn default() -> Self {
        Self {
            tcp: false,
            port: 9257,
            host: "127.0.0.1".to_string(),
            verbose: false,
        }
    }
}

impl LspArgs {
    fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// Run the LSP server
pub fn run(args: LspArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        if args.tcp {
            run_tcp_server(args).await
        } else {
            if args.verbose {
                eprintln!("Starting TL LSP server (stdio mode)...");
            }
            tl_lsp::run_server().await;
            Ok(())
        }
    })
}

/// Run LSP server in TCP mode, one server per connection
async fn run_tcp_server(args: LspArgs) -> Result<()> {
    let addr = args.addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    eprintln!(
        "\x1b[32mTL LSP server\x1b[0m listening on \x1b[33m{}\x1b[0m",
        addr
    );
    eprintln!("Press Ctrl+C to stop.");

    loop {
        let (stream, client_addr) = listener.accept().await?;
        info!(client = %client_addr, "client connected");
        if args.verbose {
            eprintln!("Client connected from {}", client_addr);
        }

        let (read, write) = tokio::io::split(stream);
        let verbose = args.verbose;
        tokio::spawn(async move {
            tl_lsp::serve(read, write).await;
            info!(client = %client_addr, "client disconnected");
            if verbose {
                eprintln!("Client {} disconnected", client_addr);
            }
        });
    }
}
