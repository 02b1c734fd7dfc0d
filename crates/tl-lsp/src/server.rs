//! TL LSP server implementation

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tl_config::{Config, ConfigLoader};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use crate::capabilities::server_capabilities;
use crate::convert;
use crate::document::DocumentState;
use crate::settings::{InitializationOptions, ServerSettings};

/// TL Language Server
#[derive(Clone)]
pub struct TlLspServer {
    client: Client,
    documents: Arc<Mutex<HashMap<Url, DocumentState>>>,
    settings: Arc<RwLock<ServerSettings>>,
}

impl TlLspServer {
    /// Create a new TL LSP server with default settings
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(Mutex::new(HashMap::new())),
            settings: Arc::new(RwLock::new(ServerSettings::default())),
        }
    }

    /// Current text of an open document
    async fn snapshot(&self, uri: &Url) -> Option<DocumentState> {
        self.documents.lock().await.get(uri).cloned()
    }

    /// Analyze and publish; skipped when `version` is given and the document
    /// has moved past it
    async fn publish_diagnostics(&self, uri: Url, version: Option<i32>) {
        let Some(state) = self.snapshot(&uri).await else {
            return;
        };
        if version.is_some_and(|v| v != state.version) {
            debug!(%uri, stale = ?version, current = state.version, "skipping stale analysis");
            return;
        }

        let diagnostics = {
            let settings = self.settings.read().await;
            if settings.diagnostics {
                let document = state.document();
                settings
                    .analyzer
                    .analyze_document(&document)
                    .iter()
                    .map(|d| convert::diagnostic_to_lsp(&document, d))
                    .collect()
            } else {
                Vec::new()
            }
        };

        self.client
            .publish_diagnostics(uri, diagnostics, Some(state.version))
            .await;
    }
}

/// Workspace root from the first workspace folder, else the root URI
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    let folder = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri);
    #[allow(deprecated)]
    let uri = folder.or(params.root_uri.as_ref())?;
    uri.to_file_path().ok()
}

fn load_config(root: Option<PathBuf>) -> Config {
    let Some(root) = root else {
        return Config::default();
    };
    match ConfigLoader::new().load_from_directory(&root) {
        Ok(config) => config,
        Err(error) => {
            warn!(%error, root = %root.display(), "invalid configuration, using defaults");
            Config::default()
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for TlLspServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let config = load_config(workspace_root(&params));
        let client_options =
            InitializationOptions::from_json(params.initialization_options.clone());
        let settings = ServerSettings::from_config(&config).with_client_options(&client_options);
        info!(
            root = ?config.project_root(),
            debounce_ms = settings.debounce.as_millis() as u64,
            "server initialized"
        );
        *self.settings.write().await = settings;

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "tl-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "TL LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let state = DocumentState::new(
            uri.clone(),
            params.text_document.text,
            params.text_document.version,
        );
        self.documents.lock().await.insert(uri.clone(), state);

        self.publish_diagnostics(uri, None).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync: the last change holds the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        {
            let mut documents = self.documents.lock().await;
            match documents.get_mut(&uri) {
                Some(state) => state.update(change.text, version),
                None => {
                    let state = DocumentState::new(uri.clone(), change.text, version);
                    documents.insert(uri.clone(), state);
                }
            }
        }

        let debounce = self.settings.read().await.debounce;
        let server = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            server.publish_diagnostics(uri, Some(version)).await;
        });
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        // Saved files may be imported by other documents
        self.settings.read().await.resolver.clear();
        self.publish_diagnostics(params.text_document.uri, None).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.lock().await.remove(&uri);

        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some(state) = self.snapshot(&uri).await else {
            return Ok(None);
        };
        let settings = self.settings.read().await;
        if !settings.hover {
            return Ok(None);
        }

        let document = state.document();
        let position =
            convert::position_from_lsp(&document, params.text_document_position_params.position);
        let Some((word, range)) = document.word_at(position) else {
            return Ok(None);
        };
        let result = settings
            .analyzer
            .query(&document, position, &word, settings.resolver.as_ref());
        debug!(%uri, word = %word, found = result.is_some(), "hover");

        let range = convert::range_to_lsp(&document, &range);
        Ok(result.map(|r| convert::hover_to_lsp(&r, Some(range))))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let Some(state) = self.snapshot(&uri).await else {
            return Ok(None);
        };
        let settings = self.settings.read().await;
        if !settings.completion {
            return Ok(None);
        }

        let document = state.document();
        let position =
            convert::position_from_lsp(&document, params.text_document_position.position);
        let items: Vec<CompletionItem> = settings
            .analyzer
            .completions(&document, position, settings.resolver.as_ref())
            .iter()
            .map(convert::completion_to_lsp)
            .collect();
        debug!(%uri, count = items.len(), "completion");

        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some(state) = self.snapshot(&uri).await else {
            return Ok(None);
        };
        let settings = self.settings.read().await;

        let document = state.document();
        let position =
            convert::position_from_lsp(&document, params.text_document_position_params.position);
        let Some((word, _)) = document.word_at(position) else {
            return Ok(None);
        };
        let location = settings
            .analyzer
            .definition(&document, position, &word, settings.resolver.as_ref())
            .and_then(|location| convert::location_to_lsp(&document, &uri, &location));
        debug!(%uri, word = %word, found = location.is_some(), "definition");

        Ok(location.map(GotoDefinitionResponse::Scalar))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Some(state) = self.snapshot(&uri).await else {
            return Ok(None);
        };
        let settings = self.settings.read().await;

        let document = state.document();
        let symbols = settings
            .analyzer
            .document_symbols(&document)
            .iter()
            .map(|symbol| convert::symbol_to_lsp(&document, symbol))
            .collect();

        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

/// Serve LSP over an arbitrary byte stream pair
pub async fn serve<I, O>(input: I, output: O)
where
    I: AsyncRead + Unpin,
    O: AsyncWrite,
{
    let (service, socket) = LspService::new(TlLspServer::new);
    Server::new(input, output, socket).serve(service).await;
}

/// Run the LSP server over stdio
pub async fn run_server() {
    serve(tokio::io::stdin(), tokio::io::stdout()).await;
}
