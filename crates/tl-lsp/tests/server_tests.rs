//! Language server request handling tests

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tl_lsp::TlLspServer;
use tower_lsp::lsp_types::*;
use tower_lsp::{LanguageServer, LspService};

const AREA: &str = "\
// Area of a circle.
func area(r: Float) -> Float:
    return r * r * math.PI
end
var total = area(2.0)";

fn uri() -> Url {
    Url::parse("file:///workspace/main.tl").unwrap()
}

async fn open(server: &TlLspServer, uri: Url, text: &str) {
    server
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri,
                language_id: "tl".to_string(),
                version: 1,
                text: text.to_string(),
            },
        })
        .await;
}

fn position_params(uri: Url, line: u32, character: u32) -> TextDocumentPositionParams {
    TextDocumentPositionParams {
        text_document: TextDocumentIdentifier { uri },
        position: Position::new(line, character),
    }
}

async fn hover_at(server: &TlLspServer, uri: Url, line: u32, character: u32) -> Option<Hover> {
    server
        .hover(HoverParams {
            text_document_position_params: position_params(uri, line, character),
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap()
}

fn markdown(hover: &Hover) -> &str {
    match &hover.contents {
        HoverContents::Markup(markup) => {
            assert_eq!(markup.kind, MarkupKind::Markdown);
            &markup.value
        }
        other => panic!("expected markup, got {:?}", other),
    }
}

#[allow(deprecated)]
fn init_params(root: Option<Url>, options: Option<serde_json::Value>) -> InitializeParams {
    InitializeParams {
        root_uri: root,
        initialization_options: options,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_initialize_advertises_capabilities() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();

    let result = server.initialize(init_params(None, None)).await.unwrap();
    let info = result.server_info.unwrap();
    assert_eq!(info.name, "tl-lsp");

    let caps = result.capabilities;
    assert!(caps.hover_provider.is_some());
    assert!(caps.definition_provider.is_some());
    assert!(caps.document_symbol_provider.is_some());
    assert_eq!(
        caps.completion_provider.unwrap().trigger_characters,
        Some(vec![".".to_string()])
    );
}

#[tokio::test]
async fn test_hover_shows_signature_and_comment() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    open(server, uri(), AREA).await;

    let hover = hover_at(server, uri(), 4, 13).await.unwrap();
    assert_eq!(
        markdown(&hover),
        "```tl\nfunc area(r: Float) -> Float\n```\n\nArea of a circle."
    );
    assert_eq!(
        hover.range,
        Some(Range::new(Position::new(4, 12), Position::new(4, 16)))
    );

    assert!(hover_at(server, uri(), 2, 0).await.is_none());
}

#[tokio::test]
async fn test_hover_on_unknown_document() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();

    assert!(hover_at(server, uri(), 0, 0).await.is_none());
}

#[tokio::test]
async fn test_completion_after_dot() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    open(server, uri(), "var xs = [1, 2]\nxs.").await;

    let response = server
        .completion(CompletionParams {
            text_document_position: position_params(uri(), 1, 3),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        })
        .await
        .unwrap();

    let Some(CompletionResponse::Array(items)) = response else {
        panic!("expected a completion list");
    };
    assert!(!items.is_empty());
    assert!(items
        .iter()
        .all(|item| item.kind == Some(CompletionItemKind::METHOD)));
    let pop = items.iter().find(|item| item.label == "pop").unwrap();
    assert_eq!(pop.detail.as_deref(), Some("func Array<Int>.pop() -> Int"));
}

#[tokio::test]
async fn test_goto_definition_in_same_document() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    open(server, uri(), AREA).await;

    let response = server
        .goto_definition(GotoDefinitionParams {
            text_document_position_params: position_params(uri(), 4, 13),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        })
        .await
        .unwrap();

    let Some(GotoDefinitionResponse::Scalar(location)) = response else {
        panic!("expected a single location");
    };
    assert_eq!(location.uri, uri());
    assert_eq!(
        location.range,
        Range::new(Position::new(1, 5), Position::new(1, 9))
    );
}

#[tokio::test]
async fn test_goto_definition_across_modules() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("geo")).unwrap();
    let module = dir.path().join("geo").join("shapes.tl");
    fs::write(&module, "class Square:\n    var side: Float = 1.0\nend").unwrap();
    fs::write(dir.path().join("tl.toml"), "[package]\nname = \"geo\"\n").unwrap();

    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    let root = Url::from_file_path(dir.path()).unwrap();
    server.initialize(init_params(Some(root), None)).await.unwrap();

    let main = Url::from_file_path(dir.path().join("main.tl")).unwrap();
    open(server, main.clone(), "from geo.shapes import Square\nvar s = Square()").await;

    let response = server
        .goto_definition(GotoDefinitionParams {
            text_document_position_params: position_params(main, 1, 9),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        })
        .await
        .unwrap();

    let Some(GotoDefinitionResponse::Scalar(location)) = response else {
        panic!("expected a single location");
    };
    let expected = Url::from_file_path(fs::canonicalize(&module).unwrap()).unwrap();
    assert_eq!(location.uri, expected);
    assert_eq!(
        location.range,
        Range::new(Position::new(0, 6), Position::new(0, 12))
    );
}

#[tokio::test]
async fn test_document_symbols() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    open(
        server,
        uri(),
        "class Pair:\n    var left = 1\nend\nconst ZERO = 0",
    )
    .await;

    let response = server
        .document_symbol(DocumentSymbolParams {
            text_document: TextDocumentIdentifier { uri: uri() },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        })
        .await
        .unwrap();

    let Some(DocumentSymbolResponse::Nested(symbols)) = response else {
        panic!("expected nested symbols");
    };
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Pair", "ZERO"]);
    assert_eq!(symbols[0].kind, SymbolKind::CLASS);
    assert_eq!(symbols[0].range.end, Position::new(2, 3));
    let children = symbols[0].children.as_ref().unwrap();
    assert_eq!(children[0].name, "left");
    assert_eq!(children[0].kind, SymbolKind::FIELD);
    assert_eq!(symbols[1].kind, SymbolKind::CONSTANT);
}

#[tokio::test]
async fn test_change_then_close() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    open(server, uri(), "var a = 1").await;

    server
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri(),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: AREA.to_string(),
            }],
        })
        .await;

    // Requests see the new text before the debounced analysis runs
    assert!(hover_at(server, uri(), 4, 13).await.is_some());

    server
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri() },
        })
        .await;
    assert!(hover_at(server, uri(), 4, 13).await.is_none());
}

#[tokio::test]
async fn test_project_config_disables_hover() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tl.toml"), "[lsp]\nhover = false\n").unwrap();

    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    let root = Url::from_file_path(dir.path()).unwrap();
    server.initialize(init_params(Some(root), None)).await.unwrap();

    open(server, uri(), AREA).await;
    assert!(hover_at(server, uri(), 4, 13).await.is_none());
}

#[tokio::test]
async fn test_initialization_options_are_accepted() {
    let (service, _socket) = LspService::new(TlLspServer::new);
    let server = service.inner();
    let options = serde_json::json!({ "disabledRules": ["TL8002"], "debounceMs": 10 });
    server
        .initialize(init_params(None, Some(options)))
        .await
        .unwrap();

    open(server, uri(), AREA).await;
    assert!(hover_at(server, uri(), 4, 13).await.is_some());
}
