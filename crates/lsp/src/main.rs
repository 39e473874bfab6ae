use std::collections::HashMap;
use std::sync::RwLock;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::info;

mod completion;
mod diagnostics;
mod symbols;

/// Parsed state for a single open document, re-derived on every
/// `did_open`/`did_change` (the language has no incremental parse; spec §4.3
/// always re-parses a whole unit from source).
struct DocumentState {
    ast: quad_core::Ast,
}

struct QuadrateLanguageServer {
    client: Client,
    documents: RwLock<HashMap<Url, DocumentState>>,
}

impl QuadrateLanguageServer {
    fn new(client: Client) -> Self {
        Self {
            client,
            documents: RwLock::new(HashMap::new()),
        }
    }

    async fn publish_diagnostics_for(&self, uri: Url, source: &str) {
        let (ast, diags) = diagnostics::check_document(source);

        if let Ok(mut docs) = self.documents.write() {
            docs.insert(uri.clone(), DocumentState { ast });
        }

        self.client.publish_diagnostics(uri, diags, None).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for QuadrateLanguageServer {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        info!("Quadrate LSP server initializing");

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![" ".to_string(), "\n".to_string()]),
                    ..Default::default()
                }),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "quad-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Quadrate LSP server initialized");
        self.client
            .log_message(MessageType::INFO, "Quadrate LSP server ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Quadrate LSP server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Document opened: {}", uri);
        self.publish_diagnostics_for(uri, &params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(change) = params.content_changes.into_iter().next() {
            info!("Document changed: {}", uri);
            self.publish_diagnostics_for(uri, &change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        info!("Document closed: {}", uri);
        if let Ok(mut docs) = self.documents.write() {
            docs.remove(&uri);
        }
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let items = if let Ok(docs) = self.documents.read() {
            docs.get(&uri)
                .map(|state| completion::completions(&state.ast))
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let symbols = if let Ok(docs) = self.documents.read() {
            docs.get(&uri)
                .map(|state| symbols::document_symbols(&state.ast))
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quad_lsp=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Quadrate LSP server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(QuadrateLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
