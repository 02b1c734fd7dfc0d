//! Document state management

use tl_analysis::Document;
use tower_lsp::lsp_types::Url;

/// State of a single open document
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub uri: Url,
    pub text: String,
    pub version: i32,
}

impl DocumentState {
    pub fn new(uri: Url, text: String, version: i32) -> Self {
        Self { uri, text, version }
    }

    /// Replace the text (full sync)
    pub fn update(&mut self, text: String, version: i32) {
        self.text = text;
        self.version = version;
    }

    /// Snapshot handed to the analyzer
    pub fn document(&self) -> Document {
        Document::with_uri(self.uri.as_str(), &self.text)
    }
}
