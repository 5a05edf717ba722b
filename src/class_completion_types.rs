use async_trait::async_trait;
use lsp_textdocument::FullTextDocument;
use lsp_types::{CompletionItemKind, Uri};
use serde::{Deserialize, Serialize};

#[derive(Default)]
pub struct ClassCompletionServiceOptions {
    /**
     * Where sibling stylesheets are loaded from.
     * Defaults to reading `file:` uris from disk.
     */
    pub stylesheet_provider: Option<Box<dyn StylesheetProvider>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfiguration {
    /// Extension swapped in for the markup file's own to find its stylesheet
    pub stylesheet_extension: String,
    /// Presentation kind given to every candidate
    pub item_kind: CompletionItemKind,
}

impl Default for CompletionConfiguration {
    fn default() -> Self {
        CompletionConfiguration {
            stylesheet_extension: "css".to_string(),
            item_kind: CompletionItemKind::COLOR,
        }
    }
}

/// Source of stylesheet text, the editor's open buffers or the file system.
#[async_trait]
pub trait StylesheetProvider: Send + Sync {
    async fn open_stylesheet(&self, uri: &Uri) -> Result<FullTextDocument, StylesheetError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StylesheetError {
    #[error("Cannot derive a stylesheet uri from {0}")]
    InvalidUri(String),
    #[error("Not a local file uri: {0}")]
    UnsupportedScheme(String),
    #[error("Stylesheet not found: {0}")]
    NotFound(String),
    #[error("Failed to read stylesheet: {0}")]
    Io(#[from] std::io::Error),
}
