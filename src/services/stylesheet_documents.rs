use std::collections::HashMap;

use async_trait::async_trait;
use lsp_textdocument::FullTextDocument;
use lsp_types::Uri;
use tokio::sync::RwLock;

use crate::{
    class_completion_types::{StylesheetError, StylesheetProvider},
    utils::uri::file_path_from_uri,
};

const CSS_LANGUAGE_ID: &str = "css";

/// Reads `file:` stylesheets from disk on every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemStylesheetProvider;

#[async_trait]
impl StylesheetProvider for FileSystemStylesheetProvider {
    async fn open_stylesheet(&self, uri: &Uri) -> Result<FullTextDocument, StylesheetError> {
        let path = file_path_from_uri(uri)
            .ok_or_else(|| StylesheetError::UnsupportedScheme(uri.as_str().to_string()))?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StylesheetError::NotFound(path.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(FullTextDocument::new(CSS_LANGUAGE_ID.to_string(), 0, content))
    }
}

/// Stylesheets currently open in the editor, with their versions.
///
/// Unsaved edits win over what is on disk: a uri that is not open is handed
/// to the fallback provider, if any.
#[derive(Default)]
pub struct OpenStylesheets {
    documents: RwLock<HashMap<String, (i32, String)>>,
    fallback: Option<Box<dyn StylesheetProvider>>,
}

impl OpenStylesheets {
    pub fn new(fallback: Option<Box<dyn StylesheetProvider>>) -> OpenStylesheets {
        OpenStylesheets {
            documents: RwLock::new(HashMap::new()),
            fallback,
        }
    }

    /// Opens or replaces a document. Older versions than the stored one are ignored.
    pub async fn open(&self, uri: &Uri, version: i32, content: String) {
        let mut documents = self.documents.write().await;
        match documents.get(uri.as_str()) {
            Some((current, _)) if *current > version => {
                tracing::debug!(
                    target: "class_completion",
                    uri = uri.as_str(),
                    current = *current,
                    version,
                    "ignoring stale stylesheet version"
                );
            }
            _ => {
                documents.insert(uri.as_str().to_string(), (version, content));
            }
        }
    }

    pub async fn close(&self, uri: &Uri) {
        self.documents.write().await.remove(uri.as_str());
    }

    pub async fn version(&self, uri: &Uri) -> Option<i32> {
        self.documents
            .read()
            .await
            .get(uri.as_str())
            .map(|(version, _)| *version)
    }
}

#[async_trait]
impl StylesheetProvider for OpenStylesheets {
    async fn open_stylesheet(&self, uri: &Uri) -> Result<FullTextDocument, StylesheetError> {
        if let Some((version, content)) = self.documents.read().await.get(uri.as_str()) {
            return Ok(FullTextDocument::new(
                CSS_LANGUAGE_ID.to_string(),
                *version,
                content.clone(),
            ));
        }
        match &self.fallback {
            Some(fallback) => fallback.open_stylesheet(uri).await,
            None => Err(StylesheetError::NotFound(uri.as_str().to_string())),
        }
    }
}
