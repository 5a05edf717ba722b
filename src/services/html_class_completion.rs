use lsp_textdocument::FullTextDocument;
use lsp_types::{CompletionItem, CompletionList, Position, Uri};

use crate::{
    class_completion_types::{
        ClassCompletionServiceOptions, CompletionConfiguration, StylesheetError,
        StylesheetProvider,
    },
    parser::css_parse::parse_stylesheet,
    services::{
        css_selectors::collect_class_selectors, html_class_attribute::is_within_class_attribute,
        stylesheet_documents::FileSystemStylesheetProvider,
    },
    utils::uri::sibling_stylesheet_uri,
};

/// Characters that should trigger a completion request: the quotes opening
/// an attribute value.
pub const TRIGGER_CHARACTERS: [&str; 2] = ["\"", "'"];

pub struct HTMLClassCompletion {
    stylesheet_provider: Box<dyn StylesheetProvider>,
}

impl HTMLClassCompletion {
    pub fn new(options: ClassCompletionServiceOptions) -> HTMLClassCompletion {
        HTMLClassCompletion {
            stylesheet_provider: options
                .stylesheet_provider
                .unwrap_or_else(|| Box::new(FileSystemStylesheetProvider)),
        }
    }

    /// Class names from the sibling stylesheet when `position` is inside a
    /// `class` attribute value, otherwise an empty list. The stylesheet is
    /// only loaded in the first case. Names are neither filtered nor ranked.
    pub async fn do_complete(
        &self,
        document: &FullTextDocument,
        uri: &Uri,
        position: &Position,
        settings: Option<&CompletionConfiguration>,
    ) -> CompletionList {
        let mut result = CompletionList::default();

        let text = document.get_content(None);
        let offset = document.offset_at(*position) as usize;
        if !is_within_class_attribute(text, offset) {
            tracing::trace!(
                target: "class_completion",
                uri = uri.as_str(),
                offset,
                "not inside a class attribute"
            );
            return result;
        }

        let default_settings = CompletionConfiguration::default();
        let settings = settings.unwrap_or(&default_settings);

        let stylesheet = match self.open_sibling_stylesheet(uri, settings).await {
            Ok(stylesheet) => stylesheet,
            Err(err) => {
                tracing::debug!(
                    target: "class_completion",
                    uri = uri.as_str(),
                    error = %err,
                    "no stylesheet to complete from"
                );
                return result;
            }
        };

        let root = parse_stylesheet(stylesheet.get_content(None));
        let names = collect_class_selectors(&root);
        tracing::debug!(
            target: "class_completion",
            uri = uri.as_str(),
            version = stylesheet.version(),
            count = names.len(),
            "collected class selectors"
        );

        result.items = names
            .into_iter()
            .map(|name| CompletionItem {
                label: name,
                kind: Some(settings.item_kind),
                ..Default::default()
            })
            .collect();
        result
    }

    async fn open_sibling_stylesheet(
        &self,
        uri: &Uri,
        settings: &CompletionConfiguration,
    ) -> Result<FullTextDocument, StylesheetError> {
        let stylesheet_uri = sibling_stylesheet_uri(uri, &settings.stylesheet_extension)
            .ok_or_else(|| StylesheetError::InvalidUri(uri.as_str().to_string()))?;
        self.stylesheet_provider
            .open_stylesheet(&stylesheet_uri)
            .await
    }
}
