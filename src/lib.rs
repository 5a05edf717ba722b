//! Completion of CSS class names inside HTML `class` attribute values.
//!
//! The two building blocks are usable on their own:
//! [`is_within_class_attribute`] decides from the markup alone whether the
//! cursor is inside a `class` value, and [`collect_class_selectors`] lists
//! the class selectors of a parsed stylesheet. [`ClassCompletionService`]
//! combines them with a [`StylesheetProvider`] into LSP completion lists.

#[cfg(feature = "completion")]
mod class_completion_types;
pub mod parser;
pub mod services;
#[cfg(feature = "completion")]
mod utils;

#[cfg(feature = "completion")]
pub use class_completion_types::*;
pub use parser::css_parse::parse_stylesheet;
pub use services::css_selectors::{collect_class_selectors, collect_selector_names};
pub use services::html_class_attribute::is_within_class_attribute;
#[cfg(feature = "completion")]
pub use services::html_class_completion::TRIGGER_CHARACTERS;
#[cfg(feature = "completion")]
pub use services::stylesheet_documents::{FileSystemStylesheetProvider, OpenStylesheets};
#[cfg(feature = "completion")]
pub use utils::uri::sibling_stylesheet_uri;

use std::collections::HashSet;

#[cfg(feature = "completion")]
use lsp_textdocument::FullTextDocument;
#[cfg(feature = "completion")]
use lsp_types::{CompletionList, Position, Uri};
use parser::css_nodes::CssNode;
use parser::html_scanner::{Scanner, ScannerState};
#[cfg(feature = "completion")]
use services::html_class_completion::HTMLClassCompletion;

pub struct ClassCompletionService {
    #[cfg(feature = "completion")]
    class_completion: HTMLClassCompletion,
}

impl ClassCompletionService {
    #[cfg(feature = "completion")]
    pub fn new(options: ClassCompletionServiceOptions) -> ClassCompletionService {
        ClassCompletionService {
            class_completion: HTMLClassCompletion::new(options),
        }
    }

    pub fn create_scanner(input: &str, initial_offset: usize) -> Scanner<'_> {
        Scanner::new(input, initial_offset, ScannerState::WithinContent)
    }

    pub fn is_within_class_attribute(text: &str, offset: usize) -> bool {
        is_within_class_attribute(text, offset)
    }

    pub fn parse_stylesheet(text: &str) -> CssNode<'_> {
        parse_stylesheet(text)
    }

    pub fn find_class_selectors(stylesheet: &CssNode) -> HashSet<String> {
        collect_class_selectors(stylesheet)
    }

    #[cfg(feature = "completion")]
    pub async fn do_complete(
        &self,
        document: &FullTextDocument,
        uri: &Uri,
        position: &Position,
        settings: Option<&CompletionConfiguration>,
    ) -> CompletionList {
        self.class_completion
            .do_complete(document, uri, position, settings)
            .await
    }
}
