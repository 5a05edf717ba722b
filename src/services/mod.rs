pub mod css_selectors;
pub mod html_class_attribute;
#[cfg(feature = "completion")]
pub mod html_class_completion;
#[cfg(feature = "completion")]
pub mod stylesheet_documents;
