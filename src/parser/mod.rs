pub mod css_nodes;
pub mod css_parse;
pub mod css_scanner;
pub mod html_scanner;
