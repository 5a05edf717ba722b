use std::collections::HashSet;

use crate::parser::css_nodes::{CssNode, NodeType};

/// The view of a stylesheet syntax tree the selector walk needs.
pub trait StylesheetNode {
    type Kind: PartialEq;

    fn kind(&self) -> Self::Kind;

    /// Source text the node was parsed from
    fn text(&self) -> &str;

    fn children(&self) -> &[Self]
    where
        Self: Sized;
}

impl<'a> StylesheetNode for CssNode<'a> {
    type Kind = NodeType;

    fn kind(&self) -> NodeType {
        self.node_type
    }

    fn text(&self) -> &str {
        self.get_text()
    }

    fn children(&self) -> &[CssNode<'a>] {
        &self.children
    }
}

impl<'a> CssNode<'a> {
    /// Visits this node and its descendants in pre-order. Children of a node
    /// are visited only when `visitor` returned `true` for it.
    pub fn accept<F>(&self, visitor: F)
    where
        F: FnMut(&CssNode<'a>) -> bool,
    {
        accept(self, visitor);
    }
}

/// Pre-order walk over `root`. The visitor's return value decides whether
/// the children of the visited node are walked.
pub fn accept<N, F>(root: &N, mut visitor: F)
where
    N: StylesheetNode,
    F: FnMut(&N) -> bool,
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if visitor(node) {
            stack.extend(node.children().iter().rev());
        }
    }
}

/// Collects the text of every node accepted by `is_match`, minus the leading
/// marker character (`.` for classes).
pub fn collect_selector_names<N, F>(root: &N, is_match: F) -> HashSet<String>
where
    N: StylesheetNode,
    F: Fn(&N) -> bool,
{
    let mut names = HashSet::new();
    accept(root, |node| {
        if is_match(node) {
            let text = node.text();
            let mut chars = text.chars();
            if chars.next().is_some() {
                names.insert(chars.as_str().to_string());
            }
        }
        // class selectors also live inside compound and pseudo selectors
        true
    });
    names
}

/// Distinct class names used as selectors anywhere in the stylesheet.
pub fn collect_class_selectors(stylesheet: &CssNode) -> HashSet<String> {
    collect_selector_names(stylesheet, |node| {
        node.kind() == NodeType::ClassSelector
    })
}
