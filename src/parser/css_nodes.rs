#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Stylesheet,
    Ruleset,
    Selector,
    SimpleSelector,
    SelectorCombinator,
    ElementNameSelector,
    ClassSelector,
    IdentifierSelector,
    AttributeSelector,
    PseudoSelector,
    NestingSelector,
    Declarations,
    Declaration,
    Property,
    Value,
    AtRule,
    /// Produced by error recovery
    Undefined,
}

/// A node of a parsed stylesheet. It borrows the source text it was parsed
/// from, so rendering a node's text never allocates.
#[derive(Debug, Clone, PartialEq)]
pub struct CssNode<'a> {
    pub node_type: NodeType,
    pub offset: usize,
    pub end: usize,
    pub children: Vec<CssNode<'a>>,
    source: &'a str,
}

impl<'a> CssNode<'a> {
    pub fn new(
        node_type: NodeType,
        offset: usize,
        end: usize,
        children: Vec<CssNode<'a>>,
        source: &'a str,
    ) -> CssNode<'a> {
        CssNode {
            node_type,
            offset,
            end,
            children,
            source,
        }
    }

    pub fn length(&self) -> usize {
        self.end - self.offset
    }

    pub fn get_text(&self) -> &'a str {
        self.source.get(self.offset..self.end).unwrap_or_default()
    }

    pub fn first_child(&self) -> Option<&CssNode<'a>> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&CssNode<'a>> {
        self.children.last()
    }
}
