use super::{
    css_nodes::{CssNode, NodeType},
    css_scanner::{Scanner, TokenType},
};

/// At-rules whose block holds rules rather than declarations
const RULE_LIST_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "document",
    "-moz-document",
    "layer",
    "container",
    "scope",
    "starting-style",
];

/// Functional pseudo-classes taking a selector list
const SELECTOR_LIST_PSEUDOS: &[&str] = &[
    "not",
    "is",
    "where",
    "has",
    "matches",
    "-webkit-any",
    "-moz-any",
    "host",
    "host-context",
    "slotted",
    "global",
    "local",
];

/// Parses `text` into a syntax tree rooted at a [`NodeType::Stylesheet`] node.
///
/// Never fails. Input the grammar does not understand ends up in
/// [`NodeType::Undefined`] nodes and parsing resumes at the next `;`, block or
/// closing brace.
pub fn parse_stylesheet(text: &str) -> CssNode<'_> {
    CssParser::new(text).parse_stylesheet()
}

#[derive(Debug, Clone, Copy)]
struct Token {
    token_type: TokenType,
    offset: usize,
    end: usize,
}

struct CssParser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    index: usize,
}

impl<'a> CssParser<'a> {
    fn new(source: &'a str) -> CssParser<'a> {
        let mut scanner = Scanner::new(source);
        let mut tokens = vec![];
        loop {
            let token_type = scanner.scan();
            if matches!(token_type, TokenType::Whitespace | TokenType::Comment) {
                continue;
            }
            tokens.push(Token {
                token_type,
                offset: scanner.get_token_offset(),
                end: scanner.get_token_end(),
            });
            if token_type == TokenType::EOF {
                break;
            }
        }
        CssParser {
            source,
            tokens,
            index: 0,
        }
    }

    fn parse_stylesheet(&mut self) -> CssNode<'a> {
        let children = self.parse_rules(false);
        CssNode::new(
            NodeType::Stylesheet,
            0,
            self.source.len(),
            children,
            self.source,
        )
    }

    /// Top level (`nested == false`) consumes stray closing braces as
    /// undefined nodes, nested lists stop at them.
    fn parse_rules(&mut self, nested: bool) -> Vec<CssNode<'a>> {
        let mut children = vec![];
        loop {
            match self.peek() {
                TokenType::EOF => break,
                TokenType::CurlyR if nested => break,
                TokenType::CDO | TokenType::CDC | TokenType::SemiColon => {
                    self.consume();
                }
                TokenType::AtKeyword => children.push(self.parse_at_rule()),
                TokenType::CurlyR | TokenType::ParenthesisR | TokenType::BracketR => {
                    let token = self.consume();
                    children.push(self.token_node(NodeType::Undefined, token));
                }
                _ => children.push(self.parse_ruleset()),
            }
        }
        children
    }

    fn parse_at_rule(&mut self) -> CssNode<'a> {
        let start = self.offset();
        let keyword = self.consume();
        let name = self.source[keyword.offset + 1..keyword.end].to_ascii_lowercase();
        let mut children = vec![];
        loop {
            match self.peek() {
                TokenType::EOF | TokenType::CurlyR => break,
                TokenType::SemiColon => {
                    self.consume();
                    break;
                }
                TokenType::CurlyL => {
                    if RULE_LIST_AT_RULES.contains(&name.as_str()) {
                        self.consume();
                        children = self.parse_rules(true);
                        self.consume_if(TokenType::CurlyR);
                    } else {
                        children.push(self.parse_declarations());
                    }
                    break;
                }
                TokenType::ParenthesisL | TokenType::Function => {
                    self.consume();
                    self.skip_until_close(TokenType::ParenthesisR);
                }
                TokenType::BracketL => {
                    self.consume();
                    self.skip_until_close(TokenType::BracketR);
                }
                _ => {
                    self.consume();
                }
            }
        }
        self.finish(NodeType::AtRule, start, children)
    }

    fn parse_ruleset(&mut self) -> CssNode<'a> {
        let start = self.offset();
        let mut children = self.parse_selector_list();
        if self.peek() == TokenType::CurlyL {
            children.push(self.parse_declarations());
            return self.finish(NodeType::Ruleset, start, children);
        }
        self.recover();
        self.finish(NodeType::Undefined, start, children)
    }

    fn parse_selector_list(&mut self) -> Vec<CssNode<'a>> {
        let mut selectors = vec![];
        loop {
            if let Some(selector) = self.parse_selector() {
                selectors.push(selector);
            }
            if !self.consume_if(TokenType::Comma) {
                break;
            }
        }
        selectors
    }

    fn parse_selector(&mut self) -> Option<CssNode<'a>> {
        let start = self.offset();
        let mut children = vec![];
        loop {
            if let Some(simple) = self.parse_simple_selector() {
                children.push(simple);
            } else if let Some(combinator) = self.parse_combinator() {
                children.push(combinator);
            } else {
                break;
            }
        }
        if children.is_empty() {
            None
        } else {
            Some(self.finish(NodeType::Selector, start, children))
        }
    }

    /// A compound selector: parts written without whitespace between them.
    fn parse_simple_selector(&mut self) -> Option<CssNode<'a>> {
        let start = self.offset();
        let mut children = vec![];
        loop {
            if !children.is_empty() && self.has_whitespace() {
                break;
            }
            let part = match self.peek() {
                TokenType::Delim if self.peek_delim('.') => self.parse_class_selector(),
                TokenType::Delim if self.peek_delim('&') => {
                    let token = self.consume();
                    self.token_node(NodeType::NestingSelector, token)
                }
                TokenType::Delim if self.peek_delim('*') => {
                    let token = self.consume();
                    self.token_node(NodeType::ElementNameSelector, token)
                }
                TokenType::Ident => {
                    let token = self.consume();
                    self.token_node(NodeType::ElementNameSelector, token)
                }
                TokenType::Hash => {
                    let token = self.consume();
                    self.token_node(NodeType::IdentifierSelector, token)
                }
                TokenType::BracketL => {
                    let part_start = self.offset();
                    self.consume();
                    self.skip_until_close(TokenType::BracketR);
                    self.finish(NodeType::AttributeSelector, part_start, vec![])
                }
                TokenType::Colon => self.parse_pseudo_selector(),
                _ => break,
            };
            children.push(part);
        }
        if children.is_empty() {
            None
        } else {
            Some(self.finish(NodeType::SimpleSelector, start, children))
        }
    }

    fn parse_class_selector(&mut self) -> CssNode<'a> {
        let start = self.offset();
        self.consume();
        if self.peek() == TokenType::Ident && !self.has_whitespace() {
            self.consume();
            return self.finish(NodeType::ClassSelector, start, vec![]);
        }
        self.finish(NodeType::Undefined, start, vec![])
    }

    fn parse_pseudo_selector(&mut self) -> CssNode<'a> {
        let start = self.offset();
        self.consume();
        if self.peek() == TokenType::Colon && !self.has_whitespace() {
            self.consume();
        }
        if self.has_whitespace() {
            return self.finish(NodeType::Undefined, start, vec![]);
        }
        match self.peek() {
            TokenType::Ident => {
                self.consume();
                self.finish(NodeType::PseudoSelector, start, vec![])
            }
            TokenType::Function => {
                let function = self.consume();
                let name = self.source[function.offset..function.end - 1].to_ascii_lowercase();
                let mut children = vec![];
                if SELECTOR_LIST_PSEUDOS.contains(&name.as_str()) {
                    children = self.parse_selector_list();
                }
                self.skip_until_close(TokenType::ParenthesisR);
                self.finish(NodeType::PseudoSelector, start, children)
            }
            _ => self.finish(NodeType::Undefined, start, vec![]),
        }
    }

    fn parse_combinator(&mut self) -> Option<CssNode<'a>> {
        if self.peek_delim('>') || self.peek_delim('+') || self.peek_delim('~') {
            let token = self.consume();
            return Some(self.token_node(NodeType::SelectorCombinator, token));
        }
        None
    }

    /// Parses `{ ... }`. Items are declarations, nested rules or at-rules.
    fn parse_declarations(&mut self) -> CssNode<'a> {
        let start = self.offset();
        self.consume();
        let mut children = vec![];
        loop {
            match self.peek() {
                TokenType::EOF => break,
                TokenType::CurlyR => {
                    self.consume();
                    break;
                }
                TokenType::SemiColon => {
                    self.consume();
                }
                TokenType::AtKeyword => children.push(self.parse_at_rule()),
                TokenType::Ident if self.peek_at(1) == TokenType::Colon => {
                    let mark = self.index;
                    match self.parse_declaration() {
                        Some(declaration) => children.push(declaration),
                        None => {
                            // `a:hover { ... }` is a nested rule
                            self.index = mark;
                            children.push(self.parse_ruleset());
                        }
                    }
                }
                _ => children.push(self.parse_ruleset()),
            }
        }
        self.finish(NodeType::Declarations, start, children)
    }

    /// Returns `None` when a block opens inside the value, which means the
    /// tokens were a nested rule.
    fn parse_declaration(&mut self) -> Option<CssNode<'a>> {
        let start = self.offset();
        let property_token = self.consume();
        let property = self.token_node(NodeType::Property, property_token);
        let is_custom_property = self.source[property_token.offset..].starts_with("--");
        self.consume();

        let value_start = self.offset();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenType::EOF => break,
                TokenType::SemiColon | TokenType::CurlyR if depth == 0 => break,
                TokenType::CurlyL if depth == 0 && !is_custom_property => return None,
                TokenType::ParenthesisL
                | TokenType::Function
                | TokenType::BracketL
                | TokenType::CurlyL => {
                    depth += 1;
                    self.consume();
                }
                TokenType::ParenthesisR | TokenType::BracketR | TokenType::CurlyR => {
                    depth = depth.saturating_sub(1);
                    self.consume();
                }
                _ => {
                    self.consume();
                }
            }
        }
        let value = self.finish(NodeType::Value, value_start, vec![]);
        Some(self.finish(NodeType::Declaration, start, vec![property, value]))
    }

    /// Skips the rest of a broken rule: up to and including a `;` or a
    /// balanced block, or up to (not including) a closing brace.
    fn recover(&mut self) {
        loop {
            match self.peek() {
                TokenType::EOF | TokenType::CurlyR => break,
                TokenType::SemiColon => {
                    self.consume();
                    break;
                }
                TokenType::CurlyL => {
                    self.consume();
                    self.skip_until_close(TokenType::CurlyR);
                    break;
                }
                _ => {
                    self.consume();
                }
            }
        }
    }

    /// Consumes tokens up to and including the `close` matching an already
    /// consumed opener. A mismatched closer at depth zero is left in place.
    fn skip_until_close(&mut self, close: TokenType) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenType::EOF => break,
                TokenType::ParenthesisR | TokenType::BracketR | TokenType::CurlyR
                    if depth == 0 =>
                {
                    if self.peek() == close {
                        self.consume();
                    }
                    break;
                }
                TokenType::ParenthesisL
                | TokenType::Function
                | TokenType::BracketL
                | TokenType::CurlyL => {
                    depth += 1;
                    self.consume();
                }
                TokenType::ParenthesisR | TokenType::BracketR | TokenType::CurlyR => {
                    depth -= 1;
                    self.consume();
                }
                _ => {
                    self.consume();
                }
            }
        }
    }

    fn peek(&self) -> TokenType {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> TokenType {
        self.tokens
            .get(self.index + n)
            .map_or(TokenType::EOF, |t| t.token_type)
    }

    fn peek_delim(&self, ch: char) -> bool {
        self.tokens.get(self.index).is_some_and(|t| {
            t.token_type == TokenType::Delim && self.source[t.offset..t.end].starts_with(ch)
        })
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.index)
            .map_or(self.source.len(), |t| t.offset)
    }

    fn prev_end(&self) -> usize {
        if self.index == 0 {
            0
        } else {
            self.tokens[self.index - 1].end
        }
    }

    fn has_whitespace(&self) -> bool {
        self.index > 0 && self.prev_end() < self.offset()
    }

    /// Never moves past the trailing EOF token.
    fn consume(&mut self) -> Token {
        let token = self.tokens[self.index];
        if token.token_type != TokenType::EOF {
            self.index += 1;
        }
        token
    }

    fn consume_if(&mut self, token_type: TokenType) -> bool {
        if self.peek() == token_type {
            self.consume();
            true
        } else {
            false
        }
    }

    fn token_node(&self, node_type: NodeType, token: Token) -> CssNode<'a> {
        CssNode::new(node_type, token.offset, token.end, vec![], self.source)
    }

    fn finish(&self, node_type: NodeType, start: usize, children: Vec<CssNode<'a>>) -> CssNode<'a> {
        let end = self.prev_end().max(start);
        CssNode::new(node_type, start, end, children, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(node: &CssNode) -> Vec<NodeType> {
        node.children.iter().map(|c| c.node_type).collect()
    }

    #[test]
    fn ruleset_structure() {
        let sheet = parse_stylesheet(".a.b > p { color: red; }");
        assert_eq!(kinds(&sheet), vec![NodeType::Ruleset]);
        let ruleset = &sheet.children[0];
        assert_eq!(kinds(ruleset), vec![NodeType::Selector, NodeType::Declarations]);
        let selector = &ruleset.children[0];
        assert_eq!(selector.get_text(), ".a.b > p");
        assert_eq!(
            kinds(selector),
            vec![
                NodeType::SimpleSelector,
                NodeType::SelectorCombinator,
                NodeType::SimpleSelector
            ]
        );
        let compound = &selector.children[0];
        assert_eq!(
            kinds(compound),
            vec![NodeType::ClassSelector, NodeType::ClassSelector]
        );
        assert_eq!(compound.children[0].get_text(), ".a");
        assert_eq!(compound.children[1].get_text(), ".b");

        let declarations = &ruleset.children[1];
        assert_eq!(declarations.get_text(), "{ color: red; }");
        assert_eq!(declarations.length(), "{ color: red; }".len());
        let declaration = &declarations.children[0];
        assert_eq!(declaration.node_type, NodeType::Declaration);
        assert_eq!(declaration.first_child().map(|c| c.get_text()), Some("color"));
        assert_eq!(declaration.last_child().map(|c| c.get_text()), Some("red"));
    }

    #[test]
    fn descendant_selectors_split_on_whitespace() {
        let sheet = parse_stylesheet(".a .b{}");
        let selector = &sheet.children[0].children[0];
        assert_eq!(
            kinds(selector),
            vec![NodeType::SimpleSelector, NodeType::SimpleSelector]
        );
    }

    #[test]
    fn selector_list_and_pseudo() {
        let sheet = parse_stylesheet("a:hover, li:not(.done)::before {}");
        let ruleset = &sheet.children[0];
        assert_eq!(
            kinds(ruleset),
            vec![NodeType::Selector, NodeType::Selector, NodeType::Declarations]
        );
        let compound = &ruleset.children[1].children[0];
        assert_eq!(
            kinds(compound),
            vec![
                NodeType::ElementNameSelector,
                NodeType::PseudoSelector,
                NodeType::PseudoSelector
            ]
        );
        let not = &compound.children[1];
        assert_eq!(not.get_text(), ":not(.done)");
        assert_eq!(kinds(not), vec![NodeType::Selector]);
    }

    #[test]
    fn media_block_holds_rules() {
        let sheet = parse_stylesheet("@media (max-width: 600px) { .a { top: 0 } }\n.b{}");
        assert_eq!(kinds(&sheet), vec![NodeType::AtRule, NodeType::Ruleset]);
        assert_eq!(kinds(&sheet.children[0]), vec![NodeType::Ruleset]);
    }

    #[test]
    fn nested_rules_in_declarations() {
        let sheet = parse_stylesheet(".card { color: red; &:hover { color: blue } a:focus { } }");
        let declarations = &sheet.children[0].children[1];
        assert_eq!(
            kinds(declarations),
            vec![NodeType::Declaration, NodeType::Ruleset, NodeType::Ruleset]
        );
    }

    #[test]
    fn statement_at_rules() {
        let sheet = parse_stylesheet("@import url(a.css);@charset \"utf-8\";.x{}");
        assert_eq!(
            kinds(&sheet),
            vec![NodeType::AtRule, NodeType::AtRule, NodeType::Ruleset]
        );
        assert_eq!(sheet.children[0].get_text(), "@import url(a.css);");
    }

    #[test]
    fn recovers_from_garbage() {
        let sheet = parse_stylesheet("} .a { color: red; } ) .b { }");
        assert_eq!(
            kinds(&sheet),
            vec![
                NodeType::Undefined,
                NodeType::Ruleset,
                NodeType::Undefined,
                NodeType::Ruleset
            ]
        );
    }

    #[test]
    fn unterminated_rule_at_end() {
        let sheet = parse_stylesheet(".a { color: red");
        assert_eq!(kinds(&sheet), vec![NodeType::Ruleset]);
        assert_eq!(sheet.children[0].end, 15);
    }

    #[test]
    fn empty_input() {
        let sheet = parse_stylesheet("");
        assert_eq!(sheet.node_type, NodeType::Stylesheet);
        assert_eq!(sheet.length(), 0);
        assert!(sheet.first_child().is_none());
    }
}
