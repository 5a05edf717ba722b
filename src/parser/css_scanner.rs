use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref REG_IDENT: Regex = Regex::new(
        r"^(?:--|-?(?:[_a-zA-Z]|[^\x00-\x7F]|\\[^\r\n\f]))(?:[_a-zA-Z0-9-]|[^\x00-\x7F]|\\[^\r\n\f])*"
    )
    .unwrap();
    static ref REG_NAME: Regex =
        Regex::new(r"^(?:[_a-zA-Z0-9-]|[^\x00-\x7F]|\\[^\r\n\f])+").unwrap();
    static ref REG_NUM: Regex =
        Regex::new(r"^[+-]?(?:[0-9]*\.[0-9]+|[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap();
}

/// CSS tokenizer.
///
/// Works like the HTML scanner: [`Scanner::scan`] advances to the next token
/// and the accessors describe that token. Whitespace and comments are
/// reported as tokens too, callers decide whether to keep them.
pub struct Scanner<'a> {
    source: &'a str,
    position: usize,
    token_type: TokenType,
    token_offset: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Scanner<'a> {
        Scanner {
            source: input,
            position: 0,
            token_type: TokenType::Unknown,
            token_offset: 0,
        }
    }

    pub fn scan(&mut self) -> TokenType {
        let offset = self.position;
        let token_type = self.internal_scan();
        self.token_offset = offset;
        self.token_type = token_type;
        token_type
    }

    pub fn get_token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn get_token_offset(&self) -> usize {
        self.token_offset
    }

    pub fn get_token_end(&self) -> usize {
        self.position
    }

    pub fn get_token_text(&self) -> &'a str {
        &self.source[self.token_offset..self.position]
    }

    fn internal_scan(&mut self) -> TokenType {
        let Some(ch) = self.peek() else {
            return TokenType::EOF;
        };

        if matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C') {
            self.advance_while(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C'));
            return TokenType::Whitespace;
        }
        if self.advance_if_str("/*") {
            match self.rest().find("*/") {
                Some(i) => self.position += i + 2,
                None => self.position = self.source.len(),
            }
            return TokenType::Comment;
        }
        if ch == '"' || ch == '\'' {
            return self.string(ch);
        }
        if self.advance_if_str("<!--") {
            return TokenType::CDO;
        }
        if self.advance_if_str("-->") {
            return TokenType::CDC;
        }
        if ch == '@' {
            self.position += 1;
            if self.advance_if_regexp(&REG_IDENT) {
                return TokenType::AtKeyword;
            }
            return TokenType::Delim;
        }
        if ch == '#' {
            self.position += 1;
            if self.advance_if_regexp(&REG_NAME) {
                return TokenType::Hash;
            }
            return TokenType::Delim;
        }
        let ident_start = self.position;
        if self.advance_if_regexp(&REG_IDENT) {
            if self.advance_if_str("(") {
                if self.source[ident_start..self.position].eq_ignore_ascii_case("url(") {
                    return self.url();
                }
                return TokenType::Function;
            }
            return TokenType::Ident;
        }
        if self.advance_if_regexp(&REG_NUM) {
            if self.advance_if_str("%") {
                return TokenType::Percentage;
            }
            if self.advance_if_regexp(&REG_IDENT) {
                return TokenType::Dimension;
            }
            return TokenType::Num;
        }

        self.position += ch.len_utf8();
        match ch {
            '{' => TokenType::CurlyL,
            '}' => TokenType::CurlyR,
            '(' => TokenType::ParenthesisL,
            ')' => TokenType::ParenthesisR,
            '[' => TokenType::BracketL,
            ']' => TokenType::BracketR,
            ':' => TokenType::Colon,
            ';' => TokenType::SemiColon,
            ',' => TokenType::Comma,
            _ => TokenType::Delim,
        }
    }

    fn string(&mut self, quote: char) -> TokenType {
        self.position += 1;
        while let Some(ch) = self.peek() {
            match ch {
                '\\' => {
                    self.position += 1;
                    if let Some(escaped) = self.peek() {
                        self.position += escaped.len_utf8();
                    }
                }
                '\n' | '\r' | '\x0C' => return TokenType::BadString,
                _ => {
                    self.position += ch.len_utf8();
                    if ch == quote {
                        return TokenType::String;
                    }
                }
            }
        }
        TokenType::BadString
    }

    /// Called after `url(`. Quoted urls are left to the regular tokens.
    fn url(&mut self) -> TokenType {
        let after_paren = self.position;
        self.advance_while(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C'));
        if matches!(self.peek(), Some('"') | Some('\'')) {
            self.position = after_paren;
            return TokenType::Function;
        }
        while let Some(ch) = self.peek() {
            self.position += ch.len_utf8();
            match ch {
                ')' => return TokenType::Url,
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        self.position += escaped.len_utf8();
                    }
                }
                _ => {}
            }
        }
        TokenType::Url
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance_if_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.position += s.len();
            true
        } else {
            false
        }
    }

    fn advance_if_regexp(&mut self, regexp: &Regex) -> bool {
        match regexp.find(self.rest()) {
            Some(m) if m.start() == 0 && !m.is_empty() => {
                self.position += m.end();
                true
            }
            _ => false,
        }
    }

    fn advance_while<F>(&mut self, condition: F)
    where
        F: Fn(char) -> bool,
    {
        let n: usize = self
            .rest()
            .chars()
            .take_while(|c| condition(*c))
            .map(char::len_utf8)
            .sum();
        self.position += n;
    }
}

#[derive(PartialEq, Debug, Copy, Clone)]
pub enum TokenType {
    Ident,
    AtKeyword,
    String,
    BadString,
    Hash,
    Num,
    Percentage,
    Dimension,
    Function,
    Url,
    CDO,
    CDC,
    Colon,
    SemiColon,
    Comma,
    CurlyL,
    CurlyR,
    ParenthesisL,
    ParenthesisR,
    BracketL,
    BracketR,
    Delim,
    Whitespace,
    Comment,
    Unknown,
    EOF,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<(TokenType, &str)> {
        let mut scanner = Scanner::new(input);
        let mut result = vec![];
        let mut token_type = scanner.scan();
        while token_type != TokenType::EOF {
            if token_type != TokenType::Whitespace {
                result.push((token_type, scanner.get_token_text()));
            }
            token_type = scanner.scan();
        }
        result
    }

    #[test]
    fn class_selector_tokens() {
        assert_eq!(
            tokens(".foo.bar-baz{}"),
            vec![
                (TokenType::Delim, "."),
                (TokenType::Ident, "foo"),
                (TokenType::Delim, "."),
                (TokenType::Ident, "bar-baz"),
                (TokenType::CurlyL, "{"),
                (TokenType::CurlyR, "}"),
            ]
        );
    }

    #[test]
    fn escaped_ident() {
        assert_eq!(
            tokens(r".sm\:flex"),
            vec![(TokenType::Delim, "."), (TokenType::Ident, r"sm\:flex")]
        );
    }

    #[test]
    fn numbers_and_dimensions() {
        assert_eq!(
            tokens("1px .5em 50% -2"),
            vec![
                (TokenType::Dimension, "1px"),
                (TokenType::Dimension, ".5em"),
                (TokenType::Percentage, "50%"),
                (TokenType::Num, "-2"),
            ]
        );
    }

    #[test]
    fn strings_comments_and_urls() {
        assert_eq!(
            tokens(r#"/* .a */ ".b" url(x.css?a;b) url("c.css")"#),
            vec![
                (TokenType::Comment, "/* .a */"),
                (TokenType::String, r#"".b""#),
                (TokenType::Url, "url(x.css?a;b)"),
                (TokenType::Function, "url("),
                (TokenType::String, r#""c.css""#),
                (TokenType::ParenthesisR, ")"),
            ]
        );
    }

    #[test]
    fn at_keyword_hash_and_cdc() {
        assert_eq!(
            tokens("@media #main --x -->"),
            vec![
                (TokenType::AtKeyword, "@media"),
                (TokenType::Hash, "#main"),
                (TokenType::Ident, "--x"),
                (TokenType::CDC, "-->"),
            ]
        );
    }

    #[test]
    fn unterminated_input() {
        assert_eq!(tokens("'abc"), vec![(TokenType::BadString, "'abc")]);
        assert_eq!(tokens("/* open"), vec![(TokenType::Comment, "/* open")]);
    }
}
