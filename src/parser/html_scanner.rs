use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref REG_DOCTYPE: Regex = Regex::new(r"^!(?i:doctype)").unwrap();
    static ref REG_ELEMENT_NAME: Regex = Regex::new(r"^[_:\w][_:\w\-.\d]*").unwrap();
    static ref REG_ATTRIBUTE_NAME: Regex =
        Regex::new(r#"^[^\s"'></=\x00-\x0F\x7F\x80-\x9F]*"#).unwrap();
    static ref REG_UNQUOTED_VALUE: Regex = Regex::new(r#"^[^\s"'`=<>]+"#).unwrap();
    static ref REG_SCRIPT_BOUNDARY: Regex = Regex::new(r"<!--|-->|</?script\s*/?>?").unwrap();
    static ref REG_STYLE_END: Regex = Regex::new(r"</style").unwrap();
}

/// Tolerant HTML tokenizer.
///
/// Only the current token is observable: call [`Scanner::scan`] to advance,
/// then read its span with [`Scanner::get_token_offset`] and
/// [`Scanner::get_token_end`]. Offsets are byte offsets into the input.
pub struct Scanner<'a> {
    state: ScannerState,
    token_type: TokenType,
    token_offset: usize,
    token_error: Option<&'static str>,
    stream: MultiLineStream<'a>,

    has_space_after_tag: bool,
    last_tag: Option<String>,
    last_attribute_name: Option<String>,
    last_type_value: Option<String>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str, initial_offset: usize, initial_state: ScannerState) -> Scanner<'a> {
        Scanner {
            state: initial_state,
            token_type: TokenType::Unknown,
            token_offset: 0,
            token_error: None,
            stream: MultiLineStream::new(input, initial_offset),
            has_space_after_tag: false,
            last_tag: None,
            last_attribute_name: None,
            last_type_value: None,
        }
    }

    pub fn scan(&mut self) -> TokenType {
        let offset = self.stream.pos();
        let old_state = self.state;
        self.internal_scan();
        if self.token_type != TokenType::EOS && offset == self.stream.pos() {
            tracing::warn!(
                target: "class_completion",
                offset,
                state_before = ?old_state,
                state_after = ?self.state,
                "html scanner has not advanced"
            );
            self.stream.advance_char();
            return self.finish_token(offset, TokenType::Unknown, None);
        }
        self.token_type
    }

    pub fn get_token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn get_token_offset(&self) -> usize {
        self.token_offset
    }

    pub fn get_token_length(&self) -> usize {
        self.stream.pos() - self.token_offset
    }

    pub fn get_token_end(&self) -> usize {
        self.stream.pos()
    }

    pub fn get_token_text(&self) -> &'a str {
        self.stream.slice(self.token_offset, self.get_token_end())
    }

    pub fn get_scanner_state(&self) -> ScannerState {
        self.state
    }

    pub fn get_token_error(&self) -> Option<&'static str> {
        self.token_error
    }

    fn internal_scan(&mut self) -> TokenType {
        let offset = self.stream.pos();
        if self.stream.eos() {
            return self.finish_token(offset, TokenType::EOS, None);
        }
        let error_message;

        match self.state {
            ScannerState::WithinComment => {
                if self.stream.advance_if_str("-->") {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::EndCommentTag, None);
                }
                self.stream.advance_until_str("-->");
                return self.finish_token(offset, TokenType::Comment, None);
            }

            ScannerState::WithinDoctype => {
                if self.stream.advance_if_char(b'>') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::EndDoctypeTag, None);
                }
                self.stream.advance_until_char(b'>');
                return self.finish_token(offset, TokenType::Doctype, None);
            }

            ScannerState::WithinContent => {
                if self.stream.advance_if_char(b'<') {
                    if self.stream.peek_char(0) == b'!' {
                        if self.stream.advance_if_str("!--") {
                            self.state = ScannerState::WithinComment;
                            return self.finish_token(offset, TokenType::StartCommentTag, None);
                        }
                        if !self.stream.advance_if_regexp(&REG_DOCTYPE).is_empty() {
                            self.state = ScannerState::WithinDoctype;
                            return self.finish_token(offset, TokenType::StartDoctypeTag, None);
                        }
                    }
                    if self.stream.advance_if_char(b'/') {
                        self.state = ScannerState::AfterOpeningEndTag;
                        return self.finish_token(offset, TokenType::EndTagOpen, None);
                    }
                    self.state = ScannerState::AfterOpeningStartTag;
                    return self.finish_token(offset, TokenType::StartTagOpen, None);
                }
                self.stream.advance_until_char(b'<');
                return self.finish_token(offset, TokenType::Content, None);
            }

            ScannerState::AfterOpeningEndTag => {
                if self.next_element_name().is_some() {
                    self.state = ScannerState::WithinEndTag;
                    return self.finish_token(offset, TokenType::EndTag, None);
                }
                if self.stream.skip_whitespace() {
                    return self.finish_token(
                        offset,
                        TokenType::Whitespace,
                        Some("Tag name must directly follow the open bracket."),
                    );
                }
                self.state = ScannerState::WithinEndTag;
                self.stream.advance_until_char(b'>');
                if offset < self.stream.pos() {
                    return self.finish_token(
                        offset,
                        TokenType::Unknown,
                        Some("End tag name expected."),
                    );
                }
                return self.internal_scan();
            }

            ScannerState::WithinEndTag => {
                if self.stream.skip_whitespace() {
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                if self.stream.advance_if_char(b'>') {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::EndTagClose, None);
                }
                error_message = Some("Closing bracket expected.");
            }

            ScannerState::AfterOpeningStartTag => {
                self.last_tag = self.next_element_name();
                self.last_type_value = None;
                self.last_attribute_name = None;
                if self.last_tag.is_some() {
                    self.has_space_after_tag = false;
                    self.state = ScannerState::WithinTag;
                    return self.finish_token(offset, TokenType::StartTag, None);
                }
                if self.stream.skip_whitespace() {
                    return self.finish_token(
                        offset,
                        TokenType::Whitespace,
                        Some("Tag name must directly follow the open bracket."),
                    );
                }
                self.state = ScannerState::WithinTag;
                self.stream.advance_until_char(b'>');
                if offset < self.stream.pos() {
                    return self.finish_token(
                        offset,
                        TokenType::Unknown,
                        Some("Start tag name expected."),
                    );
                }
                return self.internal_scan();
            }

            ScannerState::WithinTag => {
                if self.stream.skip_whitespace() {
                    self.has_space_after_tag = true;
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                if self.has_space_after_tag {
                    self.last_attribute_name = self.next_attribute_name();
                    if self.last_attribute_name.is_some() {
                        self.state = ScannerState::AfterAttributeName;
                        self.has_space_after_tag = false;
                        return self.finish_token(offset, TokenType::AttributeName, None);
                    }
                }
                if self.stream.advance_if_str("/>") {
                    self.state = ScannerState::WithinContent;
                    return self.finish_token(offset, TokenType::StartTagSelfClose, None);
                }
                if self.stream.advance_if_char(b'>') {
                    self.state = match self.last_tag.as_deref() {
                        // typed scripts (templates) stay in html
                        Some("script") if self.last_type_value.is_some() => {
                            ScannerState::WithinContent
                        }
                        Some("script") => ScannerState::WithinScriptContent,
                        Some("style") => ScannerState::WithinStyleContent,
                        _ => ScannerState::WithinContent,
                    };
                    return self.finish_token(offset, TokenType::StartTagClose, None);
                }
                self.stream.advance_char();
                return self.finish_token(
                    offset,
                    TokenType::Unknown,
                    Some("Unexpected character in tag."),
                );
            }

            ScannerState::AfterAttributeName => {
                if self.stream.skip_whitespace() {
                    self.has_space_after_tag = true;
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                if self.stream.advance_if_char(b'=') {
                    self.state = ScannerState::BeforeAttributeValue;
                    return self.finish_token(offset, TokenType::DelimiterAssign, None);
                }
                self.state = ScannerState::WithinTag;
                return self.internal_scan();
            }

            ScannerState::BeforeAttributeValue => {
                if self.stream.skip_whitespace() {
                    return self.finish_token(offset, TokenType::Whitespace, None);
                }
                let value_len = self.stream.advance_if_regexp(&REG_UNQUOTED_VALUE).len();
                if value_len > 0 {
                    // <foo bar=http://foo/>
                    if self.stream.peek_char(0) == b'>' && self.stream.peek_char(-1) == b'/' {
                        self.stream.go_back(1);
                    }
                    let end = self.stream.pos();
                    if end > offset {
                        self.remember_type_value(offset, end);
                        self.state = ScannerState::WithinTag;
                        self.has_space_after_tag = false;
                        return self.finish_token(offset, TokenType::AttributeValue, None);
                    }
                }
                let ch = self.stream.peek_char(0);
                if ch == b'\'' || ch == b'"' {
                    self.stream.advance(1);
                    if self.stream.advance_until_char(ch) {
                        self.stream.advance(1);
                    }
                    let end = self.stream.pos();
                    if end > offset + 1 {
                        let inner_end = if self.stream.peek_char(-1) == ch { end - 1 } else { end };
                        self.remember_type_value(offset + 1, inner_end.max(offset + 1));
                    }
                    self.state = ScannerState::WithinTag;
                    self.has_space_after_tag = false;
                    return self.finish_token(offset, TokenType::AttributeValue, None);
                }
                self.state = ScannerState::WithinTag;
                self.has_space_after_tag = false;
                return self.internal_scan();
            }

            ScannerState::WithinScriptContent => {
                // see http://stackoverflow.com/questions/14574471/how-do-browsers-parse-a-script-tag-exactly
                let mut script_state: u8 = 1;
                while !self.stream.eos() {
                    let m = self.stream.advance_past_regexp(&REG_SCRIPT_BOUNDARY);
                    if m.is_empty() {
                        self.stream.go_to_end();
                        return self.finish_token(offset, TokenType::Script, None);
                    } else if m == "<!--" {
                        if script_state == 1 {
                            script_state = 2;
                        }
                    } else if m == "-->" {
                        script_state = 1;
                    } else if m.as_bytes()[1] != b'/' {
                        // <script
                        if script_state == 2 {
                            script_state = 3;
                        }
                    } else if script_state == 3 {
                        // </script inside a commented script
                        script_state = 2;
                    } else {
                        self.stream.go_back(m.len());
                        break;
                    }
                }
                self.state = ScannerState::WithinContent;
                if offset < self.stream.pos() {
                    return self.finish_token(offset, TokenType::Script, None);
                }
                return self.internal_scan();
            }

            ScannerState::WithinStyleContent => {
                self.stream.advance_until_regexp(&REG_STYLE_END);
                self.state = ScannerState::WithinContent;
                if offset < self.stream.pos() {
                    return self.finish_token(offset, TokenType::Styles, None);
                }
                return self.internal_scan();
            }
        }

        self.stream.advance_char();
        self.state = ScannerState::WithinContent;
        self.finish_token(offset, TokenType::Unknown, error_message)
    }

    fn finish_token(
        &mut self,
        offset: usize,
        token_type: TokenType,
        error_message: Option<&'static str>,
    ) -> TokenType {
        self.token_type = token_type;
        self.token_offset = offset;
        self.token_error = error_message;
        self.token_type
    }

    fn remember_type_value(&mut self, start: usize, end: usize) {
        if self.last_attribute_name.as_deref() == Some("type") {
            let value = self.stream.slice(start, end);
            self.last_type_value = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
    }

    fn next_element_name(&mut self) -> Option<String> {
        let s = self.stream.advance_if_regexp(&REG_ELEMENT_NAME);
        if s.is_empty() {
            None
        } else {
            Some(s.to_lowercase())
        }
    }

    fn next_attribute_name(&mut self) -> Option<String> {
        let s = self.stream.advance_if_regexp(&REG_ATTRIBUTE_NAME);
        if s.is_empty() {
            None
        } else {
            Some(s.to_lowercase())
        }
    }
}

/// Cursor over the source text. Positions are byte offsets and always stay
/// on char boundaries.
struct MultiLineStream<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> MultiLineStream<'a> {
    fn new(source: &'a str, position: usize) -> MultiLineStream<'a> {
        let mut position = position.min(source.len());
        while !source.is_char_boundary(position) {
            position -= 1;
        }
        MultiLineStream { source, position }
    }

    fn eos(&self) -> bool {
        self.source.len() <= self.position
    }

    fn pos(&self) -> usize {
        self.position
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or_default()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    /// Only used to step back over ASCII bytes.
    fn go_back(&mut self, n: usize) {
        self.position = self.position.saturating_sub(n);
    }

    /// Only used to step over ASCII bytes.
    fn advance(&mut self, n: usize) {
        self.position = (self.position + n).min(self.source.len());
    }

    fn advance_char(&mut self) {
        if let Some(ch) = self.rest().chars().next() {
            self.position += ch.len_utf8();
        }
    }

    fn go_to_end(&mut self) {
        self.position = self.source.len();
    }

    fn peek_char(&self, n: isize) -> u8 {
        let index = if n >= 0 {
            self.position.checked_add(n as usize)
        } else {
            self.position.checked_sub(n.unsigned_abs())
        };
        index
            .and_then(|i| self.source.as_bytes().get(i).copied())
            .unwrap_or(0)
    }

    fn advance_if_char(&mut self, ch: u8) -> bool {
        if self.peek_char(0) == ch {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn advance_if_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.position += s.len();
            true
        } else {
            false
        }
    }

    /// Advances over the match anchored at the current position.
    fn advance_if_regexp(&mut self, regexp: &Regex) -> &'a str {
        let rest = self.rest();
        match regexp.find(rest) {
            Some(m) if m.start() == 0 => {
                self.position += m.end();
                m.as_str()
            }
            _ => "",
        }
    }

    /// Advances to the end of the next match anywhere ahead.
    fn advance_past_regexp(&mut self, regexp: &Regex) -> &'a str {
        let rest = self.rest();
        match regexp.find(rest) {
            Some(m) => {
                self.position += m.end();
                m.as_str()
            }
            None => "",
        }
    }

    /// Advances to the start of the next match, or to the end.
    fn advance_until_regexp(&mut self, regexp: &Regex) -> bool {
        match regexp.find(self.rest()) {
            Some(m) => {
                self.position += m.start();
                true
            }
            None => {
                self.go_to_end();
                false
            }
        }
    }

    fn advance_until_char(&mut self, ch: u8) -> bool {
        match self.rest().bytes().position(|b| b == ch) {
            Some(i) => {
                self.position += i;
                true
            }
            None => {
                self.go_to_end();
                false
            }
        }
    }

    fn advance_until_str(&mut self, s: &str) -> bool {
        match self.rest().find(s) {
            Some(i) => {
                self.position += i;
                true
            }
            None => {
                self.go_to_end();
                false
            }
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let n = self
            .rest()
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | 12 | b'\r'))
            .count();
        self.position += n;
        n > 0
    }
}

#[derive(PartialEq, Debug, Copy, Clone)]
pub enum TokenType {
    StartCommentTag,
    Comment,
    EndCommentTag,
    StartTagOpen,
    StartTagClose,
    StartTagSelfClose,
    StartTag,
    EndTagOpen,
    EndTagClose,
    EndTag,
    DelimiterAssign,
    AttributeName,
    AttributeValue,
    StartDoctypeTag,
    Doctype,
    EndDoctypeTag,
    Content,
    Whitespace,
    Unknown,
    Script,
    Styles,
    EOS,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScannerState {
    WithinContent,
    AfterOpeningStartTag,
    AfterOpeningEndTag,
    WithinDoctype,
    WithinTag,
    WithinEndTag,
    WithinComment,
    WithinScriptContent,
    WithinStyleContent,
    AfterAttributeName,
    BeforeAttributeValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens(input: &str, expected: Vec<Token>) {
        let mut scanner = Scanner::new(input, 0, ScannerState::WithinContent);
        let mut token_type = scanner.scan();
        let mut actual = vec![];
        while token_type != TokenType::EOS {
            let mut token = Token {
                offset: scanner.get_token_offset(),
                token_type,
                content: None,
            };
            if [
                TokenType::StartTag,
                TokenType::EndTag,
                TokenType::AttributeName,
                TokenType::AttributeValue,
            ]
            .contains(&token_type)
            {
                token.content = Some(scanner.get_token_text().to_string());
            }
            actual.push(token);
            token_type = scanner.scan();
        }
        assert_eq!(actual, expected);
    }

    fn token(offset: usize, token_type: TokenType, content: Option<&str>) -> Token {
        Token {
            offset,
            token_type,
            content: content.map(|c| c.to_string()),
        }
    }

    #[test]
    fn open_start_tag() {
        assert_tokens(
            "<abc",
            vec![
                token(0, TokenType::StartTagOpen, None),
                token(1, TokenType::StartTag, Some("abc")),
            ],
        );
    }

    #[test]
    fn quoted_attribute() {
        assert_tokens(
            r#"<div class="a b">"#,
            vec![
                token(0, TokenType::StartTagOpen, None),
                token(1, TokenType::StartTag, Some("div")),
                token(4, TokenType::Whitespace, None),
                token(5, TokenType::AttributeName, Some("class")),
                token(10, TokenType::DelimiterAssign, None),
                token(11, TokenType::AttributeValue, Some(r#""a b""#)),
                token(16, TokenType::StartTagClose, None),
            ],
        );
    }

    #[test]
    fn unquoted_attribute_before_self_close() {
        assert_tokens(
            "<a href=http://foo/>",
            vec![
                token(0, TokenType::StartTagOpen, None),
                token(1, TokenType::StartTag, Some("a")),
                token(2, TokenType::Whitespace, None),
                token(3, TokenType::AttributeName, Some("href")),
                token(7, TokenType::DelimiterAssign, None),
                token(8, TokenType::AttributeValue, Some("http://foo")),
                token(18, TokenType::StartTagSelfClose, None),
            ],
        );
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_tokens(
            r#"<p id="x"#,
            vec![
                token(0, TokenType::StartTagOpen, None),
                token(1, TokenType::StartTag, Some("p")),
                token(2, TokenType::Whitespace, None),
                token(3, TokenType::AttributeName, Some("id")),
                token(5, TokenType::DelimiterAssign, None),
                token(6, TokenType::AttributeValue, Some(r#""x"#)),
            ],
        );
    }

    #[test]
    fn comment_and_doctype() {
        assert_tokens(
            "<!DOCTYPE html><!-- c -->",
            vec![
                token(0, TokenType::StartDoctypeTag, None),
                token(9, TokenType::Doctype, None),
                token(14, TokenType::EndDoctypeTag, None),
                token(15, TokenType::StartCommentTag, None),
                token(19, TokenType::Comment, None),
                token(22, TokenType::EndCommentTag, None),
            ],
        );
    }

    #[test]
    fn script_content_is_opaque() {
        assert_tokens(
            r#"<script>x = '<b class="y">'</script>"#,
            vec![
                token(0, TokenType::StartTagOpen, None),
                token(1, TokenType::StartTag, Some("script")),
                token(7, TokenType::StartTagClose, None),
                token(8, TokenType::Script, None),
                token(27, TokenType::EndTagOpen, None),
                token(29, TokenType::EndTag, Some("script")),
                token(35, TokenType::EndTagClose, None),
            ],
        );
    }

    #[test]
    fn stray_character_in_tag() {
        let mut scanner = Scanner::new("<div =", 0, ScannerState::WithinContent);
        assert_eq!(scanner.scan(), TokenType::StartTagOpen);
        assert_eq!(scanner.scan(), TokenType::StartTag);
        assert_eq!(scanner.get_token_length(), 3);
        assert_eq!(scanner.get_token_error(), None);
        assert_eq!(scanner.get_scanner_state(), ScannerState::WithinTag);

        assert_eq!(scanner.scan(), TokenType::Whitespace);
        assert_eq!(scanner.scan(), TokenType::Unknown);
        assert_eq!(scanner.get_token_offset(), 5);
        assert_eq!(scanner.get_token_length(), 1);
        assert_eq!(scanner.get_token_error(), Some("Unexpected character in tag."));
        assert_eq!(scanner.scan(), TokenType::EOS);
    }

    #[test]
    fn multibyte_content_does_not_split_chars() {
        let input = "<p>héllo <b>ü</b></p>";
        let mut scanner = Scanner::new(input, 0, ScannerState::WithinContent);
        let mut token_type = scanner.scan();
        while token_type != TokenType::EOS {
            assert!(input.is_char_boundary(scanner.get_token_end()));
            token_type = scanner.scan();
        }
    }

    #[derive(PartialEq, Debug)]
    struct Token {
        offset: usize,
        token_type: TokenType,
        content: Option<String>,
    }
}
