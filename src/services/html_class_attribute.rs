use crate::parser::html_scanner::{Scanner, ScannerState, TokenType};

/// Whether `offset` lies strictly inside the value of a `class` attribute.
///
/// The value span includes its quotes, so an offset on the opening quote or
/// right after the closing one does not count. `offset` is a byte offset into
/// `text`.
pub fn is_within_class_attribute(text: &str, offset: usize) -> bool {
    let mut scanner = Scanner::new(text, 0, ScannerState::WithinContent);
    let tokens = std::iter::from_fn(move || match scanner.scan() {
        TokenType::EOS => None,
        token_type => Some(AttributeToken {
            token_type,
            offset: scanner.get_token_offset(),
            end: scanner.get_token_end(),
            text: scanner.get_token_text(),
        }),
    });
    contains_class_value(tokens, offset)
}

struct AttributeToken<'a> {
    token_type: TokenType,
    offset: usize,
    end: usize,
    text: &'a str,
}

fn contains_class_value<'a, I>(tokens: I, offset: usize) -> bool
where
    I: Iterator<Item = AttributeToken<'a>>,
{
    let mut last_attribute_name: Option<&str> = None;
    // values starting at or after the offset cannot contain it
    for token in tokens.take_while(|t| t.offset < offset) {
        match token.token_type {
            TokenType::AttributeName => {
                last_attribute_name = Some(token.text);
            }
            TokenType::AttributeValue => {
                // a value only belongs to the name right before it
                let Some(name) = last_attribute_name.take() else {
                    continue;
                };
                if name == "class" && token.offset < offset && offset < token.end {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_within(value: &str) -> bool {
        let offset = value.find('|').unwrap();
        let text = format!("{}{}", &value[..offset], &value[offset + 1..]);
        is_within_class_attribute(&text, offset)
    }

    #[test]
    fn inside_class_value() {
        assert!(is_within(r#"<div class="|"></div>"#));
        assert!(is_within(r#"<div class="a |b"></div>"#));
        assert!(is_within(r#"<div class='a|'></div>"#));
    }

    #[test]
    fn boundaries_are_excluded() {
        assert!(!is_within(r#"<div class=|"a"></div>"#));
        assert!(!is_within(r#"<div class="a"|></div>"#));
    }

    #[test]
    fn other_attributes() {
        assert!(!is_within(r#"<div id="|"></div>"#));
        assert!(!is_within(r#"<div class="a" id="b|"></div>"#));
        assert!(!is_within(r#"<div data-class="|"></div>"#));
    }

    #[test]
    fn attribute_name_is_matched_exactly() {
        assert!(!is_within(r#"<DIV CLASS="x|"></DIV>"#));
        assert!(!is_within(r#"<div Class="x|"></div>"#));
    }

    fn token(token_type: TokenType, offset: usize, end: usize, text: &str) -> AttributeToken<'_> {
        AttributeToken {
            token_type,
            offset,
            end,
            text,
        }
    }

    #[test]
    fn class_name_is_consumed_by_its_value() {
        // name, value, then a second value with no name of its own
        let tokens = vec![
            token(TokenType::AttributeName, 5, 10, "class"),
            token(TokenType::AttributeValue, 11, 14, r#""a""#),
            token(TokenType::Whitespace, 14, 15, " "),
            token(TokenType::AttributeValue, 15, 20, r#""xyz""#),
        ];
        assert!(!contains_class_value(tokens.into_iter(), 17));

        let tokens = vec![
            token(TokenType::AttributeName, 5, 10, "class"),
            token(TokenType::AttributeValue, 11, 14, r#""a""#),
        ];
        assert!(contains_class_value(tokens.into_iter(), 12));
    }

    #[test]
    fn value_before_any_name_is_skipped() {
        let tokens = vec![
            token(TokenType::AttributeValue, 0, 5, r#""abc""#),
            token(TokenType::AttributeName, 6, 11, "class"),
            token(TokenType::AttributeValue, 12, 15, r#""d""#),
        ];
        assert!(!contains_class_value(tokens.into_iter(), 2));
    }

    #[test]
    fn later_elements() {
        assert!(is_within(
            r#"<p id="a">text</p><!-- <b class="c"> --><span title="t" class="x |y"></span>"#
        ));
        assert!(!is_within(r#"<!-- <b class="|"> -->"#));
    }

    #[test]
    fn malformed_markup_does_not_panic() {
        assert!(!is_within(r#"<div ="x" class|"#));
        assert!(!is_within(r#"<<<"">|"#));
        assert!(!is_within("<div class=\"ü\"|"));
        assert!(!is_within(r#"<div class="a" ="|"></div>"#));
        assert!(!is_within_class_attribute("<div class=\"a\">", 1000));
    }
}
