//! Lexer for the TexTalk expression syntax found inside statement
//! literals and bracketed ids.

use crate::language::{ParseError, TexToken, TexTokenKind};

const OPERATOR_CHARS: &str = "!@%&*-+=|/<>";

fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(c)
}

fn is_identifier_char(c: char) -> bool {
    c == '$' || c == '#' || c.is_ascii_alphanumeric()
}

pub struct TexLexer {
    tokens: Vec<TexToken>,
    index: usize,
    errors: Vec<ParseError>,
}

impl TexLexer {
    pub fn new(text: &str) -> TexLexer {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        let chars: Vec<char> = text
            .chars()
            .collect();
        let mut i = 0usize;
        let mut row = 0i32;
        let mut column = 0i32;

        while i < chars.len() {
            let c = chars[i];
            let start_row = row;
            let start_column = column;

            let mut advance = |i: &mut usize, row: &mut i32, column: &mut i32| {
                let c = chars[*i];
                *i += 1;
                if c == '\n' {
                    *row += 1;
                    *column = 0;
                } else {
                    *column += 1;
                }
                c
            };

            if c.is_whitespace() {
                advance(&mut i, &mut row, &mut column);
            } else if c == ':' && chars.get(i + 1) == Some(&'=') {
                advance(&mut i, &mut row, &mut column);
                advance(&mut i, &mut row, &mut column);
                tokens.push(TexToken::new(
                    ":=",
                    TexTokenKind::ColonEquals,
                    start_row,
                    start_column,
                ));
            } else if let Some(kind) = single_char_kind(c) {
                advance(&mut i, &mut row, &mut column);
                tokens.push(TexToken::new(
                    c.to_string(),
                    kind,
                    start_row,
                    start_column,
                ));
            } else if c == '?' {
                // a bare ? is the wildcard placeholder
                advance(&mut i, &mut row, &mut column);
                tokens.push(TexToken::new(
                    "?",
                    TexTokenKind::Identifier,
                    start_row,
                    start_column,
                ));
            } else if is_identifier_char(c) {
                let mut text = String::new();
                while i < chars.len() && is_identifier_char(chars[i]) {
                    text.push(advance(&mut i, &mut row, &mut column));
                }
                // a trailing ? marks a variadic parameter name
                if chars.get(i) == Some(&'?') {
                    text.push(advance(&mut i, &mut row, &mut column));
                }
                let kind = if text == "is" {
                    TexTokenKind::Is
                } else {
                    TexTokenKind::Identifier
                };
                tokens.push(TexToken::new(text, kind, start_row, start_column));
            } else if is_operator_char(c) {
                let mut text = String::new();
                while i < chars.len() && is_operator_char(chars[i]) {
                    text.push(advance(&mut i, &mut row, &mut column));
                }
                tokens.push(TexToken::new(
                    text,
                    TexTokenKind::Operator,
                    start_row,
                    start_column,
                ));
            } else {
                advance(&mut i, &mut row, &mut column);
                errors.push(ParseError::new(
                    format!("Unrecognized character '{}'", c),
                    start_row,
                    start_column,
                ));
            }
        }

        TexLexer {
            tokens,
            index: 0,
            errors,
        }
    }

    pub fn has_next(&self) -> bool {
        self.index
            < self
                .tokens
                .len()
    }

    pub fn peek(&self) -> Option<&TexToken> {
        self.tokens
            .get(self.index)
    }

    pub fn peek_next(&self) -> Option<&TexToken> {
        self.tokens
            .get(self.index + 1)
    }

    pub fn next(&mut self) -> Option<TexToken> {
        let token = self
            .tokens
            .get(self.index)
            .cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
}

fn single_char_kind(c: char) -> Option<TexTokenKind> {
    match c {
        '\\' => Some(TexTokenKind::Backslash),
        ':' => Some(TexTokenKind::Colon),
        '.' => Some(TexTokenKind::Period),
        '(' => Some(TexTokenKind::LeftParen),
        ')' => Some(TexTokenKind::RightParen),
        '[' => Some(TexTokenKind::LeftSquare),
        ']' => Some(TexTokenKind::RightSquare),
        '{' => Some(TexTokenKind::LeftCurly),
        '}' => Some(TexTokenKind::RightCurly),
        '_' => Some(TexTokenKind::Underscore),
        '^' => Some(TexTokenKind::Caret),
        ',' => Some(TexTokenKind::Comma),
        _ => None,
    }
}

#[cfg(test)]
mod check {
    use super::*;

    fn kinds(text: &str) -> Vec<TexTokenKind> {
        let mut lexer = TexLexer::new(text);
        let mut collected = Vec::new();
        while let Some(token) = lexer.next() {
            collected.push(token.kind);
        }
        collected
    }

    #[test]
    fn command_tokens() {
        use TexTokenKind::*;
        assert_eq!(
            kinds("\\f{x}"),
            vec![Backslash, Identifier, LeftCurly, Identifier, RightCurly]
        );
    }

    #[test]
    fn is_keyword_versus_identifier() {
        use TexTokenKind::*;
        assert_eq!(kinds("x is y"), vec![Identifier, Is, Identifier]);
        assert_eq!(kinds("island"), vec![Identifier]);
    }

    #[test]
    fn variadic_and_wildcard_markers() {
        let mut lexer = TexLexer::new("x? ?");
        let first = lexer
            .next()
            .unwrap();
        assert_eq!(first.text, "x?");
        assert_eq!(first.kind, TexTokenKind::Identifier);
        let second = lexer
            .next()
            .unwrap();
        assert_eq!(second.text, "?");
        assert_eq!(second.kind, TexTokenKind::Identifier);
    }

    #[test]
    fn operator_runs() {
        use TexTokenKind::*;
        assert_eq!(
            kinds("a <= b := c"),
            vec![Identifier, Operator, Identifier, ColonEquals, Identifier]
        );
    }

    #[test]
    fn unrecognized_character() {
        let lexer = TexLexer::new("x ; y");
        assert_eq!(
            lexer
                .errors()
                .len(),
            1
        );
    }
}
