//! Lexer for the structural ChalkTalk syntax. Indentation is made
//! explicit: every non-blank line break synthesizes an Indent token and
//! an Unindent for each indent-stack level at or above the new depth, so
//! the parser can treat nesting like ordinary brackets.

use crate::language::{ParseError, Token, TokenKind};

/// Characters an operator name is drawn from.
const OPERATOR_CHARS: &str = "~!@%^&*-+<>\\/=";

fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(c)
}

fn is_identifier_char(c: char) -> bool {
    c == '$' || c == '#' || c.is_ascii_alphanumeric()
}

pub struct Lexer {
    tokens: Vec<Token>,
    index: usize,
    errors: Vec<ParseError>,
}

impl Lexer {
    pub fn new(text: &str) -> Lexer {
        let mut worker = Worker::new(text);
        worker.run();
        Lexer {
            tokens: worker.tokens,
            index: 0,
            errors: worker.errors,
        }
    }

    pub fn has_next(&self) -> bool {
        self.index
            < self
                .tokens
                .len()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens
            .get(self.index)
    }

    pub fn peek_next(&self) -> Option<&Token> {
        self.tokens
            .get(self.index + 1)
    }

    pub fn next(&mut self) -> Option<Token> {
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

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }
}

struct Worker {
    chars: Vec<char>,
    position: usize,
    row: i32,
    column: i32,
    indents: Vec<usize>,
    open_brackets: usize,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl Worker {
    fn new(text: &str) -> Worker {
        let mut chars: Vec<char> = text
            .chars()
            .collect();
        if chars.last() != Some(&'\n') {
            chars.push('\n');
        }
        Worker {
            chars,
            position: 0,
            row: 0,
            column: 0,
            indents: vec![0],
            open_brackets: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn current(&self) -> Option<char> {
        self.chars
            .get(self.position)
            .copied()
    }

    fn lookahead(&self, distance: usize) -> Option<char> {
        self.chars
            .get(self.position + distance)
            .copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.position];
        self.position += 1;
        if c == '\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        c
    }

    fn emit(&mut self, text: impl Into<String>, kind: TokenKind, row: i32, column: i32) {
        self.tokens
            .push(Token::new(text, kind, row, column));
    }

    fn error(&mut self, message: impl Into<String>, row: i32, column: i32) {
        self.errors
            .push(ParseError::new(message, row, column));
    }

    fn run(&mut self) {
        while let Some(c) = self.current() {
            let row = self.row;
            let column = self.column;

            if c == '-' && self.lookahead(1) == Some('-') {
                while let Some(c) = self.current() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if c == '\n' {
                self.advance();
                self.handle_line_break(row, column);
            } else if c == ':' && self.lookahead(1) == Some('=') {
                self.advance();
                self.advance();
                self.emit(":=", TokenKind::ColonEquals, row, column);
            } else if c == ':' {
                self.advance();
                self.emit(":", TokenKind::Colon, row, column);
            } else if c == ',' {
                self.advance();
                self.emit(",", TokenKind::Comma, row, column);
            } else if c == '.' && self.lookahead(1) == Some(' ') {
                self.advance();
                self.advance();
                self.emit(". ", TokenKind::DotSpace, row, column);
            } else if c == '(' {
                self.advance();
                self.open_brackets += 1;
                self.emit("(", TokenKind::LeftParen, row, column);
            } else if c == ')' {
                self.advance();
                self.open_brackets = self
                    .open_brackets
                    .saturating_sub(1);
                self.emit(")", TokenKind::RightParen, row, column);
            } else if c == '{' {
                self.advance();
                self.open_brackets += 1;
                self.emit("{", TokenKind::LeftCurly, row, column);
            } else if c == '}' {
                self.advance();
                self.open_brackets = self
                    .open_brackets
                    .saturating_sub(1);
                self.emit("}", TokenKind::RightCurly, row, column);
            } else if c == '"' {
                self.read_delimited('"', TokenKind::String, row, column);
            } else if c == '\'' {
                self.read_delimited('\'', TokenKind::Statement, row, column);
            } else if c == '[' {
                self.read_id(row, column);
            } else if c == ' ' || c == '\t' || c == '\r' {
                self.advance();
            } else if is_operator_char(c) {
                let mut text = String::new();
                while let Some(c) = self.current() {
                    if !is_operator_char(c) {
                        break;
                    }
                    text.push(self.advance());
                }
                if text == "=" {
                    self.emit("=", TokenKind::Equals, row, column);
                } else {
                    self.emit(text, TokenKind::Name, row, column);
                }
            } else if is_identifier_char(c) {
                let mut text = String::new();
                while let Some(c) = self.current() {
                    if !is_identifier_char(c) {
                        break;
                    }
                    text.push(self.advance());
                }
                self.emit(text, TokenKind::Name, row, column);
            } else {
                self.advance();
                self.error(format!("Unrecognized character '{}'", c), row, column);
            }
        }

        // close every line wrapper still open
        let mut open = 0i32;
        for token in &self.tokens {
            match token.kind {
                TokenKind::Indent => open += 1,
                TokenKind::Unindent => open -= 1,
                _ => {}
            }
        }
        let row = self.row;
        let column = self.column;
        for _ in 0..open.max(0) {
            self.emit("<Unindent>", TokenKind::Unindent, row, column);
        }
    }

    /// A newline was just consumed; `row`/`column` locate it. A run of
    /// blank lines collapses to one Linebreak, emitted after the
    /// indentation tokens for the following line so that every level the
    /// previous line opened is closed before the break.
    fn handle_line_break(&mut self, row: i32, column: i32) {
        if self.open_brackets > 0 {
            return;
        }

        let mut blank = false;
        while self.current() == Some('\n') {
            blank = true;
            self.advance();
        }

        if self
            .current()
            .is_none()
        {
            return;
        }

        let mut spaces = 0usize;
        let mut probe = 0usize;
        while self.lookahead(probe) == Some(' ') {
            spaces += 1;
            probe += 1;
        }
        let has_dot_marker =
            self.lookahead(probe) == Some('.') && self.lookahead(probe + 1) == Some(' ');

        // indentation is counted in two-space units; the `. ` argument
        // marker occupies one more unit, and an odd trailing space in
        // front of it rounds up
        let level = if has_dot_marker {
            (spaces + 3) / 2
        } else {
            spaces / 2
        };

        self.emit("<Indent>", TokenKind::Indent, self.row, self.column);
        while let Some(&top) = self
            .indents
            .last()
        {
            if top >= level {
                self.indents
                    .pop();
                self.emit("<Unindent>", TokenKind::Unindent, self.row, self.column);
            } else {
                break;
            }
            if self
                .indents
                .is_empty()
            {
                break;
            }
        }
        self.indents
            .push(level);

        if blank {
            self.emit("<Linebreak>", TokenKind::Linebreak, row, column);
        }
    }

    /// Read a quoted literal. The token text keeps its delimiters; if
    /// the line ends first, report it and synthesize the closing quote.
    fn read_delimited(&mut self, delimiter: char, kind: TokenKind, row: i32, column: i32) {
        let mut text = String::new();
        text.push(self.advance());

        let mut terminated = false;
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            text.push(self.advance());
            if c == delimiter {
                terminated = true;
                break;
            }
        }

        if !terminated {
            let what = match kind {
                TokenKind::String => "string",
                _ => "statement",
            };
            self.error(format!("Unterminated {}", what), row, column);
            text.push(delimiter);
        }

        self.emit(text, kind, row, column);
    }

    /// Read a bracketed id, tracking nested square brackets up to the
    /// end of the line. The token text excludes the outer brackets.
    fn read_id(&mut self, row: i32, column: i32) {
        self.advance();

        let mut text = String::new();
        let mut depth = 1usize;
        let mut terminated = false;
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            if c == '[' {
                depth += 1;
            } else if c == ']' {
                depth -= 1;
                if depth == 0 {
                    self.advance();
                    terminated = true;
                    break;
                }
            }
            text.push(self.advance());
        }

        if !terminated {
            self.error("Unterminated id", row, column);
        }

        self.emit(text, TokenKind::Id, row, column);
    }
}

#[cfg(test)]
mod check {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(text);
        let mut collected = Vec::new();
        while let Some(token) = lexer.next() {
            collected.push(token.kind);
        }
        collected
    }

    #[test]
    fn simple_section() {
        use TokenKind::*;
        assert_eq!(
            kinds("Defines: y\nmeans:\n. 'y = x'\n"),
            vec![
                Name, Colon, Name, Indent, Unindent, Name, Colon, Indent, DotSpace, Statement,
                Unindent
            ]
        );
    }

    #[test]
    fn indents_are_balanced() {
        let inputs = [
            "",
            "\n",
            "a:\n",
            "a: x\nb:\n. 'x'\n. 'y'\n",
            "a:\n. if: 'p'\n  then: 'q'\n",
            "a: 1\n\n\nb: 2\n",
            "   weird\n        deeper\nback",
        ];
        for input in inputs {
            let mut lexer = Lexer::new(input);
            let mut depth = 0i32;
            while let Some(token) = lexer.next() {
                match token.kind {
                    TokenKind::Indent => depth += 1,
                    TokenKind::Unindent => depth -= 1,
                    _ => {}
                }
            }
            assert_eq!(depth, 0, "unbalanced for {:?}", input);
        }
    }

    #[test]
    fn blank_lines_collapse() {
        use TokenKind::*;
        assert_eq!(
            kinds("a: 1\n\n\nb: 2\n"),
            vec![Name, Colon, Name, Indent, Unindent, Linebreak, Name, Colon, Name]
        );
    }

    #[test]
    fn blank_line_closes_open_levels_before_the_break() {
        use TokenKind::*;
        assert_eq!(
            kinds("a:\n. 'x'\n\nb: 2\n"),
            vec![
                Name, Colon, Indent, DotSpace, Statement, Indent, Unindent, Unindent, Linebreak,
                Name, Colon, Name
            ]
        );
    }

    #[test]
    fn comments_are_dropped() {
        use TokenKind::*;
        assert_eq!(
            kinds("a: 1 -- a comment\nb: 2\n"),
            vec![Name, Colon, Name, Indent, Unindent, Name, Colon, Name]
        );
    }

    #[test]
    fn fixed_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("x := (a, {b}), m = \"text\"\n"),
            vec![
                Name, ColonEquals, LeftParen, Name, Comma, LeftCurly, Name, RightCurly,
                RightParen, Comma, Name, Equals, String
            ]
        );
    }

    #[test]
    fn id_token_strips_brackets() {
        let mut lexer = Lexer::new("[\\f{x}]\nDefines: y\n");
        let token = lexer
            .next()
            .unwrap();
        assert_eq!(token.kind, TokenKind::Id);
        assert_eq!(token.text, "\\f{x}");
        assert!(lexer
            .errors()
            .is_empty());
    }

    #[test]
    fn unterminated_string_recovers() {
        let mut lexer = Lexer::new("a: \"oops\n");
        let mut found = None;
        while let Some(token) = lexer.next() {
            if token.kind == TokenKind::String {
                found = Some(token);
            }
        }
        assert_eq!(
            found
                .map(|t| t.text),
            Some("\"oops\"".to_string())
        );
        assert_eq!(
            lexer
                .errors()
                .len(),
            1
        );
        assert!(lexer.errors()[0]
            .message
            .contains("Unterminated string"));
    }

    #[test]
    fn unrecognized_character_is_skipped() {
        let lexer = Lexer::new("a: ∆\n");
        assert_eq!(
            lexer
                .errors()
                .len(),
            1
        );
        assert!(lexer.errors()[0]
            .message
            .contains("Unrecognized character"));
    }
}
