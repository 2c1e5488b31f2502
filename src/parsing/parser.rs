//! Recursive descent parser for the structural ChalkTalk syntax,
//! consuming the lexer's token stream into the untyped phase-1 tree.
//! Mistakes are recorded and parsing presses on: expect() hands back an
//! INVALID sentinel token on a mismatch so the rest of the document is
//! still examined.

use crate::language::{
    Abstraction, Aggregate, Argument, ArgumentKind, Assignment, AssignmentRhs, Group, Mapping,
    ParseError, Root, Section, Token, TokenKind, Tuple, TupleItem,
};
use crate::parsing::lexer::Lexer;

pub struct Parser {
    lexer: Lexer,
    errors: Vec<ParseError>,
}

/// Parse a whole document into the untyped structural tree. The tree
/// is returned even when errors were found; callers decide whether a
/// partial result is of use to them.
pub fn parse_structure(content: &str) -> (Root, Vec<ParseError>) {
    let mut parser = Parser::new(content);
    let root = parser.read_root();
    (root, parser.into_errors())
}

impl Parser {
    pub fn new(content: &str) -> Parser {
        let lexer = Lexer::new(content);
        let errors = lexer
            .errors()
            .to_vec();
        Parser { lexer, errors }
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    fn error(&mut self, message: impl Into<String>, row: i32, column: i32) {
        self.errors
            .push(ParseError::new(message, row, column));
    }

    fn has_kind(&self, kind: TokenKind) -> bool {
        self.lexer
            .peek()
            .map(|token| token.kind == kind)
            .unwrap_or(false)
    }

    fn next_has_kind(&self, kind: TokenKind) -> bool {
        self.lexer
            .peek_next()
            .map(|token| token.kind == kind)
            .unwrap_or(false)
    }

    fn expect(&mut self, kind: TokenKind) -> Token {
        match self
            .lexer
            .peek()
        {
            Some(token) if token.kind == kind => self
                .lexer
                .next()
                .unwrap_or_else(|| Token::invalid(-1, -1)),
            Some(token) => {
                let (row, column, text) = (token.row, token.column, token.text.clone());
                self.error(
                    format!("Expected a token of type {} but found '{}'", kind, text),
                    row,
                    column,
                );
                Token::invalid(row, column)
            }
            None => {
                self.error(
                    format!("Expected a token of type {} but found the end of input", kind),
                    -1,
                    -1,
                );
                Token::invalid(-1, -1)
            }
        }
    }

    pub fn read_root(&mut self) -> Root {
        let mut groups = Vec::new();

        loop {
            while self.has_kind(TokenKind::Linebreak) {
                self.lexer
                    .next();
            }
            if !self
                .lexer
                .has_next()
            {
                break;
            }
            match self.read_group() {
                Some(group) => groups.push(group),
                None => break,
            }
        }

        // anything left over at this point cannot be the start of a
        // group; report each token rather than silently dropping it
        while let Some(token) = self
            .lexer
            .next()
        {
            if matches!(
                token.kind,
                TokenKind::Linebreak | TokenKind::Indent | TokenKind::Unindent
            ) {
                continue;
            }
            self.errors
                .push(ParseError::new(
                    format!("Unrecognized token '{}'", token.text),
                    token.row,
                    token.column,
                ));
        }

        Root { groups }
    }

    /// A group is an optional bracketed id line followed by one or more
    /// sections. A candidate with no sections at all parses as absent.
    pub fn read_group(&mut self) -> Option<Group> {
        let id = if self.has_kind(TokenKind::Id) {
            let token = self
                .lexer
                .next();
            // the id sits alone on its line, so its line wrapper is an
            // always-empty Begin/End pair
            if self.has_kind(TokenKind::Indent) {
                self.lexer
                    .next();
                self.expect(TokenKind::Unindent);
            }
            token
        } else {
            None
        };

        let mut sections = Vec::new();
        while self.at_section_start() {
            if let Some(section) = self.read_section() {
                sections.push(section);
            } else {
                break;
            }
        }

        if sections.is_empty() {
            if let Some(id) = &id {
                self.error(
                    "Expected at least one section to follow this id",
                    id.row,
                    id.column,
                );
            }
            return None;
        }

        Some(Group { id, sections })
    }

    fn at_section_start(&self) -> bool {
        self.has_kind(TokenKind::Name) && self.next_has_kind(TokenKind::Colon)
    }

    pub fn read_section(&mut self) -> Option<Section> {
        let name = self.expect(TokenKind::Name);
        self.expect(TokenKind::Colon);

        let mut args = Vec::new();

        if self.at_argument_start() {
            loop {
                if let Some(argument) = self.read_argument(true) {
                    args.push(argument);
                }
                if self.has_kind(TokenKind::Comma) {
                    self.lexer
                        .next();
                } else {
                    break;
                }
            }
        }

        // the indented block below the section line holds the `. `
        // marked arguments; the wrapper is absent when the section line
        // was followed by a blank line or the end of input
        if self.has_kind(TokenKind::Indent) {
            self.lexer
                .next();
            loop {
                // a blank line is allowed in front of a `. ` line
                if self.has_kind(TokenKind::Linebreak) && self.next_has_kind(TokenKind::DotSpace) {
                    self.lexer
                        .next();
                }
                if self.has_kind(TokenKind::DotSpace) {
                    self.read_argument_line(&mut args);
                } else {
                    break;
                }
            }
            self.expect(TokenKind::Unindent);
        }

        Some(Section { name, args })
    }

    fn at_argument_start(&self) -> bool {
        match self
            .lexer
            .peek()
        {
            Some(token) => matches!(
                token.kind,
                TokenKind::Statement
                    | TokenKind::String
                    | TokenKind::Name
                    | TokenKind::LeftParen
                    | TokenKind::LeftCurly
            ),
            None => false,
        }
    }

    fn read_argument_line(&mut self, args: &mut Vec<Argument>) {
        self.expect(TokenKind::DotSpace);

        let is_group = self.has_kind(TokenKind::Id) || self.at_section_start();
        if is_group {
            match self.read_group() {
                Some(group) => args.push(Argument {
                    is_inline: false,
                    kind: ArgumentKind::Group(group),
                }),
                None => {
                    let (row, column) = self.position();
                    self.error("Expected a group after the '. ' marker", row, column);
                }
            }
            return;
        }

        loop {
            if let Some(argument) = self.read_argument(false) {
                args.push(argument);
            }
            if self.has_kind(TokenKind::Comma) {
                self.lexer
                    .next();
            } else {
                break;
            }
        }

        // plain argument lines carry an empty line wrapper of their own
        if self.has_kind(TokenKind::Indent) {
            self.lexer
                .next();
            self.expect(TokenKind::Unindent);
        }
    }

    fn position(&self) -> (i32, i32) {
        match self
            .lexer
            .peek()
        {
            Some(token) => (token.row, token.column),
            None => (-1, -1),
        }
    }

    fn read_argument(&mut self, is_inline: bool) -> Option<Argument> {
        let kind = match self
            .lexer
            .peek()
        {
            Some(token) => token.kind,
            None => {
                self.error("Expected an argument but found the end of input", -1, -1);
                return None;
            }
        };

        let kind = match kind {
            TokenKind::Statement | TokenKind::String | TokenKind::Id => {
                let token = self
                    .lexer
                    .next()?;
                ArgumentKind::Token(token)
            }
            TokenKind::Name => {
                if self.next_has_kind(TokenKind::Equals) {
                    ArgumentKind::Mapping(self.read_mapping()?)
                } else if self.next_has_kind(TokenKind::ColonEquals) {
                    ArgumentKind::Assignment(self.read_assignment()?)
                } else if self.next_has_kind(TokenKind::LeftParen) {
                    ArgumentKind::Abstraction(self.read_abstraction()?)
                } else {
                    let token = self
                        .lexer
                        .next()?;
                    ArgumentKind::Token(token)
                }
            }
            TokenKind::LeftCurly => ArgumentKind::Aggregate(self.read_aggregate()?),
            TokenKind::LeftParen => ArgumentKind::Tuple(self.read_tuple()?),
            _ => {
                let (row, column) = self.position();
                let text = self
                    .lexer
                    .next()
                    .map(|token| token.text)
                    .unwrap_or_default();
                self.error(format!("Expected an argument but found '{}'", text), row, column);
                return None;
            }
        };

        Some(Argument { is_inline, kind })
    }

    fn read_mapping(&mut self) -> Option<Mapping> {
        let lhs = self.expect(TokenKind::Name);
        self.expect(TokenKind::Equals);
        let rhs = self.expect(TokenKind::String);
        Some(Mapping { lhs, rhs })
    }

    fn read_assignment(&mut self) -> Option<Assignment> {
        let lhs = self.expect(TokenKind::Name);
        self.expect(TokenKind::ColonEquals);
        let rhs = self.read_assignment_rhs()?;
        Some(Assignment { lhs, rhs })
    }

    fn read_assignment_rhs(&mut self) -> Option<AssignmentRhs> {
        match self
            .lexer
            .peek()
            .map(|token| token.kind)
        {
            Some(TokenKind::LeftParen) => Some(AssignmentRhs::Tuple(self.read_tuple()?)),
            Some(TokenKind::LeftCurly) => Some(AssignmentRhs::Aggregate(self.read_aggregate()?)),
            Some(TokenKind::Name) => Some(AssignmentRhs::Name(self.expect(TokenKind::Name))),
            _ => {
                let (row, column) = self.position();
                self.error(
                    "Expected a name, tuple, or aggregate on the right of ':='",
                    row,
                    column,
                );
                None
            }
        }
    }

    fn read_abstraction(&mut self) -> Option<Abstraction> {
        let name = self.expect(TokenKind::Name);
        self.expect(TokenKind::LeftParen);
        let params = self.read_name_list(TokenKind::RightParen);
        self.expect(TokenKind::RightParen);
        Some(Abstraction { name, params })
    }

    fn read_aggregate(&mut self) -> Option<Aggregate> {
        self.expect(TokenKind::LeftCurly);
        let params = self.read_name_list(TokenKind::RightCurly);
        self.expect(TokenKind::RightCurly);
        Some(Aggregate { params })
    }

    fn read_name_list(&mut self, terminator: TokenKind) -> Vec<Token> {
        let mut names = Vec::new();
        if self.has_kind(terminator) {
            return names;
        }
        loop {
            names.push(self.expect(TokenKind::Name));
            if self.has_kind(TokenKind::Comma) {
                self.lexer
                    .next();
            } else {
                break;
            }
        }
        names
    }

    fn read_tuple(&mut self) -> Option<Tuple> {
        self.expect(TokenKind::LeftParen);
        let mut items = Vec::new();
        loop {
            if let Some(item) = self.read_tuple_item() {
                items.push(item);
            }
            if self.has_kind(TokenKind::Comma) {
                self.lexer
                    .next();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RightParen);
        Some(Tuple { items })
    }

    fn read_tuple_item(&mut self) -> Option<TupleItem> {
        if self.has_kind(TokenKind::Name) {
            if self.next_has_kind(TokenKind::ColonEquals) {
                return Some(TupleItem::Assignment(self.read_assignment()?));
            }
            if self.next_has_kind(TokenKind::LeftParen) {
                return Some(TupleItem::Abstraction(self.read_abstraction()?));
            }
        }
        Some(TupleItem::Rhs(self.read_assignment_rhs()?))
    }
}

#[cfg(test)]
mod check {
    use super::*;

    #[test]
    fn single_section() {
        let (root, errors) = parse_structure("Defines: y\n");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(
            root.groups
                .len(),
            1
        );
        let group = &root.groups[0];
        assert!(group
            .id
            .is_none());
        assert_eq!(
            group.sections[0]
                .name
                .text,
            "Defines"
        );
        assert_eq!(
            group.sections[0]
                .args
                .len(),
            1
        );
    }

    #[test]
    fn id_line_belongs_to_group() {
        let (root, errors) = parse_structure("[\\f{x}]\nDefines: y\nmeans: 'y = x'\n");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        let group = &root.groups[0];
        assert_eq!(
            group
                .id
                .as_ref()
                .map(|t| t.text.as_str()),
            Some("\\f{x}")
        );
        assert_eq!(
            group.sections
                .len(),
            2
        );
    }

    #[test]
    fn dot_arguments_and_nested_group() {
        let (root, errors) = parse_structure(
            "Result:\n. for: x\n  where:\n  . 'x > 0'\n  then:\n  . 'x + 1 > 1'\n",
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        let section = &root.groups[0].sections[0];
        assert_eq!(
            section.args
                .len(),
            1
        );
        match &section.args[0].kind {
            ArgumentKind::Group(group) => {
                let names: Vec<&str> = group
                    .sections
                    .iter()
                    .map(|s| {
                        s.name
                            .text
                            .as_str()
                    })
                    .collect();
                assert_eq!(names, vec!["for", "where", "then"]);
            }
            other => panic!("expected a nested group, found {:?}", other),
        }
    }

    #[test]
    fn mapping_argument() {
        let (root, errors) = parse_structure("Source:\n. type = \"book\"\n. title = \"Analysis\"\n");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        let section = &root.groups[0].sections[0];
        assert_eq!(
            section.args
                .len(),
            2
        );
        match &section.args[0].kind {
            ArgumentKind::Mapping(mapping) => {
                assert_eq!(mapping.lhs.text, "type");
                assert_eq!(mapping.rhs.text, "\"book\"");
            }
            other => panic!("expected a mapping, found {:?}", other),
        }
    }

    #[test]
    fn tuple_targets() {
        let (root, errors) = parse_structure("Defines: X := (G, {e}, f(x))\n");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        let section = &root.groups[0].sections[0];
        match &section.args[0].kind {
            ArgumentKind::Assignment(assignment) => {
                assert_eq!(assignment.lhs.text, "X");
                match &assignment.rhs {
                    AssignmentRhs::Tuple(tuple) => assert_eq!(
                        tuple
                            .items
                            .len(),
                        3
                    ),
                    other => panic!("expected a tuple, found {:?}", other),
                }
            }
            other => panic!("expected an assignment, found {:?}", other),
        }
    }

    #[test]
    fn blank_line_separates_groups() {
        let (root, errors) = parse_structure("Axiom:\n. 'a = a'\n\nResult:\n. 'b = b'\n");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(
            root.groups
                .len(),
            2
        );
        assert_eq!(root.groups[0].sections[0].name.text, "Axiom");
        assert_eq!(root.groups[1].sections[0].name.text, "Result");
    }

    #[test]
    fn stray_tokens_are_reported() {
        // a name with no colon cannot start a section, so the tokens
        // are reported one by one instead of being silently dropped
        let (_, errors) = parse_structure("Defines y\n");
        assert!(!errors.is_empty());
        assert!(errors
            .iter()
            .any(|e| e
                .message
                .contains("Unrecognized token")));
    }

    #[test]
    fn never_panics_on_junk() {
        for input in [
            "",
            "\n\n\n",
            ":::",
            "((((((",
            "]]]]",
            "a: (b, {c\nd: 'e\n",
            ". . . .",
            "[unclosed\n",
        ] {
            let (_, _) = parse_structure(input);
        }
    }

    #[test]
    fn round_trip_is_exact() {
        let inputs = [
            "Defines: y\nmeans:\n. 'y = x'",
            "[\\f{x}]\nDefines: y\nmeans: 'y = x'",
            "Result:\n. for: x\n  then:\n  . 'x = x'",
            "Axiom: \"there is a set with no members\"",
            "Source:\n. type = \"book\"",
        ];
        for input in inputs {
            let (root, errors) = parse_structure(input);
            assert!(errors.is_empty(), "unexpected errors for {:?}: {:?}", input, errors);
            let code = root.to_code();
            let (reparsed, errors) = parse_structure(&code);
            assert!(errors.is_empty(), "reparse errors for {:?}: {:?}", code, errors);
            assert_eq!(reparsed, root, "round trip mismatch for {:?}", input);
        }
    }
}
