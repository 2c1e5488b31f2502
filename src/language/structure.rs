//! Types representing the untyped structural tree for the ChalkTalk
//! language, as produced by the first parsing phase. Semantic validation
//! later converts these into the typed document forms in document.rs.

use std::fmt;

#[derive(Eq, Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Linebreak,
    Indent,
    Unindent,
    Id,
    Statement,
    String,
    Name,
    Colon,
    ColonEquals,
    Comma,
    DotSpace,
    Equals,
    LeftParen,
    RightParen,
    LeftCurly,
    RightCurly,
    Invalid,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Linebreak => "Linebreak",
            TokenKind::Indent => "Indent",
            TokenKind::Unindent => "Unindent",
            TokenKind::Id => "Id",
            TokenKind::Statement => "Statement",
            TokenKind::String => "String",
            TokenKind::Name => "Name",
            TokenKind::Colon => "Colon",
            TokenKind::ColonEquals => "ColonEquals",
            TokenKind::Comma => "Comma",
            TokenKind::DotSpace => "DotSpace",
            TokenKind::Equals => "Equals",
            TokenKind::LeftParen => "LeftParen",
            TokenKind::RightParen => "RightParen",
            TokenKind::LeftCurly => "LeftCurly",
            TokenKind::RightCurly => "RightCurly",
            TokenKind::Invalid => "Invalid",
        };
        write!(f, "{}", name)
    }
}

/// A lexeme with its zero-origin position. Synthesized tokens (Indent,
/// Unindent, Linebreak) carry the position of the character that
/// triggered them. Equality compares text and kind only, so reparsing
/// printed code yields a tree equal to the original even though the
/// positions have moved.
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub row: i32,
    pub column: i32,
}

impl PartialEq for Token {
    fn eq(&self, other: &Token) -> bool {
        self.text == other.text && self.kind == other.kind
    }
}

impl Eq for Token {}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, row: i32, column: i32) -> Token {
        Token {
            text: text.into(),
            kind,
            row,
            column,
        }
    }

    /// The sentinel emitted by expect() when the token it wanted was not
    /// there, letting parsing continue past the mistake.
    pub fn invalid(row: i32, column: i32) -> Token {
        Token::new("INVALID", TokenKind::Invalid, row, column)
    }
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Root {
    pub groups: Vec<Group>,
}

/// One or more sections, optionally preceded by a bracketed id line. A
/// group always has at least one section; a candidate group with none
/// parses as absent.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Group {
    pub id: Option<Token>,
    pub sections: Vec<Section>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Section {
    pub name: Token,
    pub args: Vec<Argument>,
}

/// A section argument. Inline arguments appear on the section's own
/// line, separated by commas; the rest appear one per line below it,
/// each introduced by the `. ` marker.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Argument {
    pub is_inline: bool,
    pub kind: ArgumentKind,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub enum ArgumentKind {
    Token(Token),
    Group(Group),
    Abstraction(Abstraction),
    Aggregate(Aggregate),
    Assignment(Assignment),
    Mapping(Mapping),
    Tuple(Tuple),
}

/// A name applied to parameters, `f(x, y)`.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Abstraction {
    pub name: Token,
    pub params: Vec<Token>,
}

/// A brace-enclosed collection of names, `{a, b}`.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub params: Vec<Token>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Assignment {
    pub lhs: Token,
    pub rhs: AssignmentRhs,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub enum AssignmentRhs {
    Name(Token),
    Tuple(Tuple),
    Aggregate(Aggregate),
}

/// A metadata-style binding of a name to a string literal, `name = "..."`.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Mapping {
    pub lhs: Token,
    pub rhs: Token,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Tuple {
    pub items: Vec<TupleItem>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub enum TupleItem {
    Assignment(Assignment),
    Abstraction(Abstraction),
    Rhs(AssignmentRhs),
}

const INDENT: &str = "  ";

fn pad(buffer: &mut String, nesting: usize) {
    for _ in 0..nesting {
        buffer.push_str(INDENT);
    }
}

impl Root {
    pub fn to_code(&self) -> String {
        let mut buffer = String::new();
        for (i, group) in self
            .groups
            .iter()
            .enumerate()
        {
            if i > 0 {
                buffer.push_str("\n\n");
            }
            group.write_code(&mut buffer, 0);
        }
        buffer
    }
}

impl Group {
    pub fn to_code(&self) -> String {
        let mut buffer = String::new();
        self.write_code(&mut buffer, 0);
        buffer
    }

    // when continuing a `. ` marker line the first line of the group is
    // already positioned, so its own pad must be suppressed
    fn write_code(&self, buffer: &mut String, nesting: usize) {
        self.write_code_from(buffer, nesting, false);
    }

    fn write_code_from(&self, buffer: &mut String, nesting: usize, continuing: bool) {
        let mut continuing = continuing;
        if let Some(id) = &self.id {
            if !continuing {
                pad(buffer, nesting);
            }
            continuing = false;
            buffer.push('[');
            buffer.push_str(&id.text);
            buffer.push_str("]\n");
        }
        for (i, section) in self
            .sections
            .iter()
            .enumerate()
        {
            if i > 0 {
                buffer.push('\n');
            }
            section.write_code_from(buffer, nesting, continuing && i == 0);
        }
    }
}

impl Section {
    pub fn to_code(&self) -> String {
        let mut buffer = String::new();
        self.write_code(&mut buffer, 0);
        buffer
    }

    fn write_code(&self, buffer: &mut String, nesting: usize) {
        self.write_code_from(buffer, nesting, false);
    }

    fn write_code_from(&self, buffer: &mut String, nesting: usize, continuing: bool) {
        if !continuing {
            pad(buffer, nesting);
        }
        buffer.push_str(&self.name.text);
        buffer.push(':');

        let mut first = true;
        for argument in &self.args {
            if !argument.is_inline {
                continue;
            }
            if first {
                buffer.push(' ');
                first = false;
            } else {
                buffer.push_str(", ");
            }
            argument.write_code(buffer, nesting);
        }

        for argument in &self.args {
            if argument.is_inline {
                continue;
            }
            buffer.push('\n');
            pad(buffer, nesting + 1);
            buffer.push_str(". ");
            argument.write_code(buffer, nesting + 1);
        }
    }
}

impl Argument {
    fn write_code(&self, buffer: &mut String, nesting: usize) {
        match &self.kind {
            ArgumentKind::Token(token) => match token.kind {
                TokenKind::Id => {
                    buffer.push('[');
                    buffer.push_str(&token.text);
                    buffer.push(']');
                }
                _ => buffer.push_str(&token.text),
            },
            ArgumentKind::Group(group) => {
                group.write_code_from(buffer, nesting, true);
            }
            ArgumentKind::Abstraction(abstraction) => abstraction.write_code(buffer),
            ArgumentKind::Aggregate(aggregate) => aggregate.write_code(buffer),
            ArgumentKind::Assignment(assignment) => assignment.write_code(buffer),
            ArgumentKind::Mapping(mapping) => mapping.write_code(buffer),
            ArgumentKind::Tuple(tuple) => tuple.write_code(buffer),
        }
    }
}

impl Abstraction {
    fn write_code(&self, buffer: &mut String) {
        buffer.push_str(&self.name.text);
        buffer.push('(');
        for (i, param) in self
            .params
            .iter()
            .enumerate()
        {
            if i > 0 {
                buffer.push_str(", ");
            }
            buffer.push_str(&param.text);
        }
        buffer.push(')');
    }
}

impl Aggregate {
    fn write_code(&self, buffer: &mut String) {
        buffer.push('{');
        for (i, param) in self
            .params
            .iter()
            .enumerate()
        {
            if i > 0 {
                buffer.push_str(", ");
            }
            buffer.push_str(&param.text);
        }
        buffer.push('}');
    }
}

impl Assignment {
    fn write_code(&self, buffer: &mut String) {
        buffer.push_str(&self.lhs.text);
        buffer.push_str(" := ");
        self.rhs
            .write_code(buffer);
    }
}

impl AssignmentRhs {
    fn write_code(&self, buffer: &mut String) {
        match self {
            AssignmentRhs::Name(token) => buffer.push_str(&token.text),
            AssignmentRhs::Tuple(tuple) => tuple.write_code(buffer),
            AssignmentRhs::Aggregate(aggregate) => aggregate.write_code(buffer),
        }
    }
}

impl Mapping {
    fn write_code(&self, buffer: &mut String) {
        buffer.push_str(&self.lhs.text);
        buffer.push_str(" = ");
        buffer.push_str(&self.rhs.text);
    }
}

impl Tuple {
    fn write_code(&self, buffer: &mut String) {
        buffer.push('(');
        for (i, item) in self
            .items
            .iter()
            .enumerate()
        {
            if i > 0 {
                buffer.push_str(", ");
            }
            match item {
                TupleItem::Assignment(assignment) => assignment.write_code(buffer),
                TupleItem::Abstraction(abstraction) => abstraction.write_code(buffer),
                TupleItem::Rhs(rhs) => rhs.write_code(buffer),
            }
        }
        buffer.push(')');
    }
}

/// A uniform view over the structural node family so one rewrite
/// function can be applied across the whole tree.
#[derive(Eq, Debug, Clone, PartialEq)]
pub enum Phase1Node {
    Root(Root),
    Group(Group),
    Section(Section),
    Argument(Argument),
    Abstraction(Abstraction),
    Aggregate(Aggregate),
    Assignment(Assignment),
    Mapping(Mapping),
    Tuple(Tuple),
    Token(Token),
}

impl Phase1Node {
    /// Rebuild every child first, reconstruct this node from the rebuilt
    /// children, then apply `f` to the result. The rewrite function thus
    /// always observes subtrees that have themselves already been
    /// rewritten. If `f` returns a node of a different variant than its
    /// argument the rebuilt node is kept unchanged at that position.
    pub fn transform(self, f: &dyn Fn(Phase1Node) -> Phase1Node) -> Phase1Node {
        let rebuilt = match self {
            Phase1Node::Root(root) => Phase1Node::Root(Root {
                groups: root
                    .groups
                    .into_iter()
                    .map(|g| transformed_group(g, f))
                    .collect(),
            }),
            Phase1Node::Group(group) => Phase1Node::Group(rebuild_group(group, f)),
            Phase1Node::Section(section) => Phase1Node::Section(rebuild_section(section, f)),
            Phase1Node::Argument(argument) => Phase1Node::Argument(rebuild_argument(argument, f)),
            Phase1Node::Abstraction(node) => Phase1Node::Abstraction(node),
            Phase1Node::Aggregate(node) => Phase1Node::Aggregate(node),
            Phase1Node::Assignment(node) => Phase1Node::Assignment(node),
            Phase1Node::Mapping(node) => Phase1Node::Mapping(node),
            Phase1Node::Tuple(node) => Phase1Node::Tuple(node),
            Phase1Node::Token(token) => Phase1Node::Token(token),
        };
        f(rebuilt)
    }
}

fn transformed_group(group: Group, f: &dyn Fn(Phase1Node) -> Phase1Node) -> Group {
    let fallback = rebuild_group(group, f);
    match f(Phase1Node::Group(fallback.clone())) {
        Phase1Node::Group(group) => group,
        _ => fallback,
    }
}

fn rebuild_group(group: Group, f: &dyn Fn(Phase1Node) -> Phase1Node) -> Group {
    Group {
        id: group.id,
        sections: group
            .sections
            .into_iter()
            .map(|section| {
                let fallback = rebuild_section(section, f);
                match f(Phase1Node::Section(fallback.clone())) {
                    Phase1Node::Section(section) => section,
                    _ => fallback,
                }
            })
            .collect(),
    }
}

fn rebuild_section(section: Section, f: &dyn Fn(Phase1Node) -> Phase1Node) -> Section {
    Section {
        name: section.name,
        args: section
            .args
            .into_iter()
            .map(|argument| {
                let fallback = rebuild_argument(argument, f);
                match f(Phase1Node::Argument(fallback.clone())) {
                    Phase1Node::Argument(argument) => argument,
                    _ => fallback,
                }
            })
            .collect(),
    }
}

fn rebuild_argument(argument: Argument, f: &dyn Fn(Phase1Node) -> Phase1Node) -> Argument {
    let kind = match argument.kind {
        ArgumentKind::Group(group) => ArgumentKind::Group(transformed_group(group, f)),
        other => other,
    };
    Argument {
        is_inline: argument.is_inline,
        kind,
    }
}

#[cfg(test)]
mod check {
    use super::*;

    fn name(text: &str) -> Token {
        Token::new(text, TokenKind::Name, 0, 0)
    }

    #[test]
    fn section_code_inline_and_marked() {
        let section = Section {
            name: name("means"),
            args: vec![
                Argument {
                    is_inline: true,
                    kind: ArgumentKind::Token(Token::new("'x'", TokenKind::Statement, 0, 7)),
                },
                Argument {
                    is_inline: false,
                    kind: ArgumentKind::Token(Token::new("'y'", TokenKind::Statement, 1, 2)),
                },
            ],
        };

        assert_eq!(section.to_code(), "means: 'x'\n  . 'y'");
    }

    #[test]
    fn group_code_with_id() {
        let group = Group {
            id: Some(Token::new("\\f{x}", TokenKind::Id, 0, 0)),
            sections: vec![Section {
                name: name("Defines"),
                args: vec![Argument {
                    is_inline: true,
                    kind: ArgumentKind::Token(name("y")),
                }],
            }],
        };

        assert_eq!(group.to_code(), "[\\f{x}]\nDefines: y");
    }

    #[test]
    fn tuple_and_assignment_code() {
        let assignment = Assignment {
            lhs: name("X"),
            rhs: AssignmentRhs::Tuple(Tuple {
                items: vec![
                    TupleItem::Rhs(AssignmentRhs::Name(name("a"))),
                    TupleItem::Abstraction(Abstraction {
                        name: name("f"),
                        params: vec![name("x")],
                    }),
                ],
            }),
        };

        let mut buffer = String::new();
        assignment.write_code(&mut buffer);
        assert_eq!(buffer, "X := (a, f(x))");
    }

    #[test]
    fn transform_rewrites_bottom_up() {
        let root = Root {
            groups: vec![Group {
                id: None,
                sections: vec![Section {
                    name: name("Result"),
                    args: vec![Argument {
                        is_inline: true,
                        kind: ArgumentKind::Token(name("a")),
                    }],
                }],
            }],
        };

        let result = Phase1Node::Root(root).transform(&|node| match node {
            Phase1Node::Argument(argument) => Phase1Node::Argument(Argument {
                is_inline: argument.is_inline,
                kind: ArgumentKind::Token(name("b")),
            }),
            other => other,
        });

        match result {
            Phase1Node::Root(root) => {
                let section = &root.groups[0].sections[0];
                assert_eq!(
                    section.args[0].kind,
                    ArgumentKind::Token(name("b"))
                );
            }
            _ => panic!("expected a root node"),
        }
    }
}
