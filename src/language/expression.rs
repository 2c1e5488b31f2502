//! Types representing the TexTalk expression language that appears
//! inside ChalkTalk statement literals and bracketed ids.

use std::fmt;

#[derive(Eq, Debug, Clone, Copy, PartialEq)]
pub enum TexTokenKind {
    Backslash,
    LeftParen,
    RightParen,
    LeftSquare,
    RightSquare,
    LeftCurly,
    RightCurly,
    Operator,
    Identifier,
    Comma,
    Period,
    Colon,
    ColonEquals,
    Underscore,
    Caret,
    Is,
    Invalid,
}

impl fmt::Display for TexTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TexTokenKind::Backslash => "\\",
            TexTokenKind::LeftParen => "(",
            TexTokenKind::RightParen => ")",
            TexTokenKind::LeftSquare => "[",
            TexTokenKind::RightSquare => "]",
            TexTokenKind::LeftCurly => "{",
            TexTokenKind::RightCurly => "}",
            TexTokenKind::Operator => "operator",
            TexTokenKind::Identifier => "identifier",
            TexTokenKind::Comma => ",",
            TexTokenKind::Period => ".",
            TexTokenKind::Colon => ":",
            TexTokenKind::ColonEquals => ":=",
            TexTokenKind::Underscore => "_",
            TexTokenKind::Caret => "^",
            TexTokenKind::Is => "is",
            TexTokenKind::Invalid => "INVALID",
        };
        write!(f, "{}", name)
    }
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct TexToken {
    pub text: String,
    pub kind: TexTokenKind,
    pub row: i32,
    pub column: i32,
}

impl TexToken {
    pub fn new(text: impl Into<String>, kind: TexTokenKind, row: i32, column: i32) -> TexToken {
        TexToken {
            text: text.into(),
            kind,
            row,
            column,
        }
    }
}

#[derive(Eq, Debug, Clone, Copy, PartialEq)]
pub enum TextKind {
    Identifier,
    Operator,
    Comma,
    Is,
    ColonEquals,
}

/// A leaf of the expression tree.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct TextNode {
    pub kind: TextKind,
    pub text: String,
}

#[derive(Eq, Debug, Clone, Copy, PartialEq)]
pub enum GroupKind {
    Paren,
    Square,
    Curly,
}

impl GroupKind {
    pub fn open(&self) -> char {
        match self {
            GroupKind::Paren => '(',
            GroupKind::Square => '[',
            GroupKind::Curly => '{',
        }
    }

    pub fn close(&self) -> char {
        match self {
            GroupKind::Paren => ')',
            GroupKind::Square => ']',
            GroupKind::Curly => '}',
        }
    }
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub kind: GroupKind,
    pub parameters: Parameters,
}

/// Comma-separated expressions inside a group, or on either side of an
/// `is` / `:=` form.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Parameters {
    pub items: Vec<Expression>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Expression {
    pub children: Vec<TexNode>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct SubSup {
    pub sub: Option<GroupNode>,
    pub sup: Option<GroupNode>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct NamedGroup {
    pub name: String,
    pub group: GroupNode,
}

/// A backslash command, one or more dot-separated parts.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Command {
    pub parts: Vec<CommandPart>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct CommandPart {
    pub name: String,
    pub square: Option<GroupNode>,
    pub sub_sup: Option<SubSup>,
    pub groups: Vec<GroupNode>,
    pub named_groups: Vec<NamedGroup>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct IsNode {
    pub lhs: Parameters,
    pub rhs: Parameters,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct ColonEqualsNode {
    pub lhs: Parameters,
    pub rhs: Parameters,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub enum TexNode {
    Text(TextNode),
    Command(Command),
    Group(GroupNode),
    SubSup(SubSup),
    NamedGroup(NamedGroup),
    Expression(Expression),
    Parameters(Parameters),
    Is(IsNode),
    ColonEquals(ColonEqualsNode),
}

impl Expression {
    pub fn to_code(&self) -> String {
        let rendered: Vec<String> = self
            .children
            .iter()
            .map(|child| child.to_code())
            .collect();
        rendered.join(" ")
    }
}

impl Parameters {
    pub fn to_code(&self) -> String {
        let rendered: Vec<String> = self
            .items
            .iter()
            .map(|item| item.to_code())
            .collect();
        rendered.join(", ")
    }
}

impl GroupNode {
    pub fn to_code(&self) -> String {
        format!(
            "{}{}{}",
            self.kind
                .open(),
            self.parameters
                .to_code(),
            self.kind
                .close()
        )
    }
}

impl SubSup {
    pub fn to_code(&self) -> String {
        let mut buffer = String::new();
        if let Some(sub) = &self.sub {
            buffer.push('_');
            buffer.push_str(&sub.to_code());
        }
        if let Some(sup) = &self.sup {
            buffer.push('^');
            buffer.push_str(&sup.to_code());
        }
        buffer
    }
}

impl NamedGroup {
    pub fn to_code(&self) -> String {
        format!(
            ":{}{}",
            self.name,
            self.group
                .to_code()
        )
    }
}

impl CommandPart {
    pub fn to_code(&self) -> String {
        let mut buffer = String::new();
        buffer.push_str(&self.name);
        if let Some(square) = &self.square {
            buffer.push_str(&square.to_code());
        }
        if let Some(sub_sup) = &self.sub_sup {
            buffer.push_str(&sub_sup.to_code());
        }
        for group in &self.groups {
            buffer.push_str(&group.to_code());
        }
        for named in &self.named_groups {
            buffer.push_str(&named.to_code());
        }
        buffer
    }
}

impl Command {
    pub fn to_code(&self) -> String {
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|part| part.to_code())
            .collect();
        format!("\\{}", rendered.join("."))
    }
}

impl TexNode {
    pub fn to_code(&self) -> String {
        match self {
            TexNode::Text(text) => text
                .text
                .clone(),
            TexNode::Command(command) => command.to_code(),
            TexNode::Group(group) => group.to_code(),
            TexNode::SubSup(sub_sup) => sub_sup.to_code(),
            TexNode::NamedGroup(named) => named.to_code(),
            TexNode::Expression(expression) => expression.to_code(),
            TexNode::Parameters(parameters) => parameters.to_code(),
            TexNode::Is(node) => format!(
                "{} is {}",
                node.lhs
                    .to_code(),
                node.rhs
                    .to_code()
            ),
            TexNode::ColonEquals(node) => format!(
                "{} := {}",
                node.lhs
                    .to_code(),
                node.rhs
                    .to_code()
            ),
        }
    }

    /// Rebuild every child bottom-up, reconstruct this node from the
    /// rebuilt children, then apply `f` to the reconstruction. Where a
    /// slot requires a particular variant (a command part's groups, for
    /// instance) and `f` hands back something else, the rebuilt value is
    /// kept for that slot.
    pub fn transform(self, f: &dyn Fn(TexNode) -> TexNode) -> TexNode {
        let rebuilt = match self {
            TexNode::Text(text) => TexNode::Text(text),
            TexNode::Command(command) => TexNode::Command(rebuild_command(command, f)),
            TexNode::Group(group) => TexNode::Group(transformed_group(group, f)),
            TexNode::SubSup(sub_sup) => TexNode::SubSup(rebuild_sub_sup(sub_sup, f)),
            TexNode::NamedGroup(named) => TexNode::NamedGroup(rebuild_named_group(named, f)),
            TexNode::Expression(expression) => {
                TexNode::Expression(transformed_expression(expression, f))
            }
            TexNode::Parameters(parameters) => {
                TexNode::Parameters(rebuild_parameters(parameters, f))
            }
            TexNode::Is(node) => TexNode::Is(IsNode {
                lhs: rebuild_parameters(node.lhs, f),
                rhs: rebuild_parameters(node.rhs, f),
            }),
            TexNode::ColonEquals(node) => TexNode::ColonEquals(ColonEqualsNode {
                lhs: rebuild_parameters(node.lhs, f),
                rhs: rebuild_parameters(node.rhs, f),
            }),
        };
        f(rebuilt)
    }
}

fn transformed_expression(expression: Expression, f: &dyn Fn(TexNode) -> TexNode) -> Expression {
    let fallback = Expression {
        children: expression
            .children
            .into_iter()
            .map(|child| child.transform(f))
            .collect(),
    };
    match f(TexNode::Expression(fallback.clone())) {
        TexNode::Expression(expression) => expression,
        _ => fallback,
    }
}

fn rebuild_parameters(parameters: Parameters, f: &dyn Fn(TexNode) -> TexNode) -> Parameters {
    Parameters {
        items: parameters
            .items
            .into_iter()
            .map(|item| transformed_expression(item, f))
            .collect(),
    }
}

fn transformed_group(group: GroupNode, f: &dyn Fn(TexNode) -> TexNode) -> GroupNode {
    let fallback = GroupNode {
        kind: group.kind,
        parameters: rebuild_parameters(group.parameters, f),
    };
    match f(TexNode::Group(fallback.clone())) {
        TexNode::Group(group) => group,
        _ => fallback,
    }
}

fn rebuild_sub_sup(sub_sup: SubSup, f: &dyn Fn(TexNode) -> TexNode) -> SubSup {
    SubSup {
        sub: sub_sup
            .sub
            .map(|group| transformed_group(group, f)),
        sup: sub_sup
            .sup
            .map(|group| transformed_group(group, f)),
    }
}

fn rebuild_named_group(named: NamedGroup, f: &dyn Fn(TexNode) -> TexNode) -> NamedGroup {
    NamedGroup {
        name: named.name,
        group: transformed_group(named.group, f),
    }
}

fn rebuild_command(command: Command, f: &dyn Fn(TexNode) -> TexNode) -> Command {
    Command {
        parts: command
            .parts
            .into_iter()
            .map(|part| CommandPart {
                name: part.name,
                square: part
                    .square
                    .map(|group| transformed_group(group, f)),
                sub_sup: part
                    .sub_sup
                    .map(|sub_sup| rebuild_sub_sup(sub_sup, f)),
                groups: part
                    .groups
                    .into_iter()
                    .map(|group| transformed_group(group, f))
                    .collect(),
                named_groups: part
                    .named_groups
                    .into_iter()
                    .map(|named| rebuild_named_group(named, f))
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod check {
    use super::*;

    pub fn identifier(text: &str) -> TexNode {
        TexNode::Text(TextNode {
            kind: TextKind::Identifier,
            text: text.to_string(),
        })
    }

    #[test]
    fn command_code() {
        let command = Command {
            parts: vec![CommandPart {
                name: "f".to_string(),
                square: None,
                sub_sup: None,
                groups: vec![GroupNode {
                    kind: GroupKind::Curly,
                    parameters: Parameters {
                        items: vec![Expression {
                            children: vec![identifier("x")],
                        }],
                    },
                }],
                named_groups: vec![],
            }],
        };

        assert_eq!(command.to_code(), "\\f{x}");
    }

    #[test]
    fn is_form_code() {
        let node = TexNode::Is(IsNode {
            lhs: Parameters {
                items: vec![Expression {
                    children: vec![identifier("x")],
                }],
            },
            rhs: Parameters {
                items: vec![Expression {
                    children: vec![identifier("\\group")],
                }],
            },
        });

        assert_eq!(node.to_code(), "x is \\group");
    }

    #[test]
    fn transform_reaches_command_arguments() {
        let node = TexNode::Command(Command {
            parts: vec![CommandPart {
                name: "f".to_string(),
                square: None,
                sub_sup: None,
                groups: vec![GroupNode {
                    kind: GroupKind::Curly,
                    parameters: Parameters {
                        items: vec![Expression {
                            children: vec![identifier("x")],
                        }],
                    },
                }],
                named_groups: vec![],
            }],
        });

        let renamed = node.transform(&|node| match node {
            TexNode::Text(text) if text.text == "x" => TexNode::Text(TextNode {
                kind: TextKind::Identifier,
                text: "y".to_string(),
            }),
            other => other,
        });

        assert_eq!(renamed.to_code(), "\\f{y}");
    }
}
