//! Recursive descent parser for TexTalk expressions. The top level
//! parses a flat child list and then reduces a single `is` or `:=`
//! occurrence into its binary node form.

use crate::language::{
    ColonEqualsNode, Command, CommandPart, Expression, GroupKind, GroupNode, IsNode, NamedGroup,
    ParseError, Parameters, SubSup, TexNode, TexTokenKind, TextKind, TextNode,
};
use crate::parsing::texlexer::TexLexer;

/// Parse the text between a statement's quotes into an expression tree.
/// The tree comes back alongside every error found; an error-free parse
/// is the caller's signal that the tree is trustworthy.
pub fn parse_expression(text: &str) -> (Expression, Vec<ParseError>) {
    let mut parser = TexParser::new(text);
    let expression = parser.read_expression(&[]);
    let reduced = parser.reduce(expression);
    (reduced, parser.errors)
}

pub struct TexParser {
    lexer: TexLexer,
    errors: Vec<ParseError>,
}

impl TexParser {
    fn new(text: &str) -> TexParser {
        let lexer = TexLexer::new(text);
        let errors = lexer
            .errors()
            .to_vec();
        TexParser { lexer, errors }
    }

    fn error(&mut self, message: impl Into<String>, row: i32, column: i32) {
        self.errors
            .push(ParseError::new(message, row, column));
    }

    fn has_kind(&self, kind: TexTokenKind) -> bool {
        self.lexer
            .peek()
            .map(|token| token.kind == kind)
            .unwrap_or(false)
    }

    fn next_has_kind(&self, kind: TexTokenKind) -> bool {
        self.lexer
            .peek_next()
            .map(|token| token.kind == kind)
            .unwrap_or(false)
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

    fn expect(&mut self, kind: TexTokenKind) -> Option<crate::language::TexToken> {
        if self.has_kind(kind) {
            self.lexer
                .next()
        } else {
            let (row, column) = self.position();
            let found = self
                .lexer
                .peek()
                .map(|token| {
                    token
                        .text
                        .clone()
                })
                .unwrap_or_else(|| "the end of input".to_string());
            self.error(format!("Expected '{}' but found '{}'", kind, found), row, column);
            None
        }
    }

    /// Gather children until a terminator or the end of input. Any token
    /// no rule claims is consumed with an error so the loop always makes
    /// progress.
    fn read_expression(&mut self, terminators: &[TexTokenKind]) -> Expression {
        let mut children = Vec::new();

        while let Some(token) = self
            .lexer
            .peek()
        {
            if terminators.contains(&token.kind) {
                break;
            }
            match token.kind {
                TexTokenKind::Backslash => {
                    let command = self.read_command();
                    children.push(TexNode::Command(command));
                }
                TexTokenKind::LeftParen => {
                    let group = self.read_group(GroupKind::Paren);
                    children.push(TexNode::Group(group));
                }
                TexTokenKind::LeftCurly => {
                    let group = self.read_group(GroupKind::Curly);
                    children.push(TexNode::Group(group));
                }
                TexTokenKind::Is => {
                    self.lexer
                        .next();
                    children.push(text_node(TextKind::Is, "is"));
                }
                TexTokenKind::Identifier => {
                    if let Some(token) = self
                        .lexer
                        .next()
                    {
                        children.push(text_node(TextKind::Identifier, &token.text));
                    }
                }
                TexTokenKind::Operator => {
                    if let Some(token) = self
                        .lexer
                        .next()
                    {
                        children.push(text_node(TextKind::Operator, &token.text));
                    }
                }
                TexTokenKind::Comma => {
                    self.lexer
                        .next();
                    children.push(text_node(TextKind::Comma, ","));
                }
                TexTokenKind::Caret => {
                    self.lexer
                        .next();
                    children.push(text_node(TextKind::Operator, "^"));
                }
                TexTokenKind::Underscore => {
                    self.lexer
                        .next();
                    children.push(text_node(TextKind::Operator, "_"));
                }
                TexTokenKind::ColonEquals => {
                    self.lexer
                        .next();
                    children.push(text_node(TextKind::ColonEquals, ":="));
                }
                _ => {
                    let (row, column) = (token.row, token.column);
                    let text = token
                        .text
                        .clone();
                    self.lexer
                        .next();
                    self.error(format!("Unexpected token '{}'", text), row, column);
                }
            }
        }

        Expression { children }
    }

    /// Reduce a single top-level `is` into its binary node, then do the
    /// same for `:=`. More than one occurrence of either at one level is
    /// an error and the flat form is kept.
    fn reduce(&mut self, expression: Expression) -> Expression {
        let expression = self.reduce_kind(expression, TextKind::Is);
        self.reduce_kind(expression, TextKind::ColonEquals)
    }

    fn reduce_kind(&mut self, expression: Expression, kind: TextKind) -> Expression {
        let positions: Vec<usize> = expression
            .children
            .iter()
            .enumerate()
            .filter(|(_, child)| matches!(child, TexNode::Text(text) if text.kind == kind))
            .map(|(i, _)| i)
            .collect();

        match positions.len() {
            0 => expression,
            1 => {
                let index = positions[0];
                let mut children = expression.children;
                let right: Vec<TexNode> = children.split_off(index + 1);
                children.pop();
                let lhs = self.split_parameters(children);
                let rhs = self.split_parameters(right);
                let node = match kind {
                    TextKind::Is => TexNode::Is(IsNode { lhs, rhs }),
                    _ => TexNode::ColonEquals(ColonEqualsNode { lhs, rhs }),
                };
                Expression {
                    children: vec![node],
                }
            }
            _ => {
                let what = match kind {
                    TextKind::Is => "is",
                    _ => ":=",
                };
                self.error(
                    format!("Found more than one '{}' at the same level", what),
                    -1,
                    -1,
                );
                expression
            }
        }
    }

    fn split_parameters(&mut self, children: Vec<TexNode>) -> Parameters {
        let mut items = Vec::new();
        let mut current = Vec::new();
        for child in children {
            if matches!(&child, TexNode::Text(text) if text.kind == TextKind::Comma) {
                items.push(self.reduce(Expression { children: current }));
                current = Vec::new();
            } else {
                current.push(child);
            }
        }
        items.push(self.reduce(Expression { children: current }));
        Parameters { items }
    }

    /// A command is `\` followed by one or more dot-separated parts.
    fn read_command(&mut self) -> Command {
        self.expect(TexTokenKind::Backslash);

        let mut parts = vec![self.read_command_part()];
        while self.has_kind(TexTokenKind::Period) {
            self.lexer
                .next();
            parts.push(self.read_command_part());
        }

        Command { parts }
    }

    fn read_command_part(&mut self) -> CommandPart {
        let name = match self.expect(TexTokenKind::Identifier) {
            Some(token) => token.text,
            None => String::new(),
        };

        let square = if self.has_kind(TexTokenKind::LeftSquare) {
            Some(self.read_group(GroupKind::Square))
        } else {
            None
        };

        let sub_sup = self.read_sub_sup();

        // positional groups are homogeneous: the first one picks the
        // bracket kind and the rest must use the same
        let mut groups = Vec::new();
        let chosen = if self.has_kind(TexTokenKind::LeftCurly) {
            Some(GroupKind::Curly)
        } else if self.has_kind(TexTokenKind::LeftParen) {
            Some(GroupKind::Paren)
        } else {
            None
        };
        if let Some(kind) = chosen {
            let open = match kind {
                GroupKind::Curly => TexTokenKind::LeftCurly,
                _ => TexTokenKind::LeftParen,
            };
            while self.has_kind(open) {
                groups.push(self.read_group(kind));
            }
        }

        let mut named_groups = Vec::new();
        while self.has_kind(TexTokenKind::Colon) && self.next_has_kind(TexTokenKind::Identifier) {
            self.lexer
                .next();
            let name = match self.expect(TexTokenKind::Identifier) {
                Some(token) => token.text,
                None => String::new(),
            };
            let group = if self.has_kind(TexTokenKind::LeftCurly) {
                self.read_group(GroupKind::Curly)
            } else {
                let (row, column) = self.position();
                self.error(
                    format!("Expected a curly group after ':{}'", name),
                    row,
                    column,
                );
                empty_group(GroupKind::Curly)
            };
            named_groups.push(NamedGroup { name, group });
        }

        CommandPart {
            name,
            square,
            sub_sup,
            groups,
            named_groups,
        }
    }

    fn read_sub_sup(&mut self) -> Option<SubSup> {
        let mut sub = None;
        let mut sup = None;

        if self.has_kind(TexTokenKind::Underscore) {
            self.lexer
                .next();
            sub = Some(self.read_script_group());
        }
        if self.has_kind(TexTokenKind::Caret) {
            self.lexer
                .next();
            sup = Some(self.read_script_group());
        }

        if sub.is_none() && sup.is_none() {
            None
        } else {
            Some(SubSup { sub, sup })
        }
    }

    fn read_script_group(&mut self) -> GroupNode {
        if self.has_kind(TexTokenKind::LeftCurly) {
            self.read_group(GroupKind::Curly)
        } else if self.has_kind(TexTokenKind::LeftParen) {
            self.read_group(GroupKind::Paren)
        } else {
            let (row, column) = self.position();
            self.error("Expected a group in the script position", row, column);
            empty_group(GroupKind::Curly)
        }
    }

    fn read_group(&mut self, kind: GroupKind) -> GroupNode {
        let (open, close) = match kind {
            GroupKind::Paren => (TexTokenKind::LeftParen, TexTokenKind::RightParen),
            GroupKind::Square => (TexTokenKind::LeftSquare, TexTokenKind::RightSquare),
            GroupKind::Curly => (TexTokenKind::LeftCurly, TexTokenKind::RightCurly),
        };

        self.expect(open);

        let mut items = Vec::new();
        if !self.has_kind(close) {
            loop {
                let item = self.read_expression(&[TexTokenKind::Comma, close]);
                let item = self.reduce(item);
                items.push(item);
                if self.has_kind(TexTokenKind::Comma) {
                    self.lexer
                        .next();
                } else {
                    break;
                }
            }
        }

        self.expect(close);

        GroupNode {
            kind,
            parameters: Parameters { items },
        }
    }
}

fn text_node(kind: TextKind, text: &str) -> TexNode {
    TexNode::Text(TextNode {
        kind,
        text: text.to_string(),
    })
}

fn empty_group(kind: GroupKind) -> GroupNode {
    GroupNode {
        kind,
        parameters: Parameters { items: vec![] },
    }
}
