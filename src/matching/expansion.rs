//! Rewriting statements into their written forms. Every Defines: or
//! Represents: carrying a written: section contributes a pattern and a
//! template; expansion walks each statement bottom-up, matches command
//! occurrences against the library by signature, and splices the filled
//! template back in as text. Passes repeat until the document stops
//! changing.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::compile;
use crate::language::{
    Command, Document, Expression, ParseError, Statement, TexNode, TextKind, TextNode, TextSection,
};
use crate::matching::matcher::{get_substitutions, validate_pattern, OperatorPattern};
use crate::matching::signature::signature_of;

// fixed point is normally reached in two or three passes; the cap only
// guards against mutually recursive written forms
const MAXIMUM_PASSES: usize = 32;

pub struct PatternEntry {
    pub pattern: OperatorPattern,
    pub template: String,
}

/// The written forms declared by a document, keyed by command signature.
pub struct PatternLibrary {
    entries: HashMap<String, PatternEntry>,
    declared: HashSet<String>,
}

impl PatternLibrary {
    pub fn from_document(document: &Document) -> (PatternLibrary, Vec<ParseError>) {
        let mut library = PatternLibrary {
            entries: HashMap::new(),
            declared: HashSet::new(),
        };
        let mut errors = Vec::new();
        for defines in &document.defines {
            library.add(
                &defines.id,
                defines
                    .written_section
                    .as_ref(),
                &mut errors,
            );
        }
        for represents in &document.represents {
            library.add(
                &represents.id,
                represents
                    .written_section
                    .as_ref(),
                &mut errors,
            );
        }
        (library, errors)
    }

    fn add(&mut self, id: &Statement, written: Option<&TextSection>, errors: &mut Vec<ParseError>) {
        let expression = match &id.root {
            Ok(expression) => expression,
            Err(_) => return,
        };
        let pattern = match OperatorPattern::from_id(expression) {
            Some(pattern) => pattern,
            None => {
                errors.push(ParseError::new(
                    format!("Cannot derive a pattern from the id '{}'", id.text),
                    id.row,
                    id.column,
                ));
                return;
            }
        };
        for problem in validate_pattern(&pattern) {
            errors.push(ParseError::new(problem, id.row, id.column));
        }
        let signature = signature_of(&pattern.command);
        self.declared
            .insert(signature.clone());
        let written = match written {
            Some(section) => section,
            None => return,
        };
        if self
            .entries
            .contains_key(&signature)
        {
            errors.push(ParseError::new(
                format!("Duplicate written form for '{}'", signature),
                id.row,
                id.column,
            ));
            return;
        }
        self.entries
            .insert(
                signature,
                PatternEntry {
                    pattern,
                    template: written
                        .text
                        .clone(),
                },
            );
    }

    pub fn entry(&self, signature: &str) -> Option<&PatternEntry> {
        self.entries
            .get(signature)
    }

    /// Whether the signature is declared at all, written form or not.
    pub fn is_declared(&self, signature: &str) -> bool {
        self.declared
            .contains(signature)
    }
}

/// Expand the whole document to a fixed point, dropping any problems
/// found along the way; unexpandable commands stay verbatim.
pub fn expand(document: Document) -> Document {
    expand_with_errors(document).0
}

pub fn expand_with_errors(document: Document) -> (Document, Vec<ParseError>) {
    let (library, mut errors) = PatternLibrary::from_document(&document);
    let mut document = document;
    let mut seen = vec![document.to_code()];
    let mut pass_errors = Vec::new();

    for pass in 0..MAXIMUM_PASSES {
        let sink = RefCell::new(Vec::new());
        let rewritten =
            document.map_statements(&|expression| expand_expression(expression, &library, &sink));
        let code = rewritten.to_code();
        document = rewritten;
        // each pass re-reports what is still unexpandable, so only the
        // final pass's problems are kept
        pass_errors = sink.into_inner();
        if seen.contains(&code) {
            debug!("expansion stable after {} pass(es)", pass + 1);
            break;
        }
        seen.push(code);
    }

    for error in pass_errors {
        if !errors.contains(&error) {
            errors.push(error);
        }
    }
    (document, errors)
}

/// One bottom-up pass over a single expression tree.
pub fn expand_expression(
    expression: Expression,
    library: &PatternLibrary,
    errors: &RefCell<Vec<ParseError>>,
) -> Expression {
    let rewritten = TexNode::Expression(expression).transform(&|node| match node {
        TexNode::Expression(expression) => {
            TexNode::Expression(rewrite_children(expression, library, errors))
        }
        other => other,
    });
    match rewritten {
        TexNode::Expression(expression) => expression,
        other => Expression {
            children: vec![other],
        },
    }
}

fn rewrite_children(
    expression: Expression,
    library: &PatternLibrary,
    errors: &RefCell<Vec<ParseError>>,
) -> Expression {
    let nodes = expression.children;
    let mut children: Vec<TexNode> = Vec::new();
    let mut index = 0;

    while index < nodes.len() {
        let command = match &nodes[index] {
            TexNode::Command(command) => command,
            other => {
                children.push(other.clone());
                index += 1;
                continue;
            }
        };
        let signature = signature_of(command);
        match library.entry(&signature) {
            Some(entry) => {
                let wants_lhs = entry
                    .pattern
                    .lhs
                    .is_some();
                let wants_rhs = entry
                    .pattern
                    .rhs
                    .is_some();
                let lhs = if wants_lhs { children.last() } else { None };
                let rhs = if wants_rhs {
                    nodes.get(index + 1)
                } else {
                    None
                };
                let result = get_substitutions(&entry.pattern, lhs, command, rhs);
                if result.matches() {
                    let rendered = render(&entry.template, &result.substitutions, library, errors);
                    if wants_lhs {
                        children.pop();
                    }
                    children.push(TexNode::Text(TextNode {
                        kind: TextKind::Identifier,
                        text: rendered,
                    }));
                    index += if wants_rhs { 2 } else { 1 };
                    continue;
                }
                for message in result.errors {
                    errors
                        .borrow_mut()
                        .push(ParseError::at_end(message));
                }
            }
            None => {
                if !library.is_declared(&signature) && !is_bare_operator(command) {
                    errors
                        .borrow_mut()
                        .push(ParseError::at_end(format!(
                            "No matching definition found for '{}'",
                            command.to_code()
                        )));
                }
            }
        }
        children.push(nodes[index].clone());
        index += 1;
    }

    Expression { children }
}

// single letter commands with no arguments read as notation rather than
// a reference to a declared form
fn is_bare_operator(command: &Command) -> bool {
    match command
        .parts
        .as_slice()
    {
        [part] => {
            part.name
                .chars()
                .count()
                == 1
                && part
                    .square
                    .is_none()
                && part
                    .sub_sup
                    .is_none()
                && part
                    .groups
                    .is_empty()
                && part
                    .named_groups
                    .is_empty()
        }
        _ => false,
    }
}

enum Piece {
    Literal(String),
    Placeholder { name: String, mode: Mode },
}

enum Mode {
    Plain,
    Parenthesize,
    StripParens,
    Joined {
        prefix: String,
        separator: String,
        suffix: String,
    },
}

// `x?` plain, `x+?` parenthesized, `x-?` parens stripped, and
// `x{A...S...B}?` joining a variadic binding with the separator between
// the two markers
fn parse_template(template: &str) -> Vec<Piece> {
    let regex = compile!(r"([#$A-Za-z0-9]+)(?:\{([^{}]*)\}\?|([+-])\?|\?)");
    let mut pieces = Vec::new();
    let mut last = 0;

    for captures in regex.captures_iter(template) {
        let all = match captures.get(0) {
            Some(all) => all,
            None => continue,
        };
        if all.start() > last {
            pieces.push(Piece::Literal(template[last..all.start()].to_string()));
        }
        let name = captures
            .get(1)
            .map(|group| {
                group
                    .as_str()
                    .to_string()
            })
            .unwrap_or_default();
        let mode = if let Some(joined) = captures.get(2) {
            parse_joined(joined.as_str())
        } else {
            match captures
                .get(3)
                .map(|group| group.as_str())
            {
                Some("+") => Mode::Parenthesize,
                Some("-") => Mode::StripParens,
                _ => Mode::Plain,
            }
        };
        pieces.push(Piece::Placeholder { name, mode });
        last = all.end();
    }
    if last < template.len() {
        pieces.push(Piece::Literal(template[last..].to_string()));
    }
    pieces
}

fn parse_joined(content: &str) -> Mode {
    let parts: Vec<&str> = content
        .split("...")
        .collect();
    match parts.as_slice() {
        [prefix, separator, suffix] => Mode::Joined {
            prefix: prefix.to_string(),
            separator: separator.to_string(),
            suffix: suffix.to_string(),
        },
        [prefix, suffix] => Mode::Joined {
            prefix: prefix.to_string(),
            separator: String::new(),
            suffix: suffix.to_string(),
        },
        _ => Mode::Joined {
            prefix: String::new(),
            separator: content.to_string(),
            suffix: String::new(),
        },
    }
}

fn render(
    template: &str,
    substitutions: &HashMap<String, Vec<Expression>>,
    library: &PatternLibrary,
    errors: &RefCell<Vec<ParseError>>,
) -> String {
    let mut buffer = String::new();
    for piece in parse_template(template) {
        match piece {
            Piece::Literal(text) => buffer.push_str(&text),
            Piece::Placeholder { name, mode } => {
                let bound = match substitutions.get(&name) {
                    Some(bound) => bound,
                    None => {
                        errors
                            .borrow_mut()
                            .push(ParseError::at_end(format!(
                                "The written form references '{}?' which the pattern does not bind",
                                name
                            )));
                        buffer.push_str(&name);
                        continue;
                    }
                };
                // substituted sub-expressions are themselves expanded
                let expanded: Vec<Expression> = bound
                    .iter()
                    .map(|expression| expand_expression(expression.clone(), library, errors))
                    .collect();
                match mode {
                    Mode::Plain => {
                        let rendered: Vec<String> = expanded
                            .iter()
                            .map(|expression| expression.to_code())
                            .collect();
                        buffer.push_str(&rendered.join(", "));
                    }
                    Mode::Parenthesize => {
                        let rendered: Vec<String> = expanded
                            .iter()
                            .map(|expression| {
                                if expression
                                    .children
                                    .len()
                                    > 1
                                {
                                    format!("({})", expression.to_code())
                                } else {
                                    expression.to_code()
                                }
                            })
                            .collect();
                        buffer.push_str(&rendered.join(", "));
                    }
                    Mode::StripParens => {
                        let rendered: Vec<String> = expanded
                            .iter()
                            .map(strip_parens)
                            .collect();
                        buffer.push_str(&rendered.join(", "));
                    }
                    Mode::Joined {
                        prefix,
                        separator,
                        suffix,
                    } => {
                        let rendered: Vec<String> = expanded
                            .iter()
                            .map(|expression| expression.to_code())
                            .collect();
                        buffer.push_str(&prefix);
                        buffer.push_str(&rendered.join(&separator));
                        buffer.push_str(&suffix);
                    }
                }
            }
        }
    }
    buffer
}

fn strip_parens(expression: &Expression) -> String {
    if let [TexNode::Group(group)] = expression
        .children
        .as_slice()
    {
        if group.kind == crate::language::GroupKind::Paren
            && group
                .parameters
                .items
                .len()
                == 1
        {
            return group.parameters.items[0].to_code();
        }
    }
    expression.to_code()
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::parsing::parse;

    fn first_statement_text(document: &Document) -> String {
        match &document.results[0]
            .result_section
            .clauses[0]
        {
            crate::language::Clause::For(group) => match &group
                .then_section
                .clauses[0]
            {
                crate::language::Clause::Statement(statement) => statement
                    .text
                    .clone(),
                other => panic!("expected a statement, found {:?}", other),
            },
            crate::language::Clause::Statement(statement) => statement
                .text
                .clone(),
            other => panic!("expected a statement or for group, found {:?}", other),
        }
    }

    #[test]
    fn written_form_replaces_the_command() {
        let document = parse(
            r#"[\f{x}]
Defines: y
means:
. 'y = x'
written: "the image of x?"

Result:
. for: z, w
  then:
  . 'z = \f{w}'"#,
        )
        .unwrap();
        let expanded = expand(document);
        assert_eq!(first_statement_text(&expanded), "z = the image of w");
    }

    #[test]
    fn expansion_is_idempotent() {
        let document = parse(
            r#"[\f{x}]
Defines: y
means:
. 'y = x'
written: "the image of x?"

Result:
. for: z, w
  then:
  . 'z = \f{w}'"#,
        )
        .unwrap();
        let once = expand(document);
        let code = once.to_code();
        let twice = expand(once);
        assert_eq!(twice.to_code(), code);
    }

    #[test]
    fn nested_commands_expand_inside_out() {
        let document = parse(
            r#"[\f{x}]
Defines: y
means:
. 'y = x'
written: "F x?"

[\g{a}]
Defines: b
means:
. 'b = a'
written: "G a?"

Result:
. for: c
  then:
  . 'c = \g{\f{c}}'"#,
        )
        .unwrap();
        let expanded = expand(document);
        assert_eq!(first_statement_text(&expanded), "c = G F c");
    }

    #[test]
    fn variadic_binding_joins_with_the_separator() {
        let document = parse(
            r#"[\list{xs?}]
Defines: L
means:
. 'L = L'
written: "(xs{..., ...}?)"

Result:
. for: a, b, c
  then:
  . '\list{a, b, c} = a'"#,
        )
        .unwrap();
        let expanded = expand(document);
        assert_eq!(first_statement_text(&expanded), "(a, b, c) = a");
    }

    #[test]
    fn compound_substitutions_are_parenthesized() {
        let document = parse(
            r#"[\sq{x}]
Defines: y
means:
. 'y = x'
written: "x+?^2"

Result:
. for: a, b
  then:
  . '\sq{a + b} = a'"#,
        )
        .unwrap();
        let expanded = expand(document);
        assert_eq!(first_statement_text(&expanded), "(a + b)^2 = a");
    }

    #[test]
    fn unknown_command_is_reported_and_kept() {
        let document = parse(
            r"Result:
. for: q
  then:
  . '\unknown{q} = q'",
        )
        .unwrap();
        let (expanded, errors) = expand_with_errors(document);
        assert!(errors
            .iter()
            .any(|error| error
                .message
                .contains("No matching definition")));
        assert_eq!(first_statement_text(&expanded), r"\unknown{q} = q");
    }

    #[test]
    fn infix_pattern_consumes_its_operands() {
        let document = parse(
            r#"[f \compose g]
Defines: h
means:
. 'h = f'
written: "f? after g?"

Result:
. for: p, q
  then:
  . 'p \compose q = p'"#,
        )
        .unwrap();
        let expanded = expand(document);
        assert_eq!(first_statement_text(&expanded), "p after q = p");
    }
}
