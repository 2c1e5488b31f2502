//! Matching a declared command pattern against an occurrence. A match
//! binds every pattern parameter name to the expressions supplied at
//! the occurrence; a failed match reports every disagreement it finds
//! rather than stopping at the first.

use std::collections::HashMap;

use crate::language::{
    Command, CommandPart, Expression, GroupKind, GroupNode, TexNode, TextKind,
};

/// A pattern drawn from a Defines: or Represents: id. Infix forms carry
/// the names bound to the operands on either side of the command.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct OperatorPattern {
    pub lhs: Option<String>,
    pub command: Command,
    pub rhs: Option<String>,
}

impl OperatorPattern {
    /// Read a pattern out of an id expression: exactly one command at
    /// the top level, optionally flanked by operand identifiers.
    pub fn from_id(expression: &Expression) -> Option<OperatorPattern> {
        let mut command = None;
        let mut command_index = 0;
        for (i, child) in expression
            .children
            .iter()
            .enumerate()
        {
            if let TexNode::Command(found) = child {
                if command.is_some() {
                    return None;
                }
                command = Some(found.clone());
                command_index = i;
            }
        }
        let command = command?;
        let lhs = if command_index > 0 {
            operand_name(&expression.children[command_index - 1])
        } else {
            None
        };
        let rhs = expression
            .children
            .get(command_index + 1)
            .and_then(operand_name);
        Some(OperatorPattern { lhs, command, rhs })
    }
}

fn operand_name(node: &TexNode) -> Option<String> {
    match node {
        TexNode::Text(text) if text.kind == TextKind::Identifier => Some(
            text.text
                .trim_end_matches('?')
                .to_string(),
        ),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct MatchResult {
    pub substitutions: HashMap<String, Vec<Expression>>,
    pub errors: Vec<String>,
}

impl MatchResult {
    pub fn matches(&self) -> bool {
        self.errors
            .is_empty()
    }
}

/// Match a pattern against a command occurrence together with the
/// sibling nodes on either side of it, binding parameter names to the
/// supplied expressions.
pub fn get_substitutions(
    pattern: &OperatorPattern,
    lhs: Option<&TexNode>,
    value: &Command,
    rhs: Option<&TexNode>,
) -> MatchResult {
    let mut result = MatchResult::default();
    match_operand(&pattern.lhs, lhs, "left", &mut result);
    match_operand(&pattern.rhs, rhs, "right", &mut result);
    match_command(&pattern.command, value, &mut result);
    result
}

fn match_operand(
    name: &Option<String>,
    operand: Option<&TexNode>,
    side: &str,
    result: &mut MatchResult,
) {
    match (name, operand) {
        (Some(name), Some(node)) => {
            result
                .substitutions
                .insert(
                    name.clone(),
                    vec![Expression {
                        children: vec![node.clone()],
                    }],
                );
        }
        (Some(name), None) => {
            result
                .errors
                .push(format!(
                    "Expected a {} operand to bind to '{}'",
                    side, name
                ));
        }
        (None, _) => {}
    }
}

fn match_command(pattern: &Command, value: &Command, result: &mut MatchResult) {
    if pattern
        .parts
        .len()
        != value
            .parts
            .len()
    {
        result
            .errors
            .push(format!(
                "Expected {} command part(s) but found {}",
                pattern
                    .parts
                    .len(),
                value
                    .parts
                    .len()
            ));
        return;
    }
    for (pattern_part, value_part) in pattern
        .parts
        .iter()
        .zip(&value.parts)
    {
        match_part(pattern_part, value_part, result);
    }
}

fn match_part(pattern: &CommandPart, value: &CommandPart, result: &mut MatchResult) {
    if pattern.name != value.name {
        result
            .errors
            .push(format!(
                "Expected a command part named '{}' but found '{}'",
                pattern.name, value.name
            ));
        return;
    }

    match_optional_group(&pattern.square, &value.square, "[...]", &pattern.name, result);

    let (pattern_sub, pattern_sup) = scripts(pattern);
    let (value_sub, value_sup) = scripts(value);
    match_optional_group(&pattern_sub, &value_sub, "_{...}", &pattern.name, result);
    match_optional_group(&pattern_sup, &value_sup, "^{...}", &pattern.name, result);

    if pattern
        .groups
        .is_empty()
    {
        // parenthesized arguments are allowed to appear at the
        // occurrence even when the pattern declares none
        let only_parens = value
            .groups
            .iter()
            .all(|group| group.kind == GroupKind::Paren);
        if !value
            .groups
            .is_empty()
            && !only_parens
        {
            result
                .errors
                .push(format!(
                    "Unexpected argument group(s) on '{}'",
                    pattern.name
                ));
        }
    } else if pattern
        .groups
        .len()
        != value
            .groups
            .len()
    {
        result
            .errors
            .push(format!(
                "Expected {} argument group(s) on '{}' but found {}",
                pattern
                    .groups
                    .len(),
                pattern.name,
                value
                    .groups
                    .len()
            ));
    } else {
        for (pattern_group, value_group) in pattern
            .groups
            .iter()
            .zip(&value.groups)
        {
            match_group(pattern_group, value_group, result);
        }
    }

    for named in &pattern.named_groups {
        match value
            .named_groups
            .iter()
            .find(|candidate| candidate.name == named.name)
        {
            Some(found) => match_group(&named.group, &found.group, result),
            None => {
                result
                    .errors
                    .push(format!(
                        "Expected a :{}{{...}} group on '{}'",
                        named.name, pattern.name
                    ));
            }
        }
    }
    for named in &value.named_groups {
        if pattern
            .named_groups
            .iter()
            .all(|candidate| candidate.name != named.name)
        {
            result
                .errors
                .push(format!(
                    "Unexpected :{}{{...}} group on '{}'",
                    named.name, pattern.name
                ));
        }
    }
}

fn scripts(part: &CommandPart) -> (Option<GroupNode>, Option<GroupNode>) {
    match &part.sub_sup {
        Some(sub_sup) => (
            sub_sup
                .sub
                .clone(),
            sub_sup
                .sup
                .clone(),
        ),
        None => (None, None),
    }
}

fn match_optional_group(
    pattern: &Option<GroupNode>,
    value: &Option<GroupNode>,
    shape: &str,
    name: &str,
    result: &mut MatchResult,
) {
    match (pattern, value) {
        (Some(pattern_group), Some(value_group)) => {
            match_group(pattern_group, value_group, result);
        }
        (Some(_), None) => {
            result
                .errors
                .push(format!("Expected a {} group on '{}'", shape, name));
        }
        (None, Some(_)) => {
            result
                .errors
                .push(format!("Unexpected {} group on '{}'", shape, name));
        }
        (None, None) => {}
    }
}

fn match_group(pattern: &GroupNode, value: &GroupNode, result: &mut MatchResult) {
    let mut names = Vec::new();
    for item in &pattern
        .parameters
        .items
    {
        match parameter_name(item) {
            Some(name) => names.push(name),
            None => {
                result
                    .errors
                    .push(format!(
                        "Pattern parameter '{}' is not an identifier",
                        item.to_code()
                    ));
                return;
            }
        }
    }

    let supplied = &value
        .parameters
        .items;
    let variadic_tail = names
        .last()
        .map(|parameter| parameter.variadic)
        .unwrap_or(false);

    if variadic_tail {
        let required = names.len() - 1;
        if supplied.len() < required {
            result
                .errors
                .push(format!(
                    "Expected at least {} argument(s) but found {}",
                    required,
                    supplied.len()
                ));
            return;
        }
        for (parameter, item) in names
            .iter()
            .zip(&supplied[..required])
        {
            result
                .substitutions
                .insert(
                    parameter
                        .name
                        .clone(),
                    vec![item.clone()],
                );
        }
        result
            .substitutions
            .insert(
                names[required]
                    .name
                    .clone(),
                supplied[required..].to_vec(),
            );
    } else if names.len() != supplied.len() {
        result
            .errors
            .push(format!(
                "Expected {} argument(s) but found {}",
                names.len(),
                supplied.len()
            ));
    } else {
        for (parameter, item) in names
            .iter()
            .zip(supplied)
        {
            result
                .substitutions
                .insert(
                    parameter
                        .name
                        .clone(),
                    vec![item.clone()],
                );
        }
    }
}

struct Parameter {
    name: String,
    variadic: bool,
}

// a pattern parameter is an identifier `x`, a variadic identifier
// `xs?`, a function application `f(x)`, or an indexed sequence `{x}_i`
fn parameter_name(item: &Expression) -> Option<Parameter> {
    match item
        .children
        .as_slice()
    {
        [TexNode::Text(text)] if text.kind == TextKind::Identifier => Some(Parameter {
            name: text
                .text
                .trim_end_matches('?')
                .to_string(),
            variadic: text
                .text
                .ends_with('?'),
        }),
        [TexNode::Text(text), TexNode::Group(group)]
            if text.kind == TextKind::Identifier && group.kind == GroupKind::Paren =>
        {
            Some(Parameter {
                name: text
                    .text
                    .clone(),
                variadic: false,
            })
        }
        [TexNode::Group(group), TexNode::SubSup(_)] if group.kind == GroupKind::Curly => {
            match group
                .parameters
                .items
                .as_slice()
            {
                [inner] => parameter_name(inner),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Check that a pattern is declarable at all: parameters must have a
/// bindable shape, names must not repeat, and a variadic parameter must
/// be a plain identifier in the trailing position of its group.
pub fn validate_pattern(pattern: &OperatorPattern) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    let mut claim = |name: &str, errors: &mut Vec<String>| {
        if seen
            .iter()
            .any(|existing| existing == name)
        {
            errors.push(format!("Duplicate pattern parameter '{}'", name));
        } else {
            seen.push(name.to_string());
        }
    };

    if let Some(name) = &pattern.lhs {
        claim(name, &mut errors);
    }
    if let Some(name) = &pattern.rhs {
        claim(name, &mut errors);
    }

    for part in &pattern
        .command
        .parts
    {
        let mut groups: Vec<&GroupNode> = Vec::new();
        if let Some(group) = &part.square {
            groups.push(group);
        }
        if let Some(sub_sup) = &part.sub_sup {
            if let Some(group) = &sub_sup.sub {
                groups.push(group);
            }
            if let Some(group) = &sub_sup.sup {
                groups.push(group);
            }
        }
        groups.extend(&part.groups);
        for named in &part.named_groups {
            groups.push(&named.group);
        }

        for group in groups {
            let items = &group
                .parameters
                .items;
            for (i, item) in items
                .iter()
                .enumerate()
            {
                match parameter_name(item) {
                    Some(parameter) => {
                        if parameter.variadic {
                            if i + 1 != items.len() {
                                errors.push(format!(
                                    "Variadic parameter '{}' must come last in its group",
                                    parameter.name
                                ));
                            }
                            if !is_plain_identifier(item) {
                                errors.push(format!(
                                    "Variadic parameter '{}' must be a plain identifier",
                                    parameter.name
                                ));
                            }
                        }
                        claim(&parameter.name, &mut errors);
                    }
                    None => {
                        errors.push(format!(
                            "Pattern parameter '{}' is not an identifier, function \
                             application, or indexed sequence",
                            item.to_code()
                        ));
                    }
                }
            }
        }
    }

    errors
}

fn is_plain_identifier(item: &Expression) -> bool {
    matches!(
        item.children
            .as_slice(),
        [TexNode::Text(text)] if text.kind == TextKind::Identifier
    )
}
