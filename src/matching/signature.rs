//! Command signatures. A signature erases a command occurrence down to
//! its shape: part names stay, every argument group collapses to a
//! single `?`. Two occurrences with the same shape share a signature,
//! which is the key patterns are looked up by.

use crate::language::{
    Clause, ClauseListSection, Command, Document, Expression, GroupNode, NamedGroup, Parameters,
    Statement, SubSup, TexNode,
};

pub fn signature_of(command: &Command) -> String {
    let mut buffer = String::from("\\");
    for (i, part) in command
        .parts
        .iter()
        .enumerate()
    {
        if i > 0 {
            buffer.push('.');
        }
        buffer.push_str(&part.name);
        if part
            .square
            .is_some()
        {
            buffer.push_str("[?]");
        }
        if let Some(sub_sup) = &part.sub_sup {
            if sub_sup
                .sub
                .is_some()
            {
                buffer.push_str("_{?}");
            }
            if sub_sup
                .sup
                .is_some()
            {
                buffer.push_str("^{?}");
            }
        }
        for group in &part.groups {
            buffer.push(
                group
                    .kind
                    .open(),
            );
            buffer.push('?');
            buffer.push(
                group
                    .kind
                    .close(),
            );
        }
        for named in &part.named_groups {
            buffer.push(':');
            buffer.push_str(&named.name);
            buffer.push_str("{?}");
        }
    }
    buffer
}

/// Call `f` for every command occurrence in the expression, including
/// commands nested inside another command's argument groups.
pub fn for_each_command(expression: &Expression, f: &mut dyn FnMut(&Command)) {
    for child in &expression.children {
        visit(child, f);
    }
}

fn visit(node: &TexNode, f: &mut dyn FnMut(&Command)) {
    match node {
        TexNode::Text(_) => {}
        TexNode::Command(command) => {
            f(command);
            for part in &command.parts {
                if let Some(group) = &part.square {
                    visit_group(group, f);
                }
                if let Some(sub_sup) = &part.sub_sup {
                    visit_sub_sup(sub_sup, f);
                }
                for group in &part.groups {
                    visit_group(group, f);
                }
                for NamedGroup { group, .. } in &part.named_groups {
                    visit_group(group, f);
                }
            }
        }
        TexNode::Group(group) => visit_group(group, f),
        TexNode::SubSup(sub_sup) => visit_sub_sup(sub_sup, f),
        TexNode::NamedGroup(named) => visit_group(&named.group, f),
        TexNode::Expression(expression) => for_each_command(expression, f),
        TexNode::Parameters(parameters) => visit_parameters(parameters, f),
        TexNode::Is(is) => {
            visit_parameters(&is.lhs, f);
            visit_parameters(&is.rhs, f);
        }
        TexNode::ColonEquals(colon_equals) => {
            visit_parameters(&colon_equals.lhs, f);
            visit_parameters(&colon_equals.rhs, f);
        }
    }
}

fn visit_group(group: &GroupNode, f: &mut dyn FnMut(&Command)) {
    visit_parameters(&group.parameters, f);
}

fn visit_sub_sup(sub_sup: &SubSup, f: &mut dyn FnMut(&Command)) {
    if let Some(group) = &sub_sup.sub {
        visit_group(group, f);
    }
    if let Some(group) = &sub_sup.sup {
        visit_group(group, f);
    }
}

fn visit_parameters(parameters: &Parameters, f: &mut dyn FnMut(&Command)) {
    for item in &parameters.items {
        for_each_command(item, f);
    }
}

/// Call `f` for every statement in the document, ids included.
pub fn for_each_statement(document: &Document, f: &mut dyn FnMut(&Statement)) {
    for defines in &document.defines {
        f(&defines.id);
        if let Some(section) = &defines.assuming_section {
            each_in_clauses(section, f);
        }
        each_in_clauses(&defines.means_section, f);
    }
    for represents in &document.represents {
        f(&represents.id);
        if let Some(section) = &represents.assuming_section {
            each_in_clauses(section, f);
        }
        each_in_clauses(&represents.that_section, f);
    }
    for result in &document.results {
        each_in_clauses(&result.result_section, f);
    }
    for axiom in &document.axioms {
        each_in_clauses(&axiom.axiom_section, f);
    }
    for conjecture in &document.conjectures {
        each_in_clauses(&conjecture.conjecture_section, f);
    }
}

fn each_in_clauses(section: &ClauseListSection, f: &mut dyn FnMut(&Statement)) {
    for clause in &section.clauses {
        each_in_clause(clause, f);
    }
}

fn each_in_clause(clause: &Clause, f: &mut dyn FnMut(&Statement)) {
    match clause {
        Clause::Statement(statement) => f(statement),
        Clause::Text(_) | Clause::Target(_) => {}
        Clause::For(group) => {
            if let Some(section) = &group.where_section {
                each_in_clauses(section, f);
            }
            if let Some(section) = &group.such_that_section {
                each_in_clauses(section, f);
            }
            each_in_clauses(&group.then_section, f);
        }
        Clause::Exists(group) => {
            if let Some(section) = &group.where_section {
                each_in_clauses(section, f);
            }
            each_in_clauses(&group.such_that_section, f);
        }
        Clause::Not(group) => each_in_clauses(&group.not_section, f),
        Clause::Or(group) => each_in_clauses(&group.or_section, f),
        Clause::If(group) => {
            each_in_clauses(&group.if_section, f);
            each_in_clauses(&group.then_section, f);
        }
        Clause::Iff(group) => {
            each_in_clauses(&group.iff_section, f);
            each_in_clauses(&group.then_section, f);
        }
    }
}

/// Every distinct command signature appearing anywhere in the document,
/// sorted for stable output.
pub fn find_all_signatures(document: &Document) -> Vec<String> {
    let mut signatures: Vec<String> = Vec::new();
    for_each_statement(document, &mut |statement| {
        if let Ok(expression) = &statement.root {
            for_each_command(expression, &mut |command| {
                let signature = signature_of(command);
                if !signatures.contains(&signature) {
                    signatures.push(signature);
                }
            });
        }
    });
    signatures.sort();
    signatures
}
