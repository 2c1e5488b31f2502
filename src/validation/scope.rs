//! Scope analysis over a validated document. Binding sections push a
//! frame, introduce their names, and every identifier used in a
//! statement must resolve to some frame. Ids introduce placeholder
//! symbols; a placeholder may shadow another placeholder, but ordinary
//! symbols never collide with anything.

use crate::language::{
    Assignment, AssignmentRhs, Clause, ClauseListSection, ColonEqualsNode, Command, Document,
    Expression, GroupNode, NamedGroup, ParseError, Parameters, Statement, SubSup, Target,
    TargetListSection, TexNode, TextKind, Token, Tuple, TupleItem,
};

pub fn check_document(document: &Document) -> Vec<ParseError> {
    let mut checker = ScopeChecker {
        frames: Vec::new(),
        errors: Vec::new(),
    };

    for defines in &document.defines {
        checker.open();
        checker.bind_placeholders(&defines.id);
        checker.bind_targets(&defines.defines_section);
        if let Some(section) = &defines.assuming_section {
            checker.check_clauses(section);
        }
        checker.check_clauses(&defines.means_section);
        checker.close();
    }

    for represents in &document.represents {
        checker.open();
        checker.bind_placeholders(&represents.id);
        checker.bind_targets(&represents.represents_section);
        if let Some(section) = &represents.assuming_section {
            checker.check_clauses(section);
        }
        checker.check_clauses(&represents.that_section);
        checker.close();
    }

    for result in &document.results {
        checker.open();
        checker.check_clauses(&result.result_section);
        checker.close();
    }

    for axiom in &document.axioms {
        checker.open();
        checker.check_clauses(&axiom.axiom_section);
        checker.close();
    }

    for conjecture in &document.conjectures {
        checker.open();
        checker.check_clauses(&conjecture.conjecture_section);
        checker.close();
    }

    checker.errors
}

struct Symbol {
    name: String,
    placeholder: bool,
}

struct ScopeChecker {
    frames: Vec<Vec<Symbol>>,
    errors: Vec<ParseError>,
}

impl ScopeChecker {
    fn open(&mut self) {
        self.frames
            .push(Vec::new());
    }

    fn close(&mut self) {
        self.frames
            .pop();
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|symbol| symbol.name == name)
    }

    fn bind(&mut self, name: &str, placeholder: bool, row: i32, column: i32) {
        if let Some(existing) = self.lookup(name) {
            if existing.placeholder && placeholder {
                // placeholders from separate id parts may repeat
                return;
            }
            self.errors
                .push(ParseError::new(
                    format!("Duplicate defined symbol '{}'", name),
                    row,
                    column,
                ));
            return;
        }
        if let Some(frame) = self
            .frames
            .last_mut()
        {
            frame.push(Symbol {
                name: name.to_string(),
                placeholder,
            });
        }
    }

    // a binding introduced by `:=` inside a statement; silently ignored
    // when the name already resolves
    fn bind_assigned(&mut self, name: &str) {
        if self
            .lookup(name)
            .is_some()
        {
            return;
        }
        if let Some(frame) = self
            .frames
            .last_mut()
        {
            frame.push(Symbol {
                name: name.to_string(),
                placeholder: false,
            });
        }
    }

    fn bind_placeholders(&mut self, id: &Statement) {
        if let Ok(expression) = &id.root {
            let mut names = Vec::new();
            collect_identifiers_in_expression(expression, &mut names);
            for name in names {
                let name = name.trim_end_matches('?');
                if name.is_empty() || is_literal(name) {
                    continue;
                }
                self.bind(name, true, id.row, id.column);
            }
        }
    }

    fn bind_targets(&mut self, section: &TargetListSection) {
        for target in &section.targets {
            self.bind_target(target);
        }
    }

    fn bind_target(&mut self, target: &Target) {
        match target {
            Target::Identifier(token) => self.bind_token(token),
            Target::Abstraction(abstraction) => {
                self.bind_token(&abstraction.name);
                for param in &abstraction.params {
                    self.bind_token(param);
                }
            }
            Target::Aggregate(aggregate) => {
                for param in &aggregate.params {
                    self.bind_token(param);
                }
            }
            Target::Assignment(assignment) => self.bind_assignment(assignment),
            Target::Tuple(tuple) => self.bind_tuple(tuple),
        }
    }

    fn bind_token(&mut self, token: &Token) {
        self.bind(&token.text, false, token.row, token.column);
    }

    fn bind_assignment(&mut self, assignment: &Assignment) {
        self.bind_token(&assignment.lhs);
        self.bind_rhs(&assignment.rhs);
    }

    fn bind_rhs(&mut self, rhs: &AssignmentRhs) {
        match rhs {
            AssignmentRhs::Name(token) => self.bind_token(token),
            AssignmentRhs::Tuple(tuple) => self.bind_tuple(tuple),
            AssignmentRhs::Aggregate(aggregate) => {
                for param in &aggregate.params {
                    self.bind_token(param);
                }
            }
        }
    }

    fn bind_tuple(&mut self, tuple: &Tuple) {
        for item in &tuple.items {
            match item {
                TupleItem::Assignment(assignment) => self.bind_assignment(assignment),
                TupleItem::Abstraction(abstraction) => {
                    self.bind_token(&abstraction.name);
                    for param in &abstraction.params {
                        self.bind_token(param);
                    }
                }
                TupleItem::Rhs(rhs) => self.bind_rhs(rhs),
            }
        }
    }

    fn check_clauses(&mut self, section: &ClauseListSection) {
        for clause in &section.clauses {
            self.check_clause(clause);
        }
    }

    fn check_clause(&mut self, clause: &Clause) {
        match clause {
            Clause::Statement(statement) => self.check_statement(statement),
            Clause::Text(_) => {}
            Clause::Target(Target::Identifier(token)) => {
                self.check_use(&token.text, token.row, token.column);
            }
            Clause::Target(_) => {}
            Clause::For(group) => {
                self.open();
                self.bind_targets(&group.for_section);
                if let Some(section) = &group.where_section {
                    self.check_clauses(section);
                }
                if let Some(section) = &group.such_that_section {
                    self.check_clauses(section);
                }
                self.check_clauses(&group.then_section);
                self.close();
            }
            Clause::Exists(group) => {
                self.open();
                self.bind_targets(&group.exists_section);
                if let Some(section) = &group.where_section {
                    self.check_clauses(section);
                }
                self.check_clauses(&group.such_that_section);
                self.close();
            }
            Clause::Not(group) => self.check_clauses(&group.not_section),
            Clause::Or(group) => self.check_clauses(&group.or_section),
            Clause::If(group) => {
                self.check_clauses(&group.if_section);
                self.check_clauses(&group.then_section);
            }
            Clause::Iff(group) => {
                self.check_clauses(&group.iff_section);
                self.check_clauses(&group.then_section);
            }
        }
    }

    fn check_statement(&mut self, statement: &Statement) {
        let expression = match &statement.root {
            Ok(expression) => expression,
            Err(_) => return,
        };
        // `:=` introduces its left-hand names before uses are resolved
        let mut assigned = Vec::new();
        collect_assigned_names(expression, &mut assigned);
        for name in assigned {
            self.bind_assigned(&name);
        }
        let mut used = Vec::new();
        collect_identifiers_in_expression(expression, &mut used);
        for name in used {
            self.check_use(&name, statement.row, statement.column);
        }
    }

    fn check_use(&mut self, name: &str, row: i32, column: i32) {
        let name = name.trim_end_matches('?');
        if name.is_empty() || is_literal(name) {
            return;
        }
        if self
            .lookup(name)
            .is_none()
        {
            self.errors
                .push(ParseError::new(
                    format!("Undefined symbol '{}'", name),
                    row,
                    column,
                ));
        }
    }
}

// number-shaped identifiers are literals, never scope entries
fn is_literal(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_digit())
}

fn collect_identifiers_in_expression(expression: &Expression, out: &mut Vec<String>) {
    for child in &expression.children {
        collect_identifiers(child, out);
    }
}

fn collect_identifiers_in_parameters(parameters: &Parameters, out: &mut Vec<String>) {
    for item in &parameters.items {
        collect_identifiers_in_expression(item, out);
    }
}

fn collect_identifiers_in_group(group: &GroupNode, out: &mut Vec<String>) {
    collect_identifiers_in_parameters(&group.parameters, out);
}

fn collect_identifiers_in_sub_sup(sub_sup: &SubSup, out: &mut Vec<String>) {
    if let Some(group) = &sub_sup.sub {
        collect_identifiers_in_group(group, out);
    }
    if let Some(group) = &sub_sup.sup {
        collect_identifiers_in_group(group, out);
    }
}

fn collect_identifiers_in_command(command: &Command, out: &mut Vec<String>) {
    for part in &command.parts {
        if let Some(group) = &part.square {
            collect_identifiers_in_group(group, out);
        }
        if let Some(sub_sup) = &part.sub_sup {
            collect_identifiers_in_sub_sup(sub_sup, out);
        }
        for group in &part.groups {
            collect_identifiers_in_group(group, out);
        }
        for NamedGroup { group, .. } in &part.named_groups {
            collect_identifiers_in_group(group, out);
        }
    }
}

fn collect_identifiers(node: &TexNode, out: &mut Vec<String>) {
    match node {
        TexNode::Text(text) => {
            if text.kind == TextKind::Identifier && text.text != "?" {
                out.push(
                    text.text
                        .clone(),
                );
            }
        }
        TexNode::Command(command) => collect_identifiers_in_command(command, out),
        TexNode::Group(group) => collect_identifiers_in_group(group, out),
        TexNode::SubSup(sub_sup) => collect_identifiers_in_sub_sup(sub_sup, out),
        TexNode::NamedGroup(named) => collect_identifiers_in_group(&named.group, out),
        TexNode::Expression(expression) => collect_identifiers_in_expression(expression, out),
        TexNode::Parameters(parameters) => collect_identifiers_in_parameters(parameters, out),
        TexNode::Is(is) => {
            collect_identifiers_in_parameters(&is.lhs, out);
            collect_identifiers_in_parameters(&is.rhs, out);
        }
        TexNode::ColonEquals(colon_equals) => {
            collect_identifiers_in_parameters(&colon_equals.lhs, out);
            collect_identifiers_in_parameters(&colon_equals.rhs, out);
        }
    }
}

// left-hand sides of `:=` nodes that are plain single identifiers
fn collect_assigned_names(expression: &Expression, out: &mut Vec<String>) {
    for child in &expression.children {
        if let TexNode::ColonEquals(ColonEqualsNode { lhs, .. }) = child {
            for item in &lhs.items {
                if let [TexNode::Text(text)] = item
                    .children
                    .as_slice()
                {
                    if text.kind == TextKind::Identifier {
                        out.push(
                            text.text
                                .clone(),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::parsing::parser::parse_structure;
    use crate::validation::validator::validate;

    fn checked(content: &str) -> Vec<ParseError> {
        let (root, errors) = parse_structure(content);
        assert!(errors.is_empty(), "structure errors: {:?}", errors);
        let (document, errors) = validate(&root);
        assert!(errors.is_empty(), "validation errors: {:?}", errors);
        check_document(&document)
    }

    #[test]
    fn undefined_symbol_is_reported() {
        let errors = checked("Result:\n. 'x + 1'");
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("Undefined symbol 'x'"));
    }

    #[test]
    fn for_targets_bind_their_body() {
        let errors = checked(
            r"Result:
. for: x
  where:
  . 'x := 1'
  then:
  . 'x + 1'",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn numeric_identifiers_are_literals() {
        let errors = checked("Result:\n. '1 + 2'");
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn id_placeholders_cover_statement_uses() {
        let errors = checked(
            r"[\f{x}]
Defines: y
means:
. 'y = x'",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn target_conflicting_with_placeholder() {
        let errors = checked(
            r"[\f{x}]
Defines: x
means:
. 'x = x'",
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("Duplicate defined symbol 'x'"));
    }

    #[test]
    fn assignment_introduces_its_name() {
        let errors = checked("Result:\n. 'x := 1'\n. 'x + 1'");
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn exists_targets_bind_such_that() {
        let errors = checked(
            r"Result:
. exists: n
  suchThat:
  . 'n > 1'",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }
}
