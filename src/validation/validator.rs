//! The second parsing phase. Walks the structural tree, checks each
//! group against its section pattern, parses the TexTalk embedded in
//! statements and ids, and assembles the typed document. Validation
//! never stops at the first problem; every error carries the position
//! of the construct it describes.

use std::collections::HashMap;

use crate::language::{
    Abstraction, Aggregate, Argument, ArgumentKind, Assignment, AssignmentRhs, AxiomGroup, Clause,
    ClauseListSection, ConjectureGroup, DefinesGroup, Document, ExistsGroup, ForGroup, Group,
    IfGroup, IffGroup, MappingSection, NotGroup, OrGroup, ParseError, RepresentsGroup, ResultGroup,
    Root, Section, SourceGroup, Statement, Target, TargetListSection, TextClause, TextSection,
    Token, TokenKind, Tuple, TupleItem,
};
use crate::parsing::texparser::parse_expression;
use crate::validation::sections::identify_sections;

const DEFINES_PATTERN: &[&str] = &[
    "Defines",
    "assuming?",
    "means",
    "written?",
    "Alias?",
    "Metadata?",
];
const REPRESENTS_PATTERN: &[&str] = &[
    "Represents",
    "assuming?",
    "that",
    "written?",
    "Alias?",
    "Metadata?",
];
const RESULT_PATTERN: &[&str] = &["Result", "Alias?", "Metadata?"];
const AXIOM_PATTERN: &[&str] = &["Axiom", "Alias?", "Metadata?"];
const CONJECTURE_PATTERN: &[&str] = &["Conjecture", "Alias?", "Metadata?"];
const SOURCE_PATTERN: &[&str] = &["Source", "Metadata?"];
const FOR_PATTERN: &[&str] = &["for", "where?", "suchThat?", "then"];
const EXISTS_PATTERN: &[&str] = &["exists", "where?", "suchThat"];
const IF_PATTERN: &[&str] = &["if", "then"];
const IFF_PATTERN: &[&str] = &["iff", "then"];
const NOT_PATTERN: &[&str] = &["not"];
const OR_PATTERN: &[&str] = &["or"];

/// Validate a structural tree into a typed document. Groups that fail
/// validation are dropped from the document; their errors remain.
pub fn validate(root: &Root) -> (Document, Vec<ParseError>) {
    let mut validator = Validator { errors: Vec::new() };
    let document = validator.read_document(root);
    (document, validator.errors)
}

struct Validator {
    errors: Vec<ParseError>,
}

impl Validator {
    fn read_document(&mut self, root: &Root) -> Document {
        let mut document = Document::default();
        for group in &root.groups {
            let first = match group
                .sections
                .first()
            {
                Some(section) => section,
                None => continue,
            };
            match first
                .name
                .text
                .as_str()
            {
                "Defines" => {
                    if let Some(defines) = self.read_defines(group) {
                        document
                            .defines
                            .push(defines);
                    }
                }
                "Represents" => {
                    if let Some(represents) = self.read_represents(group) {
                        document
                            .represents
                            .push(represents);
                    }
                }
                "Result" => {
                    if let Some(result) = self.read_result(group) {
                        document
                            .results
                            .push(result);
                    }
                }
                "Axiom" => {
                    if let Some(axiom) = self.read_axiom(group) {
                        document
                            .axioms
                            .push(axiom);
                    }
                }
                "Conjecture" => {
                    if let Some(conjecture) = self.read_conjecture(group) {
                        document
                            .conjectures
                            .push(conjecture);
                    }
                }
                "Source" => {
                    if let Some(source) = self.read_source(group) {
                        document
                            .sources
                            .push(source);
                    }
                }
                other => {
                    self.errors
                        .push(ParseError::new(
                            format!("Unexpected top level group starting with {}:", other),
                            first
                                .name
                                .row,
                            first
                                .name
                                .column,
                        ));
                }
            }
        }
        document
    }

    fn identify<'a>(
        &mut self,
        group: &'a Group,
        pattern: &[&str],
    ) -> Option<HashMap<String, &'a Section>> {
        match identify_sections(&group.sections, pattern) {
            Ok(found) => Some(found),
            Err(errors) => {
                self.errors
                    .extend(errors);
                None
            }
        }
    }

    fn read_defines(&mut self, group: &Group) -> Option<DefinesGroup> {
        let found = self.identify(group, DEFINES_PATTERN)?;
        let id = self.read_id(group, "Defines")?;
        Some(DefinesGroup {
            id,
            defines_section: self.read_targets(found.get("Defines").copied()?),
            assuming_section: found
                .get("assuming")
                .map(|section| self.read_clauses(section)),
            means_section: self.read_clauses(found.get("means").copied()?),
            written_section: found
                .get("written")
                .and_then(|section| self.read_text(section)),
            alias_section: found
                .get("Alias")
                .map(|section| self.read_mappings(section)),
            metadata_section: found
                .get("Metadata")
                .map(|section| self.read_mappings(section)),
        })
    }

    fn read_represents(&mut self, group: &Group) -> Option<RepresentsGroup> {
        let found = self.identify(group, REPRESENTS_PATTERN)?;
        let id = self.read_id(group, "Represents")?;
        Some(RepresentsGroup {
            id,
            represents_section: self.read_targets(found.get("Represents").copied()?),
            assuming_section: found
                .get("assuming")
                .map(|section| self.read_clauses(section)),
            that_section: self.read_clauses(found.get("that").copied()?),
            written_section: found
                .get("written")
                .and_then(|section| self.read_text(section)),
            alias_section: found
                .get("Alias")
                .map(|section| self.read_mappings(section)),
            metadata_section: found
                .get("Metadata")
                .map(|section| self.read_mappings(section)),
        })
    }

    fn read_result(&mut self, group: &Group) -> Option<ResultGroup> {
        let found = self.identify(group, RESULT_PATTERN)?;
        Some(ResultGroup {
            result_section: self.read_clauses(found.get("Result").copied()?),
            alias_section: found
                .get("Alias")
                .map(|section| self.read_mappings(section)),
            metadata_section: found
                .get("Metadata")
                .map(|section| self.read_mappings(section)),
        })
    }

    fn read_axiom(&mut self, group: &Group) -> Option<AxiomGroup> {
        let found = self.identify(group, AXIOM_PATTERN)?;
        Some(AxiomGroup {
            axiom_section: self.read_clauses(found.get("Axiom").copied()?),
            alias_section: found
                .get("Alias")
                .map(|section| self.read_mappings(section)),
            metadata_section: found
                .get("Metadata")
                .map(|section| self.read_mappings(section)),
        })
    }

    fn read_conjecture(&mut self, group: &Group) -> Option<ConjectureGroup> {
        let found = self.identify(group, CONJECTURE_PATTERN)?;
        Some(ConjectureGroup {
            conjecture_section: self.read_clauses(found.get("Conjecture").copied()?),
            alias_section: found
                .get("Alias")
                .map(|section| self.read_mappings(section)),
            metadata_section: found
                .get("Metadata")
                .map(|section| self.read_mappings(section)),
        })
    }

    fn read_source(&mut self, group: &Group) -> Option<SourceGroup> {
        let found = self.identify(group, SOURCE_PATTERN)?;
        Some(SourceGroup {
            source_section: self.read_mappings(found.get("Source").copied()?),
            metadata_section: found
                .get("Metadata")
                .map(|section| self.read_mappings(section)),
        })
    }

    // The id above a Defines: or Represents: is itself TexTalk; it goes
    // through the same expression parser so its commands take part in
    // signature lookup alongside statement commands.
    fn read_id(&mut self, group: &Group, kind: &str) -> Option<Statement> {
        match &group.id {
            Some(token) => Some(self.read_tex(&token.text, token.row, token.column + 1)),
            None => {
                let first = group
                    .sections
                    .first()?;
                self.errors
                    .push(ParseError::new(
                        format!("Expected a [...] id above the {}: section", kind),
                        first
                            .name
                            .row,
                        first
                            .name
                            .column,
                    ));
                None
            }
        }
    }

    fn read_tex(&mut self, text: &str, row: i32, column: i32) -> Statement {
        let (expression, errors) = parse_expression(text);
        let root = if errors.is_empty() {
            Ok(expression)
        } else {
            let offset: Vec<ParseError> = errors
                .into_iter()
                .map(|error| offset_error(error, row, column))
                .collect();
            self.errors
                .extend(
                    offset
                        .iter()
                        .cloned(),
                );
            Err(offset)
        };
        Statement {
            text: text.to_string(),
            root,
            row,
            column,
        }
    }

    fn read_statement(&mut self, token: &Token) -> Statement {
        let text = strip_quotes(&token.text);
        // +1 steps over the opening quote
        self.read_tex(&text, token.row, token.column + 1)
    }

    fn read_clauses(&mut self, section: &Section) -> ClauseListSection {
        ClauseListSection {
            name: section
                .name
                .text
                .clone(),
            clauses: section
                .args
                .iter()
                .filter_map(|argument| self.read_clause(argument))
                .collect(),
        }
    }

    fn read_clause(&mut self, argument: &Argument) -> Option<Clause> {
        match &argument.kind {
            ArgumentKind::Abstraction(abstraction) => {
                Some(Clause::Target(Target::Abstraction(abstraction.clone())))
            }
            ArgumentKind::Aggregate(aggregate) => {
                Some(Clause::Target(Target::Aggregate(aggregate.clone())))
            }
            ArgumentKind::Tuple(tuple) => Some(Clause::Target(Target::Tuple(tuple.clone()))),
            ArgumentKind::Assignment(assignment) => {
                Some(Clause::Target(Target::Assignment(assignment.clone())))
            }
            ArgumentKind::Token(token) => match token.kind {
                TokenKind::Name => Some(Clause::Target(Target::Identifier(token.clone()))),
                TokenKind::Statement => Some(Clause::Statement(self.read_statement(token))),
                TokenKind::String => Some(Clause::Text(TextClause {
                    text: strip_quotes(&token.text),
                })),
                _ => {
                    self.errors
                        .push(ParseError::new(
                            format!("Expected a Clause but found '{}'", token.text),
                            token.row,
                            token.column,
                        ));
                    None
                }
            },
            ArgumentKind::Group(group) => self.read_clause_group(group),
            ArgumentKind::Mapping(mapping) => {
                self.errors
                    .push(ParseError::new(
                        "Expected a Clause but found a mapping",
                        mapping
                            .lhs
                            .row,
                        mapping
                            .lhs
                            .column,
                    ));
                None
            }
        }
    }

    fn read_clause_group(&mut self, group: &Group) -> Option<Clause> {
        let first = group
            .sections
            .first()?;
        match first
            .name
            .text
            .as_str()
        {
            "for" => {
                let found = self.identify(group, FOR_PATTERN)?;
                Some(Clause::For(Box::new(ForGroup {
                    for_section: self.read_targets(found.get("for").copied()?),
                    where_section: found
                        .get("where")
                        .map(|section| self.read_clauses(section)),
                    such_that_section: found
                        .get("suchThat")
                        .map(|section| self.read_clauses(section)),
                    then_section: self.read_clauses(found.get("then").copied()?),
                })))
            }
            "exists" => {
                let found = self.identify(group, EXISTS_PATTERN)?;
                Some(Clause::Exists(Box::new(ExistsGroup {
                    exists_section: self.read_targets(found.get("exists").copied()?),
                    where_section: found
                        .get("where")
                        .map(|section| self.read_clauses(section)),
                    such_that_section: self.read_clauses(found.get("suchThat").copied()?),
                })))
            }
            "if" => {
                let found = self.identify(group, IF_PATTERN)?;
                Some(Clause::If(Box::new(IfGroup {
                    if_section: self.read_clauses(found.get("if").copied()?),
                    then_section: self.read_clauses(found.get("then").copied()?),
                })))
            }
            "iff" => {
                let found = self.identify(group, IFF_PATTERN)?;
                Some(Clause::Iff(Box::new(IffGroup {
                    iff_section: self.read_clauses(found.get("iff").copied()?),
                    then_section: self.read_clauses(found.get("then").copied()?),
                })))
            }
            "not" => {
                let found = self.identify(group, NOT_PATTERN)?;
                Some(Clause::Not(Box::new(NotGroup {
                    not_section: self.read_clauses(found.get("not").copied()?),
                })))
            }
            "or" => {
                let found = self.identify(group, OR_PATTERN)?;
                Some(Clause::Or(Box::new(OrGroup {
                    or_section: self.read_clauses(found.get("or").copied()?),
                })))
            }
            other => {
                self.errors
                    .push(ParseError::new(
                        format!("Expected a Clause but found a {}: group", other),
                        first
                            .name
                            .row,
                        first
                            .name
                            .column,
                    ));
                None
            }
        }
    }

    fn read_targets(&mut self, section: &Section) -> TargetListSection {
        TargetListSection {
            name: section
                .name
                .text
                .clone(),
            targets: section
                .args
                .iter()
                .filter_map(|argument| self.read_target(argument))
                .collect(),
        }
    }

    fn read_target(&mut self, argument: &Argument) -> Option<Target> {
        match &argument.kind {
            ArgumentKind::Token(token) if token.kind == TokenKind::Name => {
                Some(Target::Identifier(token.clone()))
            }
            ArgumentKind::Abstraction(abstraction) => {
                Some(Target::Abstraction(abstraction.clone()))
            }
            ArgumentKind::Aggregate(aggregate) => Some(Target::Aggregate(aggregate.clone())),
            ArgumentKind::Assignment(assignment) => Some(Target::Assignment(assignment.clone())),
            ArgumentKind::Tuple(tuple) => Some(Target::Tuple(tuple.clone())),
            other => {
                let (row, column) = argument_position(other);
                self.errors
                    .push(ParseError::new("Expected a Target", row, column));
                None
            }
        }
    }

    fn read_mappings(&mut self, section: &Section) -> MappingSection {
        let mut mappings = Vec::new();
        for argument in &section.args {
            match &argument.kind {
                ArgumentKind::Mapping(mapping) => mappings.push(mapping.clone()),
                other => {
                    let (row, column) = argument_position(other);
                    self.errors
                        .push(ParseError::new(
                            format!(
                                "Expected a name = \"...\" mapping in the {}: section",
                                section
                                    .name
                                    .text
                            ),
                            row,
                            column,
                        ));
                }
            }
        }
        MappingSection {
            name: section
                .name
                .text
                .clone(),
            mappings,
        }
    }

    fn read_text(&mut self, section: &Section) -> Option<TextSection> {
        match section
            .args
            .as_slice()
        {
            [Argument {
                kind: ArgumentKind::Token(token),
                ..
            }] if token.kind == TokenKind::String => Some(TextSection {
                name: section
                    .name
                    .text
                    .clone(),
                text: strip_quotes(&token.text),
            }),
            _ => {
                self.errors
                    .push(ParseError::new(
                        format!(
                            "Expected a single \"...\" argument in the {}: section",
                            section
                                .name
                                .text
                        ),
                        section
                            .name
                            .row,
                        section
                            .name
                            .column,
                    ));
                None
            }
        }
    }
}

fn strip_quotes(text: &str) -> String {
    let mut result = text;
    if result.len() >= 2 {
        let bytes = result.as_bytes();
        if (bytes[0] == b'\'' && bytes[result.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[result.len() - 1] == b'"')
        {
            result = &result[1..result.len() - 1];
        }
    }
    result.to_string()
}

fn offset_error(error: ParseError, row: i32, column: i32) -> ParseError {
    if error.row < 0 || error.column < 0 {
        return ParseError::new(error.message, row, column);
    }
    ParseError::new(error.message, row + error.row, column + error.column)
}

fn argument_position(kind: &ArgumentKind) -> (i32, i32) {
    match kind {
        ArgumentKind::Token(token) => (token.row, token.column),
        ArgumentKind::Group(group) => group
            .sections
            .first()
            .map(|section| {
                (
                    section
                        .name
                        .row,
                    section
                        .name
                        .column,
                )
            })
            .unwrap_or((-1, -1)),
        ArgumentKind::Abstraction(Abstraction { name, .. }) => (name.row, name.column),
        ArgumentKind::Aggregate(Aggregate { params }) => params
            .first()
            .map(|token| (token.row, token.column))
            .unwrap_or((-1, -1)),
        ArgumentKind::Assignment(Assignment { lhs, .. }) => (lhs.row, lhs.column),
        ArgumentKind::Mapping(mapping) => (
            mapping
                .lhs
                .row,
            mapping
                .lhs
                .column,
        ),
        ArgumentKind::Tuple(tuple) => tuple_position(tuple),
    }
}

fn tuple_position(tuple: &Tuple) -> (i32, i32) {
    match tuple
        .items
        .first()
    {
        Some(TupleItem::Assignment(assignment)) => (
            assignment
                .lhs
                .row,
            assignment
                .lhs
                .column,
        ),
        Some(TupleItem::Abstraction(abstraction)) => (
            abstraction
                .name
                .row,
            abstraction
                .name
                .column,
        ),
        Some(TupleItem::Rhs(AssignmentRhs::Name(token))) => (token.row, token.column),
        Some(TupleItem::Rhs(AssignmentRhs::Tuple(inner))) => tuple_position(inner),
        Some(TupleItem::Rhs(AssignmentRhs::Aggregate(aggregate))) => aggregate
            .params
            .first()
            .map(|token| (token.row, token.column))
            .unwrap_or((-1, -1)),
        None => (-1, -1),
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::parsing::parser::parse_structure;

    fn validated(content: &str) -> (Document, Vec<ParseError>) {
        let (root, errors) = parse_structure(content);
        assert!(errors.is_empty(), "structure errors: {:?}", errors);
        validate(&root)
    }

    #[test]
    fn defines_group_is_validated() {
        let (document, errors) = validated(
            r"[\f{x}]
Defines: y
means:
. 'y = x'",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(
            document
                .defines
                .len(),
            1
        );
        let defines = &document.defines[0];
        assert_eq!(
            defines
                .id
                .text,
            r"\f{x}"
        );
        assert!(defines
            .id
            .root
            .is_ok());
        assert_eq!(
            defines
                .means_section
                .clauses
                .len(),
            1
        );
        match &defines
            .means_section
            .clauses[0]
        {
            Clause::Statement(statement) => assert_eq!(statement.text, "y = x"),
            other => panic!("expected a statement clause, found {:?}", other),
        }
    }

    #[test]
    fn missing_means_is_one_error() {
        let (_, errors) = validated(
            r#"[\f{x}]
Defines: y
written: "x""#,
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("Expected a means"));
        assert!(errors[0].row >= 0);
        assert!(errors[0].column >= 0);
    }

    #[test]
    fn missing_id_is_reported() {
        let (document, errors) = validated(
            r"Defines: y
means:
. 'y = x'",
        );
        assert!(document
            .defines
            .is_empty());
        assert!(errors[0]
            .message
            .contains("Expected a [...] id"));
    }

    #[test]
    fn for_clause_group() {
        let (document, errors) = validated(
            r"Result:
. for: x
  then:
  . 'x + x'",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        match &document.results[0]
            .result_section
            .clauses[0]
        {
            Clause::For(group) => {
                assert_eq!(
                    group
                        .for_section
                        .targets
                        .len(),
                    1
                );
                assert_eq!(
                    group
                        .then_section
                        .clauses
                        .len(),
                    1
                );
            }
            other => panic!("expected a for group, found {:?}", other),
        }
    }

    #[test]
    fn unexpected_top_level_group() {
        let (document, errors) = validated("Foo: x");
        assert!(document
            .results
            .is_empty());
        assert!(errors[0]
            .message
            .contains("Unexpected top level group"));
    }

    #[test]
    fn broken_statement_carries_offset_errors() {
        let (document, errors) = validated(
            r"Result:
. 'x is a is b'",
        );
        assert!(!errors.is_empty());
        assert_eq!(errors[0].row, 1);
        match &document.results[0]
            .result_section
            .clauses[0]
        {
            Clause::Statement(statement) => assert!(statement
                .root
                .is_err()),
            other => panic!("expected a statement clause, found {:?}", other),
        }
    }
}
