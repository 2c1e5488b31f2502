//! Types for the validated ChalkTalk document, the result of the second
//! parsing phase. These are closed families; semantic passes dispatch
//! over them with exhaustive matches.

use crate::language::error::ParseError;
use crate::language::expression::Expression;
use crate::language::structure::{
    Abstraction, Aggregate, Argument, ArgumentKind, Assignment, Group, Mapping, Section, Token,
    TokenKind, Tuple,
};

/// A quoted statement literal. The text is stored with the surrounding
/// single quotes stripped. If the embedded TexTalk failed to parse the
/// statement still stands, carrying the errors instead of a tree.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub root: Result<Expression, Vec<ParseError>>,
    pub row: i32,
    pub column: i32,
}

/// A double-quoted text literal, stored without its quotes.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct TextClause {
    pub text: String,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub enum Target {
    Identifier(Token),
    Tuple(Tuple),
    Aggregate(Aggregate),
    Abstraction(Abstraction),
    Assignment(Assignment),
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub enum Clause {
    Statement(Statement),
    Text(TextClause),
    Target(Target),
    For(Box<ForGroup>),
    Exists(Box<ExistsGroup>),
    Not(Box<NotGroup>),
    Or(Box<OrGroup>),
    If(Box<IfGroup>),
    Iff(Box<IffGroup>),
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct ClauseListSection {
    pub name: String,
    pub clauses: Vec<Clause>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct TargetListSection {
    pub name: String,
    pub targets: Vec<Target>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct MappingSection {
    pub name: String,
    pub mappings: Vec<Mapping>,
}

/// A section whose single argument is a string literal, like `written:`.
#[derive(Eq, Debug, Clone, PartialEq)]
pub struct TextSection {
    pub name: String,
    pub text: String,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct IfGroup {
    pub if_section: ClauseListSection,
    pub then_section: ClauseListSection,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct IffGroup {
    pub iff_section: ClauseListSection,
    pub then_section: ClauseListSection,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct ForGroup {
    pub for_section: TargetListSection,
    pub where_section: Option<ClauseListSection>,
    pub such_that_section: Option<ClauseListSection>,
    pub then_section: ClauseListSection,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct ExistsGroup {
    pub exists_section: TargetListSection,
    pub where_section: Option<ClauseListSection>,
    pub such_that_section: ClauseListSection,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct NotGroup {
    pub not_section: ClauseListSection,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct OrGroup {
    pub or_section: ClauseListSection,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct DefinesGroup {
    pub id: Statement,
    pub defines_section: TargetListSection,
    pub assuming_section: Option<ClauseListSection>,
    pub means_section: ClauseListSection,
    pub written_section: Option<TextSection>,
    pub alias_section: Option<MappingSection>,
    pub metadata_section: Option<MappingSection>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct RepresentsGroup {
    pub id: Statement,
    pub represents_section: TargetListSection,
    pub assuming_section: Option<ClauseListSection>,
    pub that_section: ClauseListSection,
    pub written_section: Option<TextSection>,
    pub alias_section: Option<MappingSection>,
    pub metadata_section: Option<MappingSection>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct ResultGroup {
    pub result_section: ClauseListSection,
    pub alias_section: Option<MappingSection>,
    pub metadata_section: Option<MappingSection>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct AxiomGroup {
    pub axiom_section: ClauseListSection,
    pub alias_section: Option<MappingSection>,
    pub metadata_section: Option<MappingSection>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct ConjectureGroup {
    pub conjecture_section: ClauseListSection,
    pub alias_section: Option<MappingSection>,
    pub metadata_section: Option<MappingSection>,
}

#[derive(Eq, Debug, Clone, PartialEq)]
pub struct SourceGroup {
    pub source_section: MappingSection,
    pub metadata_section: Option<MappingSection>,
}

#[derive(Eq, Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub defines: Vec<DefinesGroup>,
    pub represents: Vec<RepresentsGroup>,
    pub results: Vec<ResultGroup>,
    pub axioms: Vec<AxiomGroup>,
    pub conjectures: Vec<ConjectureGroup>,
    pub sources: Vec<SourceGroup>,
}

// Rendering back to ChalkTalk text happens by rebuilding the structural
// tree and reusing its printer, so both phases stay in exact agreement
// about layout.

fn synthesized(text: &str, kind: TokenKind) -> Token {
    Token::new(text, kind, -1, -1)
}

impl Statement {
    pub fn to_code(&self) -> String {
        format!("'{}'", self.text)
    }

    fn argument(&self, is_inline: bool) -> Argument {
        Argument {
            is_inline,
            kind: ArgumentKind::Token(synthesized(&self.to_code(), TokenKind::Statement)),
        }
    }
}

impl Target {
    fn argument(&self, is_inline: bool) -> Argument {
        let kind = match self {
            Target::Identifier(token) => ArgumentKind::Token(token.clone()),
            Target::Tuple(tuple) => ArgumentKind::Tuple(tuple.clone()),
            Target::Aggregate(aggregate) => ArgumentKind::Aggregate(aggregate.clone()),
            Target::Abstraction(abstraction) => ArgumentKind::Abstraction(abstraction.clone()),
            Target::Assignment(assignment) => ArgumentKind::Assignment(assignment.clone()),
        };
        Argument { is_inline, kind }
    }
}

impl Clause {
    fn argument(&self) -> Argument {
        match self {
            Clause::Statement(statement) => statement.argument(false),
            Clause::Text(text) => Argument {
                is_inline: false,
                kind: ArgumentKind::Token(synthesized(
                    &format!("\"{}\"", text.text),
                    TokenKind::String,
                )),
            },
            Clause::Target(target) => target.argument(false),
            Clause::For(group) => nested(group.to_structure()),
            Clause::Exists(group) => nested(group.to_structure()),
            Clause::Not(group) => nested(group.to_structure()),
            Clause::Or(group) => nested(group.to_structure()),
            Clause::If(group) => nested(group.to_structure()),
            Clause::Iff(group) => nested(group.to_structure()),
        }
    }
}

fn nested(group: Group) -> Argument {
    Argument {
        is_inline: false,
        kind: ArgumentKind::Group(group),
    }
}

impl ClauseListSection {
    fn to_structure(&self) -> Section {
        Section {
            name: synthesized(&self.name, TokenKind::Name),
            args: self
                .clauses
                .iter()
                .map(|clause| clause.argument())
                .collect(),
        }
    }
}

impl TargetListSection {
    fn to_structure(&self) -> Section {
        Section {
            name: synthesized(&self.name, TokenKind::Name),
            args: self
                .targets
                .iter()
                .map(|target| target.argument(true))
                .collect(),
        }
    }
}

impl MappingSection {
    fn to_structure(&self) -> Section {
        Section {
            name: synthesized(&self.name, TokenKind::Name),
            args: self
                .mappings
                .iter()
                .map(|mapping| Argument {
                    is_inline: false,
                    kind: ArgumentKind::Mapping(mapping.clone()),
                })
                .collect(),
        }
    }
}

impl TextSection {
    fn to_structure(&self) -> Section {
        Section {
            name: synthesized(&self.name, TokenKind::Name),
            args: vec![Argument {
                is_inline: true,
                kind: ArgumentKind::Token(synthesized(
                    &format!("\"{}\"", self.text),
                    TokenKind::String,
                )),
            }],
        }
    }
}

impl IfGroup {
    fn to_structure(&self) -> Group {
        Group {
            id: None,
            sections: vec![
                self.if_section
                    .to_structure(),
                self.then_section
                    .to_structure(),
            ],
        }
    }
}

impl IffGroup {
    fn to_structure(&self) -> Group {
        Group {
            id: None,
            sections: vec![
                self.iff_section
                    .to_structure(),
                self.then_section
                    .to_structure(),
            ],
        }
    }
}

impl ForGroup {
    fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .for_section
            .to_structure()];
        if let Some(section) = &self.where_section {
            sections.push(section.to_structure());
        }
        if let Some(section) = &self.such_that_section {
            sections.push(section.to_structure());
        }
        sections.push(
            self.then_section
                .to_structure(),
        );
        Group { id: None, sections }
    }
}

impl ExistsGroup {
    fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .exists_section
            .to_structure()];
        if let Some(section) = &self.where_section {
            sections.push(section.to_structure());
        }
        sections.push(
            self.such_that_section
                .to_structure(),
        );
        Group { id: None, sections }
    }
}

impl NotGroup {
    fn to_structure(&self) -> Group {
        Group {
            id: None,
            sections: vec![self
                .not_section
                .to_structure()],
        }
    }
}

impl OrGroup {
    fn to_structure(&self) -> Group {
        Group {
            id: None,
            sections: vec![self
                .or_section
                .to_structure()],
        }
    }
}

fn push_trailers(
    sections: &mut Vec<Section>,
    alias: &Option<MappingSection>,
    metadata: &Option<MappingSection>,
) {
    if let Some(section) = alias {
        sections.push(section.to_structure());
    }
    if let Some(section) = metadata {
        sections.push(section.to_structure());
    }
}

impl DefinesGroup {
    pub fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .defines_section
            .to_structure()];
        if let Some(section) = &self.assuming_section {
            sections.push(section.to_structure());
        }
        sections.push(
            self.means_section
                .to_structure(),
        );
        if let Some(section) = &self.written_section {
            sections.push(section.to_structure());
        }
        push_trailers(&mut sections, &self.alias_section, &self.metadata_section);
        Group {
            id: Some(synthesized(&self.id.text, TokenKind::Id)),
            sections,
        }
    }

    pub fn to_code(&self) -> String {
        self.to_structure()
            .to_code()
    }
}

impl RepresentsGroup {
    pub fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .represents_section
            .to_structure()];
        if let Some(section) = &self.assuming_section {
            sections.push(section.to_structure());
        }
        sections.push(
            self.that_section
                .to_structure(),
        );
        if let Some(section) = &self.written_section {
            sections.push(section.to_structure());
        }
        push_trailers(&mut sections, &self.alias_section, &self.metadata_section);
        Group {
            id: Some(synthesized(&self.id.text, TokenKind::Id)),
            sections,
        }
    }

    pub fn to_code(&self) -> String {
        self.to_structure()
            .to_code()
    }
}

impl ResultGroup {
    pub fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .result_section
            .to_structure()];
        push_trailers(&mut sections, &self.alias_section, &self.metadata_section);
        Group { id: None, sections }
    }
}

impl AxiomGroup {
    pub fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .axiom_section
            .to_structure()];
        push_trailers(&mut sections, &self.alias_section, &self.metadata_section);
        Group { id: None, sections }
    }
}

impl ConjectureGroup {
    pub fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .conjecture_section
            .to_structure()];
        push_trailers(&mut sections, &self.alias_section, &self.metadata_section);
        Group { id: None, sections }
    }
}

impl SourceGroup {
    pub fn to_structure(&self) -> Group {
        let mut sections = vec![self
            .source_section
            .to_structure()];
        if let Some(section) = &self.metadata_section {
            sections.push(section.to_structure());
        }
        Group { id: None, sections }
    }
}

impl Document {
    pub fn to_code(&self) -> String {
        let mut groups: Vec<Group> = Vec::new();
        groups.extend(
            self.defines
                .iter()
                .map(|g| g.to_structure()),
        );
        groups.extend(
            self.represents
                .iter()
                .map(|g| g.to_structure()),
        );
        groups.extend(
            self.axioms
                .iter()
                .map(|g| g.to_structure()),
        );
        groups.extend(
            self.conjectures
                .iter()
                .map(|g| g.to_structure()),
        );
        groups.extend(
            self.results
                .iter()
                .map(|g| g.to_structure()),
        );
        groups.extend(
            self.sources
                .iter()
                .map(|g| g.to_structure()),
        );
        crate::language::structure::Root { groups }.to_code()
    }
}

// the bottom-up rewrite specialized to statement expression roots; the
// expansion engine is built on this

impl Statement {
    fn map_expression(self, f: &dyn Fn(Expression) -> Expression) -> Statement {
        match self.root {
            Ok(expression) => {
                let rewritten = f(expression);
                Statement {
                    text: rewritten.to_code(),
                    root: Ok(rewritten),
                    row: self.row,
                    column: self.column,
                }
            }
            Err(errors) => Statement {
                text: self.text,
                root: Err(errors),
                row: self.row,
                column: self.column,
            },
        }
    }
}

impl Clause {
    pub fn map_statements(self, f: &dyn Fn(Expression) -> Expression) -> Clause {
        match self {
            Clause::Statement(statement) => Clause::Statement(statement.map_expression(f)),
            Clause::Text(text) => Clause::Text(text),
            Clause::Target(target) => Clause::Target(target),
            Clause::For(group) => Clause::For(Box::new(ForGroup {
                for_section: group.for_section,
                where_section: group
                    .where_section
                    .map(|s| s.map_statements(f)),
                such_that_section: group
                    .such_that_section
                    .map(|s| s.map_statements(f)),
                then_section: group
                    .then_section
                    .map_statements(f),
            })),
            Clause::Exists(group) => Clause::Exists(Box::new(ExistsGroup {
                exists_section: group.exists_section,
                where_section: group
                    .where_section
                    .map(|s| s.map_statements(f)),
                such_that_section: group
                    .such_that_section
                    .map_statements(f),
            })),
            Clause::Not(group) => Clause::Not(Box::new(NotGroup {
                not_section: group
                    .not_section
                    .map_statements(f),
            })),
            Clause::Or(group) => Clause::Or(Box::new(OrGroup {
                or_section: group
                    .or_section
                    .map_statements(f),
            })),
            Clause::If(group) => Clause::If(Box::new(IfGroup {
                if_section: group
                    .if_section
                    .map_statements(f),
                then_section: group
                    .then_section
                    .map_statements(f),
            })),
            Clause::Iff(group) => Clause::Iff(Box::new(IffGroup {
                iff_section: group
                    .iff_section
                    .map_statements(f),
                then_section: group
                    .then_section
                    .map_statements(f),
            })),
        }
    }
}

impl ClauseListSection {
    pub fn map_statements(self, f: &dyn Fn(Expression) -> Expression) -> ClauseListSection {
        ClauseListSection {
            name: self.name,
            clauses: self
                .clauses
                .into_iter()
                .map(|clause| clause.map_statements(f))
                .collect(),
        }
    }
}

impl Document {
    /// Rewrite the expression root of every statement in the document,
    /// ids excluded. Statements whose TexTalk failed to parse are left
    /// untouched.
    pub fn map_statements(self, f: &dyn Fn(Expression) -> Expression) -> Document {
        Document {
            defines: self
                .defines
                .into_iter()
                .map(|group| DefinesGroup {
                    id: group.id,
                    defines_section: group.defines_section,
                    assuming_section: group
                        .assuming_section
                        .map(|s| s.map_statements(f)),
                    means_section: group
                        .means_section
                        .map_statements(f),
                    written_section: group.written_section,
                    alias_section: group.alias_section,
                    metadata_section: group.metadata_section,
                })
                .collect(),
            represents: self
                .represents
                .into_iter()
                .map(|group| RepresentsGroup {
                    id: group.id,
                    represents_section: group.represents_section,
                    assuming_section: group
                        .assuming_section
                        .map(|s| s.map_statements(f)),
                    that_section: group
                        .that_section
                        .map_statements(f),
                    written_section: group.written_section,
                    alias_section: group.alias_section,
                    metadata_section: group.metadata_section,
                })
                .collect(),
            results: self
                .results
                .into_iter()
                .map(|group| ResultGroup {
                    result_section: group
                        .result_section
                        .map_statements(f),
                    alias_section: group.alias_section,
                    metadata_section: group.metadata_section,
                })
                .collect(),
            axioms: self
                .axioms
                .into_iter()
                .map(|group| AxiomGroup {
                    axiom_section: group
                        .axiom_section
                        .map_statements(f),
                    alias_section: group.alias_section,
                    metadata_section: group.metadata_section,
                })
                .collect(),
            conjectures: self
                .conjectures
                .into_iter()
                .map(|group| ConjectureGroup {
                    conjecture_section: group
                        .conjecture_section
                        .map_statements(f),
                    alias_section: group.alias_section,
                    metadata_section: group.metadata_section,
                })
                .collect(),
            sources: self.sources,
        }
    }
}
