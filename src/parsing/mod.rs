//! parser for the ChalkTalk language

use std::path::Path;
use tracing::debug;

use crate::language::{Document, LoadingError, ParseError};
use crate::validation;

pub mod lexer;
pub mod parser;
pub mod texlexer;
pub mod texparser;

pub use parser::parse_structure;
pub use texparser::parse_expression;

/// Read a file and return an owned String. Ownership passes back to the
/// caller so everything derived from the content can share its lifetime.
pub fn load(filename: &Path) -> Result<String, LoadingError<'_>> {
    match std::fs::read_to_string(filename) {
        Ok(content) => Ok(content),
        Err(error) => {
            debug!(?error);
            match error.kind() {
                std::io::ErrorKind::NotFound => Err(LoadingError {
                    problem: "File not found".to_string(),
                    details: String::new(),
                    filename,
                }),
                _ => Err(LoadingError {
                    problem: "Failed reading".to_string(),
                    details: error
                        .kind()
                        .to_string(),
                    filename,
                }),
            }
        }
    }
}

/// Parse text into a Document object, or return the list of errors
/// encountered. Covers the lexer, the structural parser, and the
/// semantic validator; scope analysis is a separate post-pass over the
/// returned document (see [`validation::check_document`]).
pub fn parse(content: &str) -> Result<Document, Vec<ParseError>> {
    let (root, mut errors) = parser::parse_structure(content);
    debug!(
        "Found {} group{}",
        root.groups
            .len(),
        if root
            .groups
            .len()
            == 1
        {
            ""
        } else {
            "s"
        }
    );

    let (document, validation_errors) = validation::validate(&root);
    errors.extend(validation_errors);

    let errors = dedupe(errors);
    if errors.is_empty() {
        Ok(document)
    } else {
        debug!(
            "Found {} error{}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        );
        Err(errors)
    }
}

// Statement errors surface both from the statement itself and from the
// validator's running list; one copy is enough.
fn dedupe(errors: Vec<ParseError>) -> Vec<ParseError> {
    let mut seen: Vec<ParseError> = Vec::new();
    for error in errors {
        if !seen.contains(&error) {
            seen.push(error);
        }
    }
    seen
}

#[cfg(test)]
mod check {
    use super::*;

    #[test]
    fn clean_document_parses() {
        let document = parse(
            r"[\f{x}]
Defines: y
means:
. 'y = x'",
        )
        .unwrap();
        assert_eq!(
            document
                .defines
                .len(),
            1
        );
    }

    #[test]
    fn errors_are_deduplicated() {
        let errors = parse(
            r"[\f{x}]
Defines: y
means:
. 'y = x is a is b'",
        )
        .unwrap_err();
        let copies = errors
            .iter()
            .filter(|error| {
                error
                    .message
                    .contains("more than one 'is'")
            })
            .count();
        assert_eq!(copies, 1);
    }

    #[test]
    fn scope_problems_do_not_fail_the_parse() {
        // an undefined symbol is a post-pass finding; the document is
        // still handed back for expansion and signature tooling
        let document = parse("Result:\n. 'x + 1'").unwrap();
        let errors = validation::check_document(&document);
        assert!(errors
            .iter()
            .any(|error| error
                .message
                .contains("Undefined symbol 'x'")));
    }
}
