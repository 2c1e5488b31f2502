//! Signature collection and written-form expansion over parsed
//! documents.

use chalktalk::language::{Clause, Document};
use chalktalk::matching::{expand, expand_with_errors, find_all_signatures};
use chalktalk::parsing::parse;

#[test]
fn signatures_collapse_every_occurrence() {
    let document = parse(
        r"[\f{x}]
Defines: y
means:
. 'y = x'",
    )
    .unwrap();
    assert_eq!(find_all_signatures(&document), vec![r"\f{?}".to_string()]);
}

#[test]
fn inline_statement_arguments_count_too() {
    let document = parse("[\\f{x}]\nDefines: y\nmeans: 'y = x'").unwrap();
    assert_eq!(find_all_signatures(&document), vec![r"\f{?}".to_string()]);
}

#[test]
fn variadic_and_fixed_occurrences_share_a_signature() {
    let document = parse(
        r#"[\sum{terms?}]
Defines: s
means:
. 's = s'
written: "(terms{... plus ...}?)"

Result:
. for: a, b, c
  then:
  . '\sum{a} = \sum{a, b, c}'"#,
    )
    .unwrap();
    assert_eq!(find_all_signatures(&document), vec![r"\sum{?}".to_string()]);

    let expanded = expand(document);
    let statement = result_statement(&expanded);
    assert_eq!(statement, "(a) = (a plus b plus c)");
}

#[test]
fn expansion_reaches_a_fixed_point() {
    let document = parse(
        r#"[\half{x}]
Defines: h
means:
. 'h = x'
written: "x? over two"

Result:
. for: a
  then:
  . '\half{\half{a}} = a'"#,
    )
    .unwrap();
    let once = expand(document);
    let first = once.to_code();
    let twice = expand(once);
    assert_eq!(twice.to_code(), first);
    assert_eq!(result_statement(&twice), "a over two over two = a");
}

#[test]
fn unexpandable_commands_survive_verbatim() {
    let document = parse(
        r"Result:
. for: q
  then:
  . '\mystery{q} = q'",
    )
    .unwrap();
    let (expanded, errors) = expand_with_errors(document);
    assert!(errors
        .iter()
        .any(|error| error
            .message
            .contains("No matching definition")));
    assert_eq!(result_statement(&expanded), r"\mystery{q} = q");
}

#[test]
fn arity_disagreements_are_reported() {
    let errors = expand_with_errors(
        parse(
            r#"[\pair{a, b}]
Defines: p
means:
. 'p = p'
written: "(a?, b?)"

Result:
. for: x
  then:
  . '\pair{x} = x'"#,
        )
        .unwrap(),
    )
    .1;
    assert!(errors
        .iter()
        .any(|error| error
            .message
            .contains("Expected 2 argument(s) but found 1")));
}

fn result_statement(document: &Document) -> String {
    match &document.results[0]
        .result_section
        .clauses[0]
    {
        Clause::For(group) => match &group
            .then_section
            .clauses[0]
        {
            Clause::Statement(statement) => statement
                .text
                .clone(),
            other => panic!("expected a statement, found {:?}", other),
        },
        Clause::Statement(statement) => statement
            .text
            .clone(),
        other => panic!("expected a statement or for group, found {:?}", other),
    }
}
