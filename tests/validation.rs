//! End to end checks over the whole pipeline: both parsing phases,
//! section patterns, and scope analysis.

use chalktalk::language::Clause;
use chalktalk::parsing::parse;
use chalktalk::validation::check_document;

#[test]
fn a_complete_document_parses() {
    let document = parse(
        r#"[\even]
Represents: n
that:
. 'n = n'
written: "even"

[\f{x}]
Defines: y
assuming:
. 'x = x'
means:
. 'y = x'
written: "f of x?"
Metadata:
. reference = "sample"

Axiom:
. for: a
  then:
  . 'a = a'

Conjecture:
. for: b
  then:
  . 'b = b'

Result:
. for: c
  then:
  . 'c = c'

Source:
. title = "A Book"
Metadata:
. year = "1998"
"#,
    )
    .unwrap();

    assert_eq!(
        document
            .defines
            .len(),
        1
    );
    assert_eq!(
        document
            .represents
            .len(),
        1
    );
    assert_eq!(
        document
            .axioms
            .len(),
        1
    );
    assert_eq!(
        document
            .conjectures
            .len(),
        1
    );
    assert_eq!(
        document
            .results
            .len(),
        1
    );
    assert_eq!(
        document
            .sources
            .len(),
        1
    );
    assert_eq!(
        document.sources[0]
            .source_section
            .mappings[0]
            .lhs
            .text,
        "title"
    );
    assert!(check_document(&document).is_empty());
}

#[test]
fn missing_means_is_exactly_one_error() {
    let errors = parse(
        r#"[\f{x}]
Defines: y
written: "f of x?""#,
    )
    .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .contains("Expected a means"));
    assert!(errors[0].row >= 0);
    assert!(errors[0].column >= 0);
}

#[test]
fn assignment_in_where_defines_the_name() {
    let document = parse(
        r"Result:
. for: x
  where:
  . 'x := 1'
  then:
  . 'x + 1'",
    )
    .unwrap();
    match &document.results[0]
        .result_section
        .clauses[0]
    {
        Clause::For(group) => {
            assert!(group
                .where_section
                .is_some());
        }
        other => panic!("expected a for group, found {:?}", other),
    }
}

#[test]
fn unbound_names_are_reported() {
    // scope analysis is a post-pass; the parse itself still succeeds
    let document = parse("Result:\n. 'mystery + 1'").unwrap();
    let errors = check_document(&document);
    assert!(errors
        .iter()
        .any(|error| error
            .message
            .contains("Undefined symbol 'mystery'")));
}

#[test]
fn sections_out_of_order_are_reported() {
    let errors = parse(
        r"[\f{x}]
Defines: y
means:
. 'y = x'
assuming:
. 'x = x'",
    )
    .unwrap_err();
    assert!(errors
        .iter()
        .any(|error| error
            .message
            .contains("Unexpected section assuming")));
}

#[test]
fn nested_quantifiers_scope_correctly() {
    let document = parse(
        r"Result:
. for: x
  then:
  . exists: y
    suchThat:
    . 'x + y = x'",
    )
    .unwrap();
    assert_eq!(
        document
            .results
            .len(),
        1
    );
    assert!(check_document(&document).is_empty());
}

#[test]
fn statement_errors_point_into_the_statement() {
    let errors = parse("Result:\n. 'a is b is c'").unwrap_err();
    let error = errors
        .iter()
        .find(|error| {
            error
                .message
                .contains("more than one 'is'")
        })
        .unwrap();
    assert_eq!(error.row, 1);
    assert!(error.column >= 2);
}
