//! Structural properties of the first parsing phase: indentation
//! tokens balance, printing and reparsing agree, and no input can make
//! the parser panic.

use chalktalk::language::TokenKind;
use chalktalk::parsing::lexer::Lexer;
use chalktalk::parsing::parser::parse_structure;

fn drain(content: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(content);
    let mut kinds = Vec::new();
    while let Some(token) = lexer.next() {
        kinds.push(token.kind);
    }
    kinds
}

#[test]
fn indents_balance_on_every_sample() {
    let samples = [
        "Defines: y\nmeans:\n. 'y = x'",
        "Result:\n. for: x\n  where:\n  . 'x := 1'\n  then:\n  . 'x + 1'",
        "Axiom:\n. 'a'\n\n\nConjecture:\n. 'b'",
        "a:\n  b:\n    c:\n. x",
        "means:\n. . . 'deep'",
    ];
    for sample in samples {
        let kinds = drain(sample);
        let indents = kinds
            .iter()
            .filter(|kind| **kind == TokenKind::Indent)
            .count();
        let unindents = kinds
            .iter()
            .filter(|kind| **kind == TokenKind::Unindent)
            .count();
        assert_eq!(indents, unindents, "unbalanced for {:?}", sample);
    }
}

#[test]
fn printing_and_reparsing_agree() {
    let content = r"[\f{x}]
Defines: y
means:
. 'y = x'";
    let (first, errors) = parse_structure(content);
    assert!(errors.is_empty(), "{:?}", errors);
    let printed = first.to_code();
    let (second, errors) = parse_structure(&printed);
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(second, first);
    assert_eq!(second.to_code(), printed);
}

#[test]
fn multi_group_documents_round_trip() {
    // blank lines separate top-level groups; every indent level the
    // first group opened must be closed before the second one starts
    let content = r"Axiom:
. 'a = a'

Result:
. for: x
  then:
  . 'x = x'

Conjecture:
. 'c = c'";
    let (first, errors) = parse_structure(content);
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        first
            .groups
            .len(),
        3
    );
    let printed = first.to_code();
    let (second, errors) = parse_structure(&printed);
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(second, first);
}

#[test]
fn printing_normalizes_layout() {
    // inline and blank-line variations print to the same shape
    let (root, _) = parse_structure("Defines: y\n\n\nmeans: 'y = x'");
    let printed = root.to_code();
    let (again, _) = parse_structure(&printed);
    assert_eq!(again.to_code(), printed);
}

#[test]
fn hostile_inputs_never_panic() {
    let samples = [
        "",
        "\n\n\n",
        ":",
        ":::::",
        ". . . .",
        "[unclosed",
        "'unterminated",
        "\"half done",
        "a: (((((",
        "}}}}}",
        "x: 'a' 'b' 'c'",
        "-- only a comment",
        "[id]\n[id]\n[id]",
        "a:\n                    . deep",
        "\u{0}\u{1}\u{2}",
        "δ: ∀ ∃ ⊥",
    ];
    for sample in samples {
        let (_, _) = parse_structure(sample);
        let _ = drain(sample);
    }
}

#[test]
fn errors_carry_positions() {
    let (_, errors) = parse_structure("Result:\n. ∆");
    assert!(!errors.is_empty());
    for error in &errors {
        assert!(error.row >= -1);
        assert!(error.column >= -1);
    }
}
