//! The section pattern matcher. Every multi-section group form is
//! described by an ordered list of section names, each optionally
//! suffixed with `?`, and the actual sections of a group are walked
//! against that list in lockstep.

use std::collections::HashMap;

use crate::language::{ParseError, Section};

/// Match `sections` against `expected`, returning the sections found by
/// name. Required entries that are missing, out of order, or duplicated
/// fail the whole match; the errors describe the full expected pattern
/// so the fix is apparent.
pub fn identify_sections<'a>(
    sections: &'a [Section],
    expected: &[&str],
) -> Result<HashMap<String, &'a Section>, Vec<ParseError>> {
    let mut errors = Vec::new();
    let mut found: HashMap<String, &'a Section> = HashMap::new();
    let mut index = 0usize;

    for entry in expected {
        let optional = entry.ends_with('?');
        let name = entry.trim_end_matches('?');

        match sections.get(index) {
            Some(section)
                if section
                    .name
                    .text
                    == name =>
            {
                found.insert(name.to_string(), section);
                index += 1;
            }
            Some(section) => {
                if !optional {
                    errors.push(ParseError::new(
                        format!(
                            "Expected a {}: section but found {}: (the expected pattern is {})",
                            name,
                            section
                                .name
                                .text,
                            describe(expected)
                        ),
                        section
                            .name
                            .row,
                        section
                            .name
                            .column,
                    ));
                    return Err(errors);
                }
            }
            None => {
                if !optional {
                    let (row, column) = last_position(sections);
                    errors.push(ParseError::new(
                        format!(
                            "Expected a {}: section (the expected pattern is {})",
                            name,
                            describe(expected)
                        ),
                        row,
                        column,
                    ));
                    return Err(errors);
                }
            }
        }
    }

    for section in &sections[index..] {
        errors.push(ParseError::new(
            format!(
                "Unexpected section {}: (the expected pattern is {})",
                section
                    .name
                    .text,
                describe(expected)
            ),
            section
                .name
                .row,
            section
                .name
                .column,
        ));
    }

    if errors.is_empty() {
        Ok(found)
    } else {
        Err(errors)
    }
}

fn describe(expected: &[&str]) -> String {
    format!("[{}]", expected.join(", "))
}

fn last_position(sections: &[Section]) -> (i32, i32) {
    match sections.last() {
        Some(section) => (
            section
                .name
                .row,
            section
                .name
                .column,
        ),
        None => (-1, -1),
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::language::{Token, TokenKind};

    fn section(name: &str, row: i32) -> Section {
        Section {
            name: Token::new(name, TokenKind::Name, row, 0),
            args: vec![],
        }
    }

    #[test]
    fn full_pattern_matches() {
        let sections = vec![
            section("Defines", 0),
            section("assuming", 1),
            section("means", 2),
        ];
        let found = identify_sections(
            &sections,
            &["Defines", "assuming?", "means", "written?"],
        )
        .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.contains_key("means"));
    }

    #[test]
    fn optional_sections_may_be_absent() {
        let sections = vec![section("Defines", 0), section("means", 1)];
        let found = identify_sections(
            &sections,
            &["Defines", "assuming?", "means", "written?"],
        )
        .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn missing_required_section() {
        let sections = vec![section("Defines", 0)];
        let errors = identify_sections(&sections, &["Defines", "assuming?", "means"])
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("Expected a means"));
        assert_eq!(errors[0].row, 0);
    }

    #[test]
    fn unexpected_section_reported() {
        let sections = vec![
            section("Defines", 0),
            section("means", 1),
            section("extra", 2),
        ];
        let errors = identify_sections(&sections, &["Defines", "means"]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("Unexpected section extra"));
    }

    #[test]
    fn repeated_optional_section_is_rejected() {
        let sections = vec![
            section("Defines", 0),
            section("assuming", 1),
            section("assuming", 2),
            section("means", 3),
        ];
        // the second assuming: cannot satisfy means:, so the walk fails
        let result = identify_sections(&sections, &["Defines", "assuming?", "means"]);
        assert!(result.is_err());
    }
}
