//! presenting problems to the user

use std::path::Path;

use owo_colors::OwoColorize;

use crate::language::{LoadingError, ParseError};

// Verbose detailed explanation, with the offending source line and a
// caret under the position the parser was looking at.
pub fn full_details(error: &ParseError, filename: &Path, source: &str) -> String {
    if error.row < 0 {
        return format!(
            "{}: {}\n{}",
            "error".bright_red(),
            error
                .message
                .bold(),
            filename.to_string_lossy()
        );
    }

    let i = error.row as usize;
    let j = error.column
        .max(0) as usize
        + 1;

    let code = source
        .lines()
        .nth(i)
        .unwrap_or("?");

    let line = i + 1;
    let column = j;

    let width = line
        .to_string()
        .len();
    let width = 3.max(width);

    format!(
        r#"
{}: {}
{}:{}:{}

{:width$} {}
{:width$} {} {}
{:width$} {} {:>j$}
            "#,
        "error".bright_red(),
        error
            .message
            .bold(),
        filename.to_string_lossy(),
        line,
        column,
        ' ',
        '|'.bright_blue(),
        line.bright_blue(),
        '|'.bright_blue(),
        code,
        ' ',
        '|'.bright_blue(),
        '^'.bright_red()
    )
    .trim_ascii()
    .to_string()
}

pub fn render_all(errors: &[ParseError], filename: &Path, source: &str) -> String {
    let rendered: Vec<String> = errors
        .iter()
        .map(|error| full_details(error, filename, source))
        .collect();
    rendered.join("\n\n")
}

/// The machine readable form, a JSON array of message/row/column
/// objects.
pub fn render_json(errors: &[ParseError]) -> String {
    serde_json::to_string_pretty(errors).unwrap_or_else(|_| "[]".to_string())
}

pub fn loading_details(error: &LoadingError) -> String {
    format!(
        "{}: {} {}\n{}",
        "error".bright_red(),
        error
            .problem
            .bold(),
        error
            .filename
            .to_string_lossy(),
        error.details
    )
    .trim_ascii_end()
    .to_string()
}

#[cfg(test)]
mod check {
    use super::*;

    #[test]
    fn details_include_the_source_line() {
        let source = "Defines: y\nmeanz:\n. 'y = x'";
        let error = ParseError::new("Expected a means: section", 1, 0);
        let details = full_details(&error, Path::new("sample.math"), source);
        assert!(details.contains("Expected a means: section"));
        assert!(details.contains("sample.math:2:1"));
        assert!(details.contains("meanz:"));
    }

    #[test]
    fn unknown_position_has_no_excerpt() {
        let error = ParseError::at_end("Expected a means: section");
        let details = full_details(&error, Path::new("sample.math"), "");
        assert!(details.contains("Expected a means: section"));
        assert!(!details.contains(":-1"));
    }

    #[test]
    fn json_form_is_an_array() {
        let errors = vec![ParseError::new("Unrecognized token", 0, 4)];
        let rendered = render_json(&errors);
        assert!(rendered.starts_with('['));
        assert!(rendered.contains("\"row\": 0"));
        assert!(rendered.contains("\"column\": 4"));
    }
}
