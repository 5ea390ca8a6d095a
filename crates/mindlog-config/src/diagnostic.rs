// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns Figment extraction failures into miette diagnostics.
//!
//! Misspelt keys and enum values (`window = "dayly"`, `standard_timeframes =
//! ["weak"]`) get a "did you mean" hint, and errors coming from a TOML file
//! point at the offending line.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key no section declares.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(mindlog::config::unknown_key),
        help("{}", did_you_mean(suggestion.as_deref(), "valid keys", valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a key of this section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A string outside a fixed set, such as a quota window or a timeframe.
    #[error("`{value}` is not a valid value for `{key}`")]
    #[diagnostic(
        code(mindlog::config::unknown_value),
        help("{}", did_you_mean(suggestion.as_deref(), "expected one of", expected))
    )]
    UnknownValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        expected: String,
        #[label("unknown value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(mindlog::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A semantic rule from [`crate::validation`].
    #[error("validation error: {message}")]
    #[diagnostic(code(mindlog::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(mindlog::config::other))]
    Other(String),
}

fn did_you_mean(suggestion: Option<&str>, label: &str, choices: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {label}: {choices}"),
        None => format!("{label}: {choices}"),
    }
}

/// Converts every error Figment collected into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs of the files that were
/// merged; a file error is only given a span when its content is present.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            let source = file_content(&error, toml_sources);
            match &error.kind {
                // Figment reports the enclosing table as the path here.
                Kind::UnknownField(field, expected) => {
                    let (span, src) = spanned(source, &path, field, field);
                    ConfigError::UnknownKey {
                        key: dotted(&path, Some(field.as_str())),
                        suggestion: suggest(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(value, expected) => {
                    let (table, field) = split_field(&path);
                    let (span, src) = spanned(source, table, field, &format!("\"{value}\""));
                    ConfigError::UnknownValue {
                        key: dotted(&path, None),
                        value: value.clone(),
                        suggestion: suggest(value, expected),
                        expected: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    let (table, field) = split_field(&path);
                    let (span, src) = spanned(source, table, field, field);
                    ConfigError::InvalidType {
                        key: dotted(&path, None),
                        detail: format!("found {actual}"),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted(path: &[String], field: Option<&str>) -> String {
    path.iter()
        .map(String::as_str)
        .chain(field)
        .collect::<Vec<_>>()
        .join(".")
}

fn split_field(path: &[String]) -> (&[String], &str) {
    match path.split_last() {
        Some((field, table)) => (table, field.as_str()),
        None => (&[], ""),
    }
}

/// The merged file the error came from, when its content is known.
fn file_content<'a>(
    error: &figment::Error,
    toml_sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let figment::Source::File(origin) = error.metadata.as_ref()?.source.as_ref()? else {
        return None;
    };
    let origin = origin.display().to_string();
    toml_sources
        .iter()
        .find(|(path, _)| *path == origin)
        .map(|(path, content)| (path.as_str(), content.as_str()))
}

fn spanned(
    source: Option<(&str, &str)>,
    table: &[String],
    field: &str,
    needle: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some((path, content)) = source else {
        return (None, None);
    };
    match locate(content, table, field, needle) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), needle.len())),
            Some(NamedSource::new(path, content.to_string())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `needle` on the line that assigns `field` inside `[table]`.
///
/// An empty `table` means the top level, before the first header. Only
/// single-line assignments are found.
pub fn locate(content: &str, table: &[String], field: &str, needle: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut in_table = table.is_empty();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            in_table = header == wanted;
        } else if in_table {
            if let Some(rest) = trimmed.strip_prefix(field) {
                if rest.trim_start().starts_with('=') {
                    if let Some(pos) = line.find(needle) {
                        return Some(offset + pos);
                    }
                }
            }
        }
        offset += line.len();
    }
    None
}

/// Closest candidate by Jaro-Winkler similarity, if any is close enough.
pub fn suggest(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(unknown, c), *c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Writes each error to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn suggests_keys_and_values() {
        assert_eq!(
            suggest("reservior", &["reservoir", "refill_interval_ms", "max_concurrent"]),
            Some("reservoir".to_string())
        );
        assert_eq!(suggest("dayly", &["daily", "monthly"]), Some("daily".to_string()));
        assert_eq!(
            suggest("weak", &["week", "month", "year", "all"]),
            Some("week".to_string())
        );
        assert_eq!(suggest("zzzzzz", &["level"]), None);
    }

    #[test]
    fn locates_keys_in_nested_tables_only() {
        let content = "standard_count = 9\n[quota]\ncharge_on_fallback = true\n\n[quota.challenges]\nstandard_cnt = 2\n";
        let o = locate(content, &table(&["quota", "challenges"]), "standard_cnt", "standard_cnt")
            .expect("offset");
        assert_eq!(&content[o..o + 12], "standard_cnt");

        assert_eq!(locate(content, &table(&[]), "standard_count", "9"), Some(17));
        assert_eq!(locate(content, &table(&["quota"]), "standard_cnt", "standard_cnt"), None);
    }

    #[test]
    fn locates_values_inside_arrays() {
        let content = "[analysis]\nstandard_timeframes = [\"week\", \"weak\"]\n";
        let o = locate(content, &table(&["analysis"]), "standard_timeframes", "\"weak\"")
            .expect("offset");
        assert_eq!(&content[o..o + 6], "\"weak\"");
    }

    #[test]
    fn similar_prefixes_do_not_match() {
        let content = "[jobs]\nworkers_extra = 1\nworkers = \"many\"\n";
        let o = locate(content, &table(&["jobs"]), "workers", "workers").expect("offset");
        assert!(content[o..].starts_with("workers = "));
    }
}
