// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural repair of almost-JSON model output.
//!
//! Handles the common ways models break JSON: single-quoted strings,
//! unquoted keys, trailing separators, raw newlines inside strings,
//! Python literals, and truncated output with unterminated strings or
//! unclosed brackets. Text outside any bracket is copied unchanged.

/// Rewrites `input` into text that is more likely to parse as JSON.
pub fn repair(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut closers: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' if !closers.is_empty() => {
                i = copy_string(&chars, i, &mut out);
                continue;
            }
            '{' => {
                closers.push('}');
                out.push(c);
            }
            '[' => {
                closers.push(']');
                out.push(c);
            }
            '}' | ']' => {
                if let Some(pos) = closers.iter().rposition(|&e| e == c) {
                    trim_trailing_comma(&mut out);
                    while closers.len() > pos + 1 {
                        if let Some(inner) = closers.pop() {
                            out.push(inner);
                        }
                    }
                    closers.pop();
                    out.push(c);
                }
            }
            _ if !closers.is_empty() && starts_word(&chars, i) => {
                let end = word_end(&chars, i);
                let word: String = chars[i..end].iter().collect();
                emit_word(&word, next_significant(&chars, end) == Some(':'), &mut out);
                i = end;
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    if !closers.is_empty() {
        trim_trailing_comma(&mut out);
        while let Some(closer) = closers.pop() {
            out.push(closer);
        }
    }
    out
}

/// Copies a string starting at the quote `chars[start]` as a double-quoted
/// JSON string. Returns the index just past the closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                if next == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(next);
                }
                i += 2;
                continue;
            }
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
        i += 1;
    }
    // Unterminated: close at end of input.
    out.push('"');
    i
}

fn starts_word(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    let is_start = c.is_alphabetic() || c == '_' || c == '$';
    // Exponent or suffix inside a number literal.
    let in_number = i > 0 && (chars[i - 1].is_ascii_digit() || chars[i - 1] == '.');
    is_start && !in_number
}

fn word_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len()
        && (chars[end].is_alphanumeric() || matches!(chars[end], '_' | '$' | '-'))
    {
        end += 1;
    }
    end
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().copied().find(|c| !c.is_whitespace())
}

fn emit_word(word: &str, is_key: bool, out: &mut String) {
    if is_key {
        out.push('"');
        out.push_str(word);
        out.push('"');
        return;
    }
    match word {
        "true" | "false" | "null" => out.push_str(word),
        "True" => out.push_str("true"),
        "False" => out.push_str("false"),
        "None" | "undefined" => out.push_str("null"),
        _ => {
            out.push('"');
            out.push_str(word);
            out.push('"');
        }
    }
}

fn trim_trailing_comma(out: &mut String) {
    let len = out.trim_end().len();
    if out[..len].ends_with(',') {
        out.truncate(len - 1);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn parse(text: &str) -> Value {
        serde_json::from_str(&repair(text)).unwrap()
    }

    #[test]
    fn valid_json_is_unchanged() {
        let text = r#"{"a": [1, 2.5e3, -4], "b": {"c": null, "d": "x'y"}}"#;
        assert_eq!(repair(text), text);
    }

    #[test]
    fn single_quotes_become_double() {
        assert_eq!(
            parse(r#"{'name': 'say "hi"', 'it\'s': 'ok'}"#),
            json!({"name": "say \"hi\"", "it's": "ok"})
        );
    }

    #[test]
    fn trailing_commas_are_dropped() {
        assert_eq!(parse(r#"{"a": [1, 2, ], "b": 3,}"#), json!({"a": [1, 2], "b": 3}));
    }

    #[test]
    fn unquoted_keys_are_quoted() {
        assert_eq!(
            parse(r#"{progress: "ok", areasToImprove: ["sleep"], next_step: "rest"}"#),
            json!({"progress": "ok", "areasToImprove": ["sleep"], "next_step": "rest"})
        );
    }

    #[test]
    fn python_literals_are_mapped() {
        assert_eq!(
            parse("{'done': True, 'skip': False, 'extra': None}"),
            json!({"done": true, "skip": false, "extra": null})
        );
    }

    #[test]
    fn truncated_output_is_closed() {
        assert_eq!(
            parse(r#"{"progress": "Good week", "areasToImprove": ["sleep", "wor"#),
            json!({"progress": "Good week", "areasToImprove": ["sleep", "wor"]})
        );
    }

    #[test]
    fn raw_newlines_in_strings_are_escaped() {
        assert_eq!(parse("{\"a\": \"line one\nline two\"}"), json!({"a": "line one\nline two"}));
    }

    #[test]
    fn stray_closers_are_ignored() {
        assert_eq!(parse(r#"{"a": 1}}"#), json!({"a": 1}));
    }

    #[test]
    fn text_outside_brackets_is_left_alone() {
        assert_eq!(repair("Sure, here it is"), "Sure, here it is");
    }
}
