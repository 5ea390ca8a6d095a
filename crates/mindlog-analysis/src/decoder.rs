// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilient decoding of raw model text into JSON.
//!
//! Three stages are tried in order:
//! 1. strip code fences and parse strictly,
//! 2. repair the stripped text and parse,
//! 3. cut out the longest bracket-delimited span, repair it, and parse.
//!
//! Only when all three fail is a [`MindlogError::Decode`] returned. Callers
//! turn that into a fallback result; the parser message is for logs only.

use std::sync::LazyLock;

use mindlog_core::MindlogError;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::repair::repair;

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*```[a-z0-9_-]*[ \t]*\r?\n?").unwrap());
static CLOSING_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*```\s*$").unwrap());

/// Stage that produced a decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Strict,
    Repaired,
    Extracted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: Value,
    pub stage: DecodeStage,
}

/// Decodes model output, escalating through the repair stages.
pub fn decode(raw: &str) -> Result<Decoded, MindlogError> {
    let stripped = strip_fences(raw);

    let strict_err = match serde_json::from_str::<Value>(stripped) {
        Ok(value) => {
            return Ok(Decoded {
                value,
                stage: DecodeStage::Strict,
            });
        }
        Err(e) => e,
    };

    if let Ok(value) = serde_json::from_str::<Value>(&repair(stripped)) {
        debug!("model output recovered by repair");
        return Ok(Decoded {
            value,
            stage: DecodeStage::Repaired,
        });
    }

    for span in bracket_spans(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(&repair(span)) {
            debug!(span_len = span.len(), "model output recovered from embedded span");
            return Ok(Decoded {
                value,
                stage: DecodeStage::Extracted,
            });
        }
    }

    Err(MindlogError::Decode(format!(
        "no JSON value found in model output: {strict_err}"
    )))
}

/// Removes a leading ```` ```lang ```` line and a trailing ```` ``` ````.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let start = OPENING_FENCE.find(trimmed).map_or(0, |m| m.end());
    let rest = &trimmed[start..];
    let end = CLOSING_FENCE.find(rest).map_or(rest.len(), |m| m.start());
    rest[..end].trim()
}

/// Object and array spans from the first opener to the last matching
/// closer, longest first.
fn bracket_spans(raw: &str) -> Vec<&str> {
    let mut spans: Vec<&str> = [('{', '}'), ('[', ']')]
        .iter()
        .filter_map(|&(open, close)| {
            let start = raw.find(open)?;
            let end = raw.rfind(close)?;
            (end > start).then(|| &raw[start..=end])
        })
        .collect();
    spans.sort_by_key(|s| std::cmp::Reverse(s.len()));
    spans
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_json_is_strict() {
        let decoded = decode(r#"{"a": 1}"#).unwrap();
        assert_eq!(decoded.stage, DecodeStage::Strict);
        assert_eq!(decoded.value, json!({"a": 1}));
    }

    #[test]
    fn fenced_json_is_strict() {
        for raw in [
            "```json\n{\"a\": [1]}\n```",
            "```JSON\n{\"a\": [1]}```",
            "  ```\n{\"a\": [1]}\n```  ",
        ] {
            let decoded = decode(raw).unwrap();
            assert_eq!(decoded.stage, DecodeStage::Strict, "input: {raw:?}");
            assert_eq!(decoded.value, json!({"a": [1]}));
        }
    }

    #[test]
    fn sloppy_json_is_repaired() {
        let decoded = decode("{'a': 'b', c: [1,2,],}").unwrap();
        assert_eq!(decoded.stage, DecodeStage::Repaired);
        assert_eq!(decoded.value, json!({"a": "b", "c": [1, 2]}));
    }

    #[test]
    fn json_in_prose_is_extracted() {
        let raw = "Here is your analysis:\n{\"progress\": \"steady\"}\nLet me know if you need more.";
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.stage, DecodeStage::Extracted);
        assert_eq!(decoded.value, json!({"progress": "steady"}));
    }

    #[test]
    fn array_in_prose_is_extracted() {
        let raw = "Challenges: [{\"title\": \"Walk\", \"description\": \"Go outside\"}] enjoy!";
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.stage, DecodeStage::Extracted);
        assert!(decoded.value.is_array());
    }

    #[test]
    fn prose_without_brackets_fails() {
        let err = decode("I'm sorry, I can't help with that.").unwrap_err();
        assert!(matches!(err, MindlogError::Decode(_)));
        assert!(decode("").is_err());
    }

    #[test]
    fn fence_stripping_leaves_plain_text() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("{}"), "{}");
    }

    fn object_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
        proptest::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,12}", 1..6)
    }

    fn as_value(map: &BTreeMap<String, String>) -> Value {
        Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn well_formed_payloads_recover_at_stage_one(map in object_strategy(), fenced in any::<bool>()) {
            let body = serde_json::to_string_pretty(&as_value(&map)).unwrap();
            let raw = if fenced { format!("```json\n{body}\n```") } else { body };
            let decoded = decode(&raw).unwrap();
            prop_assert_eq!(decoded.stage, DecodeStage::Strict);
            prop_assert_eq!(decoded.value, as_value(&map));
        }

        #[test]
        fn single_quoted_payloads_recover_at_stage_two(map in object_strategy()) {
            let fields: Vec<String> = map.iter().map(|(k, v)| format!("'{k}': '{v}'")).collect();
            let raw = format!("{{{},}}", fields.join(", "));
            let decoded = decode(&raw).unwrap();
            prop_assert_eq!(decoded.stage, DecodeStage::Repaired);
            prop_assert_eq!(decoded.value, as_value(&map));
        }

        #[test]
        fn embedded_payloads_recover_at_stage_three(
            map in object_strategy(),
            before in "[A-Za-z][A-Za-z ,.!]{0,30}",
            after in "[A-Za-z ,.!]{0,30}",
        ) {
            let body = serde_json::to_string(&as_value(&map)).unwrap();
            let raw = format!("{before}: {body} {after}");
            let decoded = decode(&raw).unwrap();
            prop_assert_eq!(decoded.stage, DecodeStage::Extracted);
            prop_assert_eq!(decoded.value, as_value(&map));
        }
    }
}
