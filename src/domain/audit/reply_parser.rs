//! Splits a language-model reply into display text and extracted fields.
//!
//! The system prompts ask the model to end every answer with a one-line
//! JSON object such as `{"userType":"individual","region":"wallonie"}`.
//! This module finds that object, reads it into [`ExtractedFields`] with
//! the same domain rules as the heuristic extractor, and removes it from
//! the text shown to the user.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::extractor::ExtractionResult;
use super::fields::ExtractedFields;

/// A code fence left empty once the JSON inside it has been removed.
static EMPTY_CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?\s*```").unwrap_or_else(|e| panic!("invalid built-in pattern: {e}"))
});

/// Parses a model reply.
///
/// Never fails: when no JSON object is found, or it does not parse, the
/// whole (sanitized) text is the reply and no fields are reported.
pub fn parse_model_reply(response: &str) -> ExtractionResult {
    let text = remove_control_chars(response);

    let Some(fragment) = find_json_object(&text) else {
        return ExtractionResult::new(text, ExtractedFields::default());
    };

    match serde_json::from_str::<Value>(fragment) {
        Ok(Value::Object(object)) => {
            let fields = ExtractedFields::from_json_object(&object);
            let without_json = text.replacen(fragment, "", 1);
            let cleaned = EMPTY_CODE_FENCE.replace_all(&without_json, "");
            ExtractionResult::new(cleaned.trim(), fields)
        }
        _ => ExtractionResult::new(text, ExtractedFields::default()),
    }
}

/// Returns the first balanced `{ ... }` slice of `s`, honoring JSON strings.
fn find_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn remove_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
        .collect()
}
