//! Recovery of action JSON embedded in reply text.
//!
//! Replies from providers without native function calling carry their
//! media actions as JSON objects inside the text, often malformed or
//! wrapped in code fences. Extraction runs a ladder from strict to
//! tolerant: balanced-brace parse at the action anchor, then field
//! regexes that forgive missing quotes, then whole-object and array
//! sweeps. Whatever matched is stripped from the reply afterwards, so
//! re-running extraction on a cleaned reply finds nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::actions::{ToolAction, DEFAULT_AUDIO_DURATION};

/// Media action kinds that travel as embedded JSON.
const LEGACY_KINDS: &str = "generate_video|generate_image|modify_image|generate_audio";

static ACTION_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"["']?action["']?\s*:\s*["']?({LEGACY_KINDS})["']?"#
    ))
    .expect("action field regex is valid")
});

static PROMPT_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?prompt["']?\s*:\s*["']([^"']+)["']"#).expect("prompt field regex is valid")
});

static DURATION_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?duration["']?\s*:\s*(\d+(?:\.\d+)?)"#)
        .expect("duration field regex is valid")
});

static SIMPLE_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"\{{[\s\S]*?["']action["']\s*:\s*["'](?:{LEGACY_KINDS})["'][\s\S]*?\}}"#
    ))
    .expect("action object regex is valid")
});

static OBJECT_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*\{[\s\S]*?\}\s*\]").expect("object array regex is valid"));

static FENCE_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json|text|plain)?\s*```").expect("fence wrapper regex is valid")
});

/// A media action recovered from reply text, plus the exact span it
/// occupied so it can be stripped.
#[derive(Debug, Clone)]
pub struct ExtractedAction {
    pub action: ToolAction,
    pub raw: String,
}

/// Scan forward from an opening brace and return the balanced object.
///
/// Tracks single- and double-quoted strings so braces inside prompts do
/// not unbalance the scan; backslash escapes are skipped.
fn balanced_object(text: &str, open: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut quote = b'"';
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match b {
                b'\\' => escape = true,
                _ if b == quote => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' | b'\'' => {
                in_string = true;
                quote = b;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rebuild an action from tolerant field regexes over a candidate span.
fn action_from_fields(candidate: &str) -> Option<ToolAction> {
    let kind = ACTION_FIELD.captures(candidate)?.get(1)?.as_str().to_string();
    let prompt = PROMPT_FIELD.captures(candidate)?.get(1)?.as_str().to_string();
    let duration = DURATION_FIELD
        .captures(candidate)
        .and_then(|c| c.get(1)?.as_str().parse().ok())
        .unwrap_or(DEFAULT_AUDIO_DURATION);

    match kind.as_str() {
        "generate_image" => Some(ToolAction::GenerateImage { prompt }),
        "generate_video" => Some(ToolAction::GenerateVideo { prompt }),
        "generate_audio" => Some(ToolAction::GenerateAudio { prompt, duration }),
        "modify_image" => Some(ToolAction::ModifyImage { prompt }),
        _ => None,
    }
}

fn parse_candidate(candidate: &str) -> Option<ToolAction> {
    if let Ok(action) = serde_json::from_str::<ToolAction>(candidate) {
        if action.is_media() {
            return Some(action);
        }
    }
    action_from_fields(candidate)
}

/// Recover a media action embedded in reply text.
///
/// Returns the action and the exact text span it was parsed from.
pub fn extract_legacy_action(text: &str) -> Option<ExtractedAction> {
    let anchor = ACTION_FIELD.find(text)?;

    // Walk back to the object that contains the anchor.
    if let Some(open) = text[..anchor.start()].rfind('{') {
        if let Some(candidate) = balanced_object(text, open) {
            if let Some(action) = parse_candidate(candidate) {
                debug!("Recovered {} from balanced object", action.tool_name());
                return Some(ExtractedAction {
                    action,
                    raw: candidate.to_string(),
                });
            }
        }
    }

    // Sweep for any object carrying an action field.
    if let Some(m) = SIMPLE_OBJECT.find(text) {
        if let Some(action) = parse_candidate(m.as_str()) {
            debug!("Recovered {} from object sweep", action.tool_name());
            return Some(ExtractedAction {
                action,
                raw: m.as_str().to_string(),
            });
        }
    }

    // Some replies wrap the action in a one-element array.
    if let Some(m) = OBJECT_ARRAY.find(text) {
        if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(m.as_str()) {
            if let Some(first) = values.into_iter().next() {
                if let Ok(action) = serde_json::from_value::<ToolAction>(first) {
                    if action.is_media() {
                        debug!("Recovered {} from array sweep", action.tool_name());
                        return Some(ExtractedAction {
                            action,
                            raw: m.as_str().to_string(),
                        });
                    }
                }
            }
        }
    }

    None
}

/// Remove the extracted span (and any code fence wrapping it) from the
/// reply text.
pub fn strip_action_text(text: &str, raw: &str) -> String {
    let mut cleaned = match text.find(raw) {
        Some(pos) => {
            let mut start = pos;
            let mut end = pos + raw.len();

            // Widen to swallow a fence that wrapped only this span.
            let before = &text[..pos];
            if let Some(fence) = before.rfind("```") {
                let between = before[fence + 3..]
                    .trim_start_matches(|c: char| c.is_ascii_alphabetic());
                if between.trim().is_empty() {
                    start = fence;
                }
            }
            let after = &text[end..];
            if let Some(close) = after.find("```") {
                if after[..close].trim().is_empty() {
                    end += close + 3;
                }
            }

            format!("{}{}", &text[..start], &text[end..])
        }
        None => text.to_string(),
    };

    cleaned = FENCE_WRAPPER.replace_all(&cleaned, "").to_string();
    cleaned.trim().to_string()
}

/// Conversion request parameters recovered from reply text.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionParams {
    pub target_format: String,
}

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").expect("code block regex is valid")
});

static CONVERSION_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{[^{}]*["']action["']\s*:\s*["']file_conversion["'][^{}]*\}"#)
        .expect("conversion object regex is valid")
});

fn conversion_from_value(candidate: &str) -> Option<ConversionParams> {
    let value: serde_json::Value = serde_json::from_str(candidate).ok()?;
    if value.get("action")?.as_str()? != "file_conversion" {
        return None;
    }
    let target = value
        .get("target_format")
        .or_else(|| value.get("targetFormat"))?
        .as_str()?;
    Some(ConversionParams {
        target_format: target.to_ascii_lowercase(),
    })
}

/// Recover file conversion parameters from a reply.
///
/// Tries a fenced code block first, then any conversion-shaped object,
/// then the widest brace-to-brace slice of the text.
pub fn extract_conversion(text: &str) -> Option<ConversionParams> {
    if let Some(caps) = CODE_BLOCK.captures(text) {
        if let Some(params) = conversion_from_value(caps.get(1)?.as_str()) {
            return Some(params);
        }
    }

    if let Some(m) = CONVERSION_OBJECT.find(text) {
        if let Some(params) = conversion_from_value(m.as_str()) {
            return Some(params);
        }
    }

    let first = text.find('{')?;
    let last = text.rfind('}')?;
    if first < last {
        return conversion_from_value(&text[first..=last]);
    }
    None
}

/// The user-facing text of a conversion reply: everything minus the
/// parameter JSON and code fences.
pub fn conversion_reply_text(text: &str) -> String {
    let mut cleaned = CODE_BLOCK.replace_all(text, "").to_string();
    cleaned = CONVERSION_OBJECT.replace_all(&cleaned, "").to_string();
    cleaned = cleaned.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "Here is your converted document.".to_string()
    } else {
        cleaned.to_string()
    }
}
