// src/core/parser.rs — Recover a JSON object from free-form model output
//
// Stages run in order and stop at the first success:
//   1. whole text as JSON
//   2. markdown fences removed
//   3. stray number between "lat" and "lng" removed
//   4. first '{' .. last '}' of the repaired text
//   5. first balanced {...} block that parses

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Which cascade stage produced the parsed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Direct,
    Unfenced,
    CoordinateRepair,
    BraceSpan,
    BalancedBlock,
}

impl std::fmt::Display for ParseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParseStage::Direct => "direct",
            ParseStage::Unfenced => "unfenced",
            ParseStage::CoordinateRepair => "coordinate-repair",
            ParseStage::BraceSpan => "brace-span",
            ParseStage::BalancedBlock => "balanced-block",
        };
        f.write_str(name)
    }
}

/// Outcome of [`parse`]. `Failed` is a hard failure for the attempt, never "empty data".
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed { value: Value, stage: ParseStage },
    Failed,
}

impl ParseOutcome {
    pub fn into_value(self) -> Option<Value> {
        match self {
            ParseOutcome::Parsed { value, .. } => Some(value),
            ParseOutcome::Failed => None,
        }
    }

    pub fn stage(&self) -> Option<ParseStage> {
        match self {
            ParseOutcome::Parsed { stage, .. } => Some(*stage),
            ParseOutcome::Failed => None,
        }
    }
}

/// `"lat":12.3,45.6,"lng":` → `"lat":12.3,"lng":`
fn coordinate_glitch() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"("lat"\s*:\s*-?\d+(?:\.\d+)?)\s*,\s*-?\d+(?:\.\d+)?\s*,\s*("lng"\s*:)"#)
            .expect("coordinate pattern is valid")
    })
}

/// Parse raw model text into a JSON object, tolerating common model mistakes.
pub fn parse(raw: &str) -> ParseOutcome {
    let parsed = |value, stage| ParseOutcome::Parsed { value, stage };

    if let Some(v) = try_object(raw) {
        return parsed(v, ParseStage::Direct);
    }

    let unfenced = strip_fences(raw);
    if let Some(v) = try_object(&unfenced) {
        return parsed(v, ParseStage::Unfenced);
    }

    let repaired = repair_coordinates(&unfenced);
    if repaired != unfenced {
        if let Some(v) = try_object(&repaired) {
            return parsed(v, ParseStage::CoordinateRepair);
        }
    }

    if let Some(v) = brace_span(&repaired).and_then(try_object) {
        return parsed(v, ParseStage::BraceSpan);
    }

    if let Some(v) = balanced_blocks(&repaired).find_map(try_object) {
        return parsed(v, ParseStage::BalancedBlock);
    }

    ParseOutcome::Failed
}

/// Only JSON objects count; a bare number or array is not an itinerary payload.
fn try_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(v @ Value::Object(_)) => Some(v),
        _ => None,
    }
}

fn strip_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub(crate) fn repair_coordinates(text: &str) -> String {
    coordinate_glitch().replace_all(text, "$1,$2").into_owned()
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Every top-level-looking `{...}` block, in order of its opening brace.
///
/// Braces inside JSON strings are ignored.
fn balanced_blocks(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|&(_, c)| c == '{')
        .filter_map(move |(start, _)| block_end(&text[start..]).map(|len| &text[start..start + len]))
}

/// Byte length of the balanced block starting at `text[0] == '{'`.
fn block_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}
