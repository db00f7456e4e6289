//! Tolerant extraction of tagged sections from model output.
//!
//! Model output is a loosely structured protocol, not a grammar: each tag is
//! located independently, anywhere in the text, in any order, with bodies
//! spanning lines. A missing or malformed section degrades to its default
//! (empty string, 0.0, false) — parsing never fails. Bodies are trimmed.

use regex::Regex;

use super::answer::{ArbiterVerdict, MemberAnswer};

/// Inner text of the first `<tag>...</tag>` pair, if present.
fn tag_body(raw: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?is)<{tag}>(.*?)</{tag}>");
    let re = Regex::new(&pattern).expect("tag pattern is static");
    re.captures(raw).map(|c| c[1].trim().to_string())
}

fn text_field(raw: &str, tag: &str) -> String {
    tag_body(raw, tag).unwrap_or_default()
}

/// Numeric parse of the tag body, clamped to [0, 1]; 0.0 on anything else.
fn confidence_field(raw: &str, tag: &str) -> f64 {
    tag_body(raw, tag)
        .and_then(|body| body.parse::<f64>().ok())
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// True only for a body that is (case-insensitively) the literal `true`.
fn flag_field(raw: &str, tag: &str) -> bool {
    tag_body(raw, tag)
        .map(|body| body.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Parse a member's raw response into its structured answer.
pub fn parse_member_answer(raw: &str) -> MemberAnswer {
    MemberAnswer {
        thought_process: text_field(raw, "thought_process"),
        analysis: text_field(raw, "analysis"),
        confidence: confidence_field(raw, "confidence"),
    }
}

/// Parse the arbiter's raw response into its structured verdict.
pub fn parse_arbiter_verdict(raw: &str) -> ArbiterVerdict {
    ArbiterVerdict {
        synthesis: text_field(raw, "synthesis"),
        confidence: confidence_field(raw, "confidence"),
        analysis: text_field(raw, "analysis"),
        dissent: text_field(raw, "dissent"),
        needs_iteration: flag_field(raw, "needs_iteration"),
        refinement_areas: text_field(raw, "refinement_areas"),
    }
}
