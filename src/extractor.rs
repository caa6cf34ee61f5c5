//! Turns the model's free-text reply into a [`DiagnosisResult`].
//!
//! Each field has its own rule and its own fallback, so a reply that only partly
//! follows the requested structure still yields a complete record. Rules scan for
//! the first keyword hit and read to the end of the line (or clause).

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DiagnosisResult, Severity};

pub const UNKNOWN_DISEASE: &str = "Unknown";
pub const DEFAULT_CONSULTATION_REASON: &str = "Professional evaluation recommended for accurate diagnosis.";
pub const DEFAULT_CURE_SUGGESTIONS: &str = "Please consult with a veterinarian for proper treatment options.";
pub const DEFAULT_HOME_REMEDIES: &str = "Keep the area clean and dry. Monitor for any changes.";

static DISEASE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)disease[:\s]+([^\n.]+)"));
static CONSULTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(?:consultation|veterinary)[:\s]+([^\n]+)"));
static CURE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)(?:cure|treatment)[:\s]+([^()\r\n]+)"));
static HOME_REMEDIES_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)home\s+remed[^:]*[:\s]+([^()\r\n]+)"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid extraction regex pattern")
}

/// First capture of `re`, trimmed. Whitespace-only captures count as no match.
fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn extract_disease_name(text: &str) -> String {
    first_capture(&DISEASE_RE, text).unwrap_or_else(|| UNKNOWN_DISEASE.to_string())
}

/// Plain substring scan: "not severe" still reads as severe.
pub fn extract_severity(text: &str) -> Severity {
    let lower = text.to_lowercase();
    if lower.contains("severe") {
        Severity::Severe
    } else if lower.contains("mild") {
        Severity::Mild
    } else {
        Severity::Moderate
    }
}

pub fn needs_consultation(text: &str, severity: Severity) -> bool {
    let lower = text.to_lowercase();
    lower.contains("veterinary") || lower.contains("consult") || severity == Severity::Severe
}

pub fn extract_consultation_reason(text: &str) -> String {
    first_capture(&CONSULTATION_RE, text).unwrap_or_else(|| DEFAULT_CONSULTATION_REASON.to_string())
}

pub fn extract_cure_suggestions(text: &str) -> String {
    first_capture(&CURE_RE, text).unwrap_or_else(|| DEFAULT_CURE_SUGGESTIONS.to_string())
}

pub fn extract_home_remedies(text: &str) -> String {
    first_capture(&HOME_REMEDIES_RE, text).unwrap_or_else(|| DEFAULT_HOME_REMEDIES.to_string())
}

/// Never fails and never leaves a field empty.
pub fn extract(raw: &str) -> DiagnosisResult {
    let severity = extract_severity(raw);
    DiagnosisResult {
        disease_name: extract_disease_name(raw),
        severity,
        should_consult_doctor: needs_consultation(raw, severity),
        consultation_reason: extract_consultation_reason(raw),
        cure_suggestions: extract_cure_suggestions(raw),
        home_remedies: extract_home_remedies(raw),
        raw_response: raw.to_string(),
    }
}
