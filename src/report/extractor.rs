// src/report/extractor.rs
//! Labeled-field extraction from free-form reports.
//!
//! Two layouts are recognized, tried in order:
//!
//! * format A: `**Label**: value` (the canonical report, see `formatter`)
//! * format B: `Label: value` at the start of a line, optionally preceded by
//!   whitespace, a list marker (`-`, `*`, `+`, `•`, `1.`) or a leading icon glyph
//!
//! A value never spans lines. A label left blank yields `None` even when the
//! intended content sits on the following lines.

use std::collections::BTreeMap;

/// Leading glyphs tolerated before a format-B label
pub const ICON_GLYPHS: [char; 14] = [
    '📈', '📉', '📊', '🎯', '🛑', '💡', '⚠', '✅', '❌', '❗', '🔔', '👉', '⭐', '\u{FE0F}',
];

/// Value associated with `label` in `text`, or `None` when absent
pub fn extract_field(text: &str, label: &str) -> Option<String> {
    if label.is_empty() {
        return None;
    }
    extract_emphasized(text, label)
        .filter(|v| is_usable(v))
        .or_else(|| extract_plain(text, label).filter(|v| is_usable(v)))
}

/// First `**label**:` value in the text, possibly empty
fn extract_emphasized(text: &str, label: &str) -> Option<String> {
    let needle = format!("**{}**", label);
    text.lines().find_map(|line| {
        let pos = line.find(&needle)?;
        let rest = line[pos + needle.len()..].trim_start_matches([' ', '\t']);
        strip_colon(rest).map(|value| value.trim().to_string())
    })
}

/// First line-leading `label:` value in the text, possibly empty
fn extract_plain(text: &str, label: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let body = strip_decoration(line);
        let rest = body.strip_prefix(label)?.trim_start_matches([' ', '\t']);
        strip_colon(rest).map(|value| value.trim().to_string())
    })
}

fn strip_colon(s: &str) -> Option<&str> {
    s.strip_prefix(':').or_else(|| s.strip_prefix('：'))
}

// Whitespace, list markers and icon glyphs ahead of a format-B label
fn strip_decoration(line: &str) -> &str {
    let mut s = line;
    loop {
        let before = s.len();
        s = s.trim_start();
        s = s.trim_start_matches(|c: char| ICON_GLYPHS.contains(&c));
        for marker in ["- ", "* ", "+ ", "• ", "•"] {
            if let Some(rest) = s.strip_prefix(marker) {
                s = rest;
            }
        }
        s = strip_numbered_marker(s);
        if s.len() == before {
            return s;
        }
    }
}

fn strip_numbered_marker(s: &str) -> &str {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return s;
    }
    let rest = &s[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(after) if after.starts_with([' ', '\t']) => after,
        _ => s,
    }
}

/// True when `value` reads like the start of another `**Label**:` field
pub fn looks_like_label(value: &str) -> bool {
    let v = value.trim_start_matches(['-', '•', ' ', '\t']);
    let inner = match v.strip_prefix("**") {
        Some(inner) => inner,
        None => return false,
    };
    match inner.find("**") {
        Some(end) => strip_colon(inner[end + 2..].trim_start()).is_some(),
        None => false,
    }
}

fn is_usable(value: &str) -> bool {
    !value.is_empty() && !looks_like_label(value)
}

/// Value of `label` plus the numbered or bulleted lines that follow it,
/// joined with `"; "`.
///
/// The first line's value may be blank. Collection ends at the next line
/// carrying one of `section_labels`; lines that are neither list items nor
/// labels are skipped.
pub fn extract_list_field(text: &str, label: &str, section_labels: &[&str]) -> Option<String> {
    if label.is_empty() {
        return None;
    }
    let mut lines = text.lines();
    let first = lines.find_map(|line| labeled_value(line, label))?;

    let mut parts: Vec<&str> = Vec::new();
    if is_usable(first) {
        parts.push(first);
    }
    for line in lines {
        if section_labels.iter().any(|l| labeled_value(line, l).is_some()) {
            break;
        }
        let line = line.trim();
        if is_list_item(line) {
            parts.push(line);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

// Possibly empty value when `line` carries `label` in either layout
fn labeled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let body = strip_decoration(line);
    let rest = match body.strip_prefix("**") {
        Some(inner) => inner.strip_prefix(label)?.strip_prefix("**")?,
        None => body.strip_prefix(label)?,
    };
    strip_colon(rest.trim_start_matches([' ', '\t'])).map(str::trim)
}

fn is_list_item(line: &str) -> bool {
    line.starts_with(|c: char| c.is_ascii_digit())
        || line.starts_with(['-', '•'])
        || line.starts_with("* ")
}

/// Field-name to single-line value mapping parsed from one report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFields {
    values: BTreeMap<String, String>,
}

impl ReportFields {
    /// Extract every label in `labels`; absent fields are simply not stored
    pub fn parse(text: &str, labels: &[&str]) -> Self {
        let values = labels
            .iter()
            .filter_map(|label| extract_field(text, label).map(|v| (label.to_string(), v)))
            .collect();
        Self { values }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.values.get(label).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, label: &str, default: &'a str) -> &'a str {
        self.get(label).unwrap_or(default)
    }

    /// First present label among `labels`
    pub fn first_of(&self, labels: &[String]) -> Option<&str> {
        labels.iter().find_map(|label| self.get(label))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
