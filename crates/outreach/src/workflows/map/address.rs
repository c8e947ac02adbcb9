//! Heuristics for pulling a website and a mailing address out of free text.

use regex::Regex;
use std::sync::OnceLock;

const MAX_LOCALITY_LINE: usize = 120;

static WEBSITE_RE: OnceLock<Regex> = OnceLock::new();
static US_ZIP_RE: OnceLock<Regex> = OnceLock::new();
static CA_POSTAL_RE: OnceLock<Regex> = OnceLock::new();
static STREET_RE: OnceLock<Regex> = OnceLock::new();

fn website_re() -> &'static Regex {
    WEBSITE_RE.get_or_init(|| {
        Regex::new(r"(?i)https?://[^\s,]+|www\.[^\s,]+").expect("website pattern compiles")
    })
}

fn us_zip_re() -> &'static Regex {
    US_ZIP_RE.get_or_init(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("zip pattern compiles"))
}

fn ca_postal_re() -> &'static Regex {
    CA_POSTAL_RE.get_or_init(|| {
        Regex::new(r"(?i)\b[ABCEGHJ-NPRSTVXY]\d[A-Z] ?\d[A-Z]\d\b")
            .expect("postal pattern compiles")
    })
}

fn street_re() -> &'static Regex {
    STREET_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(St|Street|Ave|Avenue|Rd|Road|Blvd|Drive|Dr|Lane|Ln|Suite|Ste|Unit|PO Box|P\.O\. Box|Postal)\b",
        )
        .expect("street pattern compiles")
    })
}

/// First URL-looking token in the text, or `""`.
pub fn extract_website(text: &str) -> String {
    website_re()
        .find(text)
        .map(|found| found.as_str().trim().to_string())
        .unwrap_or_default()
}

fn content_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Last non-blank line, trimmed.
pub fn last_line(text: &str) -> Option<&str> {
    content_lines(text).pop()
}

/// Picks the line most likely to be an address: one with a street keyword or
/// postal code, else a short `City, Region` line near the end, else the last
/// line.
pub fn extract_address(text: &str) -> String {
    let lines = content_lines(text);

    if let Some(line) = lines.iter().find(|line| {
        street_re().is_match(line) || us_zip_re().is_match(line) || ca_postal_re().is_match(line)
    }) {
        return line.to_string();
    }

    let tail = &lines[lines.len().saturating_sub(3)..];
    if let Some(line) = tail
        .iter()
        .rev()
        .find(|line| line.contains(',') && line.len() < MAX_LOCALITY_LINE)
    {
        return line.to_string();
    }

    lines.last().map(|line| line.to_string()).unwrap_or_default()
}
