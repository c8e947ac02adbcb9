use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::scoring::FitScore;

/// Company-level row loaded from the candidate file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub company_name: String,
    pub website: String,
    /// Canonical domain, possibly empty when the row carries no website.
    pub domain: String,
    pub city: String,
    pub state_province: String,
    pub country: String,
    pub industry: String,
    /// Raw cell text; parsed leniently by the scorer.
    pub employee_count: String,
    pub estimated_fleet_size: String,
    pub source: String,
    pub notes: String,
}

/// Tri-state verification flag reported alongside contact details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Verified,
    Unverified,
    Unknown,
}

impl Verification {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Unknown => "unknown",
        }
    }
}

/// Decision-maker chosen to represent a company for outreach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub title: String,
    pub linkedin_url: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub email_verification: Verification,
    pub phone_verification: Verification,
}

impl Contact {
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|email| !email.is_empty())
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|phone| !phone.is_empty())
    }
}

/// Candidate plus everything derived for it during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedCandidate {
    pub candidate: Candidate,
    pub contact: Option<Contact>,
    pub fit_score: FitScore,
    /// Reserved column; nothing populates it yet.
    pub growth_signal_score: Option<u8>,
}

impl EnrichedCandidate {
    pub fn score(&self) -> u8 {
        self.fit_score.value
    }
}

/// Period identifier stamped on a weekly batch and its ledger rows.
///
/// Kept as the literal text found in the ledger so that values written by
/// older runs compare exactly; [`AssignmentWeek::date`] interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentWeek(String);

impl AssignmentWeek {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date of the week, or `None` for unparseable values.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_week_date(&self.0)
    }
}

impl fmt::Display for AssignmentWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_week_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// One row of the append-only assignment ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "Domain", default)]
    pub domain: String,
    #[serde(rename = "CompanyName", default)]
    pub company_name: String,
    #[serde(rename = "AssignedRep", default)]
    pub owner: String,
    #[serde(rename = "WeekAssigned")]
    pub week: AssignmentWeek,
    #[serde(rename = "LastDisposition", default)]
    pub last_outcome: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_parses_common_ledger_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date");
        assert_eq!(AssignmentWeek::new("2025-03-07").date(), Some(expected));
        assert_eq!(
            AssignmentWeek::new("2025-03-07T10:00:00Z").date(),
            Some(expected)
        );
        assert_eq!(
            AssignmentWeek::new("2025-03-07 00:00:00").date(),
            Some(expected)
        );
        assert_eq!(AssignmentWeek::new(" 2025-03-07 ").as_str(), "2025-03-07");
    }

    #[test]
    fn malformed_week_has_no_date() {
        assert!(AssignmentWeek::new("week 10").date().is_none());
        assert!(AssignmentWeek::new("").date().is_none());
        assert!(AssignmentWeek::new("2025-13-40").date().is_none());
    }

    #[test]
    fn contact_presence_ignores_blank_values() {
        let contact = Contact {
            name: "Dana Ruiz".to_string(),
            title: "Fleet Manager".to_string(),
            linkedin_url: String::new(),
            email: Some(String::new()),
            phone: Some("555-0100".to_string()),
            email_verification: Verification::Unknown,
            phone_verification: Verification::Unknown,
        };
        assert!(!contact.has_email());
        assert!(contact.has_phone());
    }
}
