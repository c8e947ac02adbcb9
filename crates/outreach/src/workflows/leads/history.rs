use chrono::{Duration, NaiveDate};
use std::collections::HashSet;

use super::domain::AssignmentRecord;
use crate::workflows::normalizer::canonical_domain;

/// Length of the rolling exclusion window. The boundary is inclusive: a
/// domain assigned exactly this many days before the run date is still
/// excluded.
pub const ROLLING_WINDOW_DAYS: i64 = 365;

/// Why a candidate was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Listed in a legacy outbound dataset.
    Permanent,
    /// Assigned inside the rolling window.
    Recent,
}

/// Suppression rules evaluated before any directory lookup.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    prior_domains: HashSet<String>,
    recent_domains: HashSet<String>,
}

impl HistoryFilter {
    pub fn new(
        prior_domains: HashSet<String>,
        history: &[AssignmentRecord],
        today: NaiveDate,
    ) -> Self {
        let recent_domains = history
            .iter()
            .filter(|record| assigned_within_window(record, today))
            .map(|record| canonical_domain(Some(record.domain.as_str())))
            .filter(|domain| !domain.is_empty())
            .collect();

        Self {
            prior_domains,
            recent_domains,
        }
    }

    /// Blank domains are never excluded by either rule.
    pub fn exclusion(&self, domain: &str) -> Option<Exclusion> {
        if domain.is_empty() {
            return None;
        }
        if self.prior_domains.contains(domain) {
            return Some(Exclusion::Permanent);
        }
        if self.recent_domains.contains(domain) {
            return Some(Exclusion::Recent);
        }
        None
    }
}

/// True when the record's week falls in `[today - 365 days, ∞)`. Records
/// whose week cannot be parsed never match.
pub fn assigned_within_window(record: &AssignmentRecord, today: NaiveDate) -> bool {
    let cutoff = today - Duration::days(ROLLING_WINDOW_DAYS);
    record
        .week
        .date()
        .map(|assigned_on| assigned_on >= cutoff)
        .unwrap_or(false)
}
