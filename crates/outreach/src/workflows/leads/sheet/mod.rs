//! Weekly output blocks and the sinks that receive them.

mod csv_dir;
mod google;

pub use csv_dir::CsvSheetDirectory;
pub use google::GoogleSheetsClient;

use chrono::NaiveDate;
use std::fmt::Debug;

use super::domain::{AssignmentWeek, EnrichedCandidate, Verification};

/// Column header row written under each week marker.
pub const SHEET_COLUMNS: [&str; 24] = [
    "CompanyName",
    "Website",
    "Domain",
    "HQ_City",
    "HQ_StateProvince",
    "Country",
    "Industry",
    "EmployeeCount",
    "EstimatedFleetSize",
    "GrowthSignalScore",
    "FitScore",
    "DM1_Name",
    "DM1_Title",
    "DM1_LinkedIn",
    "DM1_Email",
    "DM1_Email_Verified",
    "DM1_DirectPhone",
    "DM1_Phone_Verified",
    "Source",
    "Notes",
    "BestCallWindow",
    "AssignedRep",
    "WeekAssigned",
    "LastVerified",
];

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("sheet backend failed: {0}")]
    Backend(String),
    #[error("sheet credentials rejected: {0}")]
    Credentials(String),
    #[error("sheet runtime unavailable: {0}")]
    Runtime(String),
    #[error("sheet file {path} could not be written: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("sheet file {path} could not be encoded: {source}")]
    Csv { path: String, source: csv::Error },
}

/// Destination for weekly blocks; one tab per owner.
pub trait SheetGateway: Debug {
    fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<(), SheetError>;
}

/// Builds the block appended to an owner's tab: the week marker, the column
/// row, one row per candidate and a blank separator.
pub fn render_block(
    week: &AssignmentWeek,
    owner: &str,
    candidates: &[EnrichedCandidate],
    last_verified: NaiveDate,
) -> Vec<Vec<String>> {
    let verified_on = last_verified.format("%Y-%m-%d").to_string();
    let mut rows = Vec::with_capacity(candidates.len() + 3);

    rows.push(vec![format!("Week: {week}")]);
    rows.push(SHEET_COLUMNS.iter().map(|name| name.to_string()).collect());
    rows.extend(
        candidates
            .iter()
            .map(|entry| candidate_row(entry, owner, week, &verified_on)),
    );
    rows.push(vec![String::new()]);
    rows
}

fn candidate_row(
    entry: &EnrichedCandidate,
    owner: &str,
    week: &AssignmentWeek,
    verified_on: &str,
) -> Vec<String> {
    let candidate = &entry.candidate;
    let contact = entry.contact.as_ref();
    let text = |value: Option<&String>| value.cloned().unwrap_or_default();
    let verification =
        |flag: Option<Verification>| flag.map(|flag| flag.label().to_string()).unwrap_or_default();

    vec![
        candidate.company_name.clone(),
        candidate.website.clone(),
        candidate.domain.clone(),
        candidate.city.clone(),
        candidate.state_province.clone(),
        candidate.country.clone(),
        candidate.industry.clone(),
        candidate.employee_count.clone(),
        candidate.estimated_fleet_size.clone(),
        entry
            .growth_signal_score
            .map(|score| score.to_string())
            .unwrap_or_default(),
        entry.score().to_string(),
        text(contact.map(|c| &c.name)),
        text(contact.map(|c| &c.title)),
        text(contact.map(|c| &c.linkedin_url)),
        text(contact.and_then(|c| c.email.as_ref())),
        verification(contact.map(|c| c.email_verification)),
        text(contact.and_then(|c| c.phone.as_ref())),
        verification(contact.map(|c| c.phone_verification)),
        candidate.source.clone(),
        candidate.notes.clone(),
        String::new(),
        owner.to_string(),
        week.to_string(),
        verified_on.to_string(),
    ]
}
