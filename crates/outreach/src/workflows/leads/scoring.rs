use serde::{Deserialize, Serialize};

use super::domain::{Candidate, Contact};

pub const MAX_FIT_SCORE: u8 = 100;

const SECTOR_KEYWORDS: [&str; 6] = [
    "fleet",
    "transport",
    "logistics",
    "trucking",
    "delivery",
    "distribution",
];

/// Signal a score component was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Industry,
    EmployeeCount,
    ContactCompleteness,
}

/// Discrete contribution to a fit score, kept for audit logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: u8,
    pub notes: String,
}

/// Suitability ranking in `0..=100` with the components that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitScore {
    pub value: u8,
    pub components: Vec<ScoreComponent>,
}

/// Scores a candidate and its resolved contact. Pure and deterministic.
pub fn score_candidate(candidate: &Candidate, contact: Option<&Contact>) -> FitScore {
    let components = vec![
        industry_component(&candidate.industry),
        employee_component(&candidate.employee_count),
        contact_component(contact),
    ];

    let total: u16 = components
        .iter()
        .map(|component| u16::from(component.points))
        .sum();
    let value = total.min(u16::from(MAX_FIT_SCORE)) as u8;

    FitScore { value, components }
}

fn industry_component(industry: &str) -> ScoreComponent {
    let lowered = industry.to_lowercase();
    match SECTOR_KEYWORDS
        .iter()
        .find(|keyword| lowered.contains(*keyword))
    {
        Some(keyword) => ScoreComponent {
            factor: ScoreFactor::Industry,
            points: 30,
            notes: format!("industry mentions '{keyword}'"),
        },
        None => ScoreComponent {
            factor: ScoreFactor::Industry,
            points: 0,
            notes: "industry outside target sectors".to_string(),
        },
    }
}

fn employee_component(raw: &str) -> ScoreComponent {
    // Blank and malformed counts land in the lowest non-zero tier.
    match raw.trim().parse::<f64>() {
        Ok(count) if count >= 100.0 => ScoreComponent {
            factor: ScoreFactor::EmployeeCount,
            points: 25,
            notes: format!("{count} employees"),
        },
        Ok(count) if count >= 50.0 => ScoreComponent {
            factor: ScoreFactor::EmployeeCount,
            points: 10,
            notes: format!("{count} employees"),
        },
        Ok(count) => ScoreComponent {
            factor: ScoreFactor::EmployeeCount,
            points: 0,
            notes: format!("{count} employees below 50"),
        },
        Err(_) => ScoreComponent {
            factor: ScoreFactor::EmployeeCount,
            points: 5,
            notes: format!("employee count '{}' not numeric", raw.trim()),
        },
    }
}

fn contact_component(contact: Option<&Contact>) -> ScoreComponent {
    let (has_email, has_phone) = contact
        .map(|contact| (contact.has_email(), contact.has_phone()))
        .unwrap_or((false, false));

    let (points, notes) = match (has_email, has_phone) {
        (true, true) => (30, "email and direct phone"),
        (true, false) => (10, "email only"),
        (false, true) => (10, "direct phone only"),
        (false, false) => (0, "no reachable contact details"),
    };

    ScoreComponent {
        factor: ScoreFactor::ContactCompleteness,
        points,
        notes: notes.to_string(),
    }
}
