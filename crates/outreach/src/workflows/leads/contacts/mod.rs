//! Decision-maker resolution against a people-search directory.

mod apollo;

pub use apollo::ApolloPeopleClient;

use serde::Deserialize;
use std::fmt::Debug;
use tracing::{debug, warn};

use super::domain::{Contact, Verification};

/// Target roles in priority order; earlier entries win across all people.
pub const DEFAULT_TARGET_TITLES: [&str; 16] = [
    "Fleet Manager",
    "Director of Fleet",
    "Fleet Operations Manager",
    "Head of Fleet",
    "VP Fleet",
    "Director of Fleet Operations",
    "Procurement Manager",
    "Purchasing Manager",
    "Operations Manager",
    "Director of Operations",
    "Logistics Manager",
    "Director of Logistics",
    "Maintenance Manager",
    "Fleet Maintenance Manager",
    "Marketing Manager",
    "Director of Marketing",
];

const SENIORITY_KEYWORDS: [&str; 5] = ["director", "vp", "vice", "head", "manager"];

/// Person record as returned by the directory search.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DirectoryPerson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_status: Option<String>,
    #[serde(default)]
    pub phone: Option<PhoneField>,
    #[serde(default)]
    pub direct_phone: Option<String>,
    #[serde(default)]
    pub phone_numbers: Option<Vec<PhoneEntry>>,
}

/// The directory reports phones either as one value or as a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PhoneField {
    Single(String),
    Entries(Vec<PhoneEntry>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PhoneEntry {
    Plain(String),
    Structured {
        #[serde(default)]
        number: Option<String>,
        #[serde(default)]
        sanitized_number: Option<String>,
        #[serde(default)]
        raw_number: Option<String>,
    },
    Other(serde_json::Value),
}

impl PhoneEntry {
    fn number(&self) -> Option<String> {
        match self {
            PhoneEntry::Plain(value) => non_empty(Some(value)),
            PhoneEntry::Structured {
                number,
                sanitized_number,
                raw_number,
            } => non_empty(number.as_ref())
                .or_else(|| non_empty(sanitized_number.as_ref()))
                .or_else(|| non_empty(raw_number.as_ref())),
            PhoneEntry::Other(value) => scalar_text(value),
        }
    }
}

impl DirectoryPerson {
    fn title_lowercase(&self) -> String {
        self.title.as_deref().unwrap_or_default().to_lowercase()
    }

    /// Single phone string, preferring the first structured entry's number.
    pub fn phone_number(&self) -> Option<String> {
        let primary = match &self.phone {
            Some(PhoneField::Single(value)) => non_empty(Some(value)),
            Some(PhoneField::Entries(entries)) => entries.first().and_then(PhoneEntry::number),
            Some(PhoneField::Other(value)) => scalar_text(value),
            None => None,
        };

        primary
            .or_else(|| non_empty(self.direct_phone.as_ref()))
            .or_else(|| {
                self.phone_numbers
                    .as_ref()
                    .and_then(|entries| entries.first())
                    .and_then(PhoneEntry::number)
            })
    }

    pub fn email_verification(&self) -> Verification {
        match self
            .email_status
            .as_deref()
            .map(|status| status.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("verified") => Verification::Verified,
            Some("unverified") | Some("invalid") | Some("bounced") => Verification::Unverified,
            _ => Verification::Unknown,
        }
    }

    pub fn into_contact(self) -> Contact {
        let phone = self.phone_number();
        let email_verification = self.email_verification();
        let linkedin_url = non_empty(self.linkedin_url.as_ref())
            .or_else(|| non_empty(self.linkedin.as_ref()))
            .unwrap_or_default();

        Contact {
            name: self.name.unwrap_or_default().trim().to_string(),
            title: self.title.unwrap_or_default().trim().to_string(),
            linkedin_url,
            email: non_empty(self.email.as_ref()),
            phone,
            email_verification,
            phone_verification: Verification::Unknown,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => non_empty(Some(text)),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("directory rate limit reached")]
    RateLimited,
    #[error("directory request failed: {0}")]
    Transport(String),
    #[error("directory response could not be decoded: {0}")]
    Decode(String),
    #[error("directory runtime unavailable: {0}")]
    Runtime(String),
}

/// People-search backend. Implementations return the raw result page; the
/// resolver owns ranking and failure handling.
pub trait ContactDirectory: Debug {
    fn people_by_domain(&self, domain: &str) -> Result<Vec<DirectoryPerson>, DirectoryError>;
    fn people_by_company(&self, company: &str) -> Result<Vec<DirectoryPerson>, DirectoryError>;
}

/// Finds the single best decision-maker for a company.
#[derive(Debug)]
pub struct ContactResolver<'a, D: ContactDirectory + ?Sized> {
    directory: &'a D,
    target_titles: &'a [String],
}

impl<'a, D: ContactDirectory + ?Sized> ContactResolver<'a, D> {
    pub fn new(directory: &'a D, target_titles: &'a [String]) -> Self {
        Self {
            directory,
            target_titles,
        }
    }

    /// Looks up by domain first and falls back to the company name when that
    /// yields nobody. Directory failures degrade to "no contact".
    pub fn resolve(&self, domain: &str, company: &str) -> Option<Contact> {
        let mut people = Vec::new();

        if !domain.is_empty() {
            people = match self.directory.people_by_domain(domain) {
                Ok(people) => people,
                Err(err) => {
                    warn!(domain, error = %err, "domain lookup failed");
                    Vec::new()
                }
            };
        }

        if people.is_empty() && !company.trim().is_empty() {
            people = match self.directory.people_by_company(company) {
                Ok(people) => people,
                Err(err) => {
                    warn!(company, error = %err, "company lookup failed");
                    Vec::new()
                }
            };
        }

        let found = people.len();
        let chosen = select_decision_maker(people, self.target_titles)?;
        debug!(
            domain,
            company,
            found,
            title = chosen.title.as_deref().unwrap_or_default(),
            "selected decision maker"
        );
        Some(chosen.into_contact())
    }
}

/// Picks one person: target roles in priority order, then any senior title,
/// then the first person. People are sorted by name, title and id first so
/// the choice never depends on the directory's result order.
pub fn select_decision_maker(
    mut people: Vec<DirectoryPerson>,
    target_titles: &[String],
) -> Option<DirectoryPerson> {
    if people.is_empty() {
        return None;
    }

    people.sort_by_cached_key(|person| {
        (
            person.name.as_deref().unwrap_or_default().to_lowercase(),
            person.title_lowercase(),
            person.id.clone().unwrap_or_default(),
        )
    });

    let titles: Vec<String> = people.iter().map(DirectoryPerson::title_lowercase).collect();

    let target_match = target_titles.iter().find_map(|keyword| {
        let keyword = keyword.to_lowercase();
        titles.iter().position(|title| title.contains(&keyword))
    });

    let index = target_match
        .or_else(|| {
            titles.iter().position(|title| {
                SENIORITY_KEYWORDS
                    .iter()
                    .any(|keyword| title.contains(keyword))
            })
        })
        .unwrap_or(0);

    Some(people.swap_remove(index))
}
