use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use super::domain::Candidate;
use crate::workflows::normalizer::canonical_domain;

const COMPANY_HEADERS: [&str; 3] = ["Company", "CompanyName", "company"];

/// Column positions resolved once from the header row.
struct CandidateColumns {
    company: Option<usize>,
    website: Option<usize>,
    domain: Option<usize>,
    city: Option<usize>,
    state: Option<usize>,
    country: Option<usize>,
    industry: Option<usize>,
    employee_count: Option<usize>,
    estimated_fleet_size: Option<usize>,
    source: Option<usize>,
    notes: Option<usize>,
}

impl CandidateColumns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|header| header == name);

        Self {
            company: COMPANY_HEADERS.iter().find_map(|name| find(name)),
            website: find("Website"),
            domain: find("Domain"),
            city: find("City"),
            state: find("State"),
            country: find("Country"),
            industry: find("Industry"),
            employee_count: find("EmployeeCount"),
            estimated_fleet_size: find("EstimatedFleetSize"),
            source: find("Source"),
            notes: find("Notes"),
        }
    }
}

fn cell(record: &csv::StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|index| record.get(index))
        .unwrap_or_default()
        .to_string()
}

/// Reads candidate rows. Unknown columns are ignored and missing ones become
/// empty strings; the domain comes from `Website`, or `Domain` when the
/// website cell is blank.
pub fn parse_candidates<R: Read>(reader: R) -> Result<Vec<Candidate>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let columns = CandidateColumns::from_headers(&headers);
    let mut candidates = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let website = cell(&record, columns.website);
        let domain = if website.is_empty() {
            canonical_domain(Some(cell(&record, columns.domain).as_str()))
        } else {
            canonical_domain(Some(website.as_str()))
        };

        candidates.push(Candidate {
            company_name: cell(&record, columns.company),
            website,
            domain,
            city: cell(&record, columns.city),
            state_province: cell(&record, columns.state),
            country: cell(&record, columns.country),
            industry: cell(&record, columns.industry),
            employee_count: cell(&record, columns.employee_count),
            estimated_fleet_size: cell(&record, columns.estimated_fleet_size),
            source: cell(&record, columns.source),
            notes: cell(&record, columns.notes),
        });
    }

    Ok(candidates)
}

pub fn read_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<Candidate>, CandidateFileError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| CandidateFileError::Open {
        path: path.display().to_string(),
        source,
    })?;
    parse_candidates(file).map_err(|source| CandidateFileError::Csv {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum CandidateFileError {
    #[error("candidate file {path} could not be opened: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("candidate file {path} is not valid CSV: {source}")]
    Csv { path: String, source: csv::Error },
}

/// Canonical domains listed in a legacy outbound list, taken from its
/// `Website` and `Domain` columns.
pub fn parse_prior_domains<R: Read>(reader: R) -> Result<HashSet<String>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let indices: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| *header == "Website" || *header == "Domain")
        .map(|(index, _)| index)
        .collect();

    let mut domains = HashSet::new();
    for record in csv_reader.records() {
        let record = record?;
        for index in &indices {
            let domain = canonical_domain(record.get(*index));
            if !domain.is_empty() {
                domains.insert(domain);
            }
        }
    }

    Ok(domains)
}

/// Union of the domains of every readable legacy list. Files that are missing
/// or malformed are skipped.
pub fn read_prior_domains<P: AsRef<Path>>(paths: &[P]) -> HashSet<String> {
    let mut domains = HashSet::new();

    for path in paths {
        let path = path.as_ref();
        let parsed = std::fs::File::open(path)
            .map_err(|err| err.to_string())
            .and_then(|file| parse_prior_domains(file).map_err(|err| err.to_string()));

        match parsed {
            Ok(found) => {
                debug!(path = %path.display(), domains = found.len(), "loaded legacy list");
                domains.extend(found);
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping legacy list"),
        }
    }

    domains
}
