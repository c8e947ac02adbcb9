use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::workflows::leads::contacts::{
    ContactDirectory, DirectoryError, DirectoryPerson, PhoneField, DEFAULT_TARGET_TITLES,
};
use crate::workflows::leads::domain::{AssignmentRecord, AssignmentWeek, Candidate};
use crate::workflows::leads::ledger::{AssignmentLedger, LedgerError};
use crate::workflows::leads::sheet::{SheetError, SheetGateway};
use crate::workflows::leads::{GenerationSettings, LeadListGenerator};

pub(super) const WEEK: &str = "2025-06-06";

pub(super) fn settings() -> GenerationSettings {
    GenerationSettings {
        week: AssignmentWeek::new(WEEK),
        owners: ["Evan".to_string(), "Dave".to_string()],
        target_titles: DEFAULT_TARGET_TITLES
            .iter()
            .map(|title| title.to_string())
            .collect(),
        request_delay: Duration::ZERO,
    }
}

pub(super) fn candidate(company: &str, domain: &str, industry: &str, employees: &str) -> Candidate {
    Candidate {
        company_name: company.to_string(),
        website: if domain.is_empty() {
            String::new()
        } else {
            format!("https://{domain}")
        },
        domain: domain.to_string(),
        industry: industry.to_string(),
        employee_count: employees.to_string(),
        ..Candidate::default()
    }
}

pub(super) fn fleet_manager(name: &str, email: &str, phone: &str) -> DirectoryPerson {
    DirectoryPerson {
        id: Some(name.to_lowercase()),
        name: Some(name.to_string()),
        title: Some("Fleet Manager".to_string()),
        email: Some(email.to_string()),
        phone: Some(PhoneField::Single(phone.to_string())),
        ..DirectoryPerson::default()
    }
}

pub(super) fn record(domain: &str, week: &str) -> AssignmentRecord {
    AssignmentRecord {
        domain: domain.to_string(),
        company_name: domain.to_string(),
        owner: "Evan".to_string(),
        week: AssignmentWeek::new(week),
        last_outcome: String::new(),
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryDirectory {
    pub(super) by_domain: HashMap<String, Vec<DirectoryPerson>>,
    pub(super) lookups: Mutex<Vec<String>>,
}

impl MemoryDirectory {
    pub(super) fn with_person(mut self, domain: &str, person: DirectoryPerson) -> Self {
        self.by_domain
            .entry(domain.to_string())
            .or_default()
            .push(person);
        self
    }

    pub(super) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().expect("directory mutex poisoned").clone()
    }
}

impl ContactDirectory for MemoryDirectory {
    fn people_by_domain(&self, domain: &str) -> Result<Vec<DirectoryPerson>, DirectoryError> {
        self.lookups
            .lock()
            .expect("directory mutex poisoned")
            .push(domain.to_string());
        Ok(self.by_domain.get(domain).cloned().unwrap_or_default())
    }

    fn people_by_company(&self, _company: &str) -> Result<Vec<DirectoryPerson>, DirectoryError> {
        Err(DirectoryError::RateLimited)
    }
}

#[derive(Debug, Default)]
pub(super) struct MemorySheet {
    tabs: Mutex<Vec<(String, Vec<Vec<String>>)>>,
    pub(super) fail: bool,
}

impl MemorySheet {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(super) fn blocks(&self) -> Vec<(String, Vec<Vec<String>>)> {
        self.tabs.lock().expect("sheet mutex poisoned").clone()
    }
}

impl SheetGateway for MemorySheet {
    fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<(), SheetError> {
        if self.fail {
            return Err(SheetError::Backend("quota exceeded".to_string()));
        }
        self.tabs
            .lock()
            .expect("sheet mutex poisoned")
            .push((tab.to_string(), rows.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryLedger {
    records: Mutex<Vec<AssignmentRecord>>,
    unreadable: bool,
}

impl MemoryLedger {
    pub(super) fn with_records(records: Vec<AssignmentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            unreadable: false,
        }
    }

    pub(super) fn unreadable() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            unreadable: true,
        }
    }

    pub(super) fn records(&self) -> Vec<AssignmentRecord> {
        self.records.lock().expect("ledger mutex poisoned").clone()
    }
}

impl AssignmentLedger for MemoryLedger {
    fn load(&self) -> Result<Vec<AssignmentRecord>, LedgerError> {
        if self.unreadable {
            return Err(LedgerError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "ledger locked",
            )));
        }
        Ok(self.records())
    }

    fn append(&self, records: &[AssignmentRecord]) -> Result<(), LedgerError> {
        self.records
            .lock()
            .expect("ledger mutex poisoned")
            .extend_from_slice(records);
        Ok(())
    }
}

pub(super) type MemoryGenerator = LeadListGenerator<MemoryDirectory, MemorySheet, MemoryLedger>;

pub(super) fn generator(
    directory: &Arc<MemoryDirectory>,
    sheet: &Arc<MemorySheet>,
    ledger: &Arc<MemoryLedger>,
) -> MemoryGenerator {
    LeadListGenerator::new(directory.clone(), sheet.clone(), ledger.clone(), settings())
}
