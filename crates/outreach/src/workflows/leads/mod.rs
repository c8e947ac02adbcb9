//! Weekly lead list generation: filter candidates against assignment history,
//! resolve a decision-maker, score, and split the best between two owners.

pub mod allocation;
pub mod contacts;
pub mod domain;
pub mod history;
pub mod ledger;
pub mod parser;
pub mod scoring;
pub mod sheet;

#[cfg(test)]
mod tests;

pub use allocation::{allocate, Allocation, Bucket};
pub use contacts::{ApolloPeopleClient, ContactDirectory, ContactResolver, DirectoryError};
pub use domain::{
    AssignmentRecord, AssignmentWeek, Candidate, Contact, EnrichedCandidate, Verification,
};
pub use history::{Exclusion, HistoryFilter};
pub use ledger::{AssignmentLedger, CsvAssignmentLedger, LedgerError};
pub use parser::{read_candidates, read_prior_domains, CandidateFileError};
pub use scoring::{score_candidate, FitScore};
pub use sheet::{CsvSheetDirectory, GoogleSheetsClient, SheetError, SheetGateway};

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::LeadListConfig;

/// Run parameters the generator needs from the loaded configuration.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub week: AssignmentWeek,
    pub owners: [String; 2],
    pub target_titles: Vec<String>,
    pub request_delay: Duration,
}

impl From<&LeadListConfig> for GenerationSettings {
    fn from(config: &LeadListConfig) -> Self {
        Self {
            week: config.week.clone(),
            owners: config.owners.clone(),
            target_titles: config.target_titles.clone(),
            request_delay: config.apollo.request_delay,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub week: AssignmentWeek,
    pub candidates: usize,
    pub permanently_excluded: usize,
    pub recently_excluded: usize,
    pub contacts_resolved: usize,
    pub per_owner: Vec<(String, usize)>,
    pub records_appended: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The ledger already holds this week; nothing was written.
    AlreadyGenerated { week: AssignmentWeek },
    Generated(RunSummary),
}

#[derive(Debug, thiserror::Error)]
pub enum LeadListError {
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Composes the contact directory, output sink and assignment ledger for one
/// weekly batch.
pub struct LeadListGenerator<D: ?Sized, S: ?Sized, L: ?Sized> {
    directory: Arc<D>,
    sink: Arc<S>,
    ledger: Arc<L>,
    settings: GenerationSettings,
}

impl<D, S, L> LeadListGenerator<D, S, L>
where
    D: ContactDirectory + ?Sized,
    S: SheetGateway + ?Sized,
    L: AssignmentLedger + ?Sized,
{
    pub fn new(
        directory: Arc<D>,
        sink: Arc<S>,
        ledger: Arc<L>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            directory,
            sink,
            ledger,
            settings,
        }
    }

    /// True when the ledger already records a batch for the configured week.
    /// An unreadable ledger counts as empty.
    pub fn already_generated(&self) -> bool {
        self.ledger
            .load()
            .map(|history| ledger::contains_week(&history, &self.settings.week))
            .unwrap_or(false)
    }

    /// Generates and publishes the batch for the configured week. Output is
    /// written before the ledger so a failed ledger append can be retried
    /// without losing the published lists.
    pub fn run(
        &self,
        candidates: Vec<Candidate>,
        prior_domains: HashSet<String>,
        today: NaiveDate,
    ) -> Result<RunOutcome, LeadListError> {
        let week = &self.settings.week;
        let history = match self.ledger.load() {
            Ok(history) => history,
            Err(err) => {
                warn!(error = %err, "assignment ledger unreadable, treating history as empty");
                Vec::new()
            }
        };

        if ledger::contains_week(&history, week) {
            info!(week = %week, "weekly lists already generated");
            return Ok(RunOutcome::AlreadyGenerated { week: week.clone() });
        }

        let total = candidates.len();
        let filter = HistoryFilter::new(prior_domains, &history, today);
        let mut permanently_excluded = 0;
        let mut recently_excluded = 0;
        let eligible: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| match filter.exclusion(&candidate.domain) {
                Some(Exclusion::Permanent) => {
                    permanently_excluded += 1;
                    false
                }
                Some(Exclusion::Recent) => {
                    recently_excluded += 1;
                    false
                }
                None => true,
            })
            .collect();

        info!(
            week = %week,
            candidates = total,
            eligible = eligible.len(),
            permanently_excluded,
            recently_excluded,
            "filtered candidates against history"
        );

        let scored = self.enrich(eligible);
        let contacts_resolved = scored.iter().filter(|entry| entry.contact.is_some()).count();
        let allocation = allocate(scored, &self.settings.owners, week);

        for bucket in &allocation.buckets {
            let rows = sheet::render_block(week, &bucket.owner, &bucket.candidates, today);
            self.sink.append_rows(&bucket.owner, &rows)?;
            info!(owner = %bucket.owner, rows = bucket.candidates.len(), "published weekly block");
        }

        let records = allocation.records();
        self.ledger.append(&records)?;

        let summary = RunSummary {
            week: week.clone(),
            candidates: total,
            permanently_excluded,
            recently_excluded,
            contacts_resolved,
            per_owner: allocation
                .buckets
                .iter()
                .map(|bucket| (bucket.owner.clone(), bucket.candidates.len()))
                .collect(),
            records_appended: records.len(),
        };
        info!(
            week = %summary.week,
            allocated = allocation.total(),
            contacts_resolved,
            "lead list generation complete"
        );
        Ok(RunOutcome::Generated(summary))
    }

    fn enrich(&self, eligible: Vec<Candidate>) -> Vec<EnrichedCandidate> {
        let resolver = ContactResolver::new(&*self.directory, &self.settings.target_titles);
        let mut scored = Vec::with_capacity(eligible.len());
        // Repeated (domain, company) rows share one directory lookup per run.
        let mut resolved: HashMap<(String, String), Option<Contact>> = HashMap::new();

        for candidate in eligible {
            let key = (candidate.domain.clone(), candidate.company_name.clone());
            let contact = match resolved.get(&key) {
                Some(cached) => cached.clone(),
                None => {
                    if !resolved.is_empty() && !self.settings.request_delay.is_zero() {
                        std::thread::sleep(self.settings.request_delay);
                    }
                    let contact = resolver.resolve(&candidate.domain, &candidate.company_name);
                    resolved.insert(key, contact.clone());
                    contact
                }
            };

            let fit_score = score_candidate(&candidate, contact.as_ref());
            debug!(
                company = %candidate.company_name,
                domain = %candidate.domain,
                score = fit_score.value,
                components = ?fit_score.components,
                "scored candidate"
            );

            scored.push(EnrichedCandidate {
                candidate,
                contact,
                fit_score,
                growth_signal_score: None,
            });
        }

        scored
    }
}

impl<D, S, L> std::fmt::Debug for LeadListGenerator<D, S, L>
where
    D: ContactDirectory + ?Sized,
    S: SheetGateway + ?Sized,
    L: AssignmentLedger + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadListGenerator")
            .field("directory", &self.directory)
            .field("sink", &self.sink)
            .field("ledger", &self.ledger)
            .field("settings", &self.settings)
            .finish()
    }
}
