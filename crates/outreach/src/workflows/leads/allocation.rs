use std::collections::HashSet;

use super::domain::{AssignmentRecord, AssignmentWeek, EnrichedCandidate};

/// Largest number of ranked candidates considered for one batch.
pub const BATCH_LIMIT: usize = 100;
/// Largest number of candidates handed to one owner per batch.
pub const BUCKET_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub owner: String,
    pub candidates: Vec<EnrichedCandidate>,
}

/// Weekly split of ranked candidates between the two owners.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub week: AssignmentWeek,
    pub buckets: [Bucket; 2],
}

impl Allocation {
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.candidates.len()).sum()
    }

    /// One ledger row per allocated candidate, stamped with the batch week.
    pub fn records(&self) -> Vec<AssignmentRecord> {
        self.buckets
            .iter()
            .flat_map(|bucket| {
                bucket.candidates.iter().map(|entry| AssignmentRecord {
                    domain: entry.candidate.domain.clone(),
                    company_name: entry.candidate.company_name.clone(),
                    owner: bucket.owner.clone(),
                    week: self.week.clone(),
                    last_outcome: String::new(),
                })
            })
            .collect()
    }
}

/// Ranks by fit score (stable, highest first), keeps the first entry per
/// `(domain, company)` pair, truncates to [`BATCH_LIMIT`] and deals the
/// survivors alternately to the two owners. Rows with a blank domain are
/// never deduplicated.
pub fn allocate(
    mut scored: Vec<EnrichedCandidate>,
    owners: &[String; 2],
    week: &AssignmentWeek,
) -> Allocation {
    scored.sort_by(|left, right| right.score().cmp(&left.score()));

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let ranked: Vec<EnrichedCandidate> = scored
        .into_iter()
        .filter(|entry| {
            if entry.candidate.domain.is_empty() {
                return true;
            }
            seen.insert((
                entry.candidate.domain.clone(),
                entry.candidate.company_name.clone(),
            ))
        })
        .take(BATCH_LIMIT)
        .collect();

    let mut first = Bucket {
        owner: owners[0].clone(),
        candidates: Vec::new(),
    };
    let mut second = Bucket {
        owner: owners[1].clone(),
        candidates: Vec::new(),
    };

    for (index, entry) in ranked.into_iter().enumerate() {
        let bucket = if index % 2 == 0 { &mut first } else { &mut second };
        if bucket.candidates.len() < BUCKET_LIMIT {
            bucket.candidates.push(entry);
        }
    }

    Allocation {
        week: week.clone(),
        buckets: [first, second],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::domain::Candidate;
    use crate::workflows::leads::scoring::FitScore;

    fn owners() -> [String; 2] {
        ["Evan".to_string(), "Dave".to_string()]
    }

    fn week() -> AssignmentWeek {
        AssignmentWeek::new("2025-06-06")
    }

    fn entry(company: &str, domain: &str, score: u8) -> EnrichedCandidate {
        EnrichedCandidate {
            candidate: Candidate {
                company_name: company.to_string(),
                domain: domain.to_string(),
                ..Candidate::default()
            },
            contact: None,
            fit_score: FitScore {
                value: score,
                components: Vec::new(),
            },
            growth_signal_score: None,
        }
    }

    #[test]
    fn buckets_stay_balanced_and_disjoint() {
        for count in [0usize, 1, 2, 7, 99, 100, 140] {
            let scored = (0..count)
                .map(|i| entry(&format!("Co {i}"), &format!("co{i}.com"), (i % 90) as u8))
                .collect();
            let allocation = allocate(scored, &owners(), &week());
            let [a, b] = &allocation.buckets;

            assert!(a.candidates.len().abs_diff(b.candidates.len()) <= 1);
            assert!(a.candidates.len() <= BUCKET_LIMIT && b.candidates.len() <= BUCKET_LIMIT);
            assert_eq!(allocation.total(), count.min(BATCH_LIMIT));

            let a_domains: HashSet<_> = a.candidates.iter().map(|e| &e.candidate.domain).collect();
            assert!(b
                .candidates
                .iter()
                .all(|e| !a_domains.contains(&e.candidate.domain)));
        }
    }

    #[test]
    fn highest_scoring_duplicate_survives() {
        let scored = vec![
            entry("Acme", "acme.com", 40),
            entry("Beta", "beta.com", 60),
            entry("Acme", "acme.com", 85),
        ];
        let allocation = allocate(scored, &owners(), &week());
        let [a, b] = &allocation.buckets;

        assert_eq!(allocation.total(), 2);
        assert_eq!(a.candidates[0].candidate.company_name, "Acme");
        assert_eq!(a.candidates[0].score(), 85);
        assert_eq!(b.candidates[0].candidate.company_name, "Beta");
    }

    #[test]
    fn blank_domains_are_not_collapsed() {
        let scored = vec![entry("Gamma", "", 50), entry("Gamma", "", 50)];
        assert_eq!(allocate(scored, &owners(), &week()).total(), 2);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let scored = vec![
            entry("First", "first.com", 30),
            entry("Second", "second.com", 30),
            entry("Third", "third.com", 30),
        ];
        let allocation = allocate(scored, &owners(), &week());
        let [a, b] = &allocation.buckets;
        assert_eq!(a.candidates[0].candidate.company_name, "First");
        assert_eq!(b.candidates[0].candidate.company_name, "Second");
        assert_eq!(a.candidates[1].candidate.company_name, "Third");
    }

    #[test]
    fn records_carry_owner_and_week() {
        let allocation = allocate(
            vec![entry("Acme", "acme.com", 70), entry("Beta", "beta.com", 20)],
            &owners(),
            &week(),
        );
        let records = allocation.records();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].owner, "Evan");
        assert_eq!(records[0].domain, "acme.com");
        assert_eq!(records[1].owner, "Dave");
        assert!(records.iter().all(|r| r.week == week() && r.last_outcome.is_empty()));
    }
}
