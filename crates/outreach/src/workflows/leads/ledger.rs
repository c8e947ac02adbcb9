use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::domain::{AssignmentRecord, AssignmentWeek};

const LEDGER_COLUMNS: [&str; 5] = [
    "Domain",
    "CompanyName",
    "AssignedRep",
    "WeekAssigned",
    "LastDisposition",
];

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("assignment ledger io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("assignment ledger is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only history of which company went to which owner and when.
pub trait AssignmentLedger: Debug {
    fn load(&self) -> Result<Vec<AssignmentRecord>, LedgerError>;
    fn append(&self, records: &[AssignmentRecord]) -> Result<(), LedgerError>;
}

/// True when a batch was already generated for `week`.
pub fn contains_week(records: &[AssignmentRecord], week: &AssignmentWeek) -> bool {
    records
        .iter()
        .any(|record| record.week.as_str() == week.as_str())
}

/// Ledger kept as a CSV file. Appends are incremental: existing rows are
/// never rewritten and new rows follow the file's own header order.
#[derive(Debug, Clone)]
pub struct CsvAssignmentLedger {
    path: PathBuf,
}

impl CsvAssignmentLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn existing_header(&self) -> Result<Option<csv::StringRecord>, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if file.metadata()?.len() == 0 {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);
        Ok(Some(reader.headers()?.clone()))
    }

    fn ends_with_newline(&self) -> Result<bool, LedgerError> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::Start(len - 1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }
}

impl AssignmentLedger for CsvAssignmentLedger {
    fn load(&self) -> Result<Vec<AssignmentRecord>, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);
        reader.headers()?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<AssignmentRecord>() {
            match row {
                Ok(record) => records.push(record),
                Err(err) => {
                    skipped += 1;
                    warn!(path = %self.path.display(), error = %err, "skipping unreadable ledger row");
                }
            }
        }

        debug!(
            path = %self.path.display(),
            records = records.len(),
            skipped,
            "loaded assignment ledger"
        );
        Ok(records)
    }

    fn append(&self, records: &[AssignmentRecord]) -> Result<(), LedgerError> {
        if records.is_empty() {
            return Ok(());
        }

        let header = self.existing_header()?;
        let needs_newline = header.is_some() && !self.ends_with_newline()?;
        let columns: Vec<String> = match &header {
            Some(existing) => existing.iter().map(str::to_string).collect(),
            None => LEDGER_COLUMNS.iter().map(|name| name.to_string()).collect(),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }

        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(&mut file);
            if header.is_none() {
                writer.write_record(&columns)?;
            }
            for record in records {
                writer.write_record(columns.iter().map(|column| field_for(record, column)))?;
            }
            writer.flush()?;
        }

        file.sync_all()?;
        debug!(path = %self.path.display(), appended = records.len(), "appended assignment records");
        Ok(())
    }
}

fn field_for<'a>(record: &'a AssignmentRecord, column: &str) -> &'a str {
    match column {
        "Domain" => &record.domain,
        "CompanyName" => &record.company_name,
        "AssignedRep" => &record.owner,
        "WeekAssigned" => record.week.as_str(),
        "LastDisposition" => &record.last_outcome,
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(domain: &str, owner: &str, week: &str) -> AssignmentRecord {
        AssignmentRecord {
            domain: domain.to_string(),
            company_name: format!("{domain} inc"),
            owner: owner.to_string(),
            week: AssignmentWeek::new(week),
            last_outcome: String::new(),
        }
    }

    #[test]
    fn missing_file_loads_as_empty_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = CsvAssignmentLedger::new(dir.path().join("history.csv"));
        assert!(ledger.load().expect("load").is_empty());
    }

    #[test]
    fn append_creates_file_with_header_then_appends_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ledger = CsvAssignmentLedger::new(dir.path().join("nested/history.csv"));

        ledger
            .append(&[record("a.com", "Evan", "2025-06-06")])
            .expect("first append");
        ledger
            .append(&[record("b.com", "Dave", "2025-06-13")])
            .expect("second append");

        let contents = std::fs::read_to_string(ledger.path()).expect("read ledger");
        assert_eq!(
            contents,
            "Domain,CompanyName,AssignedRep,WeekAssigned,LastDisposition\n\
a.com,a.com inc,Evan,2025-06-06,\n\
b.com,b.com inc,Dave,2025-06-13,\n"
        );

        let loaded = ledger.load().expect("load");
        assert_eq!(loaded.len(), 2);
        assert!(contains_week(&loaded, &AssignmentWeek::new("2025-06-13")));
        assert!(!contains_week(&loaded, &AssignmentWeek::new("2025-06-20")));
    }

    #[test]
    fn append_follows_existing_header_and_repairs_missing_newline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        std::fs::write(
            &path,
            "CompanyName,Domain,WeekAssigned,AssignedRep,LastDisposition,domain\n\
Old Co,old.com,2024-01-05,Evan,Won,old.com",
        )
        .expect("seed ledger");

        let ledger = CsvAssignmentLedger::new(&path);
        ledger
            .append(&[record("new.com", "Dave", "2025-06-06")])
            .expect("append");

        let contents = std::fs::read_to_string(&path).expect("read ledger");
        assert!(contents.ends_with("Old Co,old.com,2024-01-05,Evan,Won,old.com\nnew.com inc,new.com,2025-06-06,Dave,,\n"));

        let loaded = ledger.load().expect("load");
        assert_eq!(loaded[0].last_outcome, "Won");
        assert_eq!(loaded[1].owner, "Dave");
    }

    #[test]
    fn ragged_rows_are_skipped_without_losing_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        std::fs::write(
            &path,
            "Domain,CompanyName,AssignedRep,WeekAssigned,LastDisposition\n\
recent.com,Recent,Dave,2025-05-30,\n\
broken.com,Broken\n\
later.com,Later,Evan,2025-06-06,Won\n",
        )
        .expect("seed ledger");

        let loaded = CsvAssignmentLedger::new(&path).load().expect("load");

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].domain, "recent.com");
        assert_eq!(loaded[1].last_outcome, "Won");
        assert!(contains_week(&loaded, &AssignmentWeek::new("2025-05-30")));
    }

    #[test]
    fn header_without_week_column_yields_no_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.csv");
        std::fs::write(&path, "Domain,CompanyName\na.com,A\n").expect("seed ledger");

        assert!(CsvAssignmentLedger::new(&path)
            .load()
            .expect("load")
            .is_empty());
    }
}
