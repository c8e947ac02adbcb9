use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{SheetError, SheetGateway};

/// Offline sink writing each tab to `<dir>/<tab>.csv`. Blocks are appended so
/// repeated runs accumulate the same way a spreadsheet tab does.
#[derive(Debug, Clone)]
pub struct CsvSheetDirectory {
    dir: PathBuf,
}

impl CsvSheetDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn tab_path(&self, tab: &str) -> PathBuf {
        let file_name: String = tab
            .chars()
            .map(|ch| {
                if ch.is_alphanumeric() || matches!(ch, '-' | '_' | ' ') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.csv"))
    }

    fn io_error(path: &Path, source: std::io::Error) -> SheetError {
        SheetError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl SheetGateway for CsvSheetDirectory {
    fn append_rows(&self, tab: &str, rows: &[Vec<String>]) -> Result<(), SheetError> {
        let path = self.tab_path(tab);
        std::fs::create_dir_all(&self.dir).map_err(|err| Self::io_error(&self.dir, err))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| Self::io_error(&path, err))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(file);
        for row in rows {
            writer
                .write_record(row)
                .map_err(|source| SheetError::Csv {
                    path: path.display().to_string(),
                    source,
                })?;
        }
        writer.flush().map_err(|err| Self::io_error(&path, err))?;

        debug!(path = %path.display(), rows = rows.len(), "appended rows to sheet file");
        Ok(())
    }
}
