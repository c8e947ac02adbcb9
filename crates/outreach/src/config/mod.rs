use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::workflows::leads::contacts::DEFAULT_TARGET_TITLES;
use crate::workflows::leads::domain::AssignmentWeek;

/// Process-wide settings shared by every command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let log_level = optional_var("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// People-search directory settings.
#[derive(Debug, Clone)]
pub struct ApolloConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_delay: Duration,
    pub timeout: Duration,
}

/// Google Sheets destination and the service account allowed to write to it.
#[derive(Clone)]
pub struct SheetCredentials {
    pub spreadsheet_id: String,
    pub service_account_json: String,
}

impl fmt::Debug for SheetCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetCredentials")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish_non_exhaustive()
    }
}

/// Immutable settings for one weekly lead list run.
#[derive(Debug, Clone)]
pub struct LeadListConfig {
    pub apollo: ApolloConfig,
    pub week: AssignmentWeek,
    pub candidates_path: PathBuf,
    pub history_path: PathBuf,
    pub prior_list_paths: Vec<PathBuf>,
    pub owners: [String; 2],
    pub target_titles: Vec<String>,
    spreadsheet_id: Option<String>,
    service_account_json: Option<String>,
}

impl LeadListConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_key = required_var("APOLLO_API_KEY")?;
        let base_url = optional_var("APOLLO_BASE_URL")
            .unwrap_or_else(|| "https://api.apollo.io".to_string());
        let request_delay = Duration::from_millis(parse_u64("APOLLO_REQUEST_DELAY_MS", 200)?);

        let week = optional_var("WEEK_ASSIGNED")
            .map(AssignmentWeek::new)
            .unwrap_or_else(|| AssignmentWeek::for_date(Utc::now().date_naive()));

        let candidates_path = optional_var("CANDIDATES_CSV")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("candidates.csv"));
        let history_path = optional_var("ASSIGNMENT_HISTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("assignment_history.csv"));
        let prior_list_paths = optional_var("PRIOR_LIST_PATHS")
            .map(|raw| split_list(&raw).into_iter().map(PathBuf::from).collect())
            .unwrap_or_default();

        let owners = parse_owners(
            &optional_var("LEAD_OWNERS").unwrap_or_else(|| "Evan,Dave".to_string()),
        )?;

        let service_account_json = optional_var("GCP_SA_JSON")
            .or_else(|| read_service_account_file(Path::new("sa.json")));

        Ok(Self {
            apollo: ApolloConfig {
                api_key,
                base_url,
                request_delay,
                timeout: Duration::from_secs(15),
            },
            week,
            candidates_path,
            history_path,
            prior_list_paths,
            owners,
            target_titles: DEFAULT_TARGET_TITLES
                .iter()
                .map(|title| title.to_string())
                .collect(),
            spreadsheet_id: optional_var("SHEET_ID"),
            service_account_json,
        })
    }

    /// Credentials for the Google Sheets sink; only required when no local
    /// output directory replaces it.
    pub fn sheet_credentials(&self) -> Result<SheetCredentials, ConfigError> {
        let spreadsheet_id = self
            .spreadsheet_id
            .clone()
            .ok_or(ConfigError::MissingVar { name: "SHEET_ID" })?;
        let service_account_json = self
            .service_account_json
            .clone()
            .ok_or(ConfigError::MissingVar {
                name: "GCP_SA_JSON",
            })?;

        Ok(SheetCredentials {
            spreadsheet_id,
            service_account_json,
        })
    }
}

/// Kanban board credentials.
#[derive(Debug, Clone)]
pub struct TrelloConfig {
    pub key: String,
    pub token: String,
    pub board_id: String,
    pub base_url: String,
}

/// Geocoding providers used by the map export.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub contact_email: String,
    pub nominatim_base_url: String,
    pub nominatim_delay: Duration,
    pub mapbox_token: Option<String>,
    pub mapbox_base_url: String,
}

/// Immutable settings for the board-to-map export.
#[derive(Debug, Clone)]
pub struct MapExportConfig {
    pub trello: TrelloConfig,
    pub geocoding: GeocodingConfig,
    pub output_path: PathBuf,
}

impl MapExportConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let trello = TrelloConfig {
            key: required_var("TRELLO_KEY")?,
            token: required_var("TRELLO_TOKEN")?,
            board_id: required_var("BOARD_ID")?,
            base_url: optional_var("TRELLO_BASE_URL")
                .unwrap_or_else(|| "https://api.trello.com".to_string()),
        };

        let geocoding = GeocodingConfig {
            contact_email: optional_var("CONTACT_EMAIL")
                .unwrap_or_else(|| "no-reply@example.com".to_string()),
            nominatim_base_url: optional_var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string()),
            nominatim_delay: Duration::from_millis(parse_u64("NOMINATIM_DELAY_MS", 1100)?),
            mapbox_token: optional_var("MAPBOX_TOKEN"),
            mapbox_base_url: optional_var("MAPBOX_BASE_URL")
                .unwrap_or_else(|| "https://api.mapbox.com".to_string()),
        };

        let output_path = optional_var("MAP_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/clients.json"));

        Ok(Self {
            trello,
            geocoding,
            output_path,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    optional_var(name).ok_or(ConfigError::MissingVar { name })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_owners(raw: &str) -> Result<[String; 2], ConfigError> {
    match split_list(raw).as_slice() {
        [first, second] if !first.eq_ignore_ascii_case(second) => {
            Ok([first.clone(), second.clone()])
        }
        _ => Err(ConfigError::InvalidOwners {
            value: raw.to_string(),
        }),
    }
}

fn read_service_account_file(path: &Path) -> Option<String> {
    if !path.exists() {
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim().to_string();
            if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
                warn!(path = %path.display(), "service account file does not look like JSON");
            }
            Some(trimmed).filter(|value| !value.is_empty())
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read service account file");
            None
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar { name: &'static str },
    InvalidNumber { name: &'static str, value: String },
    InvalidOwners { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar { name } => {
                write!(f, "missing required environment variable {name}")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got '{value}'")
            }
            ConfigError::InvalidOwners { value } => write!(
                f,
                "LEAD_OWNERS must name exactly two distinct owners, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
