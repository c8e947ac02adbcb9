use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::leads::contacts::DirectoryError;
use crate::workflows::leads::parser::CandidateFileError;
use crate::workflows::leads::sheet::SheetError;
use crate::workflows::leads::LeadListError;
use crate::workflows::map::{BoardError, GeocodeError, MapExportError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Candidates(CandidateFileError),
    Directory(DirectoryError),
    Sheet(SheetError),
    LeadList(LeadListError),
    MapExport(MapExportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Candidates(err) => write!(f, "input error: {}", err),
            AppError::Directory(err) => write!(f, "contact directory error: {}", err),
            AppError::Sheet(err) => write!(f, "output sink error: {}", err),
            AppError::LeadList(err) => write!(f, "lead list error: {}", err),
            AppError::MapExport(err) => write!(f, "map export error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Candidates(err) => Some(err),
            AppError::Directory(err) => Some(err),
            AppError::Sheet(err) => Some(err),
            AppError::LeadList(err) => Some(err),
            AppError::MapExport(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<CandidateFileError> for AppError {
    fn from(value: CandidateFileError) -> Self {
        Self::Candidates(value)
    }
}

impl From<DirectoryError> for AppError {
    fn from(value: DirectoryError) -> Self {
        Self::Directory(value)
    }
}

impl From<SheetError> for AppError {
    fn from(value: SheetError) -> Self {
        Self::Sheet(value)
    }
}

impl From<LeadListError> for AppError {
    fn from(value: LeadListError) -> Self {
        Self::LeadList(value)
    }
}

impl From<MapExportError> for AppError {
    fn from(value: MapExportError) -> Self {
        Self::MapExport(value)
    }
}

impl From<BoardError> for AppError {
    fn from(value: BoardError) -> Self {
        Self::MapExport(MapExportError::Board(value))
    }
}

impl From<GeocodeError> for AppError {
    fn from(value: GeocodeError) -> Self {
        Self::MapExport(MapExportError::Geocoder(value))
    }
}
