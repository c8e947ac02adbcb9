//! Board-to-map export: turns kanban cards into geocoded client records for
//! the static map page.

pub mod address;
pub mod board;
pub mod cover;
pub mod geocode;

pub use board::{BoardError, BoardGateway, Card, TrelloClient};
pub use geocode::{Coordinates, GeocodeError, Geocoder, GeocoderChain};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::workflows::normalizer::canonical_domain;

const SUMMARY_EXAMPLES: usize = 6;

/// One map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientRecord {
    pub company_name: String,
    #[serde(rename = "CardURL")]
    pub card_url: String,
    pub website: String,
    pub domain: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub assigned_rep: String,
    pub notes: String,
    pub logo_file: String,
    pub last_updated: String,
}

impl ClientRecord {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MapExportError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Geocoder(#[from] GeocodeError),
    #[error("map records could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("map output {path} could not be written: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Counts logged after an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub total: usize,
    pub missing_coordinates: usize,
    pub missing_logos: usize,
}

impl ExportSummary {
    pub fn from_records(records: &[ClientRecord]) -> Self {
        Self {
            total: records.len(),
            missing_coordinates: records.iter().filter(|r| !r.has_coordinates()).count(),
            missing_logos: records.iter().filter(|r| r.logo_file.is_empty()).count(),
        }
    }

    pub fn log(&self, records: &[ClientRecord]) {
        info!(
            total = self.total,
            missing_coordinates = self.missing_coordinates,
            missing_logos = self.missing_logos,
            "map export summary"
        );
        for record in records
            .iter()
            .filter(|r| !r.has_coordinates())
            .take(SUMMARY_EXAMPLES)
        {
            warn!(
                company = %record.company_name,
                address = %record.address,
                card = %record.card_url,
                "missing coordinates"
            );
        }
        for record in records
            .iter()
            .filter(|r| r.logo_file.is_empty())
            .take(SUMMARY_EXAMPLES)
        {
            warn!(company = %record.company_name, card = %record.card_url, "missing logo");
        }
    }
}

/// Per-card lookup memo so each distinct query hits the geocoder at most once.
struct CardLookup<'a, G: Geocoder + ?Sized> {
    geocoder: &'a G,
    attempted: HashMap<String, Option<Coordinates>>,
}

impl<'a, G: Geocoder + ?Sized> CardLookup<'a, G> {
    fn new(geocoder: &'a G) -> Self {
        Self {
            geocoder,
            attempted: HashMap::new(),
        }
    }

    fn query(&mut self, query: &str) -> Option<Coordinates> {
        if let Some(known) = self.attempted.get(query) {
            return *known;
        }
        let found = match self.geocoder.geocode(query) {
            Ok(found) => found,
            Err(err) => {
                warn!(query, error = %err, "geocoding failed");
                None
            }
        };
        self.attempted.insert(query.to_string(), found);
        found
    }

    /// Address, its last line when it looks like `City, Region`, the company
    /// plus address, then the domain.
    fn variants(&mut self, name: &str, address: &str, domain: &str) -> Option<Coordinates> {
        let mut queries = Vec::new();
        if !address.is_empty() {
            queries.push(address.to_string());
            if address.contains(',') {
                if let Some(last) = address.lines().last() {
                    queries.push(last.trim().to_string());
                }
            }
            if !name.is_empty() {
                queries.push(format!("{name}, {address}"));
            }
        }
        if !domain.is_empty() {
            queries.push(domain.to_string());
        }

        queries
            .iter()
            .filter(|query| !query.is_empty())
            .find_map(|query| self.query(query))
    }
}

/// Fetches every card and builds its map record.
pub struct MapExporter<B: ?Sized, G: ?Sized> {
    board: Arc<B>,
    geocoder: Arc<G>,
}

impl<B, G> MapExporter<B, G>
where
    B: BoardGateway + ?Sized,
    G: Geocoder + ?Sized,
{
    pub fn new(board: Arc<B>, geocoder: Arc<G>) -> Self {
        Self { board, geocoder }
    }

    pub fn export(&self, now: DateTime<Utc>) -> Result<Vec<ClientRecord>, MapExportError> {
        let cards = self.board.fetch_cards()?;
        let total = cards.len();
        info!(cards = total, "fetched board cards");

        let records = cards
            .iter()
            .enumerate()
            .map(|(index, card)| {
                debug!(position = index + 1, total, card = card.title(), "processing card");
                self.build_record(card, now)
            })
            .collect();
        Ok(records)
    }

    pub fn build_record(&self, card: &Card, now: DateTime<Utc>) -> ClientRecord {
        let name = card.title();
        let description = card.description();
        let website = address::extract_website(description);
        let domain = canonical_domain(Some(website.as_str()));
        let mut address = address::extract_address(description);

        let mut lookup = CardLookup::new(&*self.geocoder);
        let mut coordinates = None;
        if !address.is_empty() {
            coordinates = lookup.variants(name, &address, &domain);
        }

        if coordinates.is_none() {
            if let Some(last) = address::last_line(description) {
                let fallback = if name.is_empty() {
                    last.to_string()
                } else {
                    format!("{name}, {last}")
                };
                coordinates = lookup.variants(name, &fallback, &domain);
                if coordinates.is_some() && address.is_empty() {
                    address = last.to_string();
                }
            }
        }

        if coordinates.is_none() && !domain.is_empty() {
            coordinates = lookup.variants(name, "", &domain);
        }

        ClientRecord {
            company_name: name.to_string(),
            card_url: card.short_url.clone().unwrap_or_default(),
            logo_file: cover::logo_for(card, &domain),
            website,
            domain,
            address,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            assigned_rep: card.members().join(","),
            notes: description.to_string(),
            last_updated: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl<B, G> std::fmt::Debug for MapExporter<B, G>
where
    B: BoardGateway + ?Sized,
    G: Geocoder + ?Sized,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapExporter")
            .field("board", &self.board)
            .field("geocoder", &self.geocoder)
            .finish()
    }
}

/// Writes the records as a pretty-printed JSON array, creating parent
/// directories as needed.
pub fn write_records(path: &Path, records: &[ClientRecord]) -> Result<(), MapExportError> {
    let write_error = |source| MapExportError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    let body = serde_json::to_string_pretty(records)?;
    std::fs::write(path, body).map_err(write_error)?;

    info!(path = %path.display(), rows = records.len(), "wrote map records");
    Ok(())
}
