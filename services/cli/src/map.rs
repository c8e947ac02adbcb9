use chrono::Utc;
use clap::Args;
use outreach::config::{AppConfig, MapExportConfig};
use outreach::error::AppError;
use outreach::telemetry;
use outreach::workflows::map::{
    write_records, ExportSummary, GeocoderChain, MapExporter, TrelloClient,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Destination JSON file (defaults to MAP_OUTPUT_PATH or data/clients.json)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let app = AppConfig::load()?;
    telemetry::init(&app.telemetry)?;

    let mut config = MapExportConfig::load()?;
    if let Some(output) = args.output {
        config.output_path = output;
    }

    let board = Arc::new(TrelloClient::new(config.trello.clone())?);
    let geocoder = Arc::new(GeocoderChain::from_config(&config.geocoding)?);
    let exporter = MapExporter::new(board, geocoder);

    let records = exporter.export(Utc::now())?;
    write_records(&config.output_path, &records)?;

    let summary = ExportSummary::from_records(&records);
    summary.log(&records);
    println!(
        "Wrote {} with {} rows ({} missing coordinates, {} missing logos).",
        config.output_path.display(),
        summary.total,
        summary.missing_coordinates,
        summary.missing_logos
    );
    Ok(())
}
