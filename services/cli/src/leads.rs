use chrono::{NaiveDate, Utc};
use clap::Args;
use outreach::config::{AppConfig, LeadListConfig};
use outreach::error::AppError;
use outreach::telemetry;
use outreach::workflows::leads::{
    read_candidates, read_prior_domains, ApolloPeopleClient, AssignmentWeek, CsvAssignmentLedger,
    CsvSheetDirectory, GenerationSettings, GoogleSheetsClient, LeadListGenerator, RunOutcome,
    SheetGateway,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct GenerateArgs {
    /// Week identifier stamped on the batch (defaults to WEEK_ASSIGNED, then today)
    #[arg(long)]
    pub(crate) week: Option<String>,
    /// Candidate CSV (defaults to CANDIDATES_CSV or candidates.csv)
    #[arg(long)]
    pub(crate) candidates: Option<PathBuf>,
    /// Assignment ledger CSV (defaults to ASSIGNMENT_HISTORY or assignment_history.csv)
    #[arg(long)]
    pub(crate) history: Option<PathBuf>,
    /// Legacy outbound list whose domains are never assigned; repeatable
    #[arg(long = "prior-list")]
    pub(crate) prior_lists: Vec<PathBuf>,
    /// Write blocks to <DIR>/<owner>.csv instead of Google Sheets
    #[arg(long)]
    pub(crate) csv_out: Option<PathBuf>,
    /// Run date for the rolling history window (defaults to today, UTC)
    #[arg(long, value_parser = crate::cli::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_generate(args: GenerateArgs) -> Result<(), AppError> {
    let app = AppConfig::load()?;
    telemetry::init(&app.telemetry)?;

    let mut config = LeadListConfig::load()?;
    if let Some(week) = args.week {
        config.week = AssignmentWeek::new(week);
    }
    if let Some(path) = args.candidates {
        config.candidates_path = path;
    }
    if let Some(path) = args.history {
        config.history_path = path;
    }
    if !args.prior_lists.is_empty() {
        config.prior_list_paths = args.prior_lists;
    }

    // Output credentials are checked before anything is read or written.
    let sink: Arc<dyn SheetGateway> = match args.csv_out {
        Some(dir) => Arc::new(CsvSheetDirectory::new(dir)),
        None => Arc::new(GoogleSheetsClient::from_service_account(
            &config.sheet_credentials()?,
        )?),
    };
    let directory = Arc::new(ApolloPeopleClient::new(config.apollo.clone())?);
    let ledger = Arc::new(CsvAssignmentLedger::new(&config.history_path));
    let generator =
        LeadListGenerator::new(directory, sink, ledger, GenerationSettings::from(&config));

    if generator.already_generated() {
        println!(
            "Weekly lists for {} already created; nothing to do.",
            config.week
        );
        return Ok(());
    }

    let candidates = read_candidates(&config.candidates_path)?;
    let prior_domains = read_prior_domains(&config.prior_list_paths);
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    info!(
        week = %config.week,
        candidates = candidates.len(),
        "starting lead list generation"
    );

    match generator.run(candidates, prior_domains, today)? {
        RunOutcome::AlreadyGenerated { week } => {
            println!("Weekly lists for {week} already created; nothing to do.");
        }
        RunOutcome::Generated(summary) => {
            println!("Lead lists for week {}", summary.week);
            println!(
                "  candidates: {} (legacy excluded: {}, recently assigned: {})",
                summary.candidates, summary.permanently_excluded, summary.recently_excluded
            );
            println!("  decision makers found: {}", summary.contacts_resolved);
            for (owner, count) in &summary.per_owner {
                println!("  {owner}: {count} companies");
            }
            println!(
                "  ledger rows appended: {} ({})",
                summary.records_appended,
                config.history_path.display()
            );
        }
    }

    Ok(())
}
