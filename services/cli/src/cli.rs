use crate::leads::{run_generate, GenerateArgs};
use crate::map::{run_export, ExportArgs};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use outreach::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "outreach",
    about = "Weekly lead lists and the client map for the outbound sales team",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Weekly lead list generation
    Leads {
        #[command(subcommand)]
        command: LeadsCommand,
    },
    /// Board-to-map export
    Map {
        #[command(subcommand)]
        command: MapCommand,
    },
}

#[derive(Subcommand, Debug)]
enum LeadsCommand {
    /// Build this week's lists, publish one block per owner and record the assignments
    Generate(GenerateArgs),
}

#[derive(Subcommand, Debug)]
enum MapCommand {
    /// Fetch board cards, geocode them and write the map data file
    Export(ExportArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Leads {
            command: LeadsCommand::Generate(args),
        } => run_generate(args),
        Command::Map {
            command: MapCommand::Export(args),
        } => run_export(args),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "outreach",
            "leads",
            "generate",
            "--week",
            "2025-06-06",
            "--csv-out",
            "out",
            "--prior-list",
            "a.csv",
            "--prior-list",
            "b.csv",
            "--today",
            "2025-06-06",
        ])
        .expect("arguments parse");

        match cli.command {
            Command::Leads {
                command: LeadsCommand::Generate(args),
            } => {
                assert_eq!(args.week.as_deref(), Some("2025-06-06"));
                assert_eq!(args.prior_lists.len(), 2);
                assert!(args.csv_out.is_some());
                assert_eq!(args.today, NaiveDate::from_ymd_opt(2025, 6, 6));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bad_dates_are_rejected() {
        assert!(parse_date("06/06/2025").is_err());
        assert!(Cli::try_parse_from(["outreach", "leads", "generate", "--today", "soon"]).is_err());
    }
}
