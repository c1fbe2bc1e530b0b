use std::path::Path;

use chrono::{NaiveDate, Utc};
use clap::Args;
use habitroom_core::storage::ledger::date_key;
use habitroom_core::summary::build_summary;
use habitroom_core::{ScoreLedger, Settings};

use super::CliResult;

#[derive(Args)]
pub struct ScoreArgs {
    /// Day to report (YYYY-MM-DD, default: today in the configured offset)
    #[arg(long)]
    date: Option<String>,

    /// Output the raw day record as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(dir: &Path, args: ScoreArgs) -> CliResult {
    let settings = Settings::load(dir)?;
    let key = match args.date {
        Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| format!("invalid --date '{date}': {e}"))?
            .format("%Y-%m-%d")
            .to_string(),
        None => date_key(&Utc::now().with_timezone(&settings.offset()?)),
    };

    let day = ScoreLedger::in_dir(dir).query(&key);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&day)?);
    } else {
        println!("{}", build_summary(&key, &day, true));
    }
    Ok(())
}
