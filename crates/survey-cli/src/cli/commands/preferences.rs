use crate::cli::args::PreferencesArgs;
use serde_json::json;
use survey_core::analysis::{aggregate_preferences, PreferenceReport};
use survey_core::chart::preference_charts;
use survey_core::config::SurveyConfig;
use survey_core::index::{load_index, ImageCatalog};
use survey_core::report::console::format_preferences;
use survey_core::storage::readers::read_responses;

use super::{exit_codes, generated_at, print_json, wants_json, write_charts};
use std::path::Path;

pub struct PreferenceOutcome {
    pub report: PreferenceReport,
    pub skipped_rows: usize,
}

pub fn analyse(responses: &Path, index: &Path) -> anyhow::Result<PreferenceOutcome> {
    let entries = load_index(index)?;
    let catalog = ImageCatalog::from_entries(&entries);
    let log = read_responses(responses)?;
    let report = aggregate_preferences(&catalog, &log.records);

    if report.tally.unclassified > 0 {
        tracing::warn!(
            event = "responses_unclassified",
            count = report.tally.unclassified,
            index = %index.display()
        );
    }
    Ok(PreferenceOutcome {
        report,
        skipped_rows: log.skipped,
    })
}

pub fn run(args: PreferencesArgs, cfg: &SurveyConfig) -> anyhow::Result<i32> {
    let json_out = wants_json(&args.output.format)?;
    let responses = args.responses.unwrap_or_else(|| cfg.responses_file.clone());
    let index = args.index.unwrap_or_else(|| cfg.index_file.clone());

    let outcome = analyse(&responses, &index)?;
    let charts = write_charts(&args.output, &preference_charts(&outcome.report))?;

    if json_out {
        print_json(&json!({
            "schema_version": 1,
            "generated_at": generated_at(),
            "preferences": outcome.report,
            "skipped_rows": outcome.skipped_rows,
            "charts": charts,
        }))?;
    } else {
        print!("{}", format_preferences(&outcome.report));
        if outcome.skipped_rows > 0 {
            println!("\nSkipped rows (unrecognised choice): {}", outcome.skipped_rows);
        }
        for c in &charts {
            println!("wrote {}", c.display());
        }
    }
    Ok(exit_codes::OK)
}
