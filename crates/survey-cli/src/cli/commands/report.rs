use crate::cli::args::ReportArgs;
use serde_json::json;
use survey_core::analysis::summarize_demographics;
use survey_core::chart::{demographics_charts, preference_charts};
use survey_core::config::SurveyConfig;
use survey_core::report::console::{format_demographics, format_preferences};
use survey_core::storage::readers::read_demographics;

use super::{exit_codes, generated_at, preferences, print_json, wants_json, write_charts};

pub fn run(args: ReportArgs, cfg: &SurveyConfig) -> anyhow::Result<i32> {
    let json_out = wants_json(&args.output.format)?;
    let responses = args.responses.unwrap_or_else(|| cfg.responses_file.clone());
    let index = args.index.unwrap_or_else(|| cfg.index_file.clone());
    let demographics = args
        .demographics
        .unwrap_or_else(|| cfg.demographics_file.clone());

    let prefs = preferences::analyse(&responses, &index)?;
    let summary = summarize_demographics(&read_demographics(&demographics)?);

    let mut files = preference_charts(&prefs.report);
    files.extend(demographics_charts(&summary));
    let charts = write_charts(&args.output, &files)?;

    if json_out {
        print_json(&json!({
            "schema_version": 1,
            "generated_at": generated_at(),
            "preferences": prefs.report,
            "skipped_rows": prefs.skipped_rows,
            "demographics": summary,
            "charts": charts,
        }))?;
    } else {
        print!("{}", format_preferences(&prefs.report));
        println!();
        print!("{}", format_demographics(&summary));
        for c in &charts {
            println!("wrote {}", c.display());
        }
    }
    Ok(exit_codes::OK)
}
