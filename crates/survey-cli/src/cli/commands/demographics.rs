use crate::cli::args::DemographicsArgs;
use serde_json::json;
use survey_core::analysis::summarize_demographics;
use survey_core::chart::demographics_charts;
use survey_core::config::SurveyConfig;
use survey_core::report::console::format_demographics;
use survey_core::storage::readers::read_demographics;

use super::{exit_codes, generated_at, print_json, wants_json, write_charts};

pub fn run(args: DemographicsArgs, cfg: &SurveyConfig) -> anyhow::Result<i32> {
    let json_out = wants_json(&args.output.format)?;
    let path = args
        .demographics
        .unwrap_or_else(|| cfg.demographics_file.clone());

    let records = read_demographics(&path)?;
    let summary = summarize_demographics(&records);
    let charts = write_charts(&args.output, &demographics_charts(&summary))?;

    if json_out {
        print_json(&json!({
            "schema_version": 1,
            "generated_at": generated_at(),
            "demographics": summary,
            "charts": charts,
        }))?;
    } else {
        print!("{}", format_demographics(&summary));
        for c in &charts {
            println!("wrote {}", c.display());
        }
    }
    Ok(exit_codes::OK)
}
