use crate::cli::args::ValidateArgs;
use serde_json::json;
use survey_core::config::SurveyConfig;
use survey_core::index::{check_index, load_index, ImageCatalog, IndexIssues};

use super::{exit_codes, print_json, wants_json};

pub fn run(args: ValidateArgs, cfg: &SurveyConfig) -> anyhow::Result<i32> {
    let json_out = wants_json(&args.format)?;
    let entries = load_index(&cfg.index_file)?;
    let issues = check_index(&entries, &cfg.image_dir, cfg.num_pairs);
    let catalog = ImageCatalog::from_entries(&entries);

    if json_out {
        print_json(&json!({
            "schema_version": 1,
            "ok": issues.is_clean(),
            "index_file": cfg.index_file,
            "num_pairs": cfg.num_pairs,
            "original_images": catalog.original_count(),
            "refactored_images": catalog.refactored_count(),
            "issues": issues,
        }))?;
    } else {
        print_text(&issues, &catalog, cfg);
    }

    if issues.is_clean() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::DATA_ERROR)
    }
}

fn print_text(issues: &IndexIssues, catalog: &ImageCatalog, cfg: &SurveyConfig) {
    println!(
        "{}: {} pairs, {} original and {} refactored images (sample size {})",
        cfg.index_file.display(),
        issues.entries,
        catalog.original_count(),
        catalog.refactored_count(),
        cfg.num_pairs
    );
    if let Some(found) = issues.too_few_pairs {
        println!("error: only {found} pairs, need {}", cfg.num_pairs);
    }
    for name in &issues.duplicate_images {
        println!("error: image listed more than once: {name}");
    }
    for name in &issues.overlapping_images {
        println!("error: image is both original and refactored: {name}");
    }
    for path in &issues.missing_images {
        println!("error: missing image {}", path.display());
    }
    if issues.is_clean() {
        println!("ok");
    }
}
