use std::path::PathBuf;
use survey_core::config::write_sample_config;

use super::exit_codes;

pub fn run(path: PathBuf) -> anyhow::Result<i32> {
    if path.exists() {
        println!("{} already exists, leaving it unchanged", path.display());
        return Ok(exit_codes::OK);
    }
    write_sample_config(&path)?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}
