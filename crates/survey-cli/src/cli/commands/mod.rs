pub mod demographics;
pub mod init;
pub mod preferences;
pub mod report;
pub mod validate;

use crate::cli::args::{Cli, Command, OutputArgs};
use survey_core::config::load_or_default;
use survey_core::SurveyError;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const DATA_ERROR: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Version => {
            println!("survey {}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
        Command::Init(args) => init::run(cli.config.unwrap_or(args.path)),
        Command::Preferences(args) => {
            let cfg = load_or_default(cli.config.as_deref(), cli.strict)?;
            preferences::run(args, &cfg)
        }
        Command::Demographics(args) => {
            let cfg = load_or_default(cli.config.as_deref(), cli.strict)?;
            demographics::run(args, &cfg)
        }
        Command::Report(args) => {
            let cfg = load_or_default(cli.config.as_deref(), cli.strict)?;
            report::run(args, &cfg)
        }
        Command::Validate(args) => {
            let cfg = load_or_default(cli.config.as_deref(), cli.strict)?;
            validate::run(args, &cfg)
        }
    }
}

/// Config problems exit 2, everything else (unreadable or malformed data) exits 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SurveyError>() {
        Some(SurveyError::Config(_)) => exit_codes::CONFIG_ERROR,
        _ => exit_codes::DATA_ERROR,
    }
}

pub(crate) fn wants_json(format: &str) -> anyhow::Result<bool> {
    match format {
        "json" => Ok(true),
        "text" => Ok(false),
        other => Err(SurveyError::Config(format!("unknown --format '{other}' (text|json)")).into()),
    }
}

pub(crate) fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Renders charts unless disabled, returning the written files.
pub(crate) fn write_charts(
    output: &OutputArgs,
    files: &[survey_core::chart::ChartFile],
) -> anyhow::Result<Vec<std::path::PathBuf>> {
    if output.no_charts {
        return Ok(Vec::new());
    }
    Ok(survey_core::chart::render_all(files, &output.out_dir)?)
}

pub(crate) fn generated_at() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
