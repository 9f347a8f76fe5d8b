use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "survey",
    version,
    about = "Analyse refactoring preference survey results"
)]
pub struct Cli {
    /// Survey config (YAML). Defaults to the Human_survey/ layout.
    #[arg(long, global = true, env = "SURVEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Reject unknown config keys
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Tally original vs refactored preferences and reason tags
    Preferences(PreferencesArgs),
    /// Cross-tabulate experience bands against Python skill
    Demographics(DemographicsArgs),
    /// Run both analyses
    Report(ReportArgs),
    /// Check the survey index against the image directory
    Validate(ValidateArgs),
    /// Write a sample config file
    Init(InitArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory charts are written to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub no_charts: bool,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json
}

#[derive(clap::Args, Debug, Clone)]
pub struct PreferencesArgs {
    /// Responses CSV (overrides config)
    #[arg(long)]
    pub responses: Option<PathBuf>,

    /// Survey index CSV (overrides config)
    #[arg(long)]
    pub index: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DemographicsArgs {
    /// Demographics CSV (overrides config)
    #[arg(long)]
    pub demographics: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    #[arg(long)]
    pub responses: Option<PathBuf>,

    #[arg(long)]
    pub index: Option<PathBuf>,

    #[arg(long)]
    pub demographics: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = "text")]
    pub format: String, // text|json
}

#[derive(clap::Args, Debug, Clone)]
pub struct InitArgs {
    /// Where to write the config when --config is not given
    #[arg(long, default_value = "survey.yaml")]
    pub path: PathBuf,
}
