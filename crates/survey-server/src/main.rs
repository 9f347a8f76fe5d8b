use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use survey_server::config;
use survey_server::server::Server;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Survey config (YAML); defaults apply when omitted
    #[arg(long, env = "SURVEY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides SURVEY_BIND
    #[arg(long)]
    bind: Option<String>,

    /// Fail on unknown config keys
    #[arg(long)]
    strict: bool,
}

use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = config::ServerConfig::from_env();
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }

    init_logging(&cfg.log_level);

    let survey = survey_core::config::load_or_default(args.config.as_deref(), args.strict)?;

    tracing::info!(
        event = "server_start",
        config_path = ?args.config,
        index_file = %survey.index_file.display(),
        num_pairs = survey.num_pairs,
        config = ?cfg
    );

    Server::run(survey, cfg).await
}
