//! querygate - ask a SQLite file a question, get back one read-only query's rows.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use cli::{render_error, render_outcome, Cli, OutputFormat};
use querygate::config::Config;
use querygate::db::DataSourceHandle;
use querygate::error::GatewayError;
use querygate::gateway::{Gateway, GatewayOutcome, GeneratorHandle};
use querygate::logging::init_stderr_logging;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_stderr_logging();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();
    cli.validate().map_err(anyhow::Error::msg)?;
    let format = cli.parse_output_format().map_err(anyhow::Error::msg)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    if let Some(provider) = &cli.llm {
        config.llm.provider = provider.clone();
    }

    let gateway = Gateway::new(GeneratorHandle::from_config(config.llm));
    let source = cli.database.as_ref().map(DataSourceHandle::new);
    if source.is_none() {
        warn!("No database file given; pass one with --database");
    }

    let outcome = match (&cli.sql, &cli.question) {
        (Some(raw), question) => gateway
            .run_raw(raw, source.as_ref())
            .await
            .map(|mut outcome| {
                outcome.question = question.clone();
                outcome
            }),
        (None, Some(question)) => answer(&gateway, question, source.as_ref(), cli.show_prompt).await,
        (None, None) => anyhow::bail!("a QUESTION or --sql is required"),
    };

    report(outcome, format)
}

async fn answer(
    gateway: &Gateway,
    question: &str,
    source: Option<&DataSourceHandle>,
    show_prompt: bool,
) -> Result<GatewayOutcome, GatewayError> {
    let Some(source) = source else {
        return gateway.ask(question, None).await;
    };

    let prompt = gateway.prompt_for(question, source).await?;
    if show_prompt {
        eprintln!("{prompt}");
    }

    gateway.generator().preload().await?;
    gateway.ask_with_prompt(question, &prompt, source).await
}

fn report(
    outcome: Result<GatewayOutcome, GatewayError>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    match outcome {
        Ok(outcome) => {
            println!("{}", render_outcome(&outcome, format)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", render_error(&e, format)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
