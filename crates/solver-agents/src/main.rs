use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use solver_agents::{
    ClientSet, HealthReport, ImageInput, SolveOrchestrator, SolveRequest, SolveResponse,
    SolverConfig,
};

#[derive(Parser, Debug)]
#[command(name = "math-solver", version, about = "Solve math questions with verified escalation")]
struct Cli {
    /// TOML config file. Environment variables fill anything it omits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve one question and print the JSON response.
    Solve {
        /// Question text. Omit together with --stdin to read from standard input.
        /// With --image this is optional OCR text for the image.
        question: Option<String>,

        #[arg(long)]
        stdin: bool,

        /// Image of the question (PNG, JPEG, GIF or WebP).
        #[arg(long)]
        image: Option<PathBuf>,

        #[arg(long, default_value = "auto")]
        level: String,

        #[arg(long, default_value = "en")]
        locale: String,

        #[arg(long)]
        pretty: bool,
    },
    /// Print the configured models.
    Health {
        #[arg(long)]
        pretty: bool,
    },
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

async fn read_question(question: Option<String>, stdin: bool) -> Result<String> {
    match (question, stdin) {
        (Some(_), true) => bail!("pass either a question or --stdin, not both"),
        (Some(question), false) => Ok(question),
        (None, _) => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read question from stdin")?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SolverConfig::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Health { pretty } => print_json(&HealthReport::from_config(&config), pretty),
        Command::Solve {
            question,
            stdin,
            image,
            level,
            locale,
            pretty,
        } => {
            info!(
                provider = %config.provider,
                base = %config.text_model,
                strong = %config.stronger_model,
                "math solver starting"
            );

            let clients = ClientSet::from_config(&config)?;
            let orchestrator = SolveOrchestrator::from_clients(clients, config.escalation.clone());

            let response = match image {
                Some(path) => {
                    let hint = match (question, stdin) {
                        (None, false) => String::new(),
                        (question, stdin) => read_question(question, stdin).await?,
                    };
                    let image = ImageInput::load(&path)
                        .await
                        .with_context(|| format!("Failed to load image {}", path.display()))?;
                    let request = SolveRequest::new(hint.clone())
                        .with_level(level)
                        .with_locale(locale);
                    let result = orchestrator
                        .solve_image(&image, Some(hint.as_str()))
                        .await
                        .context("Image solve failed")?;
                    SolveResponse::from_result(result, &request, None)
                }
                None => {
                    let question = read_question(question, stdin).await?;
                    let request = SolveRequest::new(question)
                        .with_level(level)
                        .with_locale(locale);
                    orchestrator
                        .solve_request(&request)
                        .await
                        .context("Solve failed")?
                }
            };
            print_json(&response, pretty)
        }
    }
}
