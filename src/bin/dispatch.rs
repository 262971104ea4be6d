//! Run the Chatery action node once from the command line.
//!
//! ```text
//! chatery-dispatch [--config config.toml] <job.json>
//! chatery-dispatch [--config config.toml] --test-credentials
//! ```
//!
//! A job file names the resource and operation and lists one parameter object
//! per item:
//!
//! ```json
//! {"resource": "chat", "operation": "sendText",
//!  "items": [{"sessionId": "main", "chatId": "628123@c.us", "message": "hi"}]}
//! ```
//!
//! The resulting execution items are printed to stdout as JSON.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatery_whatsapp::config::Config;
use chatery_whatsapp::params::NodeParameters;
use chatery_whatsapp::{ActionNode, ChateryClient};

#[derive(Debug, Deserialize)]
struct Job {
    resource: String,
    operation: String,
    #[serde(default = "default_items")]
    items: Vec<NodeParameters>,
}

fn default_items() -> Vec<NodeParameters> {
    vec![NodeParameters::new()]
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(PathBuf),
    TestCredentials,
}

#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config = PathBuf::from("config.toml");
    let mut command = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                config = PathBuf::from(path);
            }
            "--test-credentials" => command = Some(Command::TestCredentials),
            other if other.starts_with("--") => anyhow::bail!("Unknown flag: {}", other),
            job => command = Some(Command::Run(PathBuf::from(job))),
        }
    }

    let command = command.context(
        "Usage: chatery-dispatch [--config config.toml] <job.json | --test-credentials>",
    )?;
    Ok(Args { config, command })
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        info!("No config at {}, using defaults", path.display());
        Config::parse("")
    }
}

fn load_job(path: &Path) -> Result<Job> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read job file: {}", path.display()))?;
    parse_job(&content).with_context(|| format!("Invalid job file: {}", path.display()))
}

fn parse_job(content: &str) -> Result<Job> {
    Ok(serde_json::from_str(content)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,chatery_whatsapp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;
    let config = load_config(&args.config)?;
    let client = ChateryClient::new(config.credentials.clone());

    let output = match args.command {
        Command::TestCredentials => client
            .test_credentials()
            .await
            .context("Credential test failed")?,
        Command::Run(job_path) => {
            let job = load_job(&job_path)?;
            let node = ActionNode::new(client, config.node.continue_on_fail);
            let items = node
                .execute(&job.resource, &job.operation, &job.items)
                .await
                .with_context(|| format!("{}.{} failed", job.resource, job.operation))?;
            serde_json::to_value(items)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
