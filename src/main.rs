use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use casegen::job::SourceKind;

mod cmd;

#[derive(Parser)]
#[command(name = "casegen")]
#[command(version, about = "Submit AI test-case generation jobs and track their progress")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the generation service. Overrides casegen.toml and
    /// CASEGEN_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Total poll budget before giving up on a running job.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments describing one job submission, shared by `generate` and
/// `validate`.
#[derive(Args)]
pub struct SubmissionArgs {
    /// Input modality: jira, azure, url, or image
    #[arg(long)]
    pub source: SourceKind,

    /// Test case types to generate (e.g. functional, regression, security)
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<String>,

    /// Jira project key (jira source)
    #[arg(long)]
    pub project_key: Option<String>,

    /// Story or work-item IDs (jira and azure sources)
    #[arg(long = "item", value_name = "ID")]
    pub items: Vec<String>,

    /// Azure DevOps organization (azure source)
    #[arg(long)]
    pub organization: Option<String>,

    /// Azure DevOps project (azure source)
    #[arg(long)]
    pub project: Option<String>,

    /// Target web page (url source)
    #[arg(long)]
    pub url: Option<String>,

    /// Screenshot paths (image source)
    #[arg(long = "image", value_name = "PATH")]
    pub images: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a generation job and track it to completion
    Generate {
        #[command(flatten)]
        submission: SubmissionArgs,
    },
    /// Attach to the currently running job and track it
    Watch,
    /// Check a submission locally without contacting the service
    Validate {
        #[command(flatten)]
        submission: SubmissionArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("casegen=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Generate { submission } => {
            cmd::cmd_generate(
                submission,
                cli.base_url.as_deref(),
                cli.max_attempts,
                cli.verbose,
            )
            .await?;
        }
        Commands::Watch => {
            cmd::cmd_watch(cli.base_url.as_deref(), cli.max_attempts, cli.verbose).await?;
        }
        Commands::Validate { submission } => {
            cmd::cmd_validate(submission)?;
        }
    }
    Ok(())
}
