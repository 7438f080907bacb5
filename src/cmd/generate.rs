//! Job submission and tracking — `casegen generate`, `watch`, `validate`.

use anyhow::Result;
use console::style;

use casegen::client::GenerationClient;
use casegen::config::CasegenConfig;
use casegen::engine::GenerationEngine;
use casegen::errors::SubmitError;
use casegen::job::{JobSubmission, SourceConfig, SourceKind};
use casegen::poll::{Outcome, SessionReport};
use casegen::ui::TerminalUI;
use casegen::ui::icons::CROSS;

use super::super::SubmissionArgs;

/// Assemble a submission from CLI arguments. Missing kind-specific fields
/// are left empty here; `JobSubmission::validate` reports them field by
/// field so the user sees everything wrong at once.
pub fn build_submission(args: &SubmissionArgs) -> JobSubmission {
    let source = match args.source {
        SourceKind::Jira => SourceConfig::Jira {
            project_key: args.project_key.clone().unwrap_or_default(),
            item_ids: args.items.clone(),
        },
        SourceKind::Azure => SourceConfig::Azure {
            organization: args.organization.clone().unwrap_or_default(),
            project: args.project.clone().unwrap_or_default(),
            work_item_ids: args.items.clone(),
        },
        SourceKind::Url => SourceConfig::Url {
            target_url: args.url.clone().unwrap_or_default(),
        },
        SourceKind::Image => SourceConfig::Image {
            image_paths: args.images.clone(),
        },
    };
    JobSubmission::new(source, args.types.clone())
}

fn load_config(base_url: Option<&str>, max_attempts: Option<u32>) -> Result<CasegenConfig> {
    let cwd = std::env::current_dir()?;
    let mut config = CasegenConfig::load(&cwd)?;
    config.apply_cli(base_url, max_attempts);
    config.validate()?;
    Ok(config)
}

fn engine_from(config: &CasegenConfig) -> GenerationEngine {
    let client = GenerationClient::with_request_timeout(
        config.service.base_url.clone(),
        config.request_timeout(),
    );
    GenerationEngine::new(client, config.poll_config())
}

fn print_validation_errors(errors: &[casegen::errors::ValidationError]) {
    eprintln!("{}{}", CROSS, style("Submission is invalid:").red().bold());
    for error in errors {
        eprintln!("  {} {}", style(&error.field).yellow(), error.message);
    }
}

fn finish(
    engine: &GenerationEngine,
    ui: &TerminalUI,
    report: &SessionReport,
    verbose: bool,
) -> Result<()> {
    if verbose {
        let elapsed = report.finished_at - report.started_at;
        println!(
            "  {} {} polls over {}s (session {})",
            style("Session:").dim(),
            report.attempts,
            elapsed.num_seconds(),
            report.session_id
        );
    }
    match &report.outcome {
        Outcome::Succeeded { key } => {
            ui.print_redirect(&engine.results_url(key));
            Ok(())
        }
        Outcome::TimedOut { key } => {
            if let Some(key) = key {
                ui.print_redirect(&engine.results_url(key));
            }
            anyhow::bail!("generation did not finish within the polling budget")
        }
        Outcome::Failed(error) => anyhow::bail!("generation failed: {error}"),
    }
}

/// Submit a job and track it to its terminal state.
pub async fn cmd_generate(
    args: &SubmissionArgs,
    base_url: Option<&str>,
    max_attempts: Option<u32>,
    verbose: bool,
) -> Result<()> {
    let config = load_config(base_url, max_attempts)?;
    let engine = engine_from(&config);
    let submission = build_submission(args);
    let mut ui = TerminalUI::new(verbose);

    match engine.generate(&submission, &mut ui).await {
        Ok(report) => finish(&engine, &ui, &report, verbose),
        Err(SubmitError::Invalid(errors)) => {
            print_validation_errors(&errors);
            anyhow::bail!("submission rejected by validation")
        }
        Err(err) => Err(err.into()),
    }
}

/// Attach to the currently running job, if any, and track it.
pub async fn cmd_watch(
    base_url: Option<&str>,
    max_attempts: Option<u32>,
    verbose: bool,
) -> Result<()> {
    let config = load_config(base_url, max_attempts)?;
    let engine = engine_from(&config);
    let mut ui = TerminalUI::new(verbose);

    let report = engine.watch(&mut ui).await?;
    finish(&engine, &ui, &report, verbose)
}

/// Validate a submission locally without contacting the service.
pub fn cmd_validate(args: &SubmissionArgs) -> Result<()> {
    let submission = build_submission(args);
    match submission.validate() {
        Ok(()) => {
            println!(
                "{} for {} source with {} test case type(s)",
                style("Submission is valid").green(),
                submission.source.kind(),
                submission.case_types.len()
            );
            Ok(())
        }
        Err(errors) => {
            print_validation_errors(&errors);
            anyhow::bail!("submission rejected by validation")
        }
    }
}
