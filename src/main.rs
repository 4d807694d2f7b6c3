#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stakewriter::agents::{Orchestrator, Request, Response};
use stakewriter::bridge;
use stakewriter::config::Config;
use stakewriter::events::{LiveSink, LogEvent};
use stakewriter::model::{EmailResult, TaskFailure};
use stakewriter::report::ReportInput;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "stakewriter",
    version,
    about = "Turns research reports into personalized stakeholder outreach emails"
)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve one JSON request over stdin/stdout with streamed LOG: lines.
    Bridge {
        /// Cancel the run after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Extract stakeholders and a company summary from a report file.
    Extract {
        /// Plain-text research report.
        report: PathBuf,
    },
    /// Extract stakeholders, then generate one email per stakeholder.
    Generate {
        /// Plain-text research report.
        report: PathBuf,

        /// Email style key (ai_style mode).
        #[arg(long, default_value = "technical_direct")]
        style: String,

        /// Company name used for personalization.
        #[arg(long)]
        company_name: Option<String>,

        /// Write a markdown digest here instead of printing it.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr so the bridge's stdout framing stays clean.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let cli = Cli::parse();
    let config = Config::load_at(cli.config.as_deref())?;
    let orchestrator = Orchestrator::from_config(config)?;

    match cli.command {
        Command::Bridge { timeout_secs } => {
            bridge::run(&orchestrator, timeout_secs.map(Duration::from_secs)).await?;
            Ok(())
        }
        Command::Extract { report } => extract(&orchestrator, &report).await,
        Command::Generate {
            report,
            style,
            company_name,
            output,
        } => generate(&orchestrator, &report, &style, company_name, output).await,
    }
}

async fn read_report(path: &PathBuf) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read report {}", path.display()))
}

/// Human-readable event stream for interactive runs.
fn stderr_sink() -> LiveSink {
    Arc::new(|event: &LogEvent| {
        eprintln!("[{}] {}: {}", event.level, event.agent, event.message);
    })
}

async fn extract(orchestrator: &Orchestrator, report: &PathBuf) -> Result<()> {
    let request = Request::ExtractStakeholders {
        workflow_id: None,
        report_input: ReportInput::Text {
            content: read_report(report).await?,
        },
    };
    let response = orchestrator
        .handle(request, CancellationToken::new(), Some(stderr_sink()))
        .await;
    let Response {
        success,
        stakeholders,
        company_summary,
        error,
        ..
    } = response;
    if !success {
        bail!(error.unwrap_or_else(|| "extraction failed".into()));
    }

    if let Some(summary) = company_summary {
        println!("Company summary:\n{summary}\n");
    }
    let stakeholders = stakeholders.unwrap_or_default();
    println!("Stakeholders ({}):", stakeholders.len());
    for s in &stakeholders {
        println!("  - {} ({})", s.name, s.title_or_default());
        if let Some(details) = &s.details {
            println!("    {details}");
        }
    }
    Ok(())
}

async fn generate(
    orchestrator: &Orchestrator,
    report: &PathBuf,
    style: &str,
    company_name: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let report_text = read_report(report).await?;
    let sink = stderr_sink();

    let extraction = orchestrator
        .handle(
            Request::ExtractStakeholders {
                workflow_id: None,
                report_input: ReportInput::Text {
                    content: report_text.clone(),
                },
            },
            CancellationToken::new(),
            Some(Arc::clone(&sink)),
        )
        .await;
    if !extraction.success {
        bail!(extraction
            .error
            .unwrap_or_else(|| "extraction failed".into()));
    }
    let stakeholders = extraction.stakeholders.unwrap_or_default();
    if stakeholders.is_empty() {
        bail!("no stakeholders identified in the report");
    }
    let company_summary = extraction.company_summary.unwrap_or_default();

    let generation = orchestrator
        .handle(
            Request::GenerateEmails {
                workflow_id: None,
                report_input: ReportInput::Text {
                    content: report_text,
                },
                selected_stakeholders: stakeholders,
                company_name,
                company_summary: company_summary.clone(),
                generation_mode: "ai_style".into(),
                mode_config: json!({ "style_key": style }),
            },
            CancellationToken::new(),
            Some(sink),
        )
        .await;
    if !generation.success {
        bail!(generation
            .error
            .unwrap_or_else(|| "email generation failed".into()));
    }

    let digest = render_digest(
        &company_summary,
        &generation.emails.unwrap_or_default(),
        &generation.failed.unwrap_or_default(),
    );
    match output {
        Some(path) => {
            tokio::fs::write(&path, digest)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Digest written to {}", path.display());
        }
        None => println!("{digest}"),
    }
    Ok(())
}

fn render_digest(
    company_summary: &str,
    emails: &[EmailResult],
    failed: &[TaskFailure],
) -> String {
    let mut out = String::from("# Stakeholder Outreach Emails\n\n");
    if !company_summary.is_empty() {
        out.push_str("## Company Summary\n\n");
        out.push_str(company_summary);
        out.push_str("\n\n");
    }
    for email in emails {
        out.push_str(&format!(
            "## {} ({})\n\n**Subject:** {}\n\n",
            email.stakeholder_name, email.stakeholder_title, email.email_subject
        ));
        if let Some(score) = email.quality_score {
            out.push_str(&format!(
                "**Quality score:** {score:.1}/10 ({} refinement rounds)\n\n",
                email.rounds_used
            ));
        }
        out.push_str(&email.email_body);
        out.push_str("\n\n");
        if !email.reflection_notes.is_empty() {
            out.push_str(&format!("> {}\n\n", email.reflection_notes));
        }
    }
    if !failed.is_empty() {
        out.push_str("## Failed\n\n");
        for failure in failed {
            out.push_str(&format!(
                "- {}: {}\n",
                failure.stakeholder_name, failure.error
            ));
        }
    }
    out
}
