//! taskscope — terminal explorer for agent trace archives
//!
//! # Subcommands
//! - `open <zip> [--export <dir>] [--json]`: load a local archive
//! - `drive <folder-link> [--token <t>] [--export <dir>] [--json]`: load a Drive folder

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use taskscope_core::export::write_export;
use taskscope_core::view::StepView;
use taskscope_core::{
    load_archive_file, load_folder, DriveClient, LoadedTrace, Session, StepsView, TaskscopeConfig,
    TraceView, UserProfile,
};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "taskscope",
    version,
    about = "Explore agent trace archives step by step"
)]
struct Cli {
    /// Config file (optional)
    #[arg(short, long, default_value = "taskscope.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct OutputArgs {
    /// Write the normalized trace as parsed_<name> into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print a JSON summary instead of the step-by-step view
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a local zip archive
    Open {
        /// Path to the zip archive
        archive: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Load the files of a Google Drive folder
    Drive {
        /// Drive folder link or id
        link: String,

        /// OAuth access token with drive.readonly scope
        #[arg(long, env = "TASKSCOPE_DRIVE_TOKEN", hide_env_values = true)]
        token: String,

        /// Hosted domain of the signed-in account, checked against [auth] allowed_domains
        #[arg(long, env = "TASKSCOPE_HOSTED_DOMAIN")]
        hosted_domain: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

// ============================================================================
// JSON summary
// ============================================================================

#[derive(Debug, Serialize)]
struct StepSummary {
    index: usize,
    before: Vec<String>,
    after: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TraceSummary {
    file: String,
    question: Option<String>,
    response: Option<String>,
    steps: Option<Vec<StepSummary>>,
    assets: usize,
}

fn summarize(view: &TraceView, loaded: &LoadedTrace) -> TraceSummary {
    let names = |images: &[taskscope_core::view::ImageView]| {
        images.iter().map(|i| i.name.clone()).collect::<Vec<_>>()
    };

    TraceSummary {
        file: view.file_name.clone(),
        question: view.question.clone(),
        response: view.response.clone(),
        steps: view.steps.as_slice().map(|steps| {
            steps
                .iter()
                .map(|s| StepSummary {
                    index: s.index,
                    before: names(&s.before),
                    after: names(&s.after),
                })
                .collect()
        }),
        assets: loaded.assets.len(),
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn print_step(step: &StepView) {
    println!("── Step {} ──", step.index);

    if step.has_images() {
        for (label, images) in [("Before", &step.before), ("After", &step.after)] {
            if images.is_empty() {
                println!("{} image is not provided", label);
                continue;
            }
            for (i, image) in images.iter().enumerate() {
                println!(
                    "{}: {} ({} of {}, {} bytes)",
                    label,
                    image.display_name,
                    i + 1,
                    images.len(),
                    image.size
                );
            }
        }
    } else {
        println!("No images provided for this step.");
    }

    for section in &step.sections {
        println!("\n{}:\n{}", section.title, section.body);
    }
    println!();
}

fn print_view(view: &TraceView) {
    println!("Agent Task Explorer — {}\n", view.file_name);

    if let Some(question) = &view.question {
        println!("Question:\n{}\n", question);
    }

    match &view.steps {
        StepsView::Steps(steps) => {
            println!("Parsed Steps\n");
            for step in steps {
                print_step(step);
            }
        }
        StepsView::NotArray => println!("No steps found or steps are not in an array format.\n"),
        StepsView::Absent => {}
    }

    println!("Final Response:");
    match &view.response {
        Some(response) => println!("{}", response),
        None => println!("No final response was generated."),
    }
}

fn present(loaded: &LoadedTrace, output: &OutputArgs) -> anyhow::Result<()> {
    let view = TraceView::build(loaded);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&summarize(&view, loaded))?);
    } else {
        print_view(&view);
    }

    if let Some(dir) = &output.export {
        let path = write_export(dir, loaded)
            .with_context(|| format!("failed to export into {}", dir.display()))?;
        eprintln!("Exported {}", path.display());
    }

    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn do_open(archive: &Path, output: &OutputArgs) -> anyhow::Result<()> {
    let loaded = load_archive_file(archive)
        .with_context(|| format!("failed to load {}", archive.display()))?;
    present(&loaded, output)
}

async fn do_drive(
    config: &TaskscopeConfig,
    link: &str,
    token: String,
    hosted_domain: Option<String>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let mut session = Session::new();
    let profile = UserProfile {
        hd: hosted_domain,
        ..UserProfile::default()
    };
    session.login(token, profile, &config.auth.allowed_domains)?;

    let client = DriveClient::new(&config.drive)?;

    let loaded = match load_folder(&client, &mut session, link).await {
        Ok(loaded) => loaded,
        Err(e) if e.is_unauthorized() => {
            anyhow::bail!("{}. Obtain a new access token and try again", e);
        }
        Err(e) => return Err(e.into()),
    };

    present(&loaded, output)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match TaskscopeConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", cli.config, e);
            std::process::exit(1);
        }
    };

    // Init logging (stderr, so --json output stays clean)
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level)),
        )
        .init();

    match cli.command {
        Commands::Open { archive, output } => do_open(&archive, &output),
        Commands::Drive {
            link,
            token,
            hosted_domain,
            output,
        } => do_drive(&config, &link, token, hosted_domain, &output).await,
    }
}

// ============================================================================
// Tests
// ============================================================================
