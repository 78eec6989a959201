//! omc-convert - CLI tool to batch-convert Ogre mesh XML files.

mod display;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use display::ProgressDisplay;
use omc_core::batch::converted_files;
use omc_core::{
    BatchConfig, BatchConverter, BatchStatus, FailurePolicy, FileList, Settings, ShellRunner,
};

/// Convert Ogre mesh XML files with OgreXMLConverter, then upgrade them with OgreMeshUpgrader.
#[derive(Parser, Debug)]
#[command(name = "omc-convert")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the user configuration directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Convert and upgrade mesh XML files
    Convert(ConvertArgs),
    /// Store the PATH value handed to the Ogre tools
    SetPath {
        /// Directories containing OgreXMLConverter and OgreMeshUpgrader
        path: String,
    },
    /// Show the stored PATH value
    ShowPath,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input .mesh.xml files or directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (defaults to beside each input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// PATH value for the tools, overriding the stored one
    #[arg(long)]
    path: Option<String>,

    /// Failure handling: abort-on-error or best-effort
    #[arg(long, default_value = "abort-on-error")]
    policy: FailurePolicy,

    /// Recurse into input directories
    #[arg(short, long)]
    recursive: bool,

    /// Print the batch report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout carries only command output, e.g. the --json report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings_path = match cli.settings {
        Some(path) => path,
        None => Settings::default_path()
            .context("No configuration directory on this platform")?,
    };

    match cli.action {
        Action::Convert(args) => convert(args, &settings_path, &mut std::io::stdout().lock()),
        Action::SetPath { path } => set_path(&path, &settings_path),
        Action::ShowPath => show_path(&settings_path, &mut std::io::stdout().lock()),
    }
}

fn convert(args: ConvertArgs, settings_path: &Path, out: &mut impl Write) -> Result<()> {
    let settings = Settings::load_from(settings_path)?;
    let search_path = match args
        .path
        .clone()
        .or_else(|| settings.search_path().map(str::to_string))
    {
        Some(path) => path,
        None => {
            error!("No PATH variable set !");
            anyhow::bail!("No PATH variable set. Run `omc-convert set-path <PATH>` or pass --path");
        }
    };

    // Collect inputs
    let mut files = FileList::new();
    for input in &args.inputs {
        if input.is_dir() {
            let added = files
                .add_dir(input, args.recursive)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            if added == 0 {
                warn!("No .mesh.xml files in {}", input.display());
            }
        } else {
            files
                .add(input)
                .with_context(|| format!("Failed to add {}", input.display()))?;
        }
    }

    if files.is_empty() {
        anyhow::bail!("No input files");
    }

    let mut config = BatchConfig::new(search_path.clone()).with_policy(args.policy);
    if let Some(dir) = &args.output {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("Invalid output directory {}", dir.display()))?;
        config = config.with_output_dir(dir);
    }

    let job = files.to_job(config)?;
    info!("Ready to convert {} file(s)", job.files().len());

    // Run on the worker and follow its events here
    let handle = BatchConverter::new(ShellRunner::host(search_path)).spawn(job)?;
    let mut display = ProgressDisplay::new(!args.json);
    let report = handle.wait_with(|event| display.handle(event))?;

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    }

    for mesh in converted_files(&report) {
        info!("Wrote {}", mesh.display());
    }

    match report.status {
        BatchStatus::Completed => {
            info!("Successful!");
            Ok(())
        }
        BatchStatus::Failed => {
            for failure in report.failures() {
                error!(
                    "{} {}: {}",
                    failure.step,
                    failure.input.display(),
                    failure.error.as_deref().unwrap_or("failed")
                );
            }
            anyhow::bail!("Error! Check your PATH variable.")
        }
        BatchStatus::Cancelled => anyhow::bail!("Batch cancelled"),
    }
}

fn set_path(value: &str, settings_path: &Path) -> Result<()> {
    let mut settings = Settings::load_from(settings_path)?;
    if !settings.set_search_path(value) {
        anyhow::bail!("PATH value must not be empty");
    }
    settings.save_to(settings_path)?;
    info!("PATH={}", value.trim());
    Ok(())
}

fn show_path(settings_path: &Path, out: &mut impl Write) -> Result<()> {
    let settings = Settings::load_from(settings_path)?;
    match settings.search_path() {
        Some(path) => writeln!(out, "{}", path)?,
        None => warn!("No PATH variable set !"),
    }
    Ok(())
}
