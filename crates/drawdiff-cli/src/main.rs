// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// drawdiff — Compare two revisions of an engineering drawing.
//
// Entry point. Initialises logging, validates both uploads, runs the requested
// variant, and writes the deliverable. The summary JSON goes to stdout; logs
// and error reports go to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use drawdiff_core::config::CompareConfig;
use drawdiff_core::error::CompareError;
use drawdiff_core::human_errors::humanize_error;
use drawdiff_core::types::OutputVariant;
use drawdiff_engine::Comparer;
use drawdiff_security::PdfUpload;

#[derive(Parser)]
#[command(name = "drawdiff")]
#[command(version)]
#[command(about = "Find text that moved, vanished, or appeared between two drawing revisions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print per-page missing/extra counts as JSON
    Summary {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// First drawing with all differences highlighted, watermark, and summary page
    Report(Render),

    /// First drawing with missing text highlighted
    Missing(Render),

    /// Second drawing with extra text highlighted
    Extra(Render),

    /// Summary page followed by the first drawing with both kinds of marks
    Merged(Render),

    /// Zip of the missing and extra drawings plus the summary JSON
    Archive(Render),
}

#[derive(Args)]
struct Inputs {
    /// Original drawing
    #[arg(value_name = "FIRST")]
    first: PathBuf,

    /// Revised drawing
    #[arg(value_name = "SECOND")]
    second: PathBuf,

    /// Positional tolerance in points
    #[arg(short, long)]
    tolerance: Option<f32>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct Render {
    #[command(flatten)]
    inputs: Inputs,

    /// Output file (defaults to the variant's download name)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Command {
    fn variant(&self) -> Option<OutputVariant> {
        match self {
            Self::Summary { .. } => None,
            Self::Report(_) => Some(OutputVariant::FullReport),
            Self::Missing(_) => Some(OutputVariant::MissingOnly),
            Self::Extra(_) => Some(OutputVariant::ExtraOnly),
            Self::Merged(_) => Some(OutputVariant::Merged),
            Self::Archive(_) => Some(OutputVariant::Archive),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

/// Execute one command and return the summary JSON.
fn run(cli: Cli) -> Result<String> {
    let variant = cli.command.variant();
    match cli.command {
        Command::Summary { inputs } => {
            let (comparer, first, second) = prepare(&inputs)?;
            let outcome = comparer.summary(first.bytes(), second.bytes())?;
            for page in &outcome.skipped {
                tracing::warn!(page = page.page, stage = %page.stage, "Page left out of the summary");
            }
            Ok(outcome.summary.to_json()?)
        }
        Command::Report(render)
        | Command::Missing(render)
        | Command::Extra(render)
        | Command::Merged(render)
        | Command::Archive(render) => {
            let variant = variant.context("output command without a variant")?;
            let (comparer, first, second) = prepare(&render.inputs)?;
            let deliverable = comparer.produce(variant, first.bytes(), second.bytes())?;

            let target = render
                .output
                .unwrap_or_else(|| PathBuf::from(deliverable.file_name()));
            fs::write(&target, &deliverable.bytes)
                .with_context(|| format!("cannot write {}", target.display()))?;
            tracing::info!(
                output = %target.display(),
                bytes = deliverable.bytes.len(),
                skipped = deliverable.skipped.len(),
                "Output written"
            );
            Ok(deliverable.summary.to_json()?)
        }
    }
}

fn prepare(inputs: &Inputs) -> Result<(Comparer, PdfUpload, PdfUpload)> {
    let mut config = match &inputs.config {
        Some(path) => CompareConfig::from_json_file(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => CompareConfig::default(),
    };
    if let Some(tolerance) = inputs.tolerance {
        config = config.with_tolerance(tolerance);
    }

    let first = read_upload(&inputs.first, config.max_upload_bytes)?;
    let second = read_upload(&inputs.second, config.max_upload_bytes)?;
    Ok((Comparer::new(config)?, first, second))
}

fn read_upload(path: &Path, max_bytes: usize) -> Result<PdfUpload> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(PdfUpload::new(&name, bytes, max_bytes)?)
}

/// Comparison failures are reported as the JSON error body; anything else
/// (unreadable files, bad arguments) as plain text.
fn report_failure(err: &anyhow::Error) {
    match err.downcast_ref::<CompareError>() {
        Some(compare) => match serde_json::to_string_pretty(&humanize_error(compare)) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("error: {compare}"),
        },
        None => eprintln!("error: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawdiff_document::fixtures::{SamplePage, sample_pdf};

    fn write_pair(dir: &Path) -> (PathBuf, PathBuf) {
        let first = dir.join("rev-a.pdf");
        let second = dir.join("rev-b.pdf");
        fs::write(
            &first,
            sample_pdf(&[SamplePage::new(612.0, 792.0)
                .word("R10", 72.0, 100.0, 12.0)
                .word("M6", 200.0, 100.0, 12.0)]),
        )
        .unwrap();
        fs::write(
            &second,
            sample_pdf(&[SamplePage::new(612.0, 792.0)
                .word("R10", 72.0, 100.0, 12.0)
                .word("M8", 200.0, 100.0, 12.0)]),
        )
        .unwrap();
        (first, second)
    }

    fn path_arg(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn summary_prints_counts() {
        let dir = tempfile::tempdir().unwrap();
        let (first, second) = write_pair(dir.path());
        let cli = Cli::try_parse_from(["drawdiff", "summary", path_arg(&first), path_arg(&second)]).unwrap();

        let json = run(cli).unwrap();
        assert_eq!(json, r#"{"summary_data":{"0":{"missing":1,"extra":1}}}"#);
    }

    #[test]
    fn missing_writes_requested_output() {
        let dir = tempfile::tempdir().unwrap();
        let (first, second) = write_pair(dir.path());
        let output = dir.path().join("out.pdf");
        let cli = Cli::try_parse_from([
            "drawdiff",
            "missing",
            path_arg(&first),
            path_arg(&second),
            "--output",
            path_arg(&output),
        ])
        .unwrap();

        run(cli).unwrap();
        assert!(fs::read(&output).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn config_file_caps_upload_size() {
        let dir = tempfile::tempdir().unwrap();
        let (first, second) = write_pair(dir.path());
        let config = dir.path().join("drawdiff.json");
        fs::write(&config, r#"{"max_upload_bytes": 64}"#).unwrap();

        let cli = Cli::try_parse_from([
            "drawdiff",
            "summary",
            path_arg(&first),
            path_arg(&second),
            "--config",
            path_arg(&config),
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::InvalidUpload(_))
        ));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (first, second) = write_pair(dir.path());
        let cli = Cli::try_parse_from([
            "drawdiff",
            "summary",
            path_arg(&first),
            path_arg(&second),
            "--tolerance=-1",
        ])
        .unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::Config(_))
        ));
    }

    #[test]
    fn non_pdf_upload_is_a_compare_error() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = write_pair(dir.path());
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "hello").unwrap();

        let cli = Cli::try_parse_from(["drawdiff", "summary", path_arg(&first), path_arg(&notes)]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompareError>(),
            Some(CompareError::InvalidUpload(_))
        ));
    }

    #[test]
    fn output_commands_map_to_variants() {
        let cli = Cli::try_parse_from(["drawdiff", "merged", "a.pdf", "b.pdf"]).unwrap();
        assert_eq!(cli.command.variant(), Some(OutputVariant::Merged));

        let cli = Cli::try_parse_from(["drawdiff", "archive", "a.pdf", "b.pdf", "-o", "x.zip"]).unwrap();
        assert_eq!(cli.command.variant(), Some(OutputVariant::Archive));

        assert!(Cli::try_parse_from(["drawdiff", "report", "a.pdf"]).is_err());
    }
}
