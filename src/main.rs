//! Main entry point for the repix CLI application.
//!
//! This binary is the external driver of the conversion pipeline: it
//! reads inputs from the filesystem, feeds them through the run state,
//! and writes the converted output back out as a single archive or as
//! individual files.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use repix::pipeline::ConversionResult;
use repix::{Cli, Format, LocalFileReader, RawFile, RunState, ZipExtractor, classify, zip};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to list mode or a full
/// conversion run.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list {
        return list_inputs(&cli).await;
    }

    // clap enforces presence outside of list mode
    let target = cli.format.context("target format is required")?;
    run_conversion(&cli, target).await
}

/// Show how each input would be classified, without converting.
///
/// ZIP archives are scanned directly from disk, so listing a large
/// archive does not load its file data into memory.
async fn list_inputs(cli: &Cli) -> Result<()> {
    for path in &cli.inputs {
        let name = display_name(path);

        if classify::extension_of(&name) == "zip" {
            let reader = Arc::new(LocalFileReader::new(path)?);
            let extractor = ZipExtractor::new(reader);

            match extractor.entries().await {
                Ok(entries) => {
                    for entry in entries.iter().filter(|e| !e.is_directory) {
                        match classify::classify_entry(&entry.file_name) {
                            Ok(format) => println!("{:<5} {}", format.to_string(), entry.file_name),
                            Err(_) => println!("{:<5} {}", "-", entry.file_name),
                        }
                    }
                }
                Err(err) => eprintln!("{name}: could not open archive ({err})"),
            }
        } else {
            match classify::classify_loose(&name, None) {
                Ok(format) => println!("{:<5} {}", format.to_string(), name),
                Err(_) => println!("{:<5} {}", "-", name),
            }
        }
    }

    Ok(())
}

/// Run the full pipeline: read inputs, normalize, convert, write output.
async fn run_conversion(cli: &Cli, target: Format) -> Result<()> {
    let inputs = read_inputs(cli).await?;

    let mut run = RunState::new();
    run.load_inputs(inputs).await;

    // Rejections from normalization are per-file, not fatal
    for diagnostic in run.diagnostics() {
        eprintln!("{diagnostic}");
    }

    if run.item_count() == 0 {
        bail!("no supported images in the input selection");
    }

    if !cli.is_quiet() {
        println!(
            "{} image(s) accepted, source format: {}",
            run.item_count(),
            run.source_lock()
        );
    }

    let diagnostics_before = run.diagnostics().len();
    run.convert_all(target).await;

    for diagnostic in &run.diagnostics()[diagnostics_before..] {
        eprintln!("{diagnostic}");
    }

    if !cli.is_quiet() {
        for result in run.results() {
            println!("  converted: {}", result.filename);
        }
    }

    if let Some(dir) = &cli.out_dir {
        write_individual(run.results(), dir).await?;
        if !cli.is_very_quiet() {
            println!("wrote {} file(s) into {}", run.results().len(), dir.display());
        }
    } else {
        let archive = run.pack_results()?;
        let output = cli.output_path();
        tokio::fs::write(&output, archive)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        if !cli.is_very_quiet() {
            println!(
                "wrote {} ({} file(s))",
                output.display(),
                run.results().len()
            );
        }
    }

    let failed = run.item_count() - run.results().len();
    if failed > 0 && !cli.is_very_quiet() {
        eprintln!("{failed} file(s) failed to convert");
    }

    Ok(())
}

/// Read each input path into a raw file for the normalizer.
///
/// The CLI has no declared content types to offer, so classification
/// downstream falls back to filename extensions.
async fn read_inputs(cli: &Cli) -> Result<Vec<RawFile>> {
    let mut inputs = Vec::with_capacity(cli.inputs.len());

    for path in &cli.inputs {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        inputs.push(RawFile::new(display_name(path), None, bytes));
    }

    Ok(inputs)
}

/// Write each converted item as its own file under the directory,
/// applying the same collision rules as the archive writer.
async fn write_individual(results: &[ConversionResult], dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut used = HashSet::new();
    for result in results {
        let name = zip::unique_name(&mut used, &result.filename);
        let path = dir.join(&name);

        // Entry names from archives may carry directory components
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(&path, &result.bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}

/// Bare filename of a path, for diagnostics and classification.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
