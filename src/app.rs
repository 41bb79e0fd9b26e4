// Declare modules
pub mod cli;
pub mod config;
pub mod formatter;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use plugload::filters::{build_globset, has_suffix};
use plugload::Scanner;

use self::cli::Cli;
use self::config::{resolve_config, RuntimeConfig};
use self::formatter::OutputGenerator;

/// Initializes components and orchestrates data flow.
pub fn run() -> Result<()> {
    // 1. Parse args and overlay them on the chosen preset
    let args = Cli::parse();
    let config = resolve_config(args)?;

    // 2. Build a walker with the merged options
    let scanner = build_scanner(&config)?;

    // 3. Scan
    let files = scanner
        .scan(&config.root, None)
        .context(format!("Failed to scan {}", config.root.display()))?;

    if files.is_empty() {
        log::warn!("no module files matched under {}", config.root.display());
        return Ok(());
    }

    // 4. Print to stdout
    let output = if config.tree {
        OutputGenerator::generate_tree(&files)
    } else {
        OutputGenerator::generate_list(&files)
    };
    println!("{output}");

    Ok(())
}

/// The scanner mirrors what a loader configured the same way would see:
/// include/exclude globs narrow the default suffix filter, and excluded
/// directories are pruned before descent.
fn build_scanner(config: &RuntimeConfig) -> Result<Scanner> {
    let include = build_globset(&config.include)?;
    let exclude = build_globset(&config.exclude)?;
    let has_includes = !config.include.is_empty();

    let ext = config.ext.clone();
    let file_exclude = exclude.clone();
    let file_filter = move |absolute: &Path, dir: &Path, _stem: &str| {
        if !has_suffix(absolute, &ext) {
            return false;
        }
        let relative = relative_file_path(absolute, dir);
        if file_exclude.is_match(&relative) {
            return false;
        }
        !has_includes || include.is_match(&relative)
    };

    let scanner = Scanner::new()
        .ext(&config.ext)
        .depth(config.depth)
        .file_filter(file_filter)
        .dir_filter(move |_absolute, relative| !exclude.is_match(relative));

    Ok(scanner)
}

fn relative_file_path(absolute: &Path, dir: &Path) -> PathBuf {
    let name = absolute.file_name().map(PathBuf::from).unwrap_or_default();
    if dir == Path::new(".") {
        name
    } else {
        dir.join(name)
    }
}
