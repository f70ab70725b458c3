//! chatlens-extract - CLI tool to rebuild the flat message table
//!
//! Reads the raw Apple Messages store, flattens it into the snapshot the
//! analysis tools load, and regenerates the per-chat HTML previews.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Snapshot: $XDG_DATA_HOME/chatlens/messages.bin
//! - Previews: $XDG_DATA_HOME/chatlens/previews/
//! - Logs: $XDG_STATE_HOME/chatlens/chatlens.log
//! - Config: $XDG_CONFIG_HOME/chatlens/config.toml

use anyhow::{Context, Result};
use chatlens_core::{Config, ExtractResult, Extractor};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatlens-extract")]
#[command(about = "Rebuild the flat message table from the raw store")]
#[command(version)]
struct Args {
    /// Path to the raw store (default: configured path, or ~/Library/Messages/chat.db)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        chatlens_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("chatlens-extract starting");

    let store_path = args.source.unwrap_or_else(|| config.store_path());
    let snapshot_path = Config::snapshot_path();

    println!("Store:    {}", store_path.display());
    println!("Snapshot: {}", snapshot_path.display());

    let extractor = Extractor::new(store_path, snapshot_path, Config::preview_dir());

    let result = if args.quiet {
        extractor.run().context("extraction failed")?
    } else {
        run_with_bar(&extractor)?
    };

    print_extract_result(&result);

    tracing::info!(
        messages = result.messages,
        decode_failures = result.decode_failures,
        "chatlens-extract complete"
    );

    Ok(())
}

/// Run the extraction behind a progress bar over the store's rows.
fn run_with_bar(extractor: &Extractor) -> Result<ExtractResult> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let result = extractor
        .run_with_progress(|current, total| {
            if current == 0 {
                pb.set_length(total as u64);
            }
            pb.set_position(current as u64);
        })
        .context("extraction failed")?;

    pb.finish_and_clear();
    Ok(result)
}

/// Print extraction result summary
fn print_extract_result(result: &ExtractResult) {
    println!("\nExtract complete:");
    println!("  Messages: {}", result.messages);
    println!("  Chats:    {}", result.chats);
    println!("  Previews: {}", result.previews);
    if result.decode_failures > 0 {
        println!("  Bodies left undecoded: {}", result.decode_failures);
    }
}
