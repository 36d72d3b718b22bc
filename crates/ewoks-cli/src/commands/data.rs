use crate::cli::{DataArgs, DataCommands};
use crate::data::{DataManager, DataProgress, DownloadOutcome};
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

pub async fn run(args: DataArgs) -> Result<()> {
    match args.command {
        DataCommands::Download { proteomes, force } => {
            handle_download(&proteomes, force).await?;
        }
        DataCommands::Path => {
            handle_path()?;
        }
        DataCommands::SetPath { path } => {
            handle_set_path(path)?;
        }
        DataCommands::ResetPath => {
            handle_reset_path()?;
        }
    }
    Ok(())
}

async fn handle_download(proteomes: &[String], force: bool) -> Result<()> {
    println!("Initializing data manager...");
    let manager = DataManager::new()?;
    println!(
        "Caching signal-peptide annotations in: {:?}",
        manager.get_data_path()
    );

    for proteome in proteomes {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
            )
            .expect("Failed to create download style template")
            .progress_chars("#>-"),
        );
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr_with_hz(2));
        pb.set_prefix(proteome.clone());

        let progress_callback = |progress: DataProgress| match progress {
            DataProgress::DownloadStarted { total_size } => {
                if let Some(size) = total_size {
                    pb.set_length(size);
                }
            }
            DataProgress::Downloading { downloaded } => {
                pb.set_position(downloaded);
            }
            DataProgress::Validating => {
                pb.set_style(
                    ProgressStyle::with_template("{spinner:.green} {prefix} {msg}")
                        .expect("Failed to create spinner style template"),
                );
                pb.set_message("Validating annotations...");
            }
        };

        match manager
            .download_signal_peptides(proteome, force, progress_callback)
            .await
        {
            Ok(DownloadOutcome::Downloaded { path, entries }) => {
                pb.finish_and_clear();
                println!(
                    "✓ {}: {} signal peptide(s) cached at {}",
                    proteome,
                    entries,
                    path.display()
                );
            }
            Ok(DownloadOutcome::Skipped { path }) => {
                pb.finish_and_clear();
                println!(
                    "- {}: already cached at {} (use --force to re-download)",
                    proteome,
                    path.display()
                );
            }
            Err(e) => {
                pb.abandon_with_message("✗ Download failed.");
                return Err(e);
            }
        }
    }
    Ok(())
}

fn handle_path() -> Result<()> {
    let manager = DataManager::new()?;
    println!("{}", manager.get_data_path().display());
    Ok(())
}

fn handle_set_path(path: PathBuf) -> Result<()> {
    let absolute = std::path::absolute(&path)?;
    info!("Setting custom signal-peptide directory to {:?}", &absolute);
    DataManager::set_custom_path(&absolute)?;
    println!("✓ Signal-peptide directory set to: {}", absolute.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    DataManager::reset_path()?;
    let manager = DataManager::new()?;
    println!(
        "✓ Signal-peptide directory reset to the default: {}",
        manager.get_data_path().display()
    );
    Ok(())
}
