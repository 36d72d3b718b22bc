use super::load_catalog;
use crate::cli::RunArgs;
use crate::config::PartialWorkflowConfig;
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use ewoks::{
    core::io::{fasta::FastaFile, signal::DirectorySignalSource, traits::PopulationFile},
    engine::{error::EngineError, gel::GelImage, gel::GelRenderer, progress::ProgressReporter},
    workflows::{
        dispatch::{ModuleDispatcher, WorkflowContext},
        pipeline,
    },
};
use std::fs;
use std::path::Path;
use tracing::info;

pub async fn run(args: RunArgs) -> Result<()> {
    info!("Initializing data manager...");
    let data_manager = DataManager::new()?;

    let partial_config = PartialWorkflowConfig::from_file(&args.workflow)?;
    info!("Merging workflow file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, &data_manager)?;

    let catalog = load_catalog(args.catalog.as_deref())?;
    let renderer = GelRenderer::new(config.gel.clone()).with_marker(config.marker);
    let dispatcher = ModuleDispatcher::with_builtin_modules(renderer);
    dispatcher.validate(&catalog)?;

    fs::create_dir_all(&args.output)?;
    let mut ctx = WorkflowContext::new(
        config.base_dir.clone(),
        Box::new(DirectorySignalSource::new(config.signal_dir.clone())),
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Running workflow with {} step(s)...", config.steps.len());
    let results = tokio::task::block_in_place(|| {
        pipeline::run(&config.steps, &dispatcher, &catalog, &mut ctx, &reporter)
    })?;

    for (index, step) in results.iter().enumerate() {
        let path = args
            .output
            .join(format!("step-{:02}-{}.png", index + 1, file_stem(&step.step_id)));
        save_gel(&step.result.image, &path)?;
        println!(
            "  {}. {} ({}): {}",
            index + 1,
            step.step_id,
            step.result.module_id,
            step.result.outcome.message
        );
        for (setting, value) in &step.result.outcome.resolved {
            println!("       {setting} = {value}");
        }
    }

    let combined_path = args.output.join("gel.png");
    let lanes = pipeline::lanes(&results);
    let combined = dispatcher.renderer().render_lanes(&lanes);
    save_gel(&combined, &combined_path)?;

    let population_path = args.output.join("final.fasta");
    FastaFile::write_to_path(&ctx.registry, &population_path).map_err(EngineError::from)?;

    println!(
        "✓ Combined gel ({}) written to: {}\n✓ Final population ({} proteins) written to: {}",
        lane_summary(dispatcher.renderer(), lanes.len()),
        combined_path.display(),
        ctx.registry.len(),
        population_path.display()
    );
    Ok(())
}

/// Encodes a gel raster as an 8-bit grayscale PNG.
fn save_gel(gel: &GelImage, path: &Path) -> Result<()> {
    let buffer = image::GrayImage::from_raw(gel.width, gel.height, gel.pixels.clone())
        .ok_or_else(|| {
            CliError::Other(anyhow::anyhow!(
                "Gel raster of {}x{} does not match its {} pixels",
                gel.width,
                gel.height,
                gel.pixels.len()
            ))
        })?;
    buffer.save(path)?;
    info!("Wrote {}x{} gel to {:?}", gel.width, gel.height, path);
    Ok(())
}

fn lane_summary(renderer: &GelRenderer, lanes: usize) -> String {
    if renderer.has_marker() {
        format!("{lanes} lane(s) plus marker")
    } else {
        format!("{lanes} lane(s)")
    }
}

fn file_stem(step_id: &str) -> String {
    step_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn step_ids_become_safe_file_stems() {
        assert_eq!(file_stem("sec-75"), "sec-75");
        assert_eq!(file_stem("../load step"), "___load_step");
    }

    #[test]
    fn lane_summary_mentions_the_marker_lane() {
        let plain = GelRenderer::new(Default::default());
        assert_eq!(lane_summary(&plain, 3), "3 lane(s)");
        assert_eq!(
            lane_summary(&plain.with_marker(true), 3),
            "3 lane(s) plus marker"
        );
    }

    #[test]
    fn gels_are_written_as_grayscale_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gel.png");
        let mut gel = GelImage::blank(4, 3);
        gel.pixels[5] = 40;

        save_gel(&gel, &path).unwrap();

        let decoded = image::open(&path).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(1, 1).0, [40]);
        assert_eq!(decoded.get_pixel(0, 0).0, [255]);
    }

    #[test]
    fn mismatched_rasters_are_rejected() {
        let dir = tempdir().unwrap();
        let gel = GelImage {
            width: 4,
            height: 3,
            pixels: vec![255; 5],
        };

        let result = save_gel(&gel, &dir.path().join("broken.png"));
        assert!(matches!(result, Err(CliError::Other(_))));
    }
}
