use crate::cli::RunArgs;
use crate::data::DataManager;
use crate::error::{CliError, Result};
use ewoks::engine::config::{GelConfig, GelConfigBuilder, IntensityTransform, Normalization};
use ewoks::engine::error::EngineError;
use ewoks::workflows::pipeline::ModuleInstance;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// A fully resolved `run` configuration.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub gel: GelConfig,
    pub marker: bool,
    /// Directory relative file settings (such as FASTA paths) are resolved against.
    pub base_dir: PathBuf,
    pub signal_dir: PathBuf,
    pub steps: Vec<ModuleInstance>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialGelConfig {
    #[serde(rename = "lane-width")]
    lane_width: Option<u32>,
    #[serde(rename = "lane-gap")]
    lane_gap: Option<u32>,
    height: Option<u32>,
    #[serde(rename = "top-margin")]
    top_margin: Option<u32>,
    #[serde(rename = "bottom-margin")]
    bottom_margin: Option<u32>,
    #[serde(rename = "min-kda")]
    min_kda: Option<f64>,
    #[serde(rename = "max-kda")]
    max_kda: Option<f64>,
    #[serde(rename = "band-sigma")]
    band_sigma: Option<f64>,
    #[serde(rename = "sigma-growth")]
    sigma_growth: Option<f64>,
    #[serde(rename = "edge-softness")]
    edge_softness: Option<f64>,
    intensity: Option<IntensityTransform>,
    saturation: Option<f64>,
    normalization: Option<Normalization>,
    marker: Option<bool>,
    #[serde(rename = "marker-kda")]
    marker_kda: Option<Vec<f64>>,
    #[serde(rename = "marker-intensity")]
    marker_intensity: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSignalPeptideConfig {
    directory: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialWorkflowConfig {
    gel: Option<PartialGelConfig>,
    #[serde(rename = "signal-peptides")]
    signal_peptides: Option<PartialSignalPeptideConfig>,
    #[serde(default)]
    steps: Vec<ModuleInstance>,
}

impl PartialWorkflowConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading workflow from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Layers `-S` values and then explicit CLI flags over the file.
    pub fn merge_with_cli(
        mut self,
        args: &RunArgs,
        data_manager: &DataManager,
    ) -> Result<WorkflowConfig> {
        self.apply_set_values(&args.set_values)?;

        if self.steps.is_empty() {
            return Err(CliError::Config(
                "The workflow defines no steps. Add at least one [[steps]] table.".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(step) = self.steps.iter().find(|s| !seen.insert(s.id.as_str())) {
            return Err(CliError::Config(format!(
                "Step id '{}' is used more than once.",
                step.id
            )));
        }

        let base_dir = args
            .workflow
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let gel_config = self.gel.take().unwrap_or_default();
        let marker = !args.no_marker && gel_config.marker.unwrap_or(true);
        let gel = Self::build_gel_config(gel_config, args)?;

        let file_signal_dir = self
            .signal_peptides
            .take()
            .and_then(|s| s.directory)
            .map(|dir| base_dir.join(dir));
        let signal_dir = match (&args.signal_dir, file_signal_dir) {
            (Some(cli_dir), _) => cli_dir.clone(),
            (None, Some(file_dir)) => file_dir,
            (None, None) => data_manager.get_data_path().to_path_buf(),
        };

        Ok(WorkflowConfig {
            gel,
            marker,
            base_dir,
            signal_dir,
            steps: self.steps,
        })
    }

    fn build_gel_config(partial: PartialGelConfig, args: &RunArgs) -> Result<GelConfig> {
        let mut builder = GelConfigBuilder::new();
        macro_rules! apply {
            ($($field:ident),*) => {
                $(if let Some(value) = partial.$field {
                    builder = builder.$field(value);
                })*
            };
        }
        apply!(
            lane_width,
            lane_gap,
            height,
            top_margin,
            bottom_margin,
            min_kda,
            max_kda,
            band_sigma,
            sigma_growth,
            edge_softness,
            intensity,
            saturation,
            normalization,
            marker_kda,
            marker_intensity
        );

        if let Some(height) = args.height {
            builder = builder.height(height);
        }
        if let Some(min_kda) = args.min_kda {
            builder = builder.min_kda(min_kda);
        }
        if let Some(max_kda) = args.max_kda {
            builder = builder.max_kda(max_kda);
        }

        builder
            .build()
            .map_err(|e| CliError::Engine(EngineError::from(e)))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            if key == "signal-peptides.directory" {
                self.signal_peptides
                    .get_or_insert_with(Default::default)
                    .directory = Some(PathBuf::from(value_str));
                continue;
            }

            let gel = self.gel.get_or_insert_with(Default::default);
            match key {
                "gel.lane-width" => gel.lane_width = Some(parse_value(key, value_str)?),
                "gel.lane-gap" => gel.lane_gap = Some(parse_value(key, value_str)?),
                "gel.height" => gel.height = Some(parse_value(key, value_str)?),
                "gel.top-margin" => gel.top_margin = Some(parse_value(key, value_str)?),
                "gel.bottom-margin" => gel.bottom_margin = Some(parse_value(key, value_str)?),
                "gel.min-kda" => gel.min_kda = Some(parse_value(key, value_str)?),
                "gel.max-kda" => gel.max_kda = Some(parse_value(key, value_str)?),
                "gel.band-sigma" => gel.band_sigma = Some(parse_value(key, value_str)?),
                "gel.sigma-growth" => gel.sigma_growth = Some(parse_value(key, value_str)?),
                "gel.edge-softness" => gel.edge_softness = Some(parse_value(key, value_str)?),
                "gel.saturation" => gel.saturation = Some(parse_value(key, value_str)?),
                "gel.marker-intensity" => {
                    gel.marker_intensity = Some(parse_value(key, value_str)?)
                }
                "gel.marker" => gel.marker = Some(parse_value(key, value_str)?),
                "gel.intensity" => gel.intensity = Some(parse_keyword(key, value_str)?),
                "gel.normalization" => gel.normalization = Some(parse_keyword(key, value_str)?),
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

fn parse_keyword<T: DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    toml::Value::String(value.trim().to_string())
        .try_into()
        .map_err(|_| CliError::Config(format!("Unrecognized value for {}: {}", key, value)))
}
