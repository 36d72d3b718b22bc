use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// Maps an abundance to the peak optical density of its band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityTransform {
    #[default]
    Log1p,
    Sqrt,
    Linear,
}

impl IntensityTransform {
    pub fn apply(self, abundance: f64) -> f64 {
        let abundance = abundance.max(0.0);
        match self {
            Self::Log1p => abundance.ln_1p(),
            Self::Sqrt => abundance.sqrt(),
            Self::Linear => abundance,
        }
    }
}

/// How the accumulated density is scaled before it is written to pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// Divide by [`GelConfig::saturation`], so gels of one run are comparable.
    #[default]
    Fixed,
    /// Divide by the darkest point of the canvas.
    Peak,
}

pub const DEFAULT_MARKER_LADDER: [f64; 10] =
    [250.0, 150.0, 100.0, 75.0, 50.0, 37.0, 25.0, 20.0, 15.0, 10.0];

#[derive(Debug, Clone, PartialEq)]
pub struct GelConfig {
    pub lane_width: u32,
    pub lane_gap: u32,
    pub height: u32,
    pub top_margin: u32,
    pub bottom_margin: u32,
    pub min_kda: f64,
    pub max_kda: f64,
    pub band_sigma: f64,
    /// Relative sigma increase at the bottom of the lane.
    pub sigma_growth: f64,
    pub edge_softness: f64,
    pub intensity: IntensityTransform,
    pub saturation: f64,
    pub normalization: Normalization,
    pub marker_kda: Vec<f64>,
    pub marker_intensity: f64,
}

impl Default for GelConfig {
    fn default() -> Self {
        Self {
            lane_width: 96,
            lane_gap: 16,
            height: 480,
            top_margin: 24,
            bottom_margin: 24,
            min_kda: 10.0,
            max_kda: 250.0,
            band_sigma: 2.5,
            sigma_growth: 0.5,
            edge_softness: 2.0,
            intensity: IntensityTransform::Log1p,
            saturation: 5.0,
            normalization: Normalization::Fixed,
            marker_kda: DEFAULT_MARKER_LADDER.to_vec(),
            marker_intensity: 2.5,
        }
    }
}

impl GelConfig {
    pub fn builder() -> GelConfigBuilder {
        GelConfigBuilder::new()
    }

    /// Vertical extent available for band migration.
    pub fn run_length(&self) -> f64 {
        f64::from(
            self.height
                .saturating_sub(self.top_margin)
                .saturating_sub(self.bottom_margin),
        )
    }
}

/// Builds a validated [`GelConfig`]; unset parameters keep their defaults.
#[derive(Default)]
pub struct GelConfigBuilder {
    lane_width: Option<u32>,
    lane_gap: Option<u32>,
    height: Option<u32>,
    top_margin: Option<u32>,
    bottom_margin: Option<u32>,
    min_kda: Option<f64>,
    max_kda: Option<f64>,
    band_sigma: Option<f64>,
    sigma_growth: Option<f64>,
    edge_softness: Option<f64>,
    intensity: Option<IntensityTransform>,
    saturation: Option<f64>,
    normalization: Option<Normalization>,
    marker_kda: Option<Vec<f64>>,
    marker_intensity: Option<f64>,
}

impl GelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane_width(mut self, px: u32) -> Self {
        self.lane_width = Some(px);
        self
    }
    pub fn lane_gap(mut self, px: u32) -> Self {
        self.lane_gap = Some(px);
        self
    }
    pub fn height(mut self, px: u32) -> Self {
        self.height = Some(px);
        self
    }
    pub fn top_margin(mut self, px: u32) -> Self {
        self.top_margin = Some(px);
        self
    }
    pub fn bottom_margin(mut self, px: u32) -> Self {
        self.bottom_margin = Some(px);
        self
    }
    pub fn min_kda(mut self, kda: f64) -> Self {
        self.min_kda = Some(kda);
        self
    }
    pub fn max_kda(mut self, kda: f64) -> Self {
        self.max_kda = Some(kda);
        self
    }
    pub fn band_sigma(mut self, px: f64) -> Self {
        self.band_sigma = Some(px);
        self
    }
    pub fn sigma_growth(mut self, growth: f64) -> Self {
        self.sigma_growth = Some(growth);
        self
    }
    pub fn edge_softness(mut self, px: f64) -> Self {
        self.edge_softness = Some(px);
        self
    }
    pub fn intensity(mut self, transform: IntensityTransform) -> Self {
        self.intensity = Some(transform);
        self
    }
    pub fn saturation(mut self, saturation: f64) -> Self {
        self.saturation = Some(saturation);
        self
    }
    pub fn normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = Some(normalization);
        self
    }
    pub fn marker_kda(mut self, ladder: Vec<f64>) -> Self {
        self.marker_kda = Some(ladder);
        self
    }
    pub fn marker_intensity(mut self, intensity: f64) -> Self {
        self.marker_intensity = Some(intensity);
        self
    }

    pub fn build(self) -> Result<GelConfig, ConfigError> {
        let defaults = GelConfig::default();
        let config = GelConfig {
            lane_width: self.lane_width.unwrap_or(defaults.lane_width),
            lane_gap: self.lane_gap.unwrap_or(defaults.lane_gap),
            height: self.height.unwrap_or(defaults.height),
            top_margin: self.top_margin.unwrap_or(defaults.top_margin),
            bottom_margin: self.bottom_margin.unwrap_or(defaults.bottom_margin),
            min_kda: self.min_kda.unwrap_or(defaults.min_kda),
            max_kda: self.max_kda.unwrap_or(defaults.max_kda),
            band_sigma: self.band_sigma.unwrap_or(defaults.band_sigma),
            sigma_growth: self.sigma_growth.unwrap_or(defaults.sigma_growth),
            edge_softness: self.edge_softness.unwrap_or(defaults.edge_softness),
            intensity: self.intensity.unwrap_or(defaults.intensity),
            saturation: self.saturation.unwrap_or(defaults.saturation),
            normalization: self.normalization.unwrap_or(defaults.normalization),
            marker_kda: self.marker_kda.unwrap_or(defaults.marker_kda),
            marker_intensity: self.marker_intensity.unwrap_or(defaults.marker_intensity),
        };
        validate(&config)?;
        Ok(config)
    }
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        parameter,
        reason: reason.into(),
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(parameter, format!("{value} is not a positive number")))
    }
}

fn non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(parameter, format!("{value} is negative or not finite")))
    }
}

fn validate(config: &GelConfig) -> Result<(), ConfigError> {
    if config.lane_width == 0 {
        return Err(invalid("lane_width", "must be at least 1 px"));
    }
    if config.height <= config.top_margin.saturating_add(config.bottom_margin) {
        return Err(invalid(
            "height",
            format!(
                "{} px leaves no room between margins of {} and {} px",
                config.height, config.top_margin, config.bottom_margin
            ),
        ));
    }
    positive("min_kda", config.min_kda)?;
    positive("max_kda", config.max_kda)?;
    if config.max_kda <= config.min_kda {
        return Err(invalid(
            "max_kda",
            format!("{} must exceed min_kda ({})", config.max_kda, config.min_kda),
        ));
    }
    positive("band_sigma", config.band_sigma)?;
    non_negative("sigma_growth", config.sigma_growth)?;
    non_negative("edge_softness", config.edge_softness)?;
    positive("saturation", config.saturation)?;
    non_negative("marker_intensity", config.marker_intensity)?;
    if config.marker_kda.is_empty() {
        return Err(ConfigError::MissingParameter("marker_kda"));
    }
    for &kda in &config.marker_kda {
        positive("marker_kda", kda)?;
    }
    Ok(())
}
