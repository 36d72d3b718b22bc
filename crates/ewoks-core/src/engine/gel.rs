use super::config::{GelConfig, Normalization};
use crate::core::models::protein::ProteinEntity;
use rayon::prelude::*;
use tracing::debug;

/// Anything that can contribute a band to a gel lane.
pub trait BandSource {
    /// Molecular weight in kDa.
    fn weight_kda(&self) -> f64;
    fn abundance(&self) -> f64;
}

impl BandSource for ProteinEntity {
    fn weight_kda(&self) -> f64 {
        self.weight()
    }

    fn abundance(&self) -> f64 {
        ProteinEntity::abundance(self)
    }
}

impl<T: BandSource + ?Sized> BandSource for &T {
    fn weight_kda(&self) -> f64 {
        (**self).weight_kda()
    }

    fn abundance(&self) -> f64 {
        (**self).abundance()
    }
}

/// A detached `(weight, abundance)` pair, as captured in lane snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub weight_kda: f64,
    pub abundance: f64,
}

impl Band {
    pub fn new(weight_kda: f64, abundance: f64) -> Self {
        Self {
            weight_kda,
            abundance,
        }
    }

    pub fn of<B: BandSource>(source: &B) -> Self {
        Self::new(source.weight_kda(), source.abundance())
    }
}

impl BandSource for Band {
    fn weight_kda(&self) -> f64 {
        self.weight_kda
    }

    fn abundance(&self) -> f64 {
        self.abundance
    }
}

/// One lane of a multi-lane gel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Lane {
    pub label: String,
    pub bands: Vec<Band>,
}

impl Lane {
    pub fn new(label: impl Into<String>, bands: Vec<Band>) -> Self {
        Self {
            label: label.into(),
            bands,
        }
    }

    pub fn from_sources<B: BandSource>(label: impl Into<String>, sources: &[B]) -> Self {
        Self::new(label, sources.iter().map(Band::of).collect())
    }
}

/// A single-channel raster, row-major. 255 is empty field, darker means more protein.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GelImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl GelImage {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![255; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// `true` if no pixel differs from the background.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p == 255)
    }

    /// The darkest value in the image.
    pub fn darkest(&self) -> u8 {
        self.pixels.iter().copied().min().unwrap_or(255)
    }
}

/// Horizontal placement of one lane within the canvas.
struct LaneLayout {
    left: usize,
    /// Vertical density profile, one value per row.
    profile: Vec<f64>,
}

/// Renders populations as virtual SDS-PAGE lanes.
///
/// Bands migrate on a log-mass scale between `max_kda` (top) and `min_kda` (bottom),
/// broaden toward the bottom of the lane and composite additively.
#[derive(Debug, Clone, Default)]
pub struct GelRenderer {
    config: GelConfig,
    marker: bool,
}

impl GelRenderer {
    pub fn new(config: GelConfig) -> Self {
        Self {
            config,
            marker: false,
        }
    }

    /// Prepends a molecular-weight ladder lane to [`GelRenderer::render_lanes`] output.
    pub fn with_marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }

    pub fn config(&self) -> &GelConfig {
        &self.config
    }

    pub fn has_marker(&self) -> bool {
        self.marker
    }

    /// Relative migration distance of `weight_kda` in `[0, 1]`: 0 at `max_kda`, 1 at `min_kda`.
    ///
    /// Weights outside the range, or non-positive ones, clip to the nearest edge.
    pub fn migration(&self, weight_kda: f64) -> f64 {
        if weight_kda.is_nan() || weight_kda <= 0.0 {
            return 1.0;
        }
        let log_min = self.config.min_kda.ln();
        let log_max = self.config.max_kda.ln();
        let denom = (log_max - log_min).max(1e-9);
        ((log_max - weight_kda.ln()) / denom).clamp(0.0, 1.0)
    }

    /// Vertical band center in pixels for a protein of `weight_kda`.
    pub fn lane_position(&self, weight_kda: f64) -> f64 {
        f64::from(self.config.top_margin) + self.migration(weight_kda) * self.config.run_length()
    }

    /// Draws a single lane from the given population snapshot.
    pub fn render<B: BandSource>(&self, sources: &[B]) -> GelImage {
        let bands: Vec<Band> = sources.iter().map(Band::of).collect();
        self.draw(vec![self.sample_profile(&bands)])
    }

    /// Draws several lanes side by side, with the marker lane first if enabled.
    pub fn render_lanes(&self, lanes: &[Lane]) -> GelImage {
        let mut profiles = Vec::with_capacity(lanes.len() + 1);
        if self.marker {
            profiles.push(self.marker_profile());
        }
        profiles.extend(lanes.iter().map(|lane| self.sample_profile(&lane.bands)));
        self.draw(profiles)
    }

    fn sample_profile(&self, bands: &[Band]) -> Vec<f64> {
        let peaks: Vec<(f64, f64)> = bands
            .iter()
            .filter(|b| b.abundance > 0.0)
            .map(|b| (b.weight_kda, self.config.intensity.apply(b.abundance)))
            .collect();
        self.profile(&peaks)
    }

    fn marker_profile(&self) -> Vec<f64> {
        let peaks: Vec<(f64, f64)> = self
            .config
            .marker_kda
            .iter()
            .map(|&kda| (kda, self.config.marker_intensity))
            .collect();
        self.profile(&peaks)
    }

    /// Sums Gaussian band profiles `(weight, peak)` into one density value per row.
    fn profile(&self, peaks: &[(f64, f64)]) -> Vec<f64> {
        let height = self.config.height as usize;
        let mut profile = vec![0.0; height];
        for &(weight, peak) in peaks {
            let f = self.migration(weight);
            let center = self.lane_position(weight);
            let sigma = self.config.band_sigma * (1.0 + self.config.sigma_growth * f);
            for (y, density) in profile.iter_mut().enumerate() {
                let d = (y as f64 + 0.5 - center) / sigma;
                *density += peak * (-0.5 * d * d).exp();
            }
        }
        profile
    }

    /// Flat-top horizontal profile with Gaussian shoulders, sampled at pixel center `dx`
    /// from the left lane edge.
    fn horizontal(&self, dx: f64) -> f64 {
        let width = f64::from(self.config.lane_width);
        if dx < 0.0 || dx >= width {
            return 0.0;
        }
        let softness = self.config.edge_softness;
        if softness <= 0.0 {
            return 1.0;
        }
        let inner_left = softness.min(width / 2.0);
        let inner_right = (width - softness).max(width / 2.0);
        let outside = if dx < inner_left {
            inner_left - dx
        } else if dx > inner_right {
            dx - inner_right
        } else {
            0.0
        };
        let d = outside / softness;
        (-0.5 * d * d).exp()
    }

    fn draw(&self, profiles: Vec<Vec<f64>>) -> GelImage {
        let lane_count = profiles.len() as u32;
        let pitch = self.config.lane_width + self.config.lane_gap;
        let width = (lane_count * pitch).saturating_sub(self.config.lane_gap).max(1);
        let height = self.config.height;

        let lanes: Vec<LaneLayout> = profiles
            .into_iter()
            .enumerate()
            .map(|(i, profile)| LaneLayout {
                left: i * pitch as usize,
                profile,
            })
            .collect();

        let row_len = width as usize;
        let mut density = vec![0.0f64; row_len * height as usize];
        density
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                for lane in &lanes {
                    let value = lane.profile[y];
                    if value == 0.0 {
                        continue;
                    }
                    let start = lane.left;
                    let end = (start + self.config.lane_width as usize).min(row_len);
                    for (dx, px) in row[start..end].iter_mut().enumerate() {
                        *px += value * self.horizontal(dx as f64 + 0.5);
                    }
                }
            });

        let scale = match self.config.normalization {
            Normalization::Fixed => self.config.saturation,
            Normalization::Peak => density.iter().copied().fold(0.0, f64::max),
        };

        let pixels: Vec<u8> = density
            .par_iter()
            .map(|&d| {
                let d = if scale > 0.0 { (d / scale).clamp(0.0, 1.0) } else { 0.0 };
                (255.0 * (1.0 - d)).round() as u8
            })
            .collect();

        debug!(
            "Rendered {}x{} gel with {} lane(s).",
            width, height, lane_count
        );
        GelImage {
            width,
            height,
            pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> GelRenderer {
        GelRenderer::new(GelConfig::default())
    }

    fn darkest_row(image: &GelImage) -> u32 {
        let x = image.width / 2;
        (0..image.height)
            .min_by_key(|&y| image.get(x, y).unwrap_or(255))
            .unwrap_or(0)
    }

    #[test]
    fn empty_population_renders_blank_canvas() {
        let image = renderer().render::<Band>(&[]);
        assert_eq!((image.width, image.height), (96, 480));
        assert!(image.is_blank());
    }

    #[test]
    fn zero_abundance_population_renders_blank_canvas() {
        let bands = [Band::new(66.4, 0.0), Band::new(15.0, 0.0)];
        assert!(renderer().render(&bands).is_blank());
    }

    #[test]
    fn heavier_proteins_migrate_less() {
        let r = renderer();
        assert!(r.lane_position(150.0) < r.lane_position(50.0));
        assert_eq!(r.lane_position(250.0), 24.0);
        assert_eq!(r.lane_position(10.0), 456.0);
    }

    #[test]
    fn out_of_range_weights_clip_to_edges() {
        let r = renderer();
        assert_eq!(r.lane_position(5000.0), 24.0);
        assert_eq!(r.lane_position(0.5), 456.0);
        assert_eq!(r.lane_position(0.0), 456.0);
        assert_eq!(r.lane_position(-3.0), 456.0);
    }

    #[test]
    fn band_appears_at_lane_position() {
        let r = renderer();
        let image = r.render(&[Band::new(66.4, 40.0)]);
        let expected = r.lane_position(66.4);
        let row = darkest_row(&image);
        assert!((f64::from(row) + 0.5 - expected).abs() <= 1.0);
        assert!(image.darkest() < 255);
        assert_eq!(image.get(image.width / 2, 0), Some(255));
    }

    #[test]
    fn comigrating_bands_sum() {
        let config = GelConfig::builder().saturation(10.0).build().unwrap();
        let r = GelRenderer::new(config);
        let single = r.render(&[Band::new(50.0, 3.0)]);
        let merged = r.render(&[Band::new(50.0, 3.0), Band::new(50.0, 2.0)]);
        let other = r.render(&[Band::new(50.0, 2.0)]);
        assert!(merged.darkest() < single.darkest());
        assert!(merged.darkest() < other.darkest());
        assert!(darkest_row(&merged).abs_diff(darkest_row(&single)) <= 1);
    }

    #[test]
    fn peak_normalization_saturates_darkest_point() {
        let config = GelConfig::builder()
            .normalization(Normalization::Peak)
            .build()
            .unwrap();
        let image = GelRenderer::new(config).render(&[Band::new(30.0, 0.01)]);
        assert_eq!(image.darkest(), 0);
    }

    #[test]
    fn lanes_are_laid_out_with_marker_first() {
        let r = renderer().with_marker(true);
        let lanes = vec![
            Lane::new("load", vec![Band::new(66.4, 40.0)]),
            Lane::new("sec", Vec::new()),
        ];
        let image = r.render_lanes(&lanes);
        assert_eq!(image.width, 3 * 96 + 2 * 16);

        let column_is_blank =
            |x: u32| (0..image.height).all(|y| image.get(x, y) == Some(255));
        assert!(!column_is_blank(48));
        assert!(column_is_blank(96 + 8));
        assert!(!column_is_blank(112 + 48));
        assert!(column_is_blank(224 + 48));
    }

    #[test]
    fn rendering_is_deterministic() {
        let bands: Vec<Band> = (1..40)
            .map(|i| Band::new(5.0 * f64::from(i), f64::from(i % 7)))
            .collect();
        let r = renderer().with_marker(true);
        let lanes = vec![Lane::new("a", bands.clone())];
        assert_eq!(r.render(&bands), r.render(&bands));
        assert_eq!(r.render_lanes(&lanes), r.render_lanes(&lanes));
    }

    #[test]
    fn renders_entities_by_reference() {
        let entity =
            ProteinEntity::from_record("sp|P1|A_TEST AB=4", "MKWVTFISLLFLFSSAYS").unwrap();
        let snapshot = vec![&entity];
        assert!(!renderer().render(&snapshot).is_blank());
    }
}
