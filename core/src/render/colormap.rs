use crate::math::stats::StatsHelper;
use crate::prelude::{HeatmapError, HeatmapResult};
use crate::processing::grid::GridField;
use image::Rgba;
use palette::{Mix, Srgb};

/// ColorBrewer RdYlBu stops, red end first.
const RED_YELLOW_BLUE: [(u8, u8, u8); 11] = [
    (165, 0, 38),
    (215, 48, 39),
    (244, 109, 67),
    (253, 174, 97),
    (254, 224, 144),
    (255, 255, 191),
    (224, 243, 248),
    (171, 217, 233),
    (116, 173, 209),
    (69, 117, 180),
    (49, 54, 149),
];

/// Piecewise-linear palette sampled over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct DivergingPalette {
    stops: Vec<Srgb<f32>>,
}

impl DivergingPalette {
    /// Red at 0, yellow at 0.5, blue at 1.
    pub fn red_yellow_blue() -> Self {
        let stops = RED_YELLOW_BLUE
            .iter()
            .map(|&(r, g, b)| Srgb::new(r, g, b).into_format::<f32>())
            .collect();
        Self { stops }
    }

    /// Blue at 0, red at 1: high values read hot. Used for every metric alike.
    pub fn heat() -> Self {
        Self::red_yellow_blue().reversed()
    }

    pub fn reversed(mut self) -> Self {
        self.stops.reverse();
        self
    }

    pub fn sample(&self, t: f64) -> Srgb<u8> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
        let span = (self.stops.len() - 1) as f64;
        let pos = t * span;
        let lower = (pos.floor() as usize).min(self.stops.len() - 2);
        let factor = (pos - lower as f64) as f32;
        self.stops[lower]
            .mix(self.stops[lower + 1], factor)
            .into_format::<u8>()
    }
}

/// Linear min-max scaling into `[0, 1]` with clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    min: f64,
    max: f64,
}

impl Normalizer {
    pub fn new(min: f64, max: f64) -> HeatmapResult<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(HeatmapError::Data(format!(
                "cannot normalize over range [{}, {}]",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn from_values(values: &[f64]) -> HeatmapResult<Self> {
        match (StatsHelper::min(values), StatsHelper::max(values)) {
            (Some(min), Some(max)) => Self::new(min, max),
            _ => Err(HeatmapError::Data("cannot normalize an empty sequence".into())),
        }
    }

    pub fn from_field(field: &GridField) -> HeatmapResult<Self> {
        Self::new(field.min(), field.max())
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Zero-variance ranges map every value to the midpoint.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.5;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Normalizer paired with the shared heat palette.
#[derive(Debug, Clone)]
pub struct ColorMapper {
    normalizer: Normalizer,
    palette: DivergingPalette,
}

impl ColorMapper {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            palette: DivergingPalette::heat(),
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn intensity(&self, value: f64) -> f64 {
        self.normalizer.normalize(value)
    }

    pub fn color_at(&self, t: f64) -> Srgb<u8> {
        self.palette.sample(t)
    }

    pub fn color(&self, value: f64) -> Srgb<u8> {
        self.palette.sample(self.intensity(value))
    }

    pub fn rgba(&self, value: f64, alpha: u8) -> Rgba<u8> {
        let c = self.color(value);
        Rgba([c.red, c.green, c.blue, alpha])
    }
}
