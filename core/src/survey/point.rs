use crate::prelude::{HeatmapError, HeatmapResult};
use crate::survey::metric::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pixel-space position on the floor-plan image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Coordinate) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One network seen by the scan taken at a measurement point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanObservation {
    pub ssid: String,
    pub frequency_hz: u64,
    pub quality: f64,
}

impl ScanObservation {
    pub fn new(ssid: impl Into<String>, frequency_hz: u64, quality: f64) -> Self {
        Self {
            ssid: ssid.into(),
            frequency_hz,
            quality,
        }
    }
}

/// Measurements captured at a single surveyed location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    pub position: Coordinate,
    pub values: BTreeMap<Metric, f64>,
    pub scans: Vec<ScanObservation>,
}

impl MeasurementPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Coordinate::new(x, y),
            values: BTreeMap::new(),
            scans: Vec::new(),
        }
    }

    pub fn with_value(mut self, metric: Metric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }

    pub fn with_scan(mut self, scan: ScanObservation) -> Self {
        self.scans.push(scan);
        self
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }
}

/// Finalized survey: measurement points plus the floor-plan extent they live in.
#[derive(Debug, Clone)]
pub struct Dataset {
    points: Vec<MeasurementPoint>,
    width: u32,
    height: u32,
}

impl Dataset {
    /// Builds a dataset, rejecting points that fall outside `[0, width] x [0, height]`.
    pub fn new(points: Vec<MeasurementPoint>, width: u32, height: u32) -> HeatmapResult<Self> {
        if width == 0 || height == 0 {
            return Err(HeatmapError::Data(format!(
                "image extent {}x{} has no area",
                width, height
            )));
        }

        for (idx, point) in points.iter().enumerate() {
            let Coordinate { x, y } = point.position;
            let inside = x.is_finite()
                && y.is_finite()
                && (0.0..=width as f64).contains(&x)
                && (0.0..=height as f64).contains(&y);
            if !inside {
                return Err(HeatmapError::Data(format!(
                    "point {} at ({}, {}) lies outside the {}x{} image",
                    idx, x, y, width, height
                )));
            }
        }

        Ok(Self {
            points,
            width,
            height,
        })
    }

    pub fn points(&self) -> &[MeasurementPoint] {
        &self.points
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_accepts_points_on_the_image_border() {
        let points = vec![
            MeasurementPoint::new(0.0, 0.0),
            MeasurementPoint::new(100.0, 50.0),
        ];
        let dataset = Dataset::new(points, 100, 50).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!((dataset.width(), dataset.height()), (100, 50));
    }

    #[test]
    fn dataset_rejects_points_outside_the_image() {
        let points = vec![MeasurementPoint::new(101.0, 10.0)];
        let err = Dataset::new(points, 100, 50).unwrap_err();
        assert!(matches!(err, HeatmapError::Data(_)));
    }

    #[test]
    fn dataset_rejects_zero_area_images() {
        assert!(Dataset::new(Vec::new(), 0, 10).is_err());
    }

    #[test]
    fn builder_helpers_populate_point() {
        let point = MeasurementPoint::new(3.0, 4.0)
            .with_value(Metric::Rssi, -42.0)
            .with_scan(ScanObservation::new("lab", 2_412_000_000, 55.0));
        assert_eq!(point.value(Metric::Rssi), Some(-42.0));
        assert_eq!(point.value(Metric::Jitter), None);
        assert_eq!(point.scans.len(), 1);
        assert_eq!(point.position.distance(&Coordinate::new(0.0, 0.0)), 5.0);
    }
}
