use crate::math::stats::StatsHelper;
use crate::prelude::{HeatmapError, HeatmapResult};
use crate::survey::{Coordinate, Dataset, Metric};

/// Number of synthetic corner points appended after the real ones.
pub const PADDING_POINTS: usize = 4;

/// Per-metric value sequences aligned index-for-index with a shared coordinate list.
///
/// The first `real_len` entries are the surveyed points in dataset order, followed by
/// the four image corners `(0,0)`, `(0,H)`, `(W,0)`, `(W,H)`. Each corner carries the
/// minimum real value of the metric so the interpolant stays pessimistic where no
/// measurement exists.
#[derive(Debug, Clone)]
pub struct MetricTable {
    coordinates: Vec<Coordinate>,
    real_len: usize,
    columns: [Result<Vec<f64>, String>; Metric::COUNT],
}

/// Borrowed view of one metric's padded sequence.
#[derive(Debug, Clone, Copy)]
pub struct MetricColumn<'a> {
    pub metric: Metric,
    pub coordinates: &'a [Coordinate],
    pub values: &'a [f64],
    pub real_len: usize,
}

impl<'a> MetricColumn<'a> {
    pub fn real_coordinates(&self) -> &'a [Coordinate] {
        &self.coordinates[..self.real_len]
    }

    pub fn real_values(&self) -> &'a [f64] {
        &self.values[..self.real_len]
    }

    pub fn padding_values(&self) -> &'a [f64] {
        &self.values[self.real_len..]
    }
}

impl MetricTable {
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn real_len(&self) -> usize {
        self.real_len
    }

    /// Padded sequence for `metric`, or the data error recorded while aggregating it.
    pub fn column(&self, metric: Metric) -> HeatmapResult<MetricColumn<'_>> {
        match &self.columns[metric.index()] {
            Ok(values) => Ok(MetricColumn {
                metric,
                coordinates: &self.coordinates,
                values,
                real_len: self.real_len,
            }),
            Err(reason) => Err(HeatmapError::Data(reason.clone())),
        }
    }
}

/// Single-pass reshaping of a dataset into the per-metric table.
pub struct DataAggregator;

impl DataAggregator {
    pub fn aggregate(dataset: &Dataset) -> HeatmapResult<MetricTable> {
        if dataset.is_empty() {
            return Err(HeatmapError::Data(
                "dataset has no measurement points; minimum is undefined".into(),
            ));
        }

        let width = dataset.width() as f64;
        let height = dataset.height() as f64;
        let mut coordinates: Vec<Coordinate> =
            dataset.points().iter().map(|point| point.position).collect();
        let real_len = coordinates.len();
        coordinates.extend([
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, height),
            Coordinate::new(width, 0.0),
            Coordinate::new(width, height),
        ]);

        let columns = Metric::ALL.map(|metric| Self::collect_column(dataset, metric));

        Ok(MetricTable {
            coordinates,
            real_len,
            columns,
        })
    }

    fn collect_column(dataset: &Dataset, metric: Metric) -> Result<Vec<f64>, String> {
        let mut values = Vec::with_capacity(dataset.len() + PADDING_POINTS);
        for (idx, point) in dataset.points().iter().enumerate() {
            match point.value(metric) {
                Some(value) if value.is_finite() => values.push(value),
                Some(value) => {
                    return Err(format!(
                        "record {} has non-finite {} value {}",
                        idx, metric, value
                    ))
                }
                None => return Err(format!("record {} is missing {}", idx, metric)),
            }
        }

        let floor = StatsHelper::min(&values)
            .ok_or_else(|| format!("no values collected for {}", metric))?;
        values.extend([floor; PADDING_POINTS]);
        Ok(values)
    }
}
