use crate::math::matrix::MatrixHelper;
use crate::prelude::{HeatmapError, HeatmapResult, Interpolator};
use crate::processing::aggregate::MetricColumn;
use crate::survey::Coordinate;
use ndarray::{Array1, Array2};

/// Relative tolerance for the post-fit residual check at the sample points.
const RESIDUAL_TOLERANCE: f64 = 1e-6;

/// Exact radial-basis interpolant with the linear kernel `phi(r) = r`.
///
/// The model is `f(p) = c + sum_i w_i * |p - p_i|` with `sum_i w_i = 0`, which
/// reproduces every sample exactly and returns `c` everywhere for constant input.
#[derive(Debug, Clone)]
pub struct RbfInterpolator {
    centers: Vec<Coordinate>,
    weights: Array1<f64>,
    offset: f64,
}

impl RbfInterpolator {
    pub fn fit(coordinates: &[Coordinate], values: &[f64]) -> HeatmapResult<Self> {
        if coordinates.len() != values.len() {
            return Err(HeatmapError::Data(format!(
                "{} coordinates but {} values",
                coordinates.len(),
                values.len()
            )));
        }
        if coordinates.is_empty() {
            return Err(HeatmapError::Data("no samples to interpolate".into()));
        }

        let (centers, samples) = merge_duplicates(coordinates, values)?;
        let n = centers.len();

        // Closed-form solution: all weights vanish and the offset carries the value.
        if samples.iter().all(|&v| v == samples[0]) {
            return Ok(Self {
                weights: Array1::zeros(n),
                offset: samples[0],
                centers,
            });
        }

        let mut system = Array2::<f64>::zeros((n + 1, n + 1));
        for (i, ci) in centers.iter().enumerate() {
            for (j, cj) in centers.iter().enumerate().skip(i + 1) {
                let r = ci.distance(cj);
                system[[i, j]] = r;
                system[[j, i]] = r;
            }
            system[[i, n]] = 1.0;
            system[[n, i]] = 1.0;
        }
        let mut rhs = Array1::<f64>::zeros(n + 1);
        for (i, &value) in samples.iter().enumerate() {
            rhs[i] = value;
        }

        let solution = MatrixHelper::solve(system.view(), rhs.view())?;
        let model = Self {
            centers,
            weights: solution.slice(ndarray::s![..n]).to_owned(),
            offset: solution[n],
        };
        model.check_residuals(&samples)?;
        Ok(model)
    }

    pub fn fit_column(column: &MetricColumn<'_>) -> HeatmapResult<Self> {
        Self::fit(column.coordinates, column.values)
    }

    pub fn centers(&self) -> &[Coordinate] {
        &self.centers
    }

    fn check_residuals(&self, samples: &[f64]) -> HeatmapResult<()> {
        let scale = samples.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        for (center, &expected) in self.centers.iter().zip(samples) {
            let got = self.evaluate(center.x, center.y);
            if !got.is_finite() || (got - expected).abs() > RESIDUAL_TOLERANCE * scale {
                return Err(HeatmapError::Numerical(format!(
                    "ill-conditioned fit: ({}, {}) reproduces {} instead of {}",
                    center.x, center.y, got, expected
                )));
            }
        }
        Ok(())
    }
}

impl Interpolator for RbfInterpolator {
    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let query = Coordinate::new(x, y);
        self.centers
            .iter()
            .zip(self.weights.iter())
            .fold(self.offset, |acc, (center, weight)| {
                acc + weight * query.distance(center)
            })
    }
}

/// Collapses coincident samples that agree; coincident samples that disagree have no
/// exact interpolant.
fn merge_duplicates(
    coordinates: &[Coordinate],
    values: &[f64],
) -> HeatmapResult<(Vec<Coordinate>, Vec<f64>)> {
    let mut centers: Vec<Coordinate> = Vec::with_capacity(coordinates.len());
    let mut samples: Vec<f64> = Vec::with_capacity(values.len());

    for (&coordinate, &value) in coordinates.iter().zip(values) {
        match centers.iter().position(|c| *c == coordinate) {
            Some(existing) if samples[existing] == value => {}
            Some(existing) => {
                return Err(HeatmapError::Numerical(format!(
                    "coincident samples at ({}, {}) disagree: {} vs {}",
                    coordinate.x, coordinate.y, samples[existing], value
                )))
            }
            None => {
                centers.push(coordinate);
                samples.push(value);
            }
        }
    }

    Ok((centers, samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn coords(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points.iter().map(|&(x, y)| Coordinate::new(x, y)).collect()
    }

    #[test]
    fn constant_samples_give_constant_surface() {
        let centers = coords(&[
            (10.0, 10.0),
            (50.0, 20.0),
            (80.0, 70.0),
            (30.0, 90.0),
            (60.0, 45.0),
            (0.0, 0.0),
            (0.0, 100.0),
            (100.0, 0.0),
            (100.0, 100.0),
        ]);
        let values = vec![-50.0; centers.len()];
        let model = RbfInterpolator::fit(&centers, &values).unwrap();

        for &(x, y) in &[(0.0, 0.0), (5.0, 95.0), (42.0, 17.0), (100.0, 100.0), (73.5, 12.25)] {
            assert_eq!(model.evaluate(x, y), -50.0);
        }
    }

    #[test]
    fn fit_reproduces_random_samples_exactly() {
        let mut rng = StdRng::seed_from_u64(7);
        let centers: Vec<Coordinate> = (0..40)
            .map(|_| Coordinate::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0)))
            .collect();
        let values: Vec<f64> = (0..40).map(|_| rng.gen_range(-90.0..-30.0)).collect();

        let model = RbfInterpolator::fit(&centers, &values).unwrap();
        for (center, expected) in centers.iter().zip(&values) {
            assert!((model.evaluate(center.x, center.y) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn surface_is_linear_between_two_samples() {
        let centers = coords(&[(0.0, 0.0), (10.0, 0.0)]);
        let model = RbfInterpolator::fit(&centers, &[0.0, 10.0]).unwrap();
        assert!((model.evaluate(2.5, 0.0) - 2.5).abs() < 1e-12);
        assert!((model.evaluate(7.0, 0.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn single_sample_is_a_constant_model() {
        let model = RbfInterpolator::fit(&coords(&[(3.0, 4.0)]), &[12.0]).unwrap();
        assert_eq!(model.evaluate(100.0, -20.0), 12.0);
    }

    #[test]
    fn conflicting_coincident_samples_fail_numerically() {
        let centers = coords(&[(5.0, 5.0), (5.0, 5.0), (20.0, 1.0), (0.0, 30.0)]);
        let err = RbfInterpolator::fit(&centers, &[-40.0, -60.0, -50.0, -55.0]).unwrap_err();
        assert!(matches!(err, HeatmapError::Numerical(_)));
    }

    #[test]
    fn agreeing_coincident_samples_are_merged() {
        let centers = coords(&[(0.0, 0.0), (0.0, 0.0), (20.0, 1.0), (0.0, 30.0)]);
        let model = RbfInterpolator::fit(&centers, &[-60.0, -60.0, -50.0, -55.0]).unwrap();
        assert_eq!(model.centers().len(), 3);
    }

    #[test]
    fn mismatched_lengths_are_a_data_error() {
        let err = RbfInterpolator::fit(&coords(&[(1.0, 1.0)]), &[]).unwrap_err();
        assert!(matches!(err, HeatmapError::Data(_)));
    }
}
