use crate::math::stats::StatsHelper;
use crate::prelude::{HeatmapError, HeatmapResult, Interpolator};
use ndarray::{Array1, Array2};

/// Regular sampling lattice over the image extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub width: u32,
    pub height: u32,
    pub num_x: usize,
    pub num_y: usize,
}

impl GridSpec {
    /// `num_x = width / divisor`; `num_y` keeps the image aspect ratio.
    pub fn for_image(width: u32, height: u32, divisor: usize) -> HeatmapResult<Self> {
        if divisor == 0 {
            return Err(HeatmapError::InvalidGrid("grid divisor must be positive".into()));
        }
        if width == 0 || height == 0 {
            return Err(HeatmapError::InvalidGrid(format!(
                "image extent {}x{} has no area",
                width, height
            )));
        }

        let num_x = width as usize / divisor;
        let aspect = width as f64 / height as f64;
        let num_y = (num_x as f64 / aspect) as usize;
        if num_x == 0 || num_y == 0 {
            return Err(HeatmapError::InvalidGrid(format!(
                "{}x{} image yields an empty {}x{} grid",
                width, height, num_x, num_y
            )));
        }

        Ok(Self {
            width,
            height,
            num_x,
            num_y,
        })
    }

    pub fn xs(&self) -> Array1<f64> {
        Array1::from(StatsHelper::linspace(0.0, self.width as f64, self.num_x))
    }

    pub fn ys(&self) -> Array1<f64> {
        Array1::from(StatsHelper::linspace(0.0, self.height as f64, self.num_y))
    }
}

/// Interpolated scalar field of shape `(num_y, num_x)`; row index grows with image y.
#[derive(Debug, Clone)]
pub struct GridField {
    xs: Array1<f64>,
    ys: Array1<f64>,
    values: Array2<f64>,
}

impl GridField {
    pub fn new(xs: Array1<f64>, ys: Array1<f64>, values: Array2<f64>) -> HeatmapResult<Self> {
        if values.dim() != (ys.len(), xs.len()) {
            return Err(HeatmapError::InvalidGrid(format!(
                "field shape {:?} does not match {} rows x {} columns",
                values.dim(),
                ys.len(),
                xs.len()
            )));
        }
        Ok(Self { xs, ys, values })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn xs(&self) -> &Array1<f64> {
        &self.xs
    }

    pub fn ys(&self) -> &Array1<f64> {
        &self.ys
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Bilinear lookup at an image-space position, clamped to the grid extent.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let (rows, cols) = self.shape();
        let (c0, c1, tx) = bracket(&self.xs, x, cols);
        let (r0, r1, ty) = bracket(&self.ys, y, rows);

        let top = self.values[[r0, c0]] * (1.0 - tx) + self.values[[r0, c1]] * tx;
        let bottom = self.values[[r1, c0]] * (1.0 - tx) + self.values[[r1, c1]] * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

/// Lower/upper indices around `pos` on an evenly spaced axis, plus the blend factor.
fn bracket(axis: &Array1<f64>, pos: f64, len: usize) -> (usize, usize, f64) {
    if len < 2 {
        return (0, 0, 0.0);
    }
    let start = axis[0];
    let step = (axis[len - 1] - start) / (len - 1) as f64;
    if step <= 0.0 {
        return (0, 0, 0.0);
    }
    let t = ((pos - start) / step).clamp(0.0, (len - 1) as f64);
    let lower = (t.floor() as usize).min(len - 2);
    (lower, lower + 1, t - lower as f64)
}

/// Evaluates an interpolator on the lattice described by a [`GridSpec`].
pub struct GridSampler {
    spec: GridSpec,
}

impl GridSampler {
    pub fn new(spec: GridSpec) -> Self {
        Self { spec }
    }

    pub fn sample<I: Interpolator + ?Sized>(&self, model: &I) -> HeatmapResult<GridField> {
        let xs = self.spec.xs();
        let ys = self.spec.ys();
        let values = Array2::from_shape_fn((self.spec.num_y, self.spec.num_x), |(row, col)| {
            model.evaluate(xs[col], ys[row])
        });

        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(HeatmapError::Numerical(format!(
                "interpolated field contains non-finite value {}",
                bad
            )));
        }

        GridField::new(xs, ys, values)
    }
}
