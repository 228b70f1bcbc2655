use crate::prelude::{HeatmapError, HeatmapResult};
use ndarray::{Array1, ArrayView1, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Solves `a * x = b` by Gaussian elimination with partial pivoting.
    ///
    /// A pivot at or below `n * EPSILON * max|a|` is treated as singular.
    pub fn solve(a: ArrayView2<f64>, b: ArrayView1<f64>) -> HeatmapResult<Array1<f64>> {
        let n = a.nrows();
        if a.ncols() != n || b.len() != n {
            return Err(HeatmapError::Numerical(format!(
                "cannot solve {}x{} system against {} values",
                a.nrows(),
                a.ncols(),
                b.len()
            )));
        }
        if n == 0 {
            return Ok(Array1::zeros(0));
        }

        let mut m = a.to_owned();
        let mut rhs = b.to_owned();
        let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if !scale.is_finite() {
            return Err(HeatmapError::Numerical("system contains non-finite entries".into()));
        }
        let tolerance = scale * n as f64 * f64::EPSILON;

        for col in 0..n {
            let (pivot_row, pivot_abs) = (col..n)
                .map(|row| (row, m[[row, col]].abs()))
                .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
            if pivot_abs <= tolerance {
                return Err(HeatmapError::Numerical(format!(
                    "singular system: no usable pivot in column {}",
                    col
                )));
            }

            if pivot_row != col {
                for k in 0..n {
                    m.swap([col, k], [pivot_row, k]);
                }
                rhs.swap(col, pivot_row);
            }

            let pivot = m[[col, col]];
            for row in (col + 1)..n {
                let factor = m[[row, col]] / pivot;
                if factor == 0.0 {
                    continue;
                }
                for k in col..n {
                    m[[row, k]] -= factor * m[[col, k]];
                }
                rhs[row] -= factor * rhs[col];
            }
        }

        let mut x = Array1::<f64>::zeros(n);
        for row in (0..n).rev() {
            let tail: f64 = ((row + 1)..n).map(|k| m[[row, k]] * x[k]).sum();
            x[row] = (rhs[row] - tail) / m[[row, row]];
        }

        Ok(x)
    }
}
