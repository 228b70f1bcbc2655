pub struct StatsHelper;

impl StatsHelper {
    /// Smallest value, `None` for an empty slice.
    pub fn min(samples: &[f64]) -> Option<f64> {
        samples.iter().copied().reduce(f64::min)
    }

    pub fn max(samples: &[f64]) -> Option<f64> {
        samples.iter().copied().reduce(f64::max)
    }

    /// `count` evenly spaced values from `start` to `stop`, both inclusive.
    pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (count - 1) as f64;
                (0..count)
                    .map(|i| if i == count - 1 { stop } else { start + step * i as f64 })
                    .collect()
            }
        }
    }
}
