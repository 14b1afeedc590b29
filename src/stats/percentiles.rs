use serde::Serialize;

/// Percentile levels reported for every distribution.
pub const P50: f64 = 0.50;
pub const P90: f64 = 0.90;
pub const P95: f64 = 0.95;
pub const P99: f64 = 0.99;

/// Nearest-rank, lower-biased percentile: the value at index
/// `floor((n - 1) * p)` of an ascending slice. Empty input yields 0.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    // Non-negative and at most `last`, so the cast is exact.
    let index = (last as f64 * p.clamp(0.0, 1.0)).floor() as usize;
    sorted.get(index.min(last)).copied().unwrap_or(0.0)
}

/// Summary of one metric over the successful samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Distribution {
    /// All fields are zero when `values` is empty.
    #[must_use]
    pub fn from_values(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        values.sort_by(f64::total_cmp);
        Self {
            mean: mean(&values),
            min: values.first().copied().unwrap_or(0.0),
            max: values.last().copied().unwrap_or(0.0),
            p50: percentile(&values, P50),
            p90: percentile(&values, P90),
            p95: percentile(&values, P95),
            p99: percentile(&values, P99),
        }
    }
}

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
