//! Logarithmic working bins for period and semi-major axis
//!
//! Bin edges are fitted once over the whole catalog: `bins` equal-width
//! intervals in log10 space between 0.9x the smallest and 1.1x the largest
//! positive value. Intervals are closed-open; the top edge is folded into
//! the last bin.

/// Sentinel bin for a missing or non-positive value
pub const NO_BIN: i32 = -1;

/// Fitted log10-space binning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogBinning {
    lo_log: f64,
    step: f64,
    bins: usize,
}

impl LogBinning {
    /// Fit over the positive finite values; `None` when there are none
    pub fn fit(values: impl IntoIterator<Item = f64>, bins: usize) -> Option<Self> {
        let bins = bins.max(1);
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite() && *v > 0.0)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        let lo_log = (0.9 * min).log10();
        let hi_log = (1.1 * max).log10();
        Some(Self {
            lo_log,
            step: (hi_log - lo_log) / bins as f64,
            bins,
        })
    }

    pub fn bin(&self, value: Option<f64>) -> i32 {
        match value {
            Some(v) if v.is_finite() && v > 0.0 => {
                let position = ((v.log10() - self.lo_log) / self.step).floor();
                position.clamp(0.0, (self.bins - 1) as f64) as i32
            }
            _ => NO_BIN,
        }
    }
}

/// Bin every value against a binning fitted over the same values
pub fn assign_bins(values: &[Option<f64>], bins: usize) -> Vec<i32> {
    match LogBinning::fit(values.iter().flatten().copied(), bins) {
        Some(binning) => values.iter().map(|v| binning.bin(*v)).collect(),
        None => vec![NO_BIN; values.len()],
    }
}
