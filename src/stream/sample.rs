use std::cmp;

/// An observed value and the bookkeeping needed to compress it
///
/// `width` is the number of original observations this sample stands in for
/// and `delta` the maximum error in its implied rank. Both are carried as
/// `f64` because `delta` is derived from the invariant function and may dip
/// below zero at the very front of a ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Sample {
    /// The observed data point
    pub value: f64,
    /// Count of observations represented, at least 1
    pub width: f64,
    /// Upper bound on rank uncertainty, fixed at insertion
    pub delta: f64,
}

impl Sample {
    /// Create a new Sample
    pub fn new(value: f64, width: f64, delta: f64) -> Sample {
        Sample {
            value,
            width,
            delta,
        }
    }

    /// A freshly observed value: width 1, no error
    pub fn raw(value: f64) -> Sample {
        Sample::new(value, 1.0, 0.0)
    }

    // The sole ordering value in a Sample is `value`. NaN never reaches a
    // ledger through `Stream::insert`.
    pub(crate) fn cmp_value(&self, other: &Sample) -> cmp::Ordering {
        self.value
            .partial_cmp(&other.value)
            .unwrap_or(cmp::Ordering::Equal)
    }
}

/// Whether `samples` is ascending by value, the precondition of every merge
pub(crate) fn is_sorted(samples: &[Sample]) -> bool {
    samples.windows(2).all(|w| w[0].value <= w[1].value)
}

/// Whether every sample stands for at least some observations
pub(crate) fn has_positive_widths(samples: &[Sample]) -> bool {
    samples.iter().all(|s| s.width > 0.0)
}
