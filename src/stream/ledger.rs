//! The ledger is the S(n) of Cormode et al: an ordered run of weighted
//! samples, each carrying the rank error it was admitted with. All of the
//! insert, compress and query passes are single linear scans so a plain `Vec`
//! serves. The outlined implementation uses a linked list; we prefer a Vec for
//! reasons of cache locality.

use std::mem;

use tracing::debug;

use crate::invariant::Invariant;
use crate::stream::sample::{self, Sample};

/// An ordered, compressible summary of weighted samples
#[derive(Debug, Clone)]
pub struct Ledger {
    invariant: Invariant,
    samples: Vec<Sample>,
    // Spare storage that `merge` builds its output into. Swapped with
    // `samples` after every merge so neither allocation is lost.
    spare: Vec<Sample>,
    n: f64,
    max: Option<f64>,
}

// Scan position threaded through a sorted batch. `rank` only counts samples
// that were in the ledger before the batch began.
#[derive(Debug, Default)]
struct Cursor {
    idx: usize,
    rank: f64,
}

impl Ledger {
    /// Create an empty ledger bound to `invariant`
    pub fn new(invariant: Invariant) -> Ledger {
        Ledger {
            invariant,
            samples: Vec::new(),
            spare: Vec::new(),
            n: 0.0,
            max: None,
        }
    }

    /// The invariant this ledger maintains
    pub fn invariant(&self) -> &Invariant {
        &self.invariant
    }

    /// Total observations ever merged in, including those compressed away
    pub fn count(&self) -> usize {
        self.n as usize
    }

    /// Samples currently stored
    ///
    /// This value will fluctuate as compression happens.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the ledger has ever received data since the last reset
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The stored samples, ascending by value
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Smallest stored value
    ///
    /// Under a targeted invariant the first sample may itself be compressed
    /// into its successor, so this is the minimum within the error bound.
    pub fn min(&self) -> Option<f64> {
        self.samples.first().map(|s| s.value)
    }

    /// Largest value ever inserted
    pub fn max(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            self.max
        }
    }

    fn observe(&mut self, value: f64) {
        self.max = match self.max {
            Some(m) if m >= value => Some(m),
            _ => Some(value),
        };
    }

    fn delta_at(&self, rank: f64) -> f64 {
        self.invariant.bound(rank, self.n).floor() - 1.0
    }

    /// Insert `value`, standing for `width` observations
    ///
    /// The new sample lands before the first sample whose value is strictly
    /// greater, so it follows any run of equal values already present. A new
    /// maximum is appended with zero error.
    pub fn insert(&mut self, value: f64, width: f64) {
        self.observe(value);
        let mut r = 0.0;
        let pos = self.samples.iter().position(|c| {
            if c.value > value {
                true
            } else {
                r += c.width;
                false
            }
        });
        match pos {
            Some(idx) => {
                let delta = self.delta_at(r);
                self.samples.insert(idx, Sample::new(value, width, delta));
            }
            None => self.samples.push(Sample::new(value, width, 0.0)),
        }
        self.n += width;
    }

    /// Merge an ascending run of samples into the ledger
    ///
    /// Only `value` and `width` of the incoming samples are used; `delta` is
    /// reassigned from this ledger's invariant. The input _must_ be sorted
    /// ascending by value and carry positive widths. Violating that does not
    /// crash but silently corrupts the rank bookkeeping. Debug builds assert
    /// both.
    pub fn merge(&mut self, batch: &[Sample]) {
        debug_assert!(
            sample::is_sorted(batch),
            "merge input must be ascending by value"
        );
        debug_assert!(
            sample::has_positive_widths(batch),
            "merge input must carry positive widths"
        );
        if batch.is_empty() {
            return;
        }

        let mut out = mem::replace(&mut self.spare, Vec::new());
        out.clear();
        out.reserve(self.samples.len() + batch.len());

        let mut cur = Cursor::default();
        for s in batch {
            self.observe(s.value);
            while cur.idx < self.samples.len() && !(self.samples[cur.idx].value > s.value) {
                let c = self.samples[cur.idx];
                cur.rank += c.width;
                out.push(c);
                cur.idx += 1;
            }
            let delta = if cur.idx < self.samples.len() {
                self.delta_at(cur.rank)
            } else {
                0.0
            };
            out.push(Sample::new(s.value, s.width, delta));
            self.n += s.width;
        }
        out.extend_from_slice(&self.samples[cur.idx..]);

        self.spare = mem::replace(&mut self.samples, out);
    }

    /// Greedily merge adjacent samples while the invariant allows
    ///
    /// A single pass walks backward from the tail. The current target `x`
    /// absorbs its predecessor `c` whenever `c.width + x.width + x.delta`
    /// fits under the invariant at the running rank; otherwise `c` becomes
    /// the new target.
    pub fn compress(&mut self) {
        let len = self.samples.len();
        if len < 2 {
            return;
        }

        // Survivors are packed toward the tail; `x` always sits at `w`.
        let mut w = len - 1;
        let mut r = self.n - 1.0 - self.samples[w].width;
        for i in (0..len - 1).rev() {
            let c = self.samples[i];
            let x = self.samples[w];
            if c.width + x.width + x.delta <= self.invariant.bound(r, self.n) {
                self.samples[w].width += c.width;
            } else {
                w -= 1;
                self.samples[w] = c;
            }
            r -= c.width;
        }
        self.samples.drain(..w);

        debug!(
            before = len,
            after = self.samples.len(),
            n = self.n,
            "compressed ledger"
        );
    }

    /// Query for the approximate `q` quantile
    ///
    /// The target rank is widened by half the invariant evaluated at the
    /// target rank itself, as the published algorithm does. Returns `None`
    /// when the ledger holds no samples.
    pub fn query(&self, q: f64) -> Option<f64> {
        let (first, rest) = self.samples.split_first()?;
        let mut t = (q * self.n).ceil();
        t += (self.invariant.bound(t, self.n) / 2.0).ceil();

        let mut p = first;
        let mut r = 0.0;
        for c in rest {
            if r + c.width + c.delta > t {
                return Some(p.value);
            }
            r += p.width;
            p = c;
        }
        Some(p.value)
    }

    /// Empty the ledger, keeping its allocations
    pub fn reset(&mut self) {
        self.samples.clear();
        self.spare.clear();
        self.n = 0.0;
        self.max = None;
    }
}
