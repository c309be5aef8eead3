//! This is an implementation of the algorithm presented in Cormode, Korn,
//! Muthukrishnan, Srivastava's paper "Effective Computation of Biased Quantiles
//! over Data Streams". The ambition here is to approximate quantiles on a
//! stream of data without having a boatload of information kept in memory.
//!
//! We follow the 'batch' method of the paper. Incoming values are appended to
//! an unsorted buffer and, once the buffer is full, the buffer is sorted and
//! merged into the `Ledger` in a single pass, after which the ledger is
//! compressed. Until the first flush a query is answered exactly from the
//! sorted buffer.
//!
//! Independent `Stream`s may be built on separate threads and folded together
//! with `merge` over a `samples()` snapshot. Each stream is single-threaded
//! internally; share-nothing and combine at the end.
//!
//! # Examples
//!
//! ```
//! use biased_quantiles::Stream;
//!
//! let mut stream = Stream::targeted(0.01, &[0.5, 0.9, 0.99]).unwrap();
//! for i in 1..10_001 {
//!     stream.insert(i as f64);
//! }
//! let p99 = stream.query(0.99).unwrap();
//! assert!((p99 - 9_900.0).abs() / 9_900.0 < 0.03);
//! assert_eq!(stream.count(), 10_000);
//! ```

use std::ops::AddAssign;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::invariant::Invariant;

mod ledger;
mod sample;

pub use self::ledger::Ledger;
pub use self::sample::Sample;

/// Number of raw values held before a flush, absent other configuration
pub const DEFAULT_BUFFER_CAPACITY: usize = 500;

/// Construction parameters for a `Stream`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Config {
    /// The rank-error policy
    pub invariant: Invariant,
    /// Raw values buffered between flushes
    #[cfg_attr(feature = "serde_support", serde(default = "default_buffer_capacity"))]
    pub buffer_capacity: usize,
}

#[cfg(feature = "serde_support")]
fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

impl Config {
    /// A config for `invariant` with the default buffer capacity
    pub fn new(invariant: Invariant) -> Config {
        Config {
            invariant,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Set the number of values buffered between flushes
    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Config {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Check the invariant parameters and buffer capacity
    pub fn validate(&self) -> Result<()> {
        self.invariant.validate()?;
        if self.buffer_capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(())
    }
}

/// A structure to provide approximate quantile queries in bounded memory and
/// with bounded error.
#[derive(Debug, Clone)]
pub struct Stream {
    ledger: Ledger,
    // Raw samples of width 1, unsorted except directly after a fast-path
    // query. Never grows past `capacity`.
    buffer: Vec<Sample>,
    capacity: usize,
}

fn clamp_quantile(q: f64) -> Option<f64> {
    if q.is_nan() {
        None
    } else {
        Some(q.max(0.0).min(1.0))
    }
}

impl Stream {
    /// Create a new Stream maintaining `invariant`
    pub fn new(invariant: Invariant) -> Result<Stream> {
        Stream::with_config(Config::new(invariant))
    }

    /// Create a new Stream for high-biased quantiles with error `epsilon`
    ///
    /// Appropriate when the quantiles of interest lie above the median and
    /// are not known in advance.
    pub fn biased(epsilon: f64) -> Result<Stream> {
        Stream::new(Invariant::biased(epsilon)?)
    }

    /// Create a new Stream targeted at `quantiles` with error `epsilon`
    ///
    /// `epsilon` is usually 0.01.
    pub fn targeted(epsilon: f64, quantiles: &[f64]) -> Result<Stream> {
        Stream::new(Invariant::targeted(epsilon, quantiles)?)
    }

    /// Create a new Stream from a full `Config`
    pub fn with_config(config: Config) -> Result<Stream> {
        config.validate()?;
        Ok(Stream {
            ledger: Ledger::new(config.invariant),
            buffer: Vec::with_capacity(config.buffer_capacity),
            capacity: config.buffer_capacity,
        })
    }

    /// The invariant this stream maintains
    pub fn invariant(&self) -> &Invariant {
        self.ledger.invariant()
    }

    /// Return the error factor ε this stream was built with
    ///
    /// # Example
    /// ```
    /// use biased_quantiles::Stream;
    ///
    /// let stream = Stream::biased(0.1).unwrap();
    /// assert_eq!(0.1, stream.error_bound());
    /// ```
    pub fn error_bound(&self) -> f64 {
        self.ledger.invariant().epsilon()
    }

    /// Raw values buffered between flushes
    pub fn buffer_capacity(&self) -> usize {
        self.capacity
    }

    /// Insert a value into the Stream
    ///
    /// A full buffer is flushed into the ledger and the ledger compressed.
    /// NaN has no rank and is dropped.
    pub fn insert(&mut self, value: f64) {
        if value.is_nan() {
            trace!("dropping NaN insert");
            return;
        }
        self.buffer.push(Sample::raw(value));
        if self.buffer.len() >= self.capacity {
            self.flush();
            self.ledger.compress();
        }
    }

    fn sort_buffer(&mut self) {
        self.buffer.sort_by(Sample::cmp_value);
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        trace!(
            batch = self.buffer.len(),
            ledger = self.ledger.len(),
            "flushing buffer"
        );
        self.sort_buffer();
        self.ledger.merge(&self.buffer);
        self.buffer.clear();
    }

    /// Query the Stream for an approximate `q` quantile
    ///
    /// `q` is clamped to `[0, 1]`. The error guarantee holds for the quantiles
    /// a targeted stream was built with, and for any `q` under a biased
    /// stream. Other quantiles still answer, with wider and unspecified
    /// error. Returns `None` if the stream holds no data or `q` is NaN.
    ///
    /// While nothing has been flushed the answer is exact: the value at index
    /// `floor(len * q)` of the sorted inserts.
    ///
    /// # Examples
    /// ```
    /// use biased_quantiles::Stream;
    ///
    /// let mut stream = Stream::biased(0.01).unwrap();
    /// assert_eq!(None, stream.query(0.5));
    /// for i in 1..101 {
    ///     stream.insert(i as f64);
    /// }
    /// assert_eq!(Some(51.0), stream.query(0.5));
    /// assert_eq!(Some(100.0), stream.query(1.0));
    /// ```
    pub fn query(&mut self, q: f64) -> Option<f64> {
        let q = clamp_quantile(q)?;
        if self.ledger.is_empty() {
            if self.buffer.is_empty() {
                return None;
            }
            self.sort_buffer();
            let last = self.buffer.len() - 1;
            let idx = ((self.buffer.len() as f64) * q) as usize;
            return Some(self.buffer[idx.min(last)].value);
        }
        self.flush();
        self.ledger.query(q)
    }

    /// Merge a snapshot from another Stream into this one
    ///
    /// `samples` must be ascending by value, as `Stream::samples` produces.
    /// The snapshot goes straight to the ledger without passing through the
    /// buffer. Merging streams built with different invariants works
    /// mechanically but voids the error guarantee.
    pub fn merge(&mut self, samples: &[Sample]) {
        self.ledger.merge(samples);
    }

    /// A snapshot of the Stream, ascending by value
    ///
    /// The snapshot accounts for every observation, buffered or not, and is
    /// the unit exchanged when merging streams.
    pub fn samples(&self) -> Vec<Sample> {
        let mut pending = self.buffer.clone();
        pending.sort_by(Sample::cmp_value);
        if self.ledger.is_empty() {
            return pending;
        }

        let stored = self.ledger.samples();
        let mut out = Vec::with_capacity(stored.len() + pending.len());
        let (mut i, mut j) = (0, 0);
        while i < stored.len() && j < pending.len() {
            if pending[j].value < stored[i].value {
                out.push(pending[j]);
                j += 1;
            } else {
                out.push(stored[i]);
                i += 1;
            }
        }
        out.extend_from_slice(&stored[i..]);
        out.extend_from_slice(&pending[j..]);
        out
    }

    /// Query the Stream for the count of its points
    ///
    /// This function returns the total number of points seen over the lifetime
    /// of the structure, _not_ the number of points currently stored.
    ///
    /// # Examples
    /// ```
    /// use biased_quantiles::Stream;
    ///
    /// let mut stream = Stream::biased(0.001).unwrap();
    /// for i in 0..1000 {
    ///     stream.insert(i as f64);
    /// }
    ///
    /// assert_eq!(stream.count(), 1000);
    /// ```
    pub fn count(&self) -> usize {
        self.ledger.count() + self.buffer.len()
    }

    /// Smallest value observed, `None` if empty
    pub fn min(&self) -> Option<f64> {
        self.buffer
            .iter()
            .map(|s| s.value)
            .chain(self.ledger.min())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))))
    }

    /// Largest value observed, `None` if empty
    pub fn max(&self) -> Option<f64> {
        self.buffer
            .iter()
            .map(|s| s.value)
            .chain(self.ledger.max())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }

    /// Clear the Stream back to empty, reusing its storage
    pub fn reset(&mut self) {
        debug!(count = self.count(), "resetting stream");
        self.ledger.reset();
        self.buffer.clear();
    }
}

impl AddAssign for Stream {
    fn add_assign(&mut self, rhs: Stream) {
        self.merge(&rhs.samples());
    }
}

impl Extend<f64> for Stream {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v);
        }
    }
}
