//! Construction errors
//!
//! A `Stream` is a little finicky when you build it. Bad epsilons and bad
//! target quantiles are signalled out to the user with this enumeration. Once
//! a `Stream` exists none of its operations fail.

use thiserror::Error;

/// Result type alias for fallible construction
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when configuring an invariant or a stream
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The error epsilon must be finite and lie in (0, 1).
    #[error("epsilon must lie in (0, 1), got {0}")]
    InvalidEpsilon(f64),

    /// Each targeted quantile must be finite and lie in (0, 1).
    #[error("targeted quantile must lie in (0, 1), got {0}")]
    InvalidQuantile(f64),

    /// A targeted invariant needs at least one quantile to target.
    #[error("targeted invariant requires at least one quantile")]
    NoTargets,

    /// The insertion buffer must hold at least one value.
    #[error("buffer capacity must be non-zero")]
    ZeroCapacity,
}
