//! This crate provides approximate quantiles over data streams in a moderate
//! amount of memory.
//!
//! Order statistics is a rough business. Exact solutions are expensive in terms
//! of memory and computation. This crate implements the biased and targeted
//! quantile summaries of Cormode, Korn, Muthukrishnan and Srivastava, which
//! trade a small, bounded error in rank for sublinear space. Summaries built
//! independently, say one per thread, can be merged into a single answer.
//!
//! See [`Stream`](stream/struct.Stream.html) to get started.
#![deny(missing_docs, missing_debug_implementations, unstable_features,
        unused_import_braces)]

#[cfg(test)]
extern crate quickcheck;

#[cfg(feature = "serde_support")]
#[macro_use]
extern crate serde_derive;

#[cfg(feature = "serde_support")]
extern crate serde;

pub mod error;
pub mod invariant;
pub mod stream;

pub use crate::error::{Error, Result};
pub use crate::invariant::Invariant;
pub use crate::stream::{Config, Ledger, Sample, Stream};
