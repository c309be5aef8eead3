//! The invariant function `f(r, n)` bounds the `width + delta` a sample may
//! carry at accumulated rank `r` when `n` observations have been seen. The
//! error in a sample's reported rank is at most `f(r, n) / 2`.
//!
//! Two policies are provided. `Biased` is the 'full biased' invariant of
//! Cormode, Korn, Muthukrishnan and Srivastava, appropriate when only high
//! quantiles are interesting and are not known a priori. `Targeted` tightens
//! the error around a fixed set of quantiles given at construction and lets
//! it loosen everywhere else.
//!
//! Both are evaluated against the _current_ `n`. Nothing is precomputed, so
//! the bound moves as data arrives.

use crate::error::{Error, Result};

/// The rank-error policy bound to a `Ledger`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub enum Invariant {
    /// `f(r) = 2εr`
    Biased {
        /// The error factor ε
        epsilon: f64,
    },
    /// The minimum over all targets `q` of `2εr/q` when `qn <= r`, else
    /// `2ε(n - r)/(1 - q)`
    Targeted {
        /// The error factor ε
        epsilon: f64,
        /// The quantiles to hold tight error around, each in (0, 1)
        quantiles: Vec<f64>,
    },
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    if epsilon.is_finite() && epsilon > 0.0 && epsilon < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidEpsilon(epsilon))
    }
}

fn check_quantile(q: f64) -> Result<()> {
    if q.is_finite() && q > 0.0 && q < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidQuantile(q))
    }
}

impl Invariant {
    /// Create a high-biased invariant with error `epsilon`
    ///
    /// # Examples
    /// ```
    /// use biased_quantiles::Invariant;
    ///
    /// let inv = Invariant::biased(0.25).unwrap();
    /// assert_eq!(inv.bound(8.0, 1000.0), 4.0);
    /// assert!(Invariant::biased(0.0).is_err());
    /// ```
    pub fn biased(epsilon: f64) -> Result<Invariant> {
        let inv = Invariant::Biased { epsilon };
        inv.validate()?;
        Ok(inv)
    }

    /// Create an invariant targeted at `quantiles` with error `epsilon`
    ///
    /// Quantiles must each lie in (0, 1), exclusive of both extremes. Queries
    /// for quantiles outside this set still answer, but without the error
    /// guarantee.
    ///
    /// # Examples
    /// ```
    /// use biased_quantiles::Invariant;
    ///
    /// let inv = Invariant::targeted(0.01, &[0.5, 0.9, 0.99]).unwrap();
    /// assert_eq!(inv.epsilon(), 0.01);
    /// assert!(Invariant::targeted(0.01, &[]).is_err());
    /// assert!(Invariant::targeted(0.01, &[1.0]).is_err());
    /// ```
    pub fn targeted(epsilon: f64, quantiles: &[f64]) -> Result<Invariant> {
        let inv = Invariant::Targeted {
            epsilon,
            quantiles: quantiles.to_vec(),
        };
        inv.validate()?;
        Ok(inv)
    }

    /// Check the policy parameters
    ///
    /// The enum may be built directly, or deserialized, so `Stream`
    /// construction calls this before accepting an invariant.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Invariant::Biased { epsilon } => check_epsilon(epsilon),
            Invariant::Targeted {
                epsilon,
                ref quantiles,
            } => {
                check_epsilon(epsilon)?;
                if quantiles.is_empty() {
                    return Err(Error::NoTargets);
                }
                quantiles.iter().try_for_each(|q| check_quantile(*q))
            }
        }
    }

    /// The error factor ε of this policy
    pub fn epsilon(&self) -> f64 {
        match *self {
            Invariant::Biased { epsilon } | Invariant::Targeted { epsilon, .. } => epsilon,
        }
    }

    /// Evaluate `f(r, n)`, the largest `width + delta` allowed at rank `r`
    pub fn bound(&self, r: f64, n: f64) -> f64 {
        match *self {
            Invariant::Biased { epsilon } => 2.0 * epsilon * r,
            Invariant::Targeted {
                epsilon,
                ref quantiles,
            } => quantiles.iter().fold(std::f64::MAX, |m, &q| {
                let f = if q * n <= r {
                    (2.0 * epsilon * r) / q
                } else {
                    (2.0 * epsilon * (n - r)) / (1.0 - q)
                };
                m.min(f)
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn biased_is_linear_in_rank() {
        let inv = Invariant::biased(0.1).unwrap();
        assert_eq!(0.0, inv.bound(0.0, 50.0));
        assert!((inv.bound(10.0, 50.0) - 2.0).abs() < 1e-12);
        // n plays no part
        assert_eq!(inv.bound(10.0, 50.0), inv.bound(10.0, 5_000.0));
    }

    #[test]
    fn targeted_single_quantile() {
        let inv = Invariant::targeted(0.01, &[0.5]).unwrap();
        // below the target rank the bound shrinks toward n
        assert!((inv.bound(0.0, 100.0) - 4.0).abs() < 1e-12);
        // at the target rank both arms agree on 2εn
        assert!((inv.bound(50.0, 100.0) - 2.0).abs() < 1e-12);
        assert!((inv.bound(100.0, 100.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn targeted_takes_minimum() {
        let inv = Invariant::targeted(0.01, &[0.5, 0.99]).unwrap();
        let lo = Invariant::targeted(0.01, &[0.5]).unwrap();
        let hi = Invariant::targeted(0.01, &[0.99]).unwrap();
        for r in 0..1000 {
            let r = r as f64;
            let expected = lo.bound(r, 1000.0).min(hi.bound(r, 1000.0));
            assert_eq!(expected, inv.bound(r, 1000.0));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(Err(Error::InvalidEpsilon(1.0)), Invariant::biased(1.0));
        assert_eq!(Err(Error::InvalidEpsilon(-0.1)), Invariant::biased(-0.1));
        assert!(Invariant::biased(std::f64::NAN).is_err());
        assert_eq!(Err(Error::NoTargets), Invariant::targeted(0.01, &[]));
        assert_eq!(
            Err(Error::InvalidQuantile(0.0)),
            Invariant::targeted(0.01, &[0.5, 0.0])
        );
        assert!(Invariant::targeted(0.01, &[std::f64::INFINITY]).is_err());
    }

    #[test]
    fn validate_catches_hand_built_policies() {
        let inv = Invariant::Targeted {
            epsilon: 0.01,
            quantiles: vec![1.5],
        };
        assert_eq!(Err(Error::InvalidQuantile(1.5)), inv.validate());
    }

    // prop: forall 0 <= r <= n. f(r, n) >= 0
    #[test]
    fn bound_non_negative() {
        fn inner(r: u16, extra: u16, q: u16) -> TestResult {
            // map onto the open interval (0, 1)
            let q = (f64::from(q) + 1.0) / (f64::from(std::u16::MAX) + 2.0);
            let r = r as f64;
            let n = r + (extra as f64);
            let inv = Invariant::targeted(0.01, &[q]).unwrap();
            let biased = Invariant::biased(0.01).unwrap();
            TestResult::from_bool(inv.bound(r, n) >= 0.0 && biased.bound(r, n) >= 0.0)
        }
        QuickCheck::new().quickcheck(inner as fn(u16, u16, u16) -> TestResult);
    }
}
