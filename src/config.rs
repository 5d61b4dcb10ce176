use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::errors::{DomainSnafu, TwoBodyResult};

// ---------------------------------------------------------------------------
// Element conversion settings
// ---------------------------------------------------------------------------

/// Settings for conversions between classical elements and state vectors.
///
/// `tol` is the threshold below which the eccentricity is treated as zero and
/// the inclination as 0 or pi. State to elements always reports undefined
/// angles as 0 and substitutes the argument of latitude, true longitude or
/// longitude of periapsis. `resolve_degenerate` applies the same folding to
/// element sets before they are turned into a state vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub tol: f64,
    pub resolve_degenerate: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tol: 1e-5,
            resolve_degenerate: true,
        }
    }
}

impl ConversionConfig {
    pub fn with_tol(tol: f64) -> Self {
        Self {
            tol,
            ..Self::default()
        }
    }

    /// Plain textbook formulas, no special-casing of circular or equatorial orbits
    /// when building a state vector.
    pub fn literal() -> Self {
        Self {
            resolve_degenerate: false,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> TwoBodyResult<()> {
        ensure!(
            self.tol.is_finite() && self.tol >= 0.0,
            DomainSnafu {
                parameter: "tol",
                value: self.tol,
                reason: "tolerance must be finite and non-negative",
            }
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Kepler solver settings
// ---------------------------------------------------------------------------

/// Iteration bound and tolerances of the universal-variable Kepler solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Time residual, relative to max(|tof|, 1 s).
    pub rel_tol: f64,
    /// Allowed deviation of f*gdot - fdot*g from 1.
    pub lagrange_tol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            rel_tol: 1e-12,
            lagrange_tol: 1e-5,
        }
    }
}

impl SolverConfig {
    pub(crate) fn validate(&self) -> TwoBodyResult<()> {
        ensure!(
            self.max_iterations > 0,
            DomainSnafu {
                parameter: "max_iterations",
                value: self.max_iterations as f64,
                reason: "the solver needs at least one iteration",
            }
        );
        ensure!(
            self.rel_tol.is_finite() && self.rel_tol > 0.0,
            DomainSnafu {
                parameter: "rel_tol",
                value: self.rel_tol,
                reason: "tolerance must be finite and positive",
            }
        );
        ensure!(
            self.lagrange_tol.is_finite() && self.lagrange_tol > 0.0,
            DomainSnafu {
                parameter: "lagrange_tol",
                value: self.lagrange_tol,
                reason: "tolerance must be finite and positive",
            }
        );
        Ok(())
    }
}
