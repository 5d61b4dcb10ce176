use snafu::Snafu;

pub type TwoBodyResult<T> = Result<T, TwoBodyError>;

/// Errors raised by element conversion and Kepler propagation.
///
/// Every variant carries the values needed to diagnose the failure; nothing
/// here is logged by the library itself.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TwoBodyError {
    /// Non-physical or malformed input.
    #[snafu(display("invalid {parameter} = {value}: {reason}"))]
    Domain {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The universal Kepler solver hit its iteration bound.
    #[snafu(display(
        "Kepler solver did not converge after {iterations} iterations (residual {residual:e} s, tolerance {tolerance:e} s)"
    ))]
    Convergence {
        iterations: usize,
        residual: f64,
        tolerance: f64,
    },

    /// The geometry leaves the requested quantity undefined.
    #[snafu(display("degenerate geometry: {reason}"))]
    DegenerateGeometry { reason: &'static str },

    /// Lagrange coefficients violate f*gdot - fdot*g = 1.
    #[snafu(display(
        "Lagrange coefficients are inconsistent: |f*gdot - fdot*g - 1| = {residual:e} exceeds {tolerance:e}"
    ))]
    LagrangeIdentity { residual: f64, tolerance: f64 },

    #[snafu(display("rotation axis must be 1, 2 or 3, got {axis}"))]
    InvalidAxis { axis: u8 },
}

impl TwoBodyError {
    pub fn is_convergence(&self) -> bool {
        matches!(self, TwoBodyError::Convergence { .. })
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, TwoBodyError::Domain { .. } | TwoBodyError::InvalidAxis { .. })
    }
}
