//! Two-body propagation with the universal variable (Vallado, algorithm 8).
//!
//! Kepler's time equation t(chi) is strictly increasing in the universal
//! anomaly chi, so Newton steps are safeguarded with a bracket and fall back
//! to bisection when they leave it or stall.

use log::{debug, trace};
use nalgebra::Vector3;
use rayon::prelude::*;
use snafu::ensure;
use std::f64::consts::TAU;

use super::state::{validate_mu, StateVector};
use crate::config::SolverConfig;
use crate::errors::{
    ConvergenceSnafu, DegenerateGeometrySnafu, DomainSnafu, LagrangeIdentitySnafu, TwoBodyResult,
};

/// Below this value of alpha * |r0| the orbit is treated as parabolic.
const PARABOLIC_ALPHA: f64 = 1e-10;

/// Below this |z| the Stumpff functions are evaluated from their series.
const STUMPFF_SERIES_LIMIT: f64 = 1e-3;

/// Stumpff functions c2(z) and c3(z).
pub(crate) fn stumpff(z: f64) -> (f64, f64) {
    if z > STUMPFF_SERIES_LIMIT {
        let s = z.sqrt();
        ((1.0 - s.cos()) / z, (s - s.sin()) / (s * z))
    } else if z < -STUMPFF_SERIES_LIMIT {
        let s = (-z).sqrt();
        ((1.0 - s.cosh()) / z, (s.sinh() - s) / (-s * z))
    } else {
        (
            0.5 - z / 24.0 + z * z / 720.0 - z * z * z / 40_320.0,
            1.0 / 6.0 - z / 120.0 + z * z / 5_040.0 - z * z * z / 362_880.0,
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Conic {
    Elliptic { period: f64 },
    Parabolic,
    Hyperbolic,
}

#[derive(Debug, Clone, Copy)]
struct Universal {
    chi: f64,
    z: f64,
    c2: f64,
    c3: f64,
}

/// Quantities of the initial state shared by every Kepler evaluation.
struct KeplerProblem {
    sqrt_k: f64,
    r0: f64,
    sigma0: f64, // r0 . v0 / sqrt(k)
    alpha: f64,  // 1 / a
}

impl KeplerProblem {
    /// Time of flight (s) and radius (km) reached at universal anomaly `chi`.
    fn evaluate(&self, chi: f64) -> (f64, f64, Universal) {
        let z = self.alpha * chi * chi;
        let (c2, c3) = stumpff(z);
        let chi2 = chi * chi;
        let t = (chi2 * chi * c3 + self.sigma0 * chi2 * c2 + self.r0 * chi * (1.0 - z * c3))
            / self.sqrt_k;
        let r = chi2 * c2 + self.sigma0 * chi * (1.0 - z * c3) + self.r0 * (1.0 - z * c2);
        (t, r, Universal { chi, z, c2, c3 })
    }

    /// Solve t(chi) = dt inside the bracket [lo, hi] (either side may be
    /// open). Returns the converged anomaly with the time it actually reaches.
    fn solve(
        &self,
        dt: f64,
        guess: f64,
        mut lo: Option<f64>,
        mut hi: Option<f64>,
        config: &SolverConfig,
    ) -> TwoBodyResult<(f64, Universal)> {
        let tolerance = config.rel_tol * dt.abs().max(1.0);
        let mut chi = match (lo, hi) {
            (Some(l), Some(h)) if !(guess >= l && guess <= h) => 0.5 * (l + h),
            _ => guess,
        };
        let mut residual = f64::INFINITY;
        let mut last_step = f64::INFINITY;

        for iteration in 1..=config.max_iterations {
            let (t, radius, universal) = self.evaluate(chi);
            residual = t - dt;
            trace!("kepler iteration {iteration}: chi = {chi:e}, residual = {residual:e} s");

            if residual.abs() <= tolerance {
                debug!("kepler solver converged in {iteration} iterations (chi = {chi:e})");
                return Ok((t, universal));
            }

            let candidate = if residual.is_finite() {
                if residual < 0.0 {
                    lo = Some(lo.map_or(chi, |l| l.max(chi)));
                } else {
                    hi = Some(hi.map_or(chi, |h| h.min(chi)));
                }
                chi - residual * self.sqrt_k / radius
            } else {
                // Overflow: chi is too large in magnitude.
                if chi > 0.0 {
                    hi = Some(hi.map_or(chi, |h| h.min(chi)));
                } else {
                    lo = Some(lo.map_or(chi, |l| l.max(chi)));
                }
                f64::NAN
            };

            // Bisect when Newton leaves the bracket or stops halving its step;
            // with one side open, step outward instead.
            let next = match (lo, hi) {
                (Some(l), Some(h)) => {
                    if candidate > l && candidate < h && (candidate - chi).abs() <= 0.5 * last_step {
                        candidate
                    } else {
                        0.5 * (l + h)
                    }
                }
                (Some(l), None) if !(candidate > l) => 2.0 * chi,
                (None, Some(h)) if !(candidate < h) => 2.0 * chi,
                _ if candidate.is_finite() => candidate,
                _ => 0.5 * chi,
            };
            last_step = (next - chi).abs();
            chi = next;
        }

        ConvergenceSnafu {
            iterations: config.max_iterations,
            residual: residual.abs(),
            tolerance,
        }
        .fail()
    }
}

/// Propagate (r0, v0) by `tof` seconds under two-body dynamics with the
/// default solver settings.
pub fn propagate(
    k: f64,
    r0: &Vector3<f64>,
    v0: &Vector3<f64>,
    tof: f64,
) -> TwoBodyResult<(Vector3<f64>, Vector3<f64>)> {
    let state = propagate_with(k, &StateVector::new(*r0, *v0), tof, &SolverConfig::default())?;
    Ok((state.r, state.v))
}

/// Propagate a state by `tof` seconds (negative goes backwards in time).
///
/// A zero time of flight returns the input state unchanged. Bound orbits are
/// first reduced modulo their period, so many revolutions cost no more than one.
pub fn propagate_with(
    k: f64,
    state: &StateVector,
    tof: f64,
    config: &SolverConfig,
) -> TwoBodyResult<StateVector> {
    validate_mu(k)?;
    config.validate()?;
    state.validate()?;
    ensure!(
        tof.is_finite(),
        DomainSnafu {
            parameter: "tof",
            value: tof,
            reason: "time of flight must be finite",
        }
    );
    if tof == 0.0 {
        return Ok(*state);
    }

    let r0 = state.radius();
    let sqrt_k = k.sqrt();
    let rdotv = state.r.dot(&state.v);
    let mut alpha = 2.0 / r0 - state.v.norm_squared() / k;

    let conic = if alpha * r0 > PARABOLIC_ALPHA {
        Conic::Elliptic {
            period: TAU / (sqrt_k * alpha.powf(1.5)),
        }
    } else if (alpha * r0).abs() <= PARABOLIC_ALPHA {
        alpha = 0.0;
        Conic::Parabolic
    } else {
        Conic::Hyperbolic
    };

    let mut dt = tof;
    let guess = match conic {
        Conic::Elliptic { period } => {
            // Reduce into (-period/2, period/2] to keep chi away from a full
            // revolution, where the Stumpff functions lose precision.
            dt = tof % period;
            if dt > 0.5 * period {
                dt -= period;
            } else if dt < -0.5 * period {
                dt += period;
            }
            if dt != tof {
                debug!("elliptic orbit with period {period:.3} s: tof {tof} s reduced to {dt} s");
            }
            sqrt_k * dt * alpha
        }
        Conic::Parabolic => {
            // Barker's equation for the semi-latus rectum p = h^2 / k
            let p = state.angular_momentum().norm_squared() / k;
            let s = 0.5 * 1f64.atan2(3.0 * (k / p.powi(3)).sqrt() * dt);
            let w = s.tan().cbrt().atan();
            debug!("parabolic orbit with p = {p} km");
            p.sqrt() * 2.0 / (2.0 * w).tan()
        }
        Conic::Hyperbolic => {
            let a = 1.0 / alpha;
            let sign = dt.signum();
            let temp = -2.0 * k * dt / (a * (rdotv + sign * (-k * a).sqrt() * (1.0 - r0 / a)));
            debug!("hyperbolic orbit with a = {a} km");
            sign * (-a).sqrt() * temp.ln()
        }
    };
    // t(0) = 0 and t(chi) is increasing, so the root lies on the side of dt.
    // A bound orbit also cannot need more than one revolution of chi.
    let (lo, hi) = match (conic, dt >= 0.0) {
        (Conic::Elliptic { .. }, true) => (Some(0.0), Some(TAU / alpha.sqrt())),
        (Conic::Elliptic { .. }, false) => (Some(-TAU / alpha.sqrt()), Some(0.0)),
        (_, true) => (Some(0.0), None),
        (_, false) => (None, Some(0.0)),
    };
    // Near-parabolic hyperbolas drive the log guess to the wrong side of zero.
    let guess = if guess.is_finite() && guess * dt > 0.0 {
        guess
    } else {
        sqrt_k * dt / r0
    };

    let problem = KeplerProblem {
        sqrt_k,
        r0,
        sigma0: rdotv / sqrt_k,
        alpha,
    };
    let (t, Universal { chi, z, c2, c3 }) = problem.solve(dt, guess, lo, hi, config)?;

    // Lagrange coefficients, evaluated at the time chi actually reaches
    let chi2 = chi * chi;
    let f = 1.0 - chi2 * c2 / r0;
    let g = t - chi2 * chi * c3 / sqrt_k;
    let r = f * state.r + g * state.v;
    let r_mag = r.norm();
    ensure!(
        r_mag > 0.0 && r_mag.is_finite(),
        DegenerateGeometrySnafu {
            reason: "trajectory reaches the centre of attraction",
        }
    );
    let gdot = 1.0 - chi2 * c2 / r_mag;
    let fdot = sqrt_k * chi / (r0 * r_mag) * (z * c3 - 1.0);
    let v = fdot * state.r + gdot * state.v;

    let wronskian = f * gdot - fdot * g - 1.0;
    ensure!(
        wronskian.abs() <= config.lagrange_tol,
        LagrangeIdentitySnafu {
            residual: wronskian.abs(),
            tolerance: config.lagrange_tol,
        }
    );

    Ok(StateVector { r, v })
}

/// Propagate many independent states by the same time of flight in parallel.
pub fn propagate_batch(
    k: f64,
    states: &[StateVector],
    tof: f64,
    config: &SolverConfig,
) -> Vec<TwoBodyResult<StateVector>> {
    states
        .par_iter()
        .map(|state| propagate_with(k, state, tof, config))
        .collect()
}
