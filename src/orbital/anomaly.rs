//! Conversions between true, eccentric and mean anomaly for every conic.
//!
//! For hyperbolic orbits the "eccentric" anomaly is the hyperbolic anomaly F,
//! for parabolic orbits it is Barker's parameter B = tan(nu / 2).

use snafu::ensure;
use std::f64::consts::{PI, TAU};

use crate::errors::{ConvergenceSnafu, DomainSnafu, TwoBodyResult};

/// How close to ecc=1 an orbit is treated as parabolic by this module.
pub const PARABOLIC_ECC_LIMIT: f64 = 1e-10;

const MAX_ITERATIONS: usize = 50;
const ANOMALY_TOL: f64 = 1e-14;

fn validate_ecc(ecc: f64) -> TwoBodyResult<()> {
    ensure!(
        ecc.is_finite() && ecc >= 0.0,
        DomainSnafu {
            parameter: "ecc",
            value: ecc,
            reason: "eccentricity must be finite and non-negative",
        }
    );
    Ok(())
}

fn is_parabolic(ecc: f64) -> bool {
    (ecc - 1.0).abs() < PARABOLIC_ECC_LIMIT
}

/// Eccentric (E), hyperbolic (F) or parabolic (B) anomaly from the true anomaly.
pub fn eccentric_from_true(ecc: f64, nu: f64) -> TwoBodyResult<f64> {
    validate_ecc(ecc)?;
    let (sin_nu, cos_nu) = nu.sin_cos();
    if is_parabolic(ecc) {
        return Ok((0.5 * nu).tan());
    }
    let denom = 1.0 + ecc * cos_nu;
    if ecc < 1.0 {
        let e_anom = ((1.0 - ecc * ecc).sqrt() * sin_nu).atan2(ecc + cos_nu);
        Ok(e_anom.rem_euclid(TAU))
    } else {
        ensure!(
            denom > 0.0,
            DomainSnafu {
                parameter: "nu",
                value: nu,
                reason: "true anomaly lies beyond the hyperbolic asymptote",
            }
        );
        Ok(((ecc * ecc - 1.0).sqrt() * sin_nu / denom).asinh())
    }
}

/// Mean anomaly from the true anomaly. Elliptic results lie in [0, 2pi);
/// hyperbolic and parabolic mean anomalies are signed and unbounded.
pub fn mean_from_true(ecc: f64, nu: f64) -> TwoBodyResult<f64> {
    let anom = eccentric_from_true(ecc, nu)?;
    let mean = if is_parabolic(ecc) {
        anom + anom.powi(3) / 3.0
    } else if ecc < 1.0 {
        (anom - ecc * anom.sin()).rem_euclid(TAU)
    } else {
        ecc * anom.sinh() - anom
    };
    Ok(mean)
}

/// True anomaly in [0, 2pi) from the mean anomaly, solving Kepler's equation by
/// Newton-Raphson (Barker's equation is solved in closed form).
pub fn true_from_mean(ecc: f64, mean: f64) -> TwoBodyResult<f64> {
    validate_ecc(ecc)?;
    ensure!(
        mean.is_finite(),
        DomainSnafu {
            parameter: "mean_anomaly",
            value: mean,
            reason: "mean anomaly must be finite",
        }
    );

    if is_parabolic(ecc) {
        let q = 1.5 * mean;
        let w = (q + (q * q + 1.0).sqrt()).cbrt();
        let b = w - 1.0 / w;
        return Ok((2.0 * b.atan()).rem_euclid(TAU));
    }

    if ecc < 1.0 {
        let mean = mean.rem_euclid(TAU);
        let e_anom = newton(
            |e| e - ecc * e.sin() - mean,
            |e| 1.0 - ecc * e.cos(),
            if ecc < 0.8 { mean } else { PI },
        )?;
        let nu = ((1.0 - ecc * ecc).sqrt() * e_anom.sin()).atan2(e_anom.cos() - ecc);
        Ok(nu.rem_euclid(TAU))
    } else {
        let f_anom = newton(
            |f| ecc * f.sinh() - f - mean,
            |f| ecc * f.cosh() - 1.0,
            (mean / ecc).asinh(),
        )?;
        let nu = 2.0 * (((ecc + 1.0) / (ecc - 1.0)).sqrt() * (0.5 * f_anom).tanh()).atan();
        Ok(nu.rem_euclid(TAU))
    }
}

fn newton(f: impl Fn(f64) -> f64, df: impl Fn(f64) -> f64, guess: f64) -> TwoBodyResult<f64> {
    let mut x = guess;
    let mut step = f64::INFINITY;
    for _ in 0..MAX_ITERATIONS {
        step = f(x) / df(x);
        x -= step;
        if step.abs() <= ANOMALY_TOL * x.abs().max(1.0) {
            return Ok(x);
        }
    }
    ConvergenceSnafu {
        iterations: MAX_ITERATIONS,
        residual: step.abs(),
        tolerance: ANOMALY_TOL,
    }
    .fail()
}
