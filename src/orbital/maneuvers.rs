use snafu::ensure;
use std::f64::consts::PI;

use super::state::validate_mu;
use crate::errors::{DomainSnafu, TwoBodyResult};

/// Result of a Hohmann transfer calculation.
///
/// Impulses are signed: positive along the velocity, negative when braking
/// (transfers toward a lower orbit).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HohmannTransfer {
    pub dva: f64,     // km/s, first burn (enter transfer ellipse)
    pub dvb: f64,     // km/s, second burn (circularize)
    pub a_trans: f64, // km, transfer ellipse semi-major axis
    pub t_trans: f64, // s, half the transfer orbit period
}

impl HohmannTransfer {
    pub fn total_dv(&self) -> f64 {
        self.dva.abs() + self.dvb.abs()
    }
}

/// Result of a bielliptic transfer through an intermediate radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiellipticTransfer {
    pub dva: f64,      // km/s, departure burn
    pub dvb: f64,      // km/s, burn at the intermediate radius
    pub dvc: f64,      // km/s, circularization at the final radius
    pub a_trans1: f64, // km
    pub a_trans2: f64, // km
    pub t_trans1: f64, // s
    pub t_trans2: f64, // s
}

impl BiellipticTransfer {
    pub fn total_dv(&self) -> f64 {
        self.dva.abs() + self.dvb.abs() + self.dvc.abs()
    }

    pub fn total_time(&self) -> f64 {
        self.t_trans1 + self.t_trans2
    }
}

fn validate_radius(parameter: &'static str, r: f64) -> TwoBodyResult<()> {
    ensure!(
        r.is_finite() && r > 0.0,
        DomainSnafu {
            parameter,
            value: r,
            reason: "orbit radius must be positive and finite",
        }
    );
    Ok(())
}

/// Speed on a conic of semi-major axis `a` at radius `r` (vis-viva).
fn vis_viva(k: f64, r: f64, a: f64) -> f64 {
    (2.0 * (k / r - k / (2.0 * a))).sqrt()
}

/// Circular orbit velocity at a given radius (km/s).
pub fn circular_velocity(k: f64, r: f64) -> TwoBodyResult<f64> {
    validate_mu(k)?;
    validate_radius("r", r)?;
    Ok((k / r).sqrt())
}

/// Hohmann transfer between two coplanar circular orbits of radii `r_i` and
/// `r_f` (km, not altitudes).
pub fn hohmann(k: f64, r_i: f64, r_f: f64) -> TwoBodyResult<HohmannTransfer> {
    validate_mu(k)?;
    validate_radius("r_i", r_i)?;
    validate_radius("r_f", r_f)?;

    let a_trans = (r_i + r_f) / 2.0;
    let dva = vis_viva(k, r_i, a_trans) - (k / r_i).sqrt();
    let dvb = (k / r_f).sqrt() - vis_viva(k, r_f, a_trans);

    Ok(HohmannTransfer {
        dva,
        dvb,
        a_trans,
        t_trans: PI * (a_trans.powi(3) / k).sqrt(),
    })
}

/// Bielliptic transfer from `r_i` to `r_f` through the apoapsis radius `r_b`.
pub fn bielliptic(k: f64, r_i: f64, r_b: f64, r_f: f64) -> TwoBodyResult<BiellipticTransfer> {
    validate_mu(k)?;
    validate_radius("r_i", r_i)?;
    validate_radius("r_b", r_b)?;
    validate_radius("r_f", r_f)?;

    let a_trans1 = (r_i + r_b) / 2.0;
    let a_trans2 = (r_b + r_f) / 2.0;

    let dva = vis_viva(k, r_i, a_trans1) - (k / r_i).sqrt();
    let dvb = vis_viva(k, r_b, a_trans2) - vis_viva(k, r_b, a_trans1);
    let dvc = (k / r_f).sqrt() - vis_viva(k, r_f, a_trans2);

    Ok(BiellipticTransfer {
        dva,
        dvb,
        dvc,
        a_trans1,
        a_trans2,
        t_trans1: PI * (a_trans1.powi(3) / k).sqrt(),
        t_trans2: PI * (a_trans2.powi(3) / k).sqrt(),
    })
}
