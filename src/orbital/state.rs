use nalgebra::Vector3;
use snafu::ensure;
use std::f64::consts::TAU;

use crate::errors::{DomainSnafu, TwoBodyResult};

/// Cartesian state in an inertial frame centred on the attractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub r: Vector3<f64>, // km
    pub v: Vector3<f64>, // km/s
}

impl StateVector {
    pub fn new(r: Vector3<f64>, v: Vector3<f64>) -> Self {
        Self { r, v }
    }

    pub fn radius(&self) -> f64 {
        self.r.norm()
    }

    pub fn speed(&self) -> f64 {
        self.v.norm()
    }

    /// Specific angular momentum h = r x v (km^2/s).
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.r.cross(&self.v)
    }

    /// Specific orbital energy (km^2/s^2).
    pub fn energy(&self, k: f64) -> f64 {
        0.5 * self.v.norm_squared() - k / self.radius()
    }

    /// Eccentricity vector, pointing at periapsis.
    pub fn eccentricity_vector(&self, k: f64) -> Vector3<f64> {
        let r = self.radius();
        ((self.v.norm_squared() - k / r) * self.r - self.r.dot(&self.v) * self.v) / k
    }

    /// Orbital period (s), `None` unless the orbit is bound.
    pub fn period(&self, k: f64) -> Option<f64> {
        let energy = self.energy(k);
        if energy < 0.0 {
            let sma = -k / (2.0 * energy);
            Some(TAU * (sma.powi(3) / k).sqrt())
        } else {
            None
        }
    }

    pub(crate) fn validate(&self) -> TwoBodyResult<()> {
        for (parameter, vec) in [("r", &self.r), ("v", &self.v)] {
            for value in vec.iter() {
                ensure!(
                    value.is_finite(),
                    DomainSnafu {
                        parameter,
                        value: *value,
                        reason: "state vector components must be finite",
                    }
                );
            }
        }
        ensure!(
            self.radius() > 0.0,
            DomainSnafu {
                parameter: "r",
                value: 0.0,
                reason: "position vector must be non-zero",
            }
        );
        Ok(())
    }
}

pub(crate) fn validate_mu(k: f64) -> TwoBodyResult<()> {
    ensure!(
        k.is_finite() && k > 0.0,
        DomainSnafu {
            parameter: "k",
            value: k,
            reason: "gravitational parameter must be positive and finite",
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MU_EARTH;

    #[test]
    fn circular_leo_energy_and_period() {
        let r = 6778.0;
        let v = (MU_EARTH / r).sqrt();
        let state = StateVector::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0));

        let expected_energy = -MU_EARTH / (2.0 * r);
        assert!((state.energy(MU_EARTH) - expected_energy).abs() < 1e-9);

        // ~92.6 min
        let period = state.period(MU_EARTH).unwrap();
        assert!(period > 5500.0 && period < 5600.0, "LEO period {period:.0} s");
        assert!(state.eccentricity_vector(MU_EARTH).norm() < 1e-12);
    }

    #[test]
    fn escape_speed_has_no_period() {
        let r = 7000.0;
        let v = (2.0 * MU_EARTH / r).sqrt() * 1.01;
        let state = StateVector::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0));
        assert!(state.period(MU_EARTH).is_none());
    }

    #[test]
    fn rejects_zero_position_and_nan() {
        let zero = StateVector::new(Vector3::zeros(), Vector3::new(0.0, 7.5, 0.0));
        assert!(zero.validate().unwrap_err().is_domain());

        let nan = StateVector::new(Vector3::new(7000.0, f64::NAN, 0.0), Vector3::zeros());
        assert!(nan.validate().is_err());

        assert!(validate_mu(0.0).is_err());
        assert!(validate_mu(f64::INFINITY).is_err());
        assert!(validate_mu(MU_EARTH).is_ok());
    }
}
