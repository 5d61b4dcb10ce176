use nalgebra::Vector3;
use snafu::ensure;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::anomaly;
use super::state::{validate_mu, StateVector};
use crate::config::ConversionConfig;
use crate::errors::{DegenerateGeometrySnafu, DomainSnafu, TwoBodyResult};
use crate::rotation::perifocal_to_inertial;

// ---------------------------------------------------------------------------
// Orbit classification
// ---------------------------------------------------------------------------

/// Conic section described by the eccentricity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitKind {
    Circular,
    Elliptical,
    Parabolic,
    Hyperbolic,
}

impl OrbitKind {
    pub fn from_ecc(ecc: f64, tol: f64) -> Self {
        if ecc < tol {
            OrbitKind::Circular
        } else if (ecc - 1.0).abs() < tol {
            OrbitKind::Parabolic
        } else if ecc < 1.0 {
            OrbitKind::Elliptical
        } else {
            OrbitKind::Hyperbolic
        }
    }
}

/// Which of the angles (raan, argp) are defined for an orbit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// All six elements defined.
    EllipticalInclined,
    /// argp undefined; true anomaly replaced by the argument of latitude.
    CircularInclined,
    /// raan undefined; argp replaced by the longitude of periapsis.
    EllipticalEquatorial,
    /// raan and argp undefined; true anomaly replaced by the true longitude.
    CircularEquatorial,
}

impl Geometry {
    pub fn classify(ecc: f64, inc: f64, tol: f64) -> Self {
        let circular = ecc < tol;
        let equatorial = inc.abs() < tol || (inc - PI).abs() < tol;
        match (circular, equatorial) {
            (false, false) => Geometry::EllipticalInclined,
            (true, false) => Geometry::CircularInclined,
            (false, true) => Geometry::EllipticalEquatorial,
            (true, true) => Geometry::CircularEquatorial,
        }
    }
}

// ---------------------------------------------------------------------------
// Classical elements
// ---------------------------------------------------------------------------

/// Classical orbital elements.
///
/// Hyperbolic orbits carry a negative semi-major axis. Angles that are not
/// defined for the orbit geometry are reported as 0, see [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    pub sma: f64,       // semi-major axis, km
    pub ecc: f64,       // eccentricity (0 = circular)
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // right ascension of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // true anomaly, rad
}

impl OrbitalElements {
    pub fn new(sma: f64, ecc: f64, inc: f64, raan: f64, argp: f64, true_anom: f64) -> Self {
        Self {
            sma,
            ecc,
            inc,
            raan,
            argp,
            true_anom,
        }
    }

    /// Circular orbit of the given radius (km) and inclination.
    pub fn circular(radius: f64, inc: f64) -> Self {
        Self::new(radius, 0.0, inc, 0.0, 0.0, 0.0)
    }

    pub fn semi_latus_rectum(&self) -> f64 {
        self.sma * (1.0 - self.ecc * self.ecc)
    }

    /// Orbital period (s) for bound orbits.
    pub fn period(&self, k: f64) -> Option<f64> {
        if self.ecc < 1.0 && self.sma > 0.0 && self.sma.is_finite() {
            Some(TAU * (self.sma.powi(3) / k).sqrt())
        } else {
            None
        }
    }

    pub fn geometry(&self, tol: f64) -> Geometry {
        Geometry::classify(self.ecc, self.inc, tol)
    }

    /// Rewrite the undefined angles of a circular and/or equatorial orbit in
    /// terms of the composite angles that remain defined, with the undefined
    /// ones set to 0. Retrograde equatorial orbits measure longitudes
    /// clockwise. For an exactly circular or equatorial orbit the state vector
    /// is unchanged; within `tol` of one it moves by O(tol).
    pub fn canonicalize(&self, tol: f64) -> Self {
        let retrograde = self.inc > FRAC_PI_2;
        let (raan, argp, true_anom) = match self.geometry(tol) {
            Geometry::EllipticalInclined => (self.raan, self.argp, self.true_anom),
            Geometry::CircularInclined => (self.raan, 0.0, self.argp + self.true_anom),
            Geometry::EllipticalEquatorial => {
                let lonper = if retrograde {
                    self.argp - self.raan
                } else {
                    self.raan + self.argp
                };
                (0.0, lonper, self.true_anom)
            }
            Geometry::CircularEquatorial => {
                let truelon = if retrograde {
                    self.argp + self.true_anom - self.raan
                } else {
                    self.raan + self.argp + self.true_anom
                };
                (0.0, 0.0, truelon)
            }
        };
        Self {
            raan: raan.rem_euclid(TAU),
            argp: argp.rem_euclid(TAU),
            true_anom: true_anom.rem_euclid(TAU),
            ..*self
        }
    }

    fn validate(&self, tol: f64) -> TwoBodyResult<()> {
        for (parameter, value) in [
            ("sma", self.sma),
            ("ecc", self.ecc),
            ("inc", self.inc),
            ("raan", self.raan),
            ("argp", self.argp),
            ("true_anom", self.true_anom),
        ] {
            ensure!(
                value.is_finite(),
                DomainSnafu {
                    parameter,
                    value,
                    reason: "orbital elements must be finite",
                }
            );
        }
        ensure!(
            self.ecc >= 0.0,
            DomainSnafu {
                parameter: "ecc",
                value: self.ecc,
                reason: "eccentricity must be non-negative",
            }
        );
        ensure!(
            (self.ecc - 1.0).abs() >= tol,
            DegenerateGeometrySnafu {
                reason: "parabolic orbit: the semi-major axis does not define the conic",
            }
        );
        if self.ecc < 1.0 {
            ensure!(
                self.sma > 0.0,
                DomainSnafu {
                    parameter: "sma",
                    value: self.sma,
                    reason: "closed orbits need a positive semi-major axis",
                }
            );
        } else {
            ensure!(
                self.sma < 0.0,
                DomainSnafu {
                    parameter: "sma",
                    value: self.sma,
                    reason: "hyperbolic orbits need a negative semi-major axis",
                }
            );
        }
        ensure!(
            1.0 + self.ecc * self.true_anom.cos() > 0.0,
            DomainSnafu {
                parameter: "true_anom",
                value: self.true_anom,
                reason: "true anomaly lies beyond the hyperbolic asymptote",
            }
        );
        Ok(())
    }

    /// Convert to an inertial state vector.
    pub fn to_state(&self, k: f64, config: &ConversionConfig) -> TwoBodyResult<StateVector> {
        validate_mu(k)?;
        config.validate()?;
        self.validate(config.tol)?;

        let elem = if config.resolve_degenerate {
            self.canonicalize(config.tol)
        } else {
            *self
        };

        let p = elem.semi_latus_rectum();
        ensure!(
            p > 0.0 && p.is_finite(),
            DomainSnafu {
                parameter: "p",
                value: p,
                reason: "semi-latus rectum must be positive",
            }
        );

        let (sin_nu, cos_nu) = elem.true_anom.sin_cos();
        let r_pqw = p / (1.0 + elem.ecc * cos_nu);

        // Position in perifocal frame (PQW)
        let r_pqw_vec = Vector3::new(r_pqw * cos_nu, r_pqw * sin_nu, 0.0);

        // Velocity in perifocal frame
        let sqrt_mu_p = (k / p).sqrt();
        let v_pqw_vec = Vector3::new(-sqrt_mu_p * sin_nu, sqrt_mu_p * (elem.ecc + cos_nu), 0.0);

        Ok(StateVector {
            r: perifocal_to_inertial(&r_pqw_vec, elem.raan, elem.inc, elem.argp),
            v: perifocal_to_inertial(&v_pqw_vec, elem.raan, elem.inc, elem.argp),
        })
    }

    /// Recover the classical elements of a state vector.
    pub fn from_state(k: f64, state: &StateVector, config: &ConversionConfig) -> TwoBodyResult<Self> {
        ElementSet::from_state(k, state, config).map(|set| set.elements)
    }

    /// Advance the true anomaly by `tof` seconds through Kepler's equation.
    ///
    /// Only the anomaly changes; parabolic orbits are rejected since their
    /// semi-major axis is unbounded.
    pub fn propagate_mean_anomaly(&self, k: f64, tof: f64) -> TwoBodyResult<Self> {
        validate_mu(k)?;
        ensure!(
            tof.is_finite(),
            DomainSnafu {
                parameter: "tof",
                value: tof,
                reason: "time of flight must be finite",
            }
        );
        ensure!(
            self.sma.is_finite() && self.sma != 0.0,
            DegenerateGeometrySnafu {
                reason: "mean motion is undefined without a finite semi-major axis",
            }
        );
        let mean_motion = (k / self.sma.abs().powi(3)).sqrt();
        let mean = anomaly::mean_from_true(self.ecc, self.true_anom)? + mean_motion * tof;
        let true_anom = anomaly::true_from_mean(self.ecc, mean)?;
        Ok(Self {
            true_anom,
            ..*self
        })
    }
}

// ---------------------------------------------------------------------------
// Extended element set (state -> elements)
// ---------------------------------------------------------------------------

/// Classical elements together with the auxiliary quantities that stay
/// defined when some classical angles are not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementSet {
    pub elements: OrbitalElements,
    pub p: f64,                 // semi-latus rectum, km
    pub mean_anom: f64,         // rad, signed and unbounded for open orbits
    pub arglat: Option<f64>,    // argument of latitude, inclined orbits
    pub truelon: Option<f64>,   // true longitude, equatorial orbits
    pub lonper: Option<f64>,    // longitude of periapsis, elliptical equatorial orbits
    pub kind: OrbitKind,
    pub geometry: Geometry,
}

/// Angle from `from` to `to`, measured about `normal`, in [0, 2pi).
fn angle_about(from: &Vector3<f64>, to: &Vector3<f64>, normal: &Vector3<f64>) -> f64 {
    normal
        .dot(&from.cross(to))
        .atan2(from.dot(to))
        .rem_euclid(TAU)
}

/// Longitude of a vector in the equatorial plane; clockwise for retrograde orbits.
fn equatorial_longitude(vec: &Vector3<f64>, retrograde: bool) -> f64 {
    let lon = vec.y.atan2(vec.x);
    let lon = if retrograde { -lon } else { lon };
    lon.rem_euclid(TAU)
}

impl ElementSet {
    /// Vallado's rv2coe with explicit handling of degenerate geometries.
    ///
    /// | geometry              | raan | argp                   | true anomaly         |
    /// |-----------------------|------|------------------------|----------------------|
    /// | elliptical inclined   | node | node to periapsis      | from periapsis       |
    /// | circular inclined     | node | 0                      | argument of latitude |
    /// | elliptical equatorial | 0    | longitude of periapsis | from periapsis       |
    /// | circular equatorial   | 0    | 0                      | true longitude       |
    ///
    /// Parabolic orbits report an infinite semi-major axis; `p` stays finite.
    pub fn from_state(k: f64, state: &StateVector, config: &ConversionConfig) -> TwoBodyResult<Self> {
        validate_mu(k)?;
        config.validate()?;
        state.validate()?;

        let pos = &state.r;
        let vel = &state.v;
        let r = pos.norm();
        let v = vel.norm();
        let tol = config.tol;

        // Angular momentum
        let h = state.angular_momentum();
        let h_mag = h.norm();
        ensure!(
            h_mag > 1e-12 * r * v,
            DegenerateGeometrySnafu {
                reason: "zero angular momentum: rectilinear motion has no orbital plane",
            }
        );
        let h_hat = h / h_mag;

        // Node vector
        let n = Vector3::new(-h.y, h.x, 0.0);

        // Eccentricity vector
        let e_vec = state.eccentricity_vector(k);
        let ecc = e_vec.norm();

        let kind = OrbitKind::from_ecc(ecc, tol);
        let p = h_mag * h_mag / k;
        let sma = if kind == OrbitKind::Parabolic {
            f64::INFINITY
        } else {
            1.0 / (2.0 / r - v * v / k)
        };

        let inc = h.x.hypot(h.y).atan2(h.z);
        let retrograde = inc > FRAC_PI_2;
        let geometry = Geometry::classify(ecc, inc, tol);

        let inclined = matches!(
            geometry,
            Geometry::EllipticalInclined | Geometry::CircularInclined
        );
        let arglat = inclined.then(|| angle_about(&n, pos, &h_hat));
        let truelon = (!inclined).then(|| equatorial_longitude(pos, retrograde));
        let lonper =
            (geometry == Geometry::EllipticalEquatorial).then(|| equatorial_longitude(&e_vec, retrograde));

        let raan = if inclined {
            n.y.atan2(n.x).rem_euclid(TAU)
        } else {
            0.0
        };

        let (argp, true_anom) = match geometry {
            Geometry::EllipticalInclined => {
                (angle_about(&n, &e_vec, &h_hat), angle_about(&e_vec, pos, &h_hat))
            }
            Geometry::CircularInclined => (0.0, arglat.unwrap_or_default()),
            Geometry::EllipticalEquatorial => {
                (lonper.unwrap_or_default(), angle_about(&e_vec, pos, &h_hat))
            }
            Geometry::CircularEquatorial => (0.0, truelon.unwrap_or_default()),
        };

        let mean_anom = match kind {
            OrbitKind::Circular => true_anom,
            _ => anomaly::mean_from_true(ecc, true_anom)?,
        };

        Ok(Self {
            elements: OrbitalElements {
                sma,
                ecc,
                inc,
                raan,
                argp,
                true_anom,
            },
            p,
            mean_anom,
            arglat,
            truelon,
            lonper,
            kind,
            geometry,
        })
    }
}

// ---------------------------------------------------------------------------
// Plain-number entry points
// ---------------------------------------------------------------------------

/// Classical elements to (r, v). `tol` flags circular and equatorial orbits,
/// whose undefined angles are folded into the composite angles before
/// conversion (see [`OrbitalElements::canonicalize`]).
#[allow(clippy::too_many_arguments)]
pub fn elements_to_state(
    k: f64,
    a: f64,
    ecc: f64,
    inc: f64,
    raan: f64,
    argp: f64,
    nu: f64,
    tol: f64,
) -> TwoBodyResult<(Vector3<f64>, Vector3<f64>)> {
    let state = OrbitalElements::new(a, ecc, inc, raan, argp, nu)
        .to_state(k, &ConversionConfig::with_tol(tol))?;
    Ok((state.r, state.v))
}

/// (r, v) to classical elements with the default conversion settings.
pub fn state_to_elements(k: f64, r: &Vector3<f64>, v: &Vector3<f64>) -> TwoBodyResult<OrbitalElements> {
    OrbitalElements::from_state(k, &StateVector::new(*r, *v), &ConversionConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MU_EARTH, R_EARTH};

    fn wrap_diff(a: f64, b: f64) -> f64 {
        ((a - b + PI).rem_euclid(TAU) - PI).abs()
    }

    #[test]
    fn circular_leo_roundtrip() {
        let cfg = ConversionConfig::default();
        let orbit = OrbitalElements::circular(R_EARTH + 400.0, 51.6_f64.to_radians());
        let state = orbit.to_state(MU_EARTH, &cfg).unwrap();

        let recovered = OrbitalElements::from_state(MU_EARTH, &state, &cfg).unwrap();
        assert!((recovered.sma - orbit.sma).abs() < 1e-6, "SMA mismatch");
        assert!(recovered.ecc < 1e-12, "Should be nearly circular");
        assert!((recovered.inc - orbit.inc).abs() < 1e-12, "Inclination mismatch");
    }

    #[test]
    fn circular_orbit_speed() {
        let radius = R_EARTH + 400.0;
        let orbit = OrbitalElements::circular(radius, 0.0);
        let state = orbit.to_state(MU_EARTH, &ConversionConfig::default()).unwrap();
        let expected = (MU_EARTH / radius).sqrt();
        assert!((state.speed() - expected).abs() < 1e-9, "Circular orbit speed mismatch");
    }

    #[test]
    fn leo_period() {
        let orbit = OrbitalElements::circular(R_EARTH + 400.0, 0.0);
        let period = orbit.period(MU_EARTH).unwrap();
        // ISS period ~92 min = ~5540 s
        assert!(period > 5400.0 && period < 5700.0, "LEO period should be ~92 min, got {:.0} s", period);
        assert!(OrbitalElements::new(-7000.0, 1.5, 0.3, 0.0, 0.0, 0.0).period(MU_EARTH).is_none());
    }

    #[test]
    fn degenerate_angles_are_folded() {
        let tol = 1e-5;
        let ce = OrbitalElements::new(8000.0, 0.0, 0.0, 0.7, 1.1, 2.0).canonicalize(tol);
        assert_eq!((ce.raan, ce.argp), (0.0, 0.0));
        assert!((ce.true_anom - 3.8).abs() < 1e-12);

        let ci = OrbitalElements::new(8000.0, 0.0, 0.5, 0.7, 1.1, 2.0).canonicalize(tol);
        assert_eq!(ci.argp, 0.0);
        assert!((ci.raan - 0.7).abs() < 1e-12);
        assert!((ci.true_anom - 3.1).abs() < 1e-12);

        let retro = OrbitalElements::new(8000.0, 0.3, PI, 0.7, 1.1, 2.0).canonicalize(tol);
        assert_eq!(retro.raan, 0.0);
        assert!((retro.argp - 0.4).abs() < 1e-12);
    }

    #[test]
    fn exact_degenerate_states_match_literal_formulas() {
        let resolved = ConversionConfig::default();
        let literal = ConversionConfig::literal();
        for inc in [0.0, PI] {
            for ecc in [0.0, 0.3] {
                let elem = OrbitalElements::new(8000.0, ecc, inc, 0.7, 1.1, 2.0);
                let a = elem.to_state(MU_EARTH, &resolved).unwrap();
                let b = elem.to_state(MU_EARTH, &literal).unwrap();
                assert!((a.r - b.r).norm() < 1e-8, "inc={inc} ecc={ecc}");
                assert!((a.v - b.v).norm() < 1e-11, "inc={inc} ecc={ecc}");

                // and the sentinels come back out of the inverse conversion
                let back = OrbitalElements::from_state(MU_EARTH, &a, &resolved).unwrap();
                let expected = elem.canonicalize(resolved.tol);
                assert_eq!(back.raan, 0.0);
                assert!(wrap_diff(back.argp, expected.argp) < 1e-9, "inc={inc} ecc={ecc}");
                assert!(wrap_diff(back.true_anom, expected.true_anom) < 1e-9, "inc={inc} ecc={ecc}");
            }
        }
    }

    #[test]
    fn extended_set_reports_composite_angles() {
        let cfg = ConversionConfig::default();
        let elem = OrbitalElements::new(9000.0, 0.2, 0.6, 1.0, 0.5, 0.25);
        let state = elem.to_state(MU_EARTH, &cfg).unwrap();
        let set = ElementSet::from_state(MU_EARTH, &state, &cfg).unwrap();

        assert_eq!(set.kind, OrbitKind::Elliptical);
        assert_eq!(set.geometry, Geometry::EllipticalInclined);
        assert!((set.arglat.unwrap() - 0.75).abs() < 1e-9);
        assert!(set.truelon.is_none() && set.lonper.is_none());
        assert!((set.p - elem.semi_latus_rectum()).abs() < 1e-6);
        let m = anomaly::mean_from_true(0.2, 0.25).unwrap();
        assert!((set.mean_anom - m).abs() < 1e-9);
    }

    #[test]
    fn parabolic_state_flags_infinite_sma() {
        let r = 7000.0;
        let v = (2.0 * MU_EARTH / r).sqrt();
        let state = StateVector::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0));
        let set = ElementSet::from_state(MU_EARTH, &state, &ConversionConfig::default()).unwrap();
        assert_eq!(set.kind, OrbitKind::Parabolic);
        assert!(set.elements.sma.is_infinite());
        assert!((set.p - 2.0 * r).abs() < 1e-6);
    }

    #[test]
    fn rectilinear_motion_is_degenerate() {
        let state = StateVector::new(Vector3::new(7000.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0));
        let err = ElementSet::from_state(MU_EARTH, &state, &ConversionConfig::default()).unwrap_err();
        assert!(matches!(err, crate::errors::TwoBodyError::DegenerateGeometry { .. }), "{err}");
    }

    #[test]
    fn invalid_elements_are_rejected() {
        let cfg = ConversionConfig::default();
        let bad = [
            OrbitalElements::new(-7000.0, 0.1, 0.2, 0.0, 0.0, 0.0),
            OrbitalElements::new(7000.0, 1.5, 0.2, 0.0, 0.0, 0.0),
            OrbitalElements::new(7000.0, -0.1, 0.2, 0.0, 0.0, 0.0),
            OrbitalElements::new(f64::NAN, 0.1, 0.2, 0.0, 0.0, 0.0),
            OrbitalElements::new(-7000.0, 2.0, 0.2, 0.0, 0.0, 2.5),
        ];
        for elem in bad {
            assert!(elem.to_state(MU_EARTH, &cfg).unwrap_err().is_domain(), "{elem:?}");
        }
        let parabolic = OrbitalElements::new(7000.0, 1.0, 0.2, 0.0, 0.0, 0.0);
        assert!(matches!(
            parabolic.to_state(MU_EARTH, &cfg),
            Err(crate::errors::TwoBodyError::DegenerateGeometry { .. })
        ));
        assert!(OrbitalElements::circular(7000.0, 0.1).to_state(-1.0, &cfg).is_err());
    }

    #[test]
    fn hyperbolic_elements_roundtrip() {
        let cfg = ConversionConfig::default();
        let elem = OrbitalElements::new(-12000.0, 1.8, 0.9, 2.0, 4.0, 0.7);
        let state = elem.to_state(MU_EARTH, &cfg).unwrap();
        assert!(state.energy(MU_EARTH) > 0.0);
        let back = OrbitalElements::from_state(MU_EARTH, &state, &cfg).unwrap();
        assert!((back.sma - elem.sma).abs() / elem.sma.abs() < 1e-10);
        assert!((back.ecc - elem.ecc).abs() < 1e-12);
        assert!(wrap_diff(back.argp, elem.argp) < 1e-10);
        assert!(wrap_diff(back.true_anom, elem.true_anom) < 1e-10);
    }

    #[test]
    fn open_orbits_report_signed_mean_anomaly() {
        let cfg = ConversionConfig::default();
        // inbound leg of a hyperbola
        let elem = OrbitalElements::new(-12000.0, 1.8, 0.9, 2.0, 4.0, -0.7);
        let state = elem.to_state(MU_EARTH, &cfg).unwrap();
        let set = ElementSet::from_state(MU_EARTH, &state, &cfg).unwrap();
        let expected = anomaly::mean_from_true(1.8, -0.7).unwrap();
        assert!(set.mean_anom < 0.0, "inbound mean anomaly should be negative, got {}", set.mean_anom);
        assert!((set.mean_anom - expected).abs() < 1e-9);

        // escape speed at periapsis
        let r = 7000.0;
        let v = (2.0 * MU_EARTH / r).sqrt();
        let escape = StateVector::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0));
        let set = ElementSet::from_state(MU_EARTH, &escape, &cfg).unwrap();
        assert!(set.mean_anom.abs() < 1e-9, "got {}", set.mean_anom);
    }

    #[test]
    fn mean_anomaly_propagation_completes_a_period() {
        let elem = OrbitalElements::new(12000.0, 0.4, 0.5, 0.1, 0.2, 1.3);
        let period = elem.period(MU_EARTH).unwrap();
        let later = elem.propagate_mean_anomaly(MU_EARTH, period).unwrap();
        assert!(wrap_diff(later.true_anom, elem.true_anom) < 1e-9);
        let half = elem.propagate_mean_anomaly(MU_EARTH, 0.5 * period).unwrap();
        assert!(wrap_diff(half.true_anom, elem.true_anom) > 0.1);
    }
}
