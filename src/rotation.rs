use nalgebra::{Rotation3, Unit, Vector3};

use crate::errors::TwoBodyError;

/// Principal axis of an elementary rotation (1, 2, 3 in textbook notation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }
}

impl TryFrom<u8> for Axis {
    type Error = TwoBodyError;

    fn try_from(axis: u8) -> Result<Self, Self::Error> {
        match axis {
            1 => Ok(Axis::X),
            2 => Ok(Axis::Y),
            3 => Ok(Axis::Z),
            _ => Err(TwoBodyError::InvalidAxis { axis }),
        }
    }
}

/// Apply the elementary frame rotation R1, R2 or R3 of `angle` (rad) to `v`.
///
/// This rotates the coordinate frame, not the vector: `rotate(x, Z, pi/2)`
/// expresses the x unit vector in a frame turned a quarter turn about z, which
/// gives -y.
pub fn rotate(v: &Vector3<f64>, axis: Axis, angle: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&axis.unit(), -angle) * v
}

/// Carry a perifocal (PQW) vector into the inertial frame: R3(-raan) R1(-inc) R3(-argp).
pub fn perifocal_to_inertial(v: &Vector3<f64>, raan: f64, inc: f64, argp: f64) -> Vector3<f64> {
    let v = rotate(v, Axis::Z, -argp);
    let v = rotate(&v, Axis::X, -inc);
    rotate(&v, Axis::Z, -raan)
}
