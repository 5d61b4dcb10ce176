//! Two-body orbital mechanics.
//!
//! Conversion between classical orbital elements and Cartesian state vectors,
//! and universal-variable propagation of Kepler's problem. Units are km, km/s,
//! rad, s and km^3/s^2 throughout; every call takes the gravitational
//! parameter `k` explicitly and holds no global state.

pub mod config;
pub mod constants;
pub mod errors;
pub mod orbital;
pub mod rotation;

pub use config::{ConversionConfig, SolverConfig};
pub use errors::{TwoBodyError, TwoBodyResult};
pub use orbital::{
    elements_to_state, propagate, state_to_elements, OrbitalElements, StateVector,
};
pub use rotation::{rotate, Axis};
