pub mod anomaly;
pub mod elements;
pub mod maneuvers;
pub mod propagator;
pub mod state;

pub use elements::{elements_to_state, state_to_elements, ElementSet, Geometry, OrbitKind, OrbitalElements};
pub use maneuvers::{bielliptic, circular_velocity, hohmann, BiellipticTransfer, HohmannTransfer};
pub use propagator::{propagate, propagate_batch, propagate_with};
pub use state::StateVector;
