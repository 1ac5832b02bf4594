//! Collision detection modules: narrow-phase testers, separating axes, clipping and manifolds.

pub mod clipping;
pub mod contact;
pub mod narrowphase;
pub mod sat;

pub use contact::{
    ContactFeature, ContactGeometry, ContactManifold, ContactPoint, ContactSolverData,
};
pub use narrowphase::NarrowPhase;
pub use sat::{AxisQuery, SatAlgorithm};
