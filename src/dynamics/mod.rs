//! Simulation dynamics modules: contact solving, integration and solver events.

pub mod integrator;
pub mod observer;
pub mod solver;

pub use integrator::Integrator;
pub use observer::{EventRecorder, ImpulseKind, SolverEvent, SolverObserver};
pub use solver::{ContactSolver, SolverStepMetrics};
