use thiserror::Error;

use crate::utils::allocator::BodyHandle;

/// Configuration faults reported when bodies are created or addressed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("instance table is full ({capacity} slots)")]
    CapacityExceeded { capacity: usize },
    #[error("dynamic bodies need a finite positive mass, got {0}")]
    InvalidMass(f32),
    #[error("collider dimensions must be finite and positive, got {0:?}")]
    InvalidDimensions(glam::Vec3),
    #[error("plane normal must be non-zero")]
    DegenerateNormal,
    #[error("invalid convex shape: {0}")]
    InvalidShape(String),
    #[error("plane colliders can only be static")]
    StaticPlaneRequired,
    #[error("unknown or stale body handle {0:?}")]
    UnknownBody(BodyHandle),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
