//! Core types describing physics instances, their shapes, and shared data.

pub mod collider;
pub mod convex;
pub mod plane;
pub mod rigidbody;
pub mod soa;
pub mod types;

pub use collider::{ColliderShape, ShapeKind, WorldShape};
pub use convex::{Aabb, ConvexHullData, ConvexShape, ConvexShapeCache, Edge, Face};
pub use plane::Plane;
pub use rigidbody::{MassProperties, RigidBody};
pub use soa::{BodiesSoA, BodyFlags, BodyMut, BodyRef};
pub use types::{Material, MaterialPairProperties, Transform, Velocity};
