//! Utility helpers including math extensions, allocators and logging.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{BodyHandle, GenerationalId, SlotAllocator};
pub use math::*;
