use crate::collision::contact::ContactManifold;
use crate::config::MAX_COLLISION_COUNT;
use crate::utils::BodyHandle;

/// Fixed-capacity table of this step's manifolds.
///
/// Cleared at the start of every step and refilled by the narrow phase, so
/// nothing survives into the next step.
#[derive(Debug, Clone)]
pub struct CollisionManager {
    manifolds: Vec<ContactManifold>,
    has_collided: Vec<bool>,
    capacity: usize,
    dropped: usize,
}

impl Default for CollisionManager {
    fn default() -> Self {
        Self::with_capacity(MAX_COLLISION_COUNT)
    }
}

impl CollisionManager {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            manifolds: Vec::with_capacity(capacity),
            has_collided: vec![false; capacity],
            capacity,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Empties every slot and resets the per-slot flags.
    pub fn clean_frame(&mut self) {
        self.manifolds.clear();
        self.has_collided.iter_mut().for_each(|flag| *flag = false);
        self.dropped = 0;
    }

    /// Stores `manifold` in the next free slot. Returns `false` when the table is full.
    pub fn renew_contacts(&mut self, manifold: ContactManifold) -> bool {
        let slot = self.manifolds.len();
        if slot >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.manifolds.push(manifold);
        self.has_collided[slot] = true;
        true
    }

    pub fn has_collided(&self, slot: usize) -> bool {
        self.has_collided.get(slot).copied().unwrap_or(false)
    }

    /// Number of pairs that did not fit this step.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }

    pub fn manifolds(&self) -> &[ContactManifold] {
        &self.manifolds
    }

    pub fn manifolds_mut(&mut self) -> &mut [ContactManifold] {
        &mut self.manifolds
    }

    /// Manifold of the pair, in either order.
    pub fn find(&self, a: BodyHandle, b: BodyHandle) -> Option<&ContactManifold> {
        self.manifolds
            .iter()
            .find(|m| (m.body_a == a && m.body_b == b) || (m.body_a == b && m.body_b == a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::contact::{ContactFeature, ContactGeometry};
    use crate::core::types::MaterialPairProperties;
    use glam::Vec3;

    fn manifold(a: usize, b: usize) -> ContactManifold {
        ContactManifold::new(
            BodyHandle::new(a, 0),
            BodyHandle::new(b, 0),
            ContactGeometry::single(Vec3::Y, Vec3::ZERO, -0.1, ContactFeature::Point),
            MaterialPairProperties::default(),
        )
    }

    #[test]
    fn full_table_drops_later_pairs() {
        let mut manager = CollisionManager::with_capacity(2);
        assert!(manager.renew_contacts(manifold(0, 1)));
        assert!(manager.renew_contacts(manifold(0, 2)));
        assert!(!manager.renew_contacts(manifold(1, 2)));

        assert_eq!(manager.len(), 2);
        assert_eq!(manager.dropped(), 1);
        assert!(manager.has_collided(1));
        assert!(manager.find(BodyHandle::new(2, 0), BodyHandle::new(0, 0)).is_some());
        assert!(manager.find(BodyHandle::new(1, 0), BodyHandle::new(2, 0)).is_none());
    }

    #[test]
    fn clean_frame_resets_everything() {
        let mut manager = CollisionManager::with_capacity(1);
        manager.renew_contacts(manifold(0, 1));
        manager.renew_contacts(manifold(0, 1));
        manager.clean_frame();

        assert!(manager.is_empty());
        assert_eq!(manager.dropped(), 0);
        assert!(!manager.has_collided(0));
    }
}
