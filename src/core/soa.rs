use glam::{Mat3, Quat, Vec3};

use crate::core::{
    collider::{ColliderShape, ShapeKind, WorldShape},
    convex::ConvexShapeCache,
    plane::Plane,
    rigidbody::RigidBody,
    types::{Material, Transform, Velocity},
};
use crate::error::{PhysicsError, Result};
use crate::utils::{allocator::SlotAllocator, math::rotate_inverse_inertia, BodyHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyFlags {
    pub is_static: bool,
    pub enabled: bool,
    pub initialized: bool,
}

impl Default for BodyFlags {
    fn default() -> Self {
        Self {
            is_static: false,
            enabled: true,
            initialized: false,
        }
    }
}

/// Structure-of-Arrays storage for the physics instances.
///
/// Every column is allocated up front for the full capacity. Slots are handed
/// out by a [`SlotAllocator`]; free slots keep stale data with
/// `initialized == false`.
#[derive(Debug, Clone)]
pub struct BodiesSoA {
    slots: SlotAllocator,

    pub transforms: Vec<Transform>,
    pub velocities: Vec<Velocity>,

    // Mass properties
    pub masses: Vec<f32>,
    pub inverse_masses: Vec<f32>,
    pub local_inverse_inertias: Vec<Mat3>,
    /// World-space inverse inertia, refreshed once per step.
    pub inverse_inertias: Vec<Mat3>,

    // Material & shape
    pub materials: Vec<Material>,
    pub shapes: Vec<Option<ColliderShape>>,
    pub convex_caches: Vec<Option<ConvexShapeCache>>,
    pub flags: Vec<BodyFlags>,
}

impl BodiesSoA {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotAllocator::with_capacity(capacity),
            transforms: vec![Transform::default(); capacity],
            velocities: vec![Velocity::default(); capacity],
            masses: vec![0.0; capacity],
            inverse_masses: vec![0.0; capacity],
            local_inverse_inertias: vec![Mat3::ZERO; capacity],
            inverse_inertias: vec![Mat3::ZERO; capacity],
            materials: vec![Material::default(); capacity],
            shapes: vec![None; capacity],
            convex_caches: vec![None; capacity],
            flags: vec![BodyFlags::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Validates `body` and writes it into a free slot.
    pub fn insert(&mut self, body: RigidBody) -> Result<BodyHandle> {
        let props = body.mass_properties()?;
        let handle = self
            .slots
            .allocate()
            .ok_or(PhysicsError::CapacityExceeded {
                capacity: self.capacity(),
            })?;
        let index = handle.index();

        let mut transform = body.transform;
        transform.scale = body.shape.transform_scale(transform.scale);

        self.transforms[index] = transform;
        self.velocities[index] = if body.is_static {
            Velocity::default()
        } else {
            body.velocity
        };
        self.masses[index] = if body.is_static { 0.0 } else { body.mass };
        self.inverse_masses[index] = props.inverse_mass;
        self.local_inverse_inertias[index] = props.local_inverse_inertia;
        self.inverse_inertias[index] =
            rotate_inverse_inertia(props.local_inverse_inertia, transform.rotation);
        self.materials[index] = body.material;
        self.convex_caches[index] = body
            .shape
            .local_convex()
            .map(|local| ConvexShapeCache::new(local, &transform));
        self.shapes[index] = Some(body.shape);
        self.flags[index] = BodyFlags {
            is_static: body.is_static,
            enabled: body.enabled,
            initialized: true,
        };

        Ok(handle)
    }

    /// Frees the slot and returns the body it held.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let body = self.get(handle)?.to_rigid_body();
        let index = handle.index();
        self.slots.release(handle);
        self.flags[index] = BodyFlags::default();
        self.shapes[index] = None;
        self.convex_caches[index] = None;
        self.velocities[index] = Velocity::default();
        Some(body)
    }

    pub fn is_valid(&self, handle: BodyHandle) -> bool {
        self.slots.is_valid(handle)
    }

    pub fn handle_at(&self, index: usize) -> Option<BodyHandle> {
        self.slots.handle_at(index)
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.slots.handles()
    }

    /// Indices of initialized slots in ascending order.
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity()).filter(move |&i| self.flags[i].initialized)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<BodyRef<'_>> {
        self.is_valid(handle).then(|| BodyRef {
            soa: self,
            index: handle.index(),
        })
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<BodyMut<'_>> {
        if !self.is_valid(handle) {
            return None;
        }
        let i = handle.index();
        Some(BodyMut {
            handle,
            transform: &mut self.transforms[i],
            velocity: &mut self.velocities[i],
            inverse_mass: self.inverse_masses[i],
            inverse_inertia: self.inverse_inertias[i],
            material: &mut self.materials[i],
            flags: &mut self.flags[i],
        })
    }

    pub fn is_movable(&self, index: usize) -> bool {
        let flags = self.flags[index];
        flags.initialized && flags.enabled && !flags.is_static
    }

    pub fn shape_kind(&self, index: usize) -> Option<ShapeKind> {
        self.shapes[index].as_ref().map(ColliderShape::kind)
    }

    /// Rotates every body-space inverse inertia into world space.
    pub fn update_world_inertias(&mut self) {
        for i in 0..self.capacity() {
            if self.flags[i].initialized {
                self.inverse_inertias[i] = rotate_inverse_inertia(
                    self.local_inverse_inertias[i],
                    self.transforms[i].rotation,
                );
            }
        }
    }

    /// Adds `gravity * dt` to every movable body.
    pub fn apply_gravity(&mut self, gravity: Vec3, dt: f32) {
        for i in 0..self.capacity() {
            if self.is_movable(i) {
                self.velocities[i].linear += gravity * dt;
            }
        }
    }

    /// Rebuilds the cached world polyhedron of `index` if its transform moved.
    pub fn refresh_shape(&mut self, index: usize) -> bool {
        let transform = self.transforms[index];
        self.convex_caches[index]
            .as_mut()
            .is_some_and(|cache| cache.refresh(&transform))
    }

    /// Resolves the world-space collision geometry of `index`.
    ///
    /// Convex shapes are read from the cache; call [`Self::refresh_shape`] first.
    pub fn world_shape(&self, index: usize) -> Option<WorldShape<'_>> {
        let transform = &self.transforms[index];
        match self.shapes[index].as_ref()? {
            ColliderShape::Sphere { .. } => Some(WorldShape::Sphere {
                center: transform.position,
                radius: transform.scale.max_element(),
            }),
            ColliderShape::Plane { normal } => Some(WorldShape::Plane(Plane::new(
                transform.position,
                transform.rotation * *normal,
            ))),
            ColliderShape::Box { .. } | ColliderShape::ConvexMesh { .. } => self.convex_caches
                [index]
                .as_ref()
                .map(|cache| WorldShape::Convex(cache.world())),
        }
    }

    /// Applies an impulse at lever arm `r` from the centre of mass.
    pub fn apply_impulse(&mut self, index: usize, impulse: Vec3, r: Vec3) {
        if self.flags[index].is_static {
            return;
        }
        let velocity = &mut self.velocities[index];
        velocity.linear += impulse * self.inverse_masses[index];
        velocity.angular += self.inverse_inertias[index] * r.cross(impulse);
    }
}

/// Read-only view of one occupied slot.
pub struct BodyRef<'a> {
    soa: &'a BodiesSoA,
    index: usize,
}

impl<'a> BodyRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn transform(&self) -> &Transform {
        &self.soa.transforms[self.index]
    }
    pub fn velocity(&self) -> &Velocity {
        &self.soa.velocities[self.index]
    }
    pub fn mass(&self) -> f32 {
        self.soa.masses[self.index]
    }
    pub fn inverse_mass(&self) -> f32 {
        self.soa.inverse_masses[self.index]
    }
    pub fn inverse_inertia(&self) -> Mat3 {
        self.soa.inverse_inertias[self.index]
    }
    pub fn material(&self) -> &Material {
        &self.soa.materials[self.index]
    }
    pub fn flags(&self) -> BodyFlags {
        self.soa.flags[self.index]
    }
    pub fn is_static(&self) -> bool {
        self.soa.flags[self.index].is_static
    }
    pub fn is_enabled(&self) -> bool {
        self.soa.flags[self.index].enabled
    }
    pub fn shape(&self) -> Option<&'a ColliderShape> {
        self.soa.shapes[self.index].as_ref()
    }
    pub fn convex_cache(&self) -> Option<&'a ConvexShapeCache> {
        self.soa.convex_caches[self.index].as_ref()
    }

    pub fn to_rigid_body(&self) -> RigidBody {
        let shape = self
            .shape()
            .cloned()
            .unwrap_or(ColliderShape::Sphere { radius: 1.0 });
        let flags = self.flags();
        RigidBody {
            transform: *self.transform(),
            velocity: *self.velocity(),
            mass: self.mass(),
            material: *self.material(),
            shape,
            is_static: flags.is_static,
            enabled: flags.enabled,
        }
    }
}

/// Mutable view of one occupied slot.
pub struct BodyMut<'a> {
    pub handle: BodyHandle,
    pub transform: &'a mut Transform,
    pub velocity: &'a mut Velocity,
    inverse_mass: f32,
    inverse_inertia: Mat3,
    pub material: &'a mut Material,
    pub flags: &'a mut BodyFlags,
}

impl<'a> BodyMut<'a> {
    pub fn apply_impulse(&mut self, impulse: Vec3, position: Vec3) {
        if self.flags.is_static {
            return;
        }
        self.velocity.linear += impulse * self.inverse_mass;
        let torque = (position - self.transform.position).cross(impulse);
        self.velocity.angular += self.inverse_inertia * torque;
    }

    /// Static bodies keep a zero velocity.
    pub fn set_velocity(&mut self, linear: Vec3, angular: Vec3) {
        if self.flags.is_static {
            return;
        }
        self.velocity.linear = linear;
        self.velocity.angular = angular;
    }

    /// Moves the body; the scale encoding the collider extents is kept.
    pub fn set_pose(&mut self, position: Vec3, rotation: Quat) {
        self.transform.position = position;
        self.transform.rotation = rotation.normalize();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.flags.enabled = enabled;
    }

    pub fn is_static(&self) -> bool {
        self.flags.is_static
    }
}
