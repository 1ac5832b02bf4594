use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Unique identifier with generation tracking to prevent stale references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GenerationalId {
    pub index: usize,
    pub generation: u32,
}

impl GenerationalId {
    pub fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Stable handle to a physics instance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct BodyHandle(pub GenerationalId);

impl BodyHandle {
    pub fn new(index: usize, generation: u32) -> Self {
        Self(GenerationalId::new(index, generation))
    }

    pub fn index(&self) -> usize {
        self.0.index
    }

    pub fn generation(&self) -> u32 {
        self.0.generation
    }

    pub fn is_null(&self) -> bool {
        self.0.index == usize::MAX
    }
}

impl Default for BodyHandle {
    fn default() -> Self {
        Self(GenerationalId::new(usize::MAX, 0))
    }
}

/// Fixed-capacity slot allocator handing out generational handles.
///
/// Free slots are reused lowest-index-first on a fresh allocator and in release
/// order afterwards; every release bumps the slot generation so stale handles
/// stop resolving.
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    generations: Vec<u32>,
    occupied: Vec<bool>,
    free_list: VecDeque<usize>,
}

impl SlotAllocator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: vec![0; capacity],
            occupied: vec![false; capacity],
            free_list: (0..capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    pub fn allocate(&mut self) -> Option<BodyHandle> {
        let index = self.free_list.pop_front()?;
        self.occupied[index] = true;
        Some(BodyHandle::new(index, self.generations[index]))
    }

    pub fn release(&mut self, handle: BodyHandle) -> bool {
        if !self.is_valid(handle) {
            return false;
        }
        let index = handle.index();
        self.occupied[index] = false;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push_back(index);
        true
    }

    pub fn is_valid(&self, handle: BodyHandle) -> bool {
        self.occupied.get(handle.index()).copied().unwrap_or(false)
            && self.generations[handle.index()] == handle.generation()
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied.get(index).copied().unwrap_or(false)
    }

    /// Handle currently stored in `index`, if the slot is in use.
    pub fn handle_at(&self, index: usize) -> Option<BodyHandle> {
        self.is_occupied(index)
            .then(|| BodyHandle::new(index, self.generations[index]))
    }

    pub fn handles(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        (0..self.capacity()).filter_map(move |index| self.handle_at(index))
    }

    pub fn len(&self) -> usize {
        self.capacity() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
