use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;

use crate::utils::BodyHandle;

/// Which row of a contact constraint an impulse was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpulseKind {
    Normal,
    /// Friction along the manifold tangent with this index (0 or 1).
    Tangent(u8),
}

/// Plain structured events emitted while a step runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverEvent {
    ManifoldFound {
        body_a: BodyHandle,
        body_b: BodyHandle,
        normal: Vec3,
        point_count: usize,
        deepest: f32,
    },
    ImpulseApplied {
        body_a: BodyHandle,
        body_b: BodyHandle,
        kind: ImpulseKind,
        magnitude: f32,
        iteration: u32,
    },
}

/// Optional collaborator receiving [`SolverEvent`]s, typically a debug overlay.
pub trait SolverObserver: Send + Sync {
    fn notify(&self, event: &SolverEvent);
}

/// Observer that stores every event it receives.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<SolverEvent>>,
}

impl EventRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SolverEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<SolverEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl SolverObserver for EventRecorder {
    fn notify(&self, event: &SolverEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_collects_and_drains_events() {
        let recorder = EventRecorder::new();
        let observer: Arc<dyn SolverObserver> = recorder.clone();
        observer.notify(&SolverEvent::ImpulseApplied {
            body_a: BodyHandle::new(0, 0),
            body_b: BodyHandle::new(1, 0),
            kind: ImpulseKind::Normal,
            magnitude: 0.5,
            iteration: 0,
        });

        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.is_empty());
    }
}
