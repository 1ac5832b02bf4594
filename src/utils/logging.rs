use log::{log_enabled, warn, Level};
use std::fmt;
use std::time::{Duration, Instant};

/// Stages of one simulation tick, in execution order after `Step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// The whole tick.
    Step,
    Inertia,
    Gravity,
    NarrowPhase,
    Presolve,
    Solve,
    Integrate,
}

impl PipelineStage {
    pub const fn label(self) -> &'static str {
        match self {
            PipelineStage::Step => "physics::step",
            PipelineStage::Inertia => "physics::inertia",
            PipelineStage::Gravity => "physics::gravity",
            PipelineStage::NarrowPhase => "physics::narrow_phase",
            PipelineStage::Presolve => "physics::presolve",
            PipelineStage::Solve => "physics::solve",
            PipelineStage::Integrate => "physics::integrate",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Emits trace lines when a pipeline stage starts and when the guard drops.
pub struct ScopedTimer {
    stage: PipelineStage,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(stage: PipelineStage) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {stage}");
        }
        Self {
            stage,
            start: Instant::now(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            log::trace!("end {} ({} µs)", self.stage, self.elapsed().as_micros());
        }
    }
}

/// Warns when a whole step took longer than `budget_ms`.
pub fn warn_if_frame_budget_exceeded(duration: Duration, budget_ms: f32) {
    let spent_ms = duration.as_secs_f32() * 1000.0;
    if spent_ms > budget_ms {
        warn!("{} exceeded budget: {spent_ms:.2} ms > {budget_ms:.2} ms", PipelineStage::Step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_are_namespaced_and_distinct() {
        let stages = [
            PipelineStage::Step,
            PipelineStage::Inertia,
            PipelineStage::Gravity,
            PipelineStage::NarrowPhase,
            PipelineStage::Presolve,
            PipelineStage::Solve,
            PipelineStage::Integrate,
        ];
        for (i, a) in stages.iter().enumerate() {
            assert!(a.label().starts_with("physics::"));
            assert_eq!(a.to_string(), a.label());
            for b in &stages[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }

    #[test]
    fn timer_remembers_its_stage() {
        let timer = ScopedTimer::new(PipelineStage::Solve);
        assert_eq!(timer.stage(), PipelineStage::Solve);
        assert!(timer.elapsed() >= Duration::ZERO);
    }
}
