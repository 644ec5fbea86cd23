use std::time::Instant;

use crate::{SyncNode, Transport};

/// Caller-side cadence helper: measures the elapsed time between calls
/// and invokes the node's step with it. The node itself holds no clock,
/// so tests and fixed-timestep loops can bypass this and call
/// [`SyncNode::step`] directly.
pub struct StepDriver {
    last_step: Instant,
}

impl StepDriver {
    pub fn new() -> Self {
        Self {
            last_step: Instant::now(),
        }
    }

    /// Steps the node with the wall-clock seconds elapsed since the
    /// previous call (or since construction). Returns the delta used.
    pub fn step<T: Transport>(&mut self, node: &mut SyncNode<T>) -> f32 {
        let now = Instant::now();
        let delta_time = now.duration_since(self.last_step).as_secs_f32();
        self.last_step = now;
        node.step(delta_time);
        delta_time
    }

    /// Steps the node with a fixed delta, resetting the wall-clock
    /// baseline so a later [`Self::step`] does not double-count time.
    pub fn step_fixed<T: Transport>(&mut self, node: &mut SyncNode<T>, delta_time: f32) {
        self.last_step = Instant::now();
        node.step(delta_time);
    }
}

impl Default for StepDriver {
    fn default() -> Self {
        Self::new()
    }
}
