use std::time::{Duration, Instant};

use tracing::debug;

use super::progress::ACTIVATION_WITHHELD_PROGRESS;
use super::request::SceneTarget;
use super::service::{CompletionSignal, SceneLoadHandle, SceneLoadingService};

/// Time-driven stand-in for an engine scene loader.
#[derive(Debug, Clone)]
pub struct SimulatedSceneService {
    per_scene_load: Duration,
    activation_delay: Duration,
    requests: Vec<Vec<SceneTarget>>,
}

impl SimulatedSceneService {
    pub fn new(per_scene_load: Duration, activation_delay: Duration) -> Self {
        Self {
            per_scene_load,
            activation_delay,
            requests: Vec::new(),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> &[Vec<SceneTarget>] {
        &self.requests
    }

    fn begin(&mut self, targets: Vec<SceneTarget>) -> Box<dyn SceneLoadHandle> {
        let scene_count = u32::try_from(targets.len()).unwrap_or(u32::MAX);
        let load_duration = self.per_scene_load.saturating_mul(scene_count);
        debug!(
            scene_count,
            load_ms = load_duration.as_millis() as u64,
            "simulated_load_started"
        );
        self.requests.push(targets);
        Box::new(SimulatedLoadHandle::new(load_duration, self.activation_delay))
    }
}

impl SceneLoadingService for SimulatedSceneService {
    fn load_scene(&mut self, target: &SceneTarget) -> Box<dyn SceneLoadHandle> {
        self.begin(vec![target.clone()])
    }

    fn load_scenes(&mut self, targets: &[SceneTarget]) -> Box<dyn SceneLoadHandle> {
        self.begin(targets.to_vec())
    }
}

/// Progress climbs linearly to 0.9 over `load_duration` and parks there until
/// activation is allowed; the load then completes after `activation_delay`.
#[derive(Debug)]
pub struct SimulatedLoadHandle {
    load_duration: Duration,
    activation_delay: Duration,
    started_at: Option<Instant>,
    activation_ready_at: Option<Instant>,
    activation_allowed: bool,
    progress: f32,
    completed: bool,
    subscribers: Vec<CompletionSignal>,
}

impl SimulatedLoadHandle {
    pub fn new(load_duration: Duration, activation_delay: Duration) -> Self {
        Self {
            load_duration,
            activation_delay,
            started_at: None,
            activation_ready_at: None,
            activation_allowed: false,
            progress: 0.0,
            completed: false,
            subscribers: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn complete(&mut self) {
        self.completed = true;
        self.progress = 1.0;
        for signal in self.subscribers.drain(..) {
            signal.notify();
        }
        debug!("simulated_load_completed");
    }
}

impl SceneLoadHandle for SimulatedLoadHandle {
    fn progress(&self) -> f32 {
        self.progress
    }

    fn allow_activation(&mut self, allowed: bool) {
        self.activation_allowed = allowed;
        if !allowed {
            self.activation_ready_at = None;
        }
    }

    fn subscribe_completed(&mut self, signal: CompletionSignal) {
        if self.completed {
            signal.notify();
        } else {
            self.subscribers.push(signal);
        }
    }

    fn update(&mut self, now: Instant) {
        if self.completed {
            return;
        }
        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started_at);
        let loaded_share = if self.load_duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.load_duration.as_secs_f32()).min(1.0)
        };
        self.progress = loaded_share * ACTIVATION_WITHHELD_PROGRESS;

        if !self.activation_allowed || loaded_share < 1.0 {
            return;
        }
        let ready_at = *self.activation_ready_at.get_or_insert(now);
        if now.saturating_duration_since(ready_at) >= self.activation_delay {
            self.complete();
        }
    }
}
