use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::request::SceneTarget;

/// One-shot completion notification shared between a load handle and the
/// screen waiting on it. Only the first [`CompletionSignal::notify`] counts.
#[derive(Debug, Clone, Default)]
pub struct CompletionSignal {
    fired: Arc<AtomicBool>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for the call that fired the signal, `false` afterwards.
    pub fn notify(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// An in-flight async scene load, owned by the screen that shows it.
pub trait SceneLoadHandle {
    /// Load progress in `[0, 0.9]` while activation is withheld.
    fn progress(&self) -> f32;

    /// Allows or withholds final activation. Repeated calls with the same
    /// value have no further effect.
    fn allow_activation(&mut self, allowed: bool);

    /// Registers `signal` to be notified once the activated load finishes.
    fn subscribe_completed(&mut self, signal: CompletionSignal);

    /// Cooperative pump, called once per tick before `progress` is read.
    fn update(&mut self, _now: Instant) {}
}

/// The engine-side scene loader.
pub trait SceneLoadingService {
    fn load_scene(&mut self, target: &SceneTarget) -> Box<dyn SceneLoadHandle>;
    fn load_scenes(&mut self, targets: &[SceneTarget]) -> Box<dyn SceneLoadHandle>;
}
