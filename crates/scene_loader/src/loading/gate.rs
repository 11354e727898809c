use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::input::{InputAction, InputSnapshot};
use super::progress::blend_progress;
use super::skip::{SkipMode, SkipSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatePhase {
    Loading,
    VirtuallyComplete,
    CompletionAllowed,
    Finished,
}

/// Mutable state of one load cycle. Every flag only moves from false to true.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingGateState {
    pub start_time: Instant,
    pub minimum_display_time: Duration,
    pub virtually_complete: bool,
    pub completion_allowed: bool,
    pub finished: bool,
    pub skip_mode: SkipMode,
}

impl LoadingGateState {
    pub fn phase(&self) -> GatePhase {
        if self.finished {
            GatePhase::Finished
        } else if self.completion_allowed {
            GatePhase::CompletionAllowed
        } else if self.virtually_complete {
            GatePhase::VirtuallyComplete
        } else {
            GatePhase::Loading
        }
    }
}

/// What a single [`CompletionGate::tick`] observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateTick {
    /// Presentation progress, reported on every tick spent loading
    /// (including the one that reaches 1.0).
    pub progress: Option<f32>,
    pub virtually_completed: bool,
    pub completion_allowed: bool,
}

pub struct CompletionGate {
    state: LoadingGateState,
    skip: Box<dyn SkipSignal>,
}

impl std::fmt::Debug for CompletionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionGate")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CompletionGate {
    pub fn new(
        start_time: Instant,
        minimum_display_time: Duration,
        skip_mode: SkipMode,
        skip_action: InputAction,
    ) -> Self {
        Self::with_skip_signal(
            start_time,
            minimum_display_time,
            skip_mode,
            skip_mode.signal(skip_action),
        )
    }

    /// Uses a caller-provided policy in place of the one `skip_mode` selects.
    /// `skip_mode` still decides whether host skip requests are honored.
    pub fn with_skip_signal(
        start_time: Instant,
        minimum_display_time: Duration,
        skip_mode: SkipMode,
        skip: Box<dyn SkipSignal>,
    ) -> Self {
        Self {
            state: LoadingGateState {
                start_time,
                minimum_display_time,
                virtually_complete: false,
                completion_allowed: false,
                finished: false,
                skip_mode,
            },
            skip,
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.state.phase()
    }

    pub fn state(&self) -> &LoadingGateState {
        &self.state
    }

    pub fn tick(&mut self, now: Instant, handle_progress: f32, input: &InputSnapshot) -> GateTick {
        let mut outcome = GateTick::default();

        match self.phase() {
            GatePhase::Loading => {
                let elapsed = now.saturating_duration_since(self.state.start_time);
                let progress =
                    blend_progress(handle_progress, elapsed, self.state.minimum_display_time);
                outcome.progress = Some(progress);

                if progress >= 1.0 {
                    self.state.virtually_complete = true;
                    outcome.virtually_completed = true;
                    info!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        skip_mode = ?self.state.skip_mode,
                        "virtually_complete"
                    );
                    if self.skip.on_virtually_complete() || self.skip.poll(input) {
                        outcome.completion_allowed = self.allow_completion();
                    }
                }
            }
            GatePhase::VirtuallyComplete => {
                if self.skip.poll(input) {
                    outcome.completion_allowed = self.allow_completion();
                }
            }
            GatePhase::CompletionAllowed | GatePhase::Finished => {}
        }

        outcome
    }

    /// Unblocks completion. Returns `true` only on the call that performs the
    /// `VirtuallyComplete -> CompletionAllowed` transition; calls made while
    /// still loading are dropped.
    pub fn allow_completion(&mut self) -> bool {
        match self.phase() {
            GatePhase::VirtuallyComplete => {
                self.state.completion_allowed = true;
                info!(skip_mode = ?self.state.skip_mode, "completion_allowed");
                true
            }
            GatePhase::Loading => {
                debug!("allow_completion_before_virtual_completion_dropped");
                false
            }
            GatePhase::CompletionAllowed | GatePhase::Finished => false,
        }
    }

    /// A skip gesture from the host. Honored like [`Self::allow_completion`]
    /// unless the gate runs in [`SkipMode::Manual`].
    pub fn request_skip(&mut self) -> bool {
        if !self.state.skip_mode.accepts_skip_requests() {
            debug!("skip_request_ignored_in_manual_mode");
            return false;
        }
        self.allow_completion()
    }

    /// Marks the cycle finished once the activated load has completed.
    /// Returns `true` only for the first call made after completion was
    /// allowed.
    pub fn finish(&mut self) -> bool {
        if self.phase() != GatePhase::CompletionAllowed {
            return false;
        }
        self.state.finished = true;
        true
    }
}
