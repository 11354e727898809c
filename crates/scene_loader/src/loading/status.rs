use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use super::gate::GatePhase;

/// Last observed state of a loading screen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadingStatus {
    /// `None` until a load cycle has been shown.
    pub phase: Option<GatePhase>,
    /// Last presentation progress.
    pub progress: f32,
    /// Screen tick on which `phase` or `progress` last changed.
    pub changed_at_tick: u64,
    /// Bumped on every change; starts at 0.
    pub revision: u64,
}

/// Shared view of a loading screen for other threads (UI, logs).
///
/// The screen publishes every tick but a new revision is only recorded when
/// the phase or the progress actually moved, so readers polling with
/// [`LoadingStatusHandle::changed_since`] skip idle ticks.
#[derive(Clone, Debug, Default)]
pub struct LoadingStatusHandle {
    status: Arc<RwLock<LoadingStatus>>,
}

impl LoadingStatusHandle {
    pub fn snapshot(&self) -> LoadingStatus {
        *self.read()
    }

    /// The current status if its revision is newer than `revision`.
    pub fn changed_since(&self, revision: u64) -> Option<LoadingStatus> {
        let status = *self.read();
        (status.revision > revision).then_some(status)
    }

    /// Records `phase` and `progress`; returns `false` when neither changed.
    pub(crate) fn publish(&self, phase: Option<GatePhase>, progress: f32, tick: u64) -> bool {
        let mut status = self.write();
        if status.phase == phase && status.progress == progress {
            return false;
        }
        status.phase = phase;
        status.progress = progress;
        status.changed_at_tick = tick;
        status.revision = status.revision.saturating_add(1);
        true
    }

    fn read(&self) -> RwLockReadGuard<'_, LoadingStatus> {
        self.status.read().unwrap_or_else(|poisoned| {
            warn!("loading status lock poisoned on read; using last value");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, LoadingStatus> {
        self.status.write().unwrap_or_else(|poisoned| {
            warn!("loading status lock poisoned on write; overwriting last value");
            PoisonError::into_inner(poisoned)
        })
    }
}
