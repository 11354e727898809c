use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};
use winit::event::{ElementState, MouseButton, TouchPhase};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::config::ConfigError;

use super::input::{ActionStates, GamepadButton, InputAction, InputSnapshot};
use super::screen::LoadingScreen;
use super::service::SceneLoadingService;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub status_log_interval: Duration,
    /// Stop driving the screen after this many ticks. `None` runs until the
    /// load cycle finishes.
    pub max_ticks: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            status_log_interval: Duration::from_secs(1),
            max_ticks: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("loading screen did not start a load; check the configured scene targets")]
    LoadNotStarted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub ticks: u64,
    pub elapsed: Duration,
    pub fully_completed: bool,
}

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Supplies one input snapshot per simulation tick.
pub trait InputSource {
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot;
}

impl<F> InputSource for F
where
    F: FnMut(u64) -> InputSnapshot,
{
    fn snapshot_for_tick(&mut self, tick: u64) -> InputSnapshot {
        self(tick)
    }
}

impl InputSource for InputCollector {
    fn snapshot_for_tick(&mut self, _tick: u64) -> InputSnapshot {
        self.take_snapshot()
    }
}

/// Starts the configured load on `screen` and drives it to completion.
pub fn run_app(
    config: &LoopConfig,
    screen: &mut LoadingScreen,
    service: &mut dyn SceneLoadingService,
    clock: &mut dyn Clock,
    input: &mut dyn InputSource,
) -> Result<LoopSummary, AppError> {
    if !screen.start(service, clock.now()) {
        return Err(AppError::LoadNotStarted);
    }
    Ok(run_headless(config, screen, clock, input))
}

/// Ticks a shown `screen` at a fixed rate until its load cycle finishes, the
/// screen is destroyed or `config.max_ticks` is reached.
pub fn run_headless(
    config: &LoopConfig,
    screen: &mut LoadingScreen,
    clock: &mut dyn Clock,
    input: &mut dyn InputSource,
) -> LoopSummary {
    let mut summary = LoopSummary::default();
    if !screen.is_loading() {
        warn!("run_headless called without an active load cycle");
        return summary;
    }

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let status_log_interval =
        normalize_non_zero_duration(config.status_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        status_log_interval_ms = status_log_interval.as_millis() as u64,
        max_ticks = ?config.max_ticks,
        "loop_config"
    );

    let started = clock.now();
    let status = screen.status_handle();
    let mut last_frame_instant = started;
    let mut last_status_log = started;
    let mut logged_revision = 0u64;
    let mut tick_budget = TickAccumulator::new(fixed_dt, max_frame_delta, max_ticks_per_frame);

    'frames: loop {
        let frame_start = clock.now();
        let cap_sleep = compute_cap_sleep(
            frame_start.saturating_duration_since(last_frame_instant),
            fixed_dt,
        );
        if cap_sleep > Duration::ZERO {
            clock.sleep(cap_sleep);
        }

        let now = clock.now();
        let frame_dt = now.saturating_duration_since(last_frame_instant);
        last_frame_instant = now;
        summary.frames = summary.frames.saturating_add(1);

        let due = tick_budget.advance(frame_dt);
        if due.dropped > Duration::ZERO {
            warn!(
                dropped_ms = due.dropped.as_millis() as u64,
                max_ticks_per_frame, "tick_backlog_dropped"
            );
        }

        for _ in 0..due.ticks {
            let snapshot = input.snapshot_for_tick(summary.ticks);
            let outcome = screen.tick(now, &snapshot);
            summary.ticks = summary.ticks.saturating_add(1);
            if outcome.fully_completed {
                summary.fully_completed = true;
                break 'frames;
            }
            if outcome.destroy_requested || screen.is_destroyed() {
                break 'frames;
            }
            if config.max_ticks.is_some_and(|max| summary.ticks >= max) {
                warn!(ticks = summary.ticks, phase = ?screen.phase(), "tick_limit_reached");
                break 'frames;
            }
        }

        if now.saturating_duration_since(last_status_log) >= status_log_interval {
            if let Some(snapshot) = status.changed_since(logged_revision) {
                info!(
                    phase = ?snapshot.phase,
                    progress = snapshot.progress,
                    changed_at_tick = snapshot.changed_at_tick,
                    "loading_status"
                );
                logged_revision = snapshot.revision;
            }
            last_status_log = now;
        }
    }

    summary.elapsed = clock.now().saturating_duration_since(started);
    info!(
        frames = summary.frames,
        ticks = summary.ticks,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        fully_completed = summary.fully_completed,
        "loop_finished"
    );
    summary
}

/// Turns raw window events into edge-triggered [`InputSnapshot`]s.
#[derive(Debug, Default)]
pub struct InputCollector {
    held_keys: HashSet<KeyCode>,
    held_gamepad_buttons: HashSet<GamepadButton>,
    active_touches: HashSet<u64>,
    actions: ActionStates,
    any_key_pressed_edge: bool,
    mouse_down: [bool; 3],
    mouse_pressed_edge: [bool; 3],
    gamepad_face_pressed_edge: bool,
    touch_began_edge: bool,
}

const ALL_ACTIONS: [InputAction; 3] = [InputAction::Submit, InputAction::Cancel, InputAction::Skip];

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        self.handle_key(key_event.physical_key, key_event.state);
    }

    pub fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match state {
            ElementState::Pressed => {
                if self.held_keys.insert(code) {
                    self.any_key_pressed_edge = true;
                }
            }
            ElementState::Released => {
                self.held_keys.remove(&code);
            }
        }
        self.refresh_actions();
    }

    pub fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        let index = match button {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            _ => return,
        };
        match state {
            ElementState::Pressed => {
                if !self.mouse_down[index] {
                    self.mouse_pressed_edge[index] = true;
                }
                self.mouse_down[index] = true;
            }
            ElementState::Released => self.mouse_down[index] = false,
        }
    }

    pub fn handle_gamepad_button(&mut self, button: GamepadButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.held_gamepad_buttons.insert(button) {
                    self.gamepad_face_pressed_edge = true;
                }
            }
            ElementState::Released => {
                self.held_gamepad_buttons.remove(&button);
            }
        }
        self.refresh_actions();
    }

    pub fn handle_touch(&mut self, id: u64, phase: TouchPhase) {
        match phase {
            TouchPhase::Started => {
                if self.active_touches.insert(id) {
                    self.touch_began_edge = true;
                }
            }
            TouchPhase::Moved => {}
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.active_touches.remove(&id);
            }
        }
    }

    /// Snapshot for the next tick; press edges are reported exactly once.
    pub fn take_snapshot(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::from_parts(
            self.actions,
            self.any_key_pressed_edge,
            (
                self.mouse_pressed_edge[0],
                self.mouse_pressed_edge[1],
                self.mouse_pressed_edge[2],
            ),
            self.gamepad_face_pressed_edge,
            self.touch_began_edge,
        );
        self.actions.clear_pressed();
        self.any_key_pressed_edge = false;
        self.mouse_pressed_edge = [false; 3];
        self.gamepad_face_pressed_edge = false;
        self.touch_began_edge = false;
        snapshot
    }

    fn refresh_actions(&mut self) {
        for action in ALL_ACTIONS {
            let held = self
                .held_keys
                .iter()
                .any(|key| action_for_key(*key) == Some(action))
                || self
                    .held_gamepad_buttons
                    .iter()
                    .any(|button| action_for_gamepad_button(*button) == Some(action));
            if held && !self.actions.is_down(action) {
                self.actions.set_pressed(action, true);
            }
            self.actions.set_down(action, held);
        }
    }
}

fn action_for_key(key: KeyCode) -> Option<InputAction> {
    match key {
        KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => Some(InputAction::Submit),
        KeyCode::Escape => Some(InputAction::Cancel),
        KeyCode::Tab => Some(InputAction::Skip),
        _ => None,
    }
}

fn action_for_gamepad_button(button: GamepadButton) -> Option<InputAction> {
    match button {
        GamepadButton::South => Some(InputAction::Submit),
        GamepadButton::East => Some(InputAction::Cancel),
        GamepadButton::North | GamepadButton::West => None,
    }
}

/// Ticks owed for one frame, plus backlog discarded at the per-frame cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DueTicks {
    ticks: u32,
    dropped: Duration,
}

/// Converts wall-clock frame time into whole fixed-rate screen ticks.
#[derive(Debug)]
struct TickAccumulator {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    pending: Duration,
}

impl TickAccumulator {
    fn new(fixed_dt: Duration, max_frame_delta: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            fixed_dt,
            max_frame_delta,
            max_ticks_per_frame,
            pending: Duration::ZERO,
        }
    }

    /// A stalled frame counts as at most `max_frame_delta`; whatever still
    /// exceeds `max_ticks_per_frame` ticks is dropped rather than carried.
    fn advance(&mut self, frame_dt: Duration) -> DueTicks {
        self.pending = self
            .pending
            .saturating_add(frame_dt.min(self.max_frame_delta));
        let owed = self.pending.as_nanos() / self.fixed_dt.as_nanos().max(1);
        let ticks = u32::try_from(owed)
            .unwrap_or(u32::MAX)
            .min(self.max_ticks_per_frame);
        self.pending = self.pending.saturating_sub(self.fixed_dt.saturating_mul(ticks));

        if self.pending >= self.fixed_dt {
            let dropped = std::mem::take(&mut self.pending);
            DueTicks { ticks, dropped }
        } else {
            DueTicks {
                ticks,
                dropped: Duration::ZERO,
            }
        }
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_cap_sleep(elapsed: Duration, frame_target: Duration) -> Duration {
    frame_target.saturating_sub(elapsed)
}
