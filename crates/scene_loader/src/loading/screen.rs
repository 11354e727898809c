use std::time::Instant;

use tracing::{info, warn};

use crate::config::LoaderConfig;

use super::gate::{CompletionGate, GatePhase};
use super::input::InputSnapshot;
use super::request::{LoadRequest, LoadStyle, SceneTarget};
use super::service::{CompletionSignal, SceneLoadHandle, SceneLoadingService};
use super::status::LoadingStatusHandle;

type ProgressListener = Box<dyn FnMut(f32)>;
type EventListener = Box<dyn FnMut()>;

#[derive(Default)]
struct LoadingListeners {
    on_loading: Vec<ProgressListener>,
    on_load_completed: Vec<EventListener>,
    on_completed: Vec<EventListener>,
}

/// What one [`LoadingScreen::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenTick {
    pub progress: Option<f32>,
    pub load_completed: bool,
    pub completion_allowed: bool,
    pub fully_completed: bool,
    pub destroy_requested: bool,
}

struct LoadCycle {
    gate: CompletionGate,
    handle: Box<dyn SceneLoadHandle>,
    completion: CompletionSignal,
    activation_requested: bool,
}

impl LoadCycle {
    /// Lets the handle activate and subscribes to its completion, once.
    fn request_activation(&mut self) {
        if self.activation_requested || self.gate.phase() != GatePhase::CompletionAllowed {
            return;
        }
        self.activation_requested = true;
        self.handle.allow_activation(true);
        self.handle.subscribe_completed(self.completion.clone());
        info!("scene_activation_allowed");
    }
}

/// Loading screen shown while scenes load: drives one [`CompletionGate`] per
/// load cycle and reports progress and completion to registered listeners.
pub struct LoadingScreen {
    config: LoaderConfig,
    cycle: Option<LoadCycle>,
    listeners: LoadingListeners,
    status: LoadingStatusHandle,
    last_phase: Option<GatePhase>,
    last_progress: f32,
    ticks: u64,
    destroyed: bool,
}

impl LoadingScreen {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            cycle: None,
            listeners: LoadingListeners::default(),
            status: LoadingStatusHandle::default(),
            last_phase: None,
            last_progress: 0.0,
            ticks: 0,
            destroyed: false,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Requests the configured scenes and shows the screen for them.
    ///
    /// Returns `false` without touching the service when the configured
    /// targets do not form a valid request.
    pub fn start(&mut self, service: &mut dyn SceneLoadingService, now: Instant) -> bool {
        if self.destroyed {
            return false;
        }
        let request = match self.config.load_request() {
            Ok(request) => request,
            Err(error) => {
                warn!(
                    error = %error,
                    load_style = ?self.config.load_style,
                    "load_request_rejected"
                );
                return false;
            }
        };

        info!(
            load_style = ?request.style(),
            target_count = request.targets().len(),
            first_target = request.targets().first().map(SceneTarget::as_str).unwrap_or_default(),
            "load_requested"
        );
        let handle = match &request {
            LoadRequest::Single(target) => service.load_scene(target),
            LoadRequest::Additive(targets) => service.load_scenes(targets),
        };
        self.show(handle, now);
        true
    }

    /// Starts a new load cycle for `handle`, withholding its activation.
    pub fn show(&mut self, mut handle: Box<dyn SceneLoadHandle>, now: Instant) {
        if self.destroyed {
            return;
        }
        handle.allow_activation(false);
        let minimum_display_time = self.config.minimum_display_time();
        let gate = CompletionGate::new(
            now,
            minimum_display_time,
            self.config.skip_mode,
            self.config.skip_action,
        );
        self.cycle = Some(LoadCycle {
            gate,
            handle,
            completion: CompletionSignal::new(),
            activation_requested: false,
        });
        self.last_phase = Some(GatePhase::Loading);
        self.last_progress = 0.0;
        self.publish_status();
        info!(
            minimum_display_ms = minimum_display_time.as_millis() as u64,
            skip_mode = ?self.config.skip_mode,
            "loading_shown"
        );
    }

    pub fn tick(&mut self, now: Instant, input: &InputSnapshot) -> ScreenTick {
        let mut outcome = ScreenTick::default();
        if self.destroyed {
            return outcome;
        }
        let Some(cycle) = self.cycle.as_mut() else {
            return outcome;
        };
        self.ticks = self.ticks.saturating_add(1);

        cycle.handle.update(now);
        let gate_tick = cycle.gate.tick(now, cycle.handle.progress(), input);
        outcome.progress = gate_tick.progress;
        outcome.load_completed = gate_tick.virtually_completed;
        outcome.completion_allowed = gate_tick.completion_allowed;

        if let Some(progress) = gate_tick.progress {
            self.last_progress = progress;
            for listener in &mut self.listeners.on_loading {
                listener(progress);
            }
        }
        if gate_tick.virtually_completed {
            for listener in &mut self.listeners.on_load_completed {
                listener();
            }
        }

        cycle.request_activation();
        if cycle.activation_requested && cycle.completion.is_fired() && cycle.gate.finish() {
            outcome.fully_completed = true;
        }
        self.last_phase = Some(cycle.gate.phase());
        self.publish_status();

        if outcome.fully_completed {
            outcome.destroy_requested = self.complete_cycle();
        }
        outcome
    }

    /// Host-side unblock; works in every skip mode once loading is virtually
    /// complete. Returns `true` when it advanced the gate.
    pub fn allow_completion(&mut self) -> bool {
        self.unblock(CompletionGate::allow_completion)
    }

    /// Skip gesture from the host UI; ignored in manual skip mode.
    pub fn request_skip(&mut self) -> bool {
        self.unblock(CompletionGate::request_skip)
    }

    fn unblock(&mut self, action: fn(&mut CompletionGate) -> bool) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(cycle) = self.cycle.as_mut() else {
            return false;
        };
        if !action(&mut cycle.gate) {
            return false;
        }
        cycle.request_activation();
        self.last_phase = Some(cycle.gate.phase());
        self.publish_status();
        true
    }

    fn complete_cycle(&mut self) -> bool {
        self.cycle = None;
        info!(ticks = self.ticks, "fully_completed");
        for listener in &mut self.listeners.on_completed {
            listener();
        }

        if !self.config.destroy_on_completed {
            return false;
        }
        self.destroyed = true;
        self.listeners = LoadingListeners::default();
        info!("loading_screen_destroyed");
        true
    }

    fn publish_status(&self) {
        self.status.publish(self.last_phase, self.last_progress, self.ticks);
    }

    /// Called with presentation progress on every tick spent loading.
    pub fn on_loading(&mut self, listener: impl FnMut(f32) + 'static) {
        self.listeners.on_loading.push(Box::new(listener));
    }

    /// Called once per cycle when presentation progress reaches 1.0.
    pub fn on_load_completed(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.on_load_completed.push(Box::new(listener));
    }

    /// Called once per cycle after the activated scenes finished loading.
    pub fn on_completed(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.on_completed.push(Box::new(listener));
    }

    /// The configured single scene, or `None` for additive loading.
    pub fn load_scene(&self) -> Option<&str> {
        match self.config.load_style {
            LoadStyle::Single => Some(self.config.load_scene.as_str()),
            LoadStyle::Additive => None,
        }
    }

    /// The configured additive scenes, or `None` for single loading.
    pub fn load_scenes(&self) -> Option<&[String]> {
        match self.config.load_style {
            LoadStyle::Single => None,
            LoadStyle::Additive => Some(self.config.additive_scenes.as_slice()),
        }
    }

    /// Phase of the current cycle, or of the last one after it finished.
    pub fn phase(&self) -> Option<GatePhase> {
        self.last_phase
    }

    pub fn is_loading(&self) -> bool {
        self.cycle.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn status_handle(&self) -> LoadingStatusHandle {
        self.status.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::loading::input::InputAction;
    use crate::loading::skip::SkipMode;

    #[derive(Debug, Default)]
    struct HandleState {
        progress: f32,
        activation_calls: Vec<bool>,
        subscribers: Vec<CompletionSignal>,
        finished: Cell<bool>,
    }

    impl HandleState {
        fn activation_allowed(&self) -> bool {
            self.activation_calls.last().copied().unwrap_or(false)
        }

        fn complete(&self) {
            self.finished.set(true);
            for signal in &self.subscribers {
                signal.notify();
            }
        }
    }

    struct ScriptedHandle {
        state: Rc<RefCell<HandleState>>,
    }

    impl SceneLoadHandle for ScriptedHandle {
        fn progress(&self) -> f32 {
            self.state.borrow().progress
        }

        fn allow_activation(&mut self, allowed: bool) {
            self.state.borrow_mut().activation_calls.push(allowed);
        }

        fn subscribe_completed(&mut self, signal: CompletionSignal) {
            let mut state = self.state.borrow_mut();
            if state.finished.get() {
                signal.notify();
            }
            state.subscribers.push(signal);
        }
    }

    #[derive(Default)]
    struct ScriptedService {
        requests: Vec<Vec<String>>,
        handles: Vec<Rc<RefCell<HandleState>>>,
    }

    impl ScriptedService {
        fn handle(&mut self, targets: Vec<String>) -> Box<dyn SceneLoadHandle> {
            self.requests.push(targets);
            let state = Rc::new(RefCell::new(HandleState::default()));
            self.handles.push(state.clone());
            Box::new(ScriptedHandle { state })
        }
    }

    impl SceneLoadingService for ScriptedService {
        fn load_scene(&mut self, target: &SceneTarget) -> Box<dyn SceneLoadHandle> {
            self.handle(vec![target.to_string()])
        }

        fn load_scenes(&mut self, targets: &[SceneTarget]) -> Box<dyn SceneLoadHandle> {
            self.handle(targets.iter().map(ToString::to_string).collect())
        }
    }

    #[derive(Debug, Default)]
    struct EventLog {
        progress: Vec<f32>,
        load_completed: u32,
        completed: u32,
    }

    fn single_config(skip_mode: SkipMode) -> LoaderConfig {
        LoaderConfig {
            load_scene: "scenes/level_1".to_string(),
            skip_mode,
            ..LoaderConfig::default()
        }
    }

    fn observed_screen(config: LoaderConfig) -> (LoadingScreen, Rc<RefCell<EventLog>>) {
        let log = Rc::new(RefCell::new(EventLog::default()));
        let mut screen = LoadingScreen::new(config);
        let progress_log = log.clone();
        screen.on_loading(move |progress| progress_log.borrow_mut().progress.push(progress));
        let load_log = log.clone();
        screen.on_load_completed(move || load_log.borrow_mut().load_completed += 1);
        let completed_log = log.clone();
        screen.on_completed(move || completed_log.borrow_mut().completed += 1);
        (screen, log)
    }

    fn at(base: Instant, tick: u64) -> Instant {
        base + Duration::from_millis(tick * 16)
    }

    #[test]
    fn start_requests_single_scene_and_withholds_activation() {
        let (mut screen, _) = observed_screen(single_config(SkipMode::Manual));
        let mut service = ScriptedService::default();

        assert!(screen.start(&mut service, Instant::now()));
        assert_eq!(service.requests, vec![vec!["scenes/level_1".to_string()]]);
        assert_eq!(service.handles[0].borrow().activation_calls, vec![false]);
        assert_eq!(screen.phase(), Some(GatePhase::Loading));
        assert!(screen.is_loading());
    }

    #[test]
    fn additive_request_with_empty_target_never_starts() {
        let config = LoaderConfig {
            load_style: LoadStyle::Additive,
            additive_scenes: vec!["A".to_string(), "B".to_string(), String::new()],
            ..LoaderConfig::default()
        };
        let (mut screen, log) = observed_screen(config);
        let mut service = ScriptedService::default();
        let base = Instant::now();

        assert!(!screen.start(&mut service, base));
        assert!(service.requests.is_empty());
        for tick in 0..10 {
            assert_eq!(screen.tick(at(base, tick), &InputSnapshot::empty()), ScreenTick::default());
        }
        let log = log.borrow();
        assert!(log.progress.is_empty());
        assert_eq!(log.load_completed, 0);
        assert_eq!(log.completed, 0);
        assert_eq!(screen.phase(), None);
    }

    #[test]
    fn single_scene_with_empty_target_never_starts() {
        let (mut screen, _) = observed_screen(single_config(SkipMode::InstantComplete));
        screen.config.load_scene.clear();
        let mut service = ScriptedService::default();

        assert!(!screen.start(&mut service, Instant::now()));
        assert!(service.requests.is_empty());
    }

    #[test]
    fn additive_scenes_are_requested_together() {
        let config = LoaderConfig {
            load_style: LoadStyle::Additive,
            additive_scenes: vec!["A".to_string(), "B".to_string()],
            ..LoaderConfig::default()
        };
        let (mut screen, _) = observed_screen(config);
        let mut service = ScriptedService::default();

        assert!(screen.start(&mut service, Instant::now()));
        assert_eq!(
            service.requests,
            vec![vec!["A".to_string(), "B".to_string()]]
        );
    }

    #[test]
    fn instant_complete_scenario_fires_everything_once_in_order() {
        let (mut screen, log) = observed_screen(single_config(SkipMode::InstantComplete));
        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        let handle = service.handles[0].clone();
        let input = InputSnapshot::empty();

        for tick in 1..5 {
            handle.borrow_mut().progress = 0.18 * tick as f32;
            let outcome = screen.tick(at(base, tick), &input);
            assert!(outcome.progress.expect("loading") < 1.0);
            assert!(!outcome.load_completed);
        }
        assert!(!handle.borrow().activation_allowed());

        handle.borrow_mut().progress = 0.9;
        let fifth = screen.tick(at(base, 5), &input);
        assert_eq!(fifth.progress, Some(1.0));
        assert!(fifth.load_completed);
        assert!(fifth.completion_allowed);
        assert!(!fifth.fully_completed);
        assert_eq!(screen.phase(), Some(GatePhase::CompletionAllowed));
        assert!(handle.borrow().activation_allowed());
        assert_eq!(handle.borrow().subscribers.len(), 1);

        let waiting = screen.tick(at(base, 6), &input);
        assert!(!waiting.fully_completed);
        assert_eq!(log.borrow().completed, 0);

        handle.borrow().complete();
        let completed = (7..20)
            .filter(|tick| screen.tick(at(base, *tick), &input).fully_completed)
            .count();
        assert_eq!(completed, 1);

        let log = log.borrow();
        assert_eq!(log.progress.len(), 5);
        assert_eq!(log.progress.last(), Some(&1.0));
        assert_eq!(log.load_completed, 1);
        assert_eq!(log.completed, 1);
        assert_eq!(screen.phase(), Some(GatePhase::Finished));
        assert!(!screen.is_loading());
    }

    #[test]
    fn repeated_handle_notifications_complete_once() {
        let (mut screen, log) = observed_screen(single_config(SkipMode::InstantComplete));
        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        let handle = service.handles[0].clone();
        handle.borrow_mut().progress = 0.9;

        screen.tick(at(base, 1), &InputSnapshot::empty());
        for tick in 2..10 {
            handle.borrow().complete();
            screen.tick(at(base, tick), &InputSnapshot::empty());
        }
        assert_eq!(log.borrow().completed, 1);
        assert_eq!(handle.borrow().subscribers.len(), 1);
    }

    #[test]
    fn completion_waits_for_activation_even_if_handle_reports_early() {
        let (mut screen, log) = observed_screen(single_config(SkipMode::Manual));
        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        let handle = service.handles[0].clone();
        handle.borrow_mut().progress = 0.9;
        handle.borrow().complete();

        for tick in 1..50 {
            let outcome =
                screen.tick(at(base, tick), &InputSnapshot::empty().with_any_key_pressed(true));
            assert!(!outcome.fully_completed);
        }
        assert_eq!(screen.phase(), Some(GatePhase::VirtuallyComplete));
        assert!(handle.borrow().subscribers.is_empty());
        assert_eq!(log.borrow().completed, 0);

        assert!(screen.allow_completion());
        assert!(screen.tick(at(base, 50), &InputSnapshot::empty()).fully_completed);
        assert_eq!(log.borrow().completed, 1);
    }

    #[test]
    fn manual_mode_completes_after_allow_completion() {
        let (mut screen, log) = observed_screen(single_config(SkipMode::Manual));
        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        let handle = service.handles[0].clone();

        assert!(!screen.allow_completion());
        handle.borrow_mut().progress = 0.9;
        screen.tick(at(base, 1), &InputSnapshot::empty());
        assert!(!screen.request_skip());

        assert!(screen.allow_completion());
        assert!(handle.borrow().activation_allowed());
        assert!(!screen.allow_completion());

        let activated = Rc::new(Cell::new(false));
        let seen = activated.clone();
        let observed = handle.clone();
        screen.on_completed(move || seen.set(observed.borrow().activation_allowed()));

        handle.borrow().complete();
        assert!(screen.tick(at(base, 2), &InputSnapshot::empty()).fully_completed);
        assert!(activated.get());
        assert_eq!(log.borrow().completed, 1);
    }

    #[test]
    fn key_down_mode_uses_configured_action() {
        let mut config = single_config(SkipMode::KeyDown);
        config.skip_action = InputAction::Skip;
        let (mut screen, _) = observed_screen(config);
        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        service.handles[0].borrow_mut().progress = 0.9;

        screen.tick(at(base, 1), &InputSnapshot::empty());
        let submit = InputSnapshot::empty().with_action_pressed(InputAction::Submit);
        assert!(!screen.tick(at(base, 2), &submit).completion_allowed);
        let skip = InputSnapshot::empty().with_action_pressed(InputAction::Skip);
        assert!(screen.tick(at(base, 3), &skip).completion_allowed);
    }

    #[test]
    fn input_on_the_completion_tick_is_not_lost() {
        let mut key_down = single_config(SkipMode::KeyDown);
        key_down.skip_action = InputAction::Skip;
        let cases = [
            (
                single_config(SkipMode::AnyKey),
                InputSnapshot::empty().with_touch_began(true),
            ),
            (
                key_down,
                InputSnapshot::empty().with_action_pressed(InputAction::Skip),
            ),
        ];

        for (config, input) in cases {
            let (mut screen, log) = observed_screen(config);
            let mut service = ScriptedService::default();
            let base = Instant::now();
            screen.start(&mut service, base);
            let handle = service.handles[0].clone();
            handle.borrow_mut().progress = 0.9;

            let outcome = screen.tick(at(base, 1), &input);
            assert!(outcome.load_completed);
            assert!(outcome.completion_allowed);
            assert!(handle.borrow().activation_allowed());

            handle.borrow().complete();
            assert!(screen.tick(at(base, 2), &InputSnapshot::empty()).fully_completed);
            assert_eq!(log.borrow().completed, 1);
        }
    }

    #[test]
    fn minimum_loading_time_holds_screen_up() {
        let mut config = single_config(SkipMode::InstantComplete);
        config.minimum_loading_time_secs = 2.0;
        let (mut screen, log) = observed_screen(config);
        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        service.handles[0].borrow_mut().progress = 0.9;

        let early = screen.tick(base + Duration::from_millis(500), &InputSnapshot::empty());
        assert!(early.progress.expect("loading") <= 0.25);
        let almost = screen.tick(base + Duration::from_millis(1_990), &InputSnapshot::empty());
        assert!(!almost.load_completed);
        let done = screen.tick(base + Duration::from_secs(2), &InputSnapshot::empty());
        assert!(done.load_completed);
        assert_eq!(log.borrow().load_completed, 1);
    }

    #[test]
    fn destroy_on_completed_stops_the_screen() {
        let mut config = single_config(SkipMode::InstantComplete);
        config.destroy_on_completed = true;
        let (mut screen, log) = observed_screen(config);
        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        let handle = service.handles[0].clone();
        handle.borrow_mut().progress = 0.9;

        screen.tick(at(base, 1), &InputSnapshot::empty());
        handle.borrow().complete();
        let last = screen.tick(at(base, 2), &InputSnapshot::empty());
        assert!(last.fully_completed);
        assert!(last.destroy_requested);
        assert!(screen.is_destroyed());

        assert!(!screen.start(&mut service, at(base, 3)));
        assert_eq!(service.requests.len(), 1);
        assert_eq!(screen.tick(at(base, 4), &InputSnapshot::empty()), ScreenTick::default());
        assert_eq!(log.borrow().completed, 1);
    }

    #[test]
    fn screen_without_destroy_can_run_another_cycle() {
        let (mut screen, log) = observed_screen(single_config(SkipMode::InstantComplete));
        let mut service = ScriptedService::default();
        let base = Instant::now();

        for cycle in 0..2u64 {
            let start = at(base, cycle * 100);
            assert!(screen.start(&mut service, start));
            let handle = service.handles[cycle as usize].clone();
            handle.borrow_mut().progress = 0.9;
            screen.tick(start + Duration::from_millis(16), &InputSnapshot::empty());
            handle.borrow().complete();
            assert!(
                screen
                    .tick(start + Duration::from_millis(32), &InputSnapshot::empty())
                    .fully_completed
            );
        }
        assert_eq!(log.borrow().load_completed, 2);
        assert_eq!(log.borrow().completed, 2);
    }

    #[test]
    fn status_handle_tracks_phase_and_progress() {
        let (mut screen, _) = observed_screen(single_config(SkipMode::Manual));
        let status = screen.status_handle();
        assert_eq!(status.snapshot().phase, None);

        let mut service = ScriptedService::default();
        let base = Instant::now();
        screen.start(&mut service, base);
        service.handles[0].borrow_mut().progress = 0.45;
        screen.tick(at(base, 1), &InputSnapshot::empty());

        let snapshot = status.snapshot();
        assert_eq!(snapshot.phase, Some(GatePhase::Loading));
        assert!((snapshot.progress - 0.5).abs() < 0.0001);
        assert_eq!(snapshot.changed_at_tick, 1);

        screen.tick(at(base, 2), &InputSnapshot::empty());
        assert_eq!(status.changed_since(snapshot.revision), None);
    }

    #[test]
    fn scene_accessors_follow_load_style() {
        let single = LoadingScreen::new(single_config(SkipMode::Manual));
        assert_eq!(single.load_scene(), Some("scenes/level_1"));
        assert_eq!(single.load_scenes(), None);

        let additive = LoadingScreen::new(LoaderConfig {
            load_style: LoadStyle::Additive,
            additive_scenes: vec!["A".to_string()],
            ..LoaderConfig::default()
        });
        assert_eq!(additive.load_scene(), None);
        assert_eq!(additive.load_scenes(), Some(&["A".to_string()][..]));
    }
}
