//! Loading screen gating for asynchronous scene loads.
//!
//! A [`LoadingScreen`] blends the load's own progress with a minimum display
//! time, reports when loading is virtually complete, and holds final scene
//! activation back until its [`SkipMode`] (or the host) allows completion.

pub mod config;
pub mod loading;

pub use config::{resolve_config_path, ConfigError, LoaderConfig, CONFIG_ENV_VAR};
pub use loading::{
    blend_progress, inverse_lerp, real_progress, run_app, run_headless, AnyKeySkip, AppError,
    Clock, CompletionGate, CompletionSignal, GamepadButton, GatePhase, GateTick, InputAction,
    InputCollector, InputSnapshot, InputSource, InstantSkip, InvalidSkipMode, KeyDownSkip,
    LoadRequest, LoadRequestError, LoadStyle, LoadingGateState, LoadingScreen, LoadingStatus,
    LoadingStatusHandle, LoopConfig, LoopSummary, ManualSkip, SceneLoadHandle,
    SceneLoadingService, SceneTarget, ScreenTick, SimulatedLoadHandle, SimulatedSceneService,
    SkipMode, SkipSignal, SystemClock, UnknownSkipMode, ACTIVATION_WITHHELD_PROGRESS,
};
