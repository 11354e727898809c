mod gate;
mod input;
mod loop_runner;
mod progress;
mod request;
mod screen;
mod service;
mod sim;
mod skip;
mod status;

pub use gate::{CompletionGate, GatePhase, GateTick, LoadingGateState};
pub use input::{GamepadButton, InputAction, InputSnapshot};
pub use loop_runner::{
    run_app, run_headless, AppError, Clock, InputCollector, InputSource, LoopConfig, LoopSummary,
    SystemClock,
};
pub use progress::{blend_progress, inverse_lerp, real_progress, ACTIVATION_WITHHELD_PROGRESS};
pub use request::{LoadRequest, LoadRequestError, LoadStyle, SceneTarget};
pub use screen::{LoadingScreen, ScreenTick};
pub use service::{CompletionSignal, SceneLoadHandle, SceneLoadingService};
pub use sim::{SimulatedLoadHandle, SimulatedSceneService};
pub use skip::{
    AnyKeySkip, InstantSkip, InvalidSkipMode, KeyDownSkip, ManualSkip, SkipMode, SkipSignal,
    UnknownSkipMode,
};
pub use status::{LoadingStatus, LoadingStatusHandle};
