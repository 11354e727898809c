use std::time::Duration;

use scene_loader::{
    resolve_config_path, AppError, LoadStyle, LoaderConfig, LoadingScreen, LoopConfig,
    SimulatedSceneService, SkipMode,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use super::options::DemoOptions;

const DEFAULT_SCENE: &str = "demo/main";
/// Ten seconds at the default tick rate.
const MANUAL_MODE_GRACE_TICKS: u64 = 600;

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) screen: LoadingScreen,
    pub(crate) service: SimulatedSceneService,
    pub(crate) press_at_tick: Option<u64>,
    pub(crate) allow_at_tick: Option<u64>,
}

pub(crate) fn build_app(options: DemoOptions) -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Scene Loader Demo ===");

    let loader_config = resolve_loader_config(&options)?;
    info!(
        load_style = ?loader_config.load_style,
        skip_mode = ?loader_config.skip_mode,
        minimum_loading_time_secs = loader_config.minimum_loading_time_secs,
        destroy_on_completed = loader_config.destroy_on_completed,
        "loader_config"
    );

    let max_ticks = tick_limit(&loader_config, &options);
    let mut screen = LoadingScreen::new(loader_config);
    screen.on_loading(|progress| debug!(progress, "loading_progress"));
    screen.on_load_completed(|| info!("load_completed"));
    screen.on_completed(|| info!("loading_screen_completed"));

    let service = SimulatedSceneService::new(
        Duration::from_millis(options.scene_load_ms),
        Duration::from_millis(options.activation_ms),
    );
    let loop_config = LoopConfig {
        max_ticks,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        loop_config,
        screen,
        service,
        press_at_tick: options.press_at_tick,
        allow_at_tick: options.allow_at_tick,
    })
}

/// Manual mode only finishes through `--allow-at-tick`, and that call is
/// dropped if loading is not virtually complete yet, so manual runs always
/// get a tick limit.
fn tick_limit(config: &LoaderConfig, options: &DemoOptions) -> Option<u64> {
    if options.max_ticks.is_some() || config.skip_mode != SkipMode::Manual {
        return options.max_ticks;
    }
    if options.allow_at_tick.is_none() {
        warn!("manual skip mode without --allow-at-tick; the run will stop unfinished");
    }
    let limit = options
        .allow_at_tick
        .unwrap_or(0)
        .saturating_add(MANUAL_MODE_GRACE_TICKS);
    Some(limit)
}

fn resolve_loader_config(options: &DemoOptions) -> Result<LoaderConfig, AppError> {
    let path = match &options.config_path {
        Some(path) => Some(path.clone()),
        None => resolve_config_path()?,
    };
    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "loading_config_file");
            LoaderConfig::load_from_path(&path)?
        }
        None => LoaderConfig {
            load_scene: DEFAULT_SCENE.to_string(),
            ..LoaderConfig::default()
        },
    };
    apply_overrides(&mut config, options);
    Ok(config)
}

fn apply_overrides(config: &mut LoaderConfig, options: &DemoOptions) {
    match options.scenes.as_slice() {
        [] => {}
        [single] => {
            config.load_style = LoadStyle::Single;
            config.load_scene = single.clone();
        }
        many => {
            config.load_style = LoadStyle::Additive;
            config.additive_scenes = many.to_vec();
        }
    }
    if let Some(skip_mode) = options.skip_mode {
        config.skip_mode = skip_mode;
    }
    if let Some(min_time_secs) = options.min_time_secs {
        config.set_minimum_loading_time(min_time_secs);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
