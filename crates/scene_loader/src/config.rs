use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::loading::{InputAction, LoadRequest, LoadRequestError, LoadStyle, SkipMode};

pub const CONFIG_ENV_VAR: &str = "SCENE_LOADER_CONFIG";
pub const MAX_MINIMUM_LOADING_TIME_SECS: f32 = 10.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read loader config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse loader config: {message}")]
    Parse { message: String },
}

/// Host-side settings for one loading screen.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub load_style: LoadStyle,
    pub load_scene: String,
    pub additive_scenes: Vec<String>,
    pub skip_mode: SkipMode,
    /// Action a `key_down` skip mode listens for.
    pub skip_action: InputAction,
    /// The screen stays up at least this long, even after loading finished.
    pub minimum_loading_time_secs: f32,
    pub destroy_on_completed: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            load_style: LoadStyle::Single,
            load_scene: String::new(),
            additive_scenes: Vec::new(),
            skip_mode: SkipMode::InstantComplete,
            skip_action: InputAction::Submit,
            minimum_loading_time_secs: 0.0,
            destroy_on_completed: false,
        }
    }
}

impl LoaderConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, LoaderConfig>(&mut deserializer) {
            Ok(config) => Ok(config.normalized()),
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                let message = if path.is_empty() || path == "." {
                    source.to_string()
                } else {
                    format!("at {path}: {source}")
                };
                Err(ConfigError::Parse { message })
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Builds the request for the configured load style.
    pub fn load_request(&self) -> Result<LoadRequest, LoadRequestError> {
        match self.load_style {
            LoadStyle::Single => LoadRequest::single(self.load_scene.clone()),
            LoadStyle::Additive => LoadRequest::additive(self.additive_scenes.iter().cloned()),
        }
    }

    pub fn minimum_display_time(&self) -> Duration {
        Duration::from_secs_f32(clamp_minimum_loading_time(self.minimum_loading_time_secs))
    }

    /// Sets the minimum display time, clamped to `0..=10` seconds.
    pub fn set_minimum_loading_time(&mut self, secs: f32) {
        let clamped = clamp_minimum_loading_time(secs);
        if clamped != secs {
            warn!(
                configured = secs,
                clamped, "minimum loading time out of range; clamped"
            );
        }
        self.minimum_loading_time_secs = clamped;
    }

    fn normalized(mut self) -> Self {
        self.set_minimum_loading_time(self.minimum_loading_time_secs);
        self
    }
}

fn clamp_minimum_loading_time(secs: f32) -> f32 {
    if !secs.is_finite() {
        return 0.0;
    }
    secs.clamp(0.0, MAX_MINIMUM_LOADING_TIME_SECS)
}

/// Config path from [`CONFIG_ENV_VAR`], or `None` when it is unset.
pub fn resolve_config_path() -> Result<Option<PathBuf>, ConfigError> {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(PathBuf::from(value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar {
            var: CONFIG_ENV_VAR,
            source,
        }),
    }
}
