use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStyle {
    /// Replace the active scene with one target.
    #[default]
    Single,
    /// Load an ordered set of targets alongside the active scene.
    Additive,
}

/// Path or name of a scene the loading service understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneTarget(String);

impl SceneTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadRequestError {
    #[error("scene target at index {index} is empty")]
    EmptyTarget { index: usize },
    #[error("additive load request names no scenes")]
    NoTargets,
}

/// A validated load request. Every target is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Single(SceneTarget),
    Additive(Vec<SceneTarget>),
}

impl LoadRequest {
    pub fn single(target: impl Into<String>) -> Result<Self, LoadRequestError> {
        let target = target.into();
        if target.is_empty() {
            return Err(LoadRequestError::EmptyTarget { index: 0 });
        }
        Ok(Self::Single(SceneTarget(target)))
    }

    pub fn additive<I, S>(targets: I) -> Result<Self, LoadRequestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validated = Vec::new();
        for (index, target) in targets.into_iter().enumerate() {
            let target = target.into();
            if target.is_empty() {
                return Err(LoadRequestError::EmptyTarget { index });
            }
            validated.push(SceneTarget(target));
        }
        if validated.is_empty() {
            return Err(LoadRequestError::NoTargets);
        }
        Ok(Self::Additive(validated))
    }

    pub fn style(&self) -> LoadStyle {
        match self {
            LoadRequest::Single(_) => LoadStyle::Single,
            LoadRequest::Additive(_) => LoadStyle::Additive,
        }
    }

    pub fn targets(&self) -> &[SceneTarget] {
        match self {
            LoadRequest::Single(target) => std::slice::from_ref(target),
            LoadRequest::Additive(targets) => targets,
        }
    }
}
