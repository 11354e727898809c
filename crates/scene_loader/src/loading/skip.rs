use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::input::{InputAction, InputSnapshot};

/// How the wait after virtual completion may be bypassed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipMode {
    #[default]
    InstantComplete,
    KeyDown,
    AnyKey,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid skip mode discriminant {0} (expected 0..=3)")]
pub struct InvalidSkipMode(pub u8);

impl TryFrom<u8> for SkipMode {
    type Error = InvalidSkipMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SkipMode::InstantComplete),
            1 => Ok(SkipMode::KeyDown),
            2 => Ok(SkipMode::AnyKey),
            3 => Ok(SkipMode::Manual),
            other => Err(InvalidSkipMode(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown skip mode '{0}' (expected instant_complete, key_down, any_key or manual)")]
pub struct UnknownSkipMode(pub String);

impl FromStr for SkipMode {
    type Err = UnknownSkipMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "instant_complete" => Ok(SkipMode::InstantComplete),
            "key_down" => Ok(SkipMode::KeyDown),
            "any_key" => Ok(SkipMode::AnyKey),
            "manual" => Ok(SkipMode::Manual),
            other => Err(UnknownSkipMode(other.to_string())),
        }
    }
}

impl SkipMode {
    /// Builds the policy for this mode. `action` is only used by `KeyDown`.
    pub fn signal(self, action: InputAction) -> Box<dyn SkipSignal> {
        match self {
            SkipMode::InstantComplete => Box::new(InstantSkip),
            SkipMode::KeyDown => Box::new(KeyDownSkip { action }),
            SkipMode::AnyKey => Box::new(AnyKeySkip),
            SkipMode::Manual => Box::new(ManualSkip),
        }
    }

    /// Whether a host-side skip request is honored in this mode.
    pub fn accepts_skip_requests(self) -> bool {
        !matches!(self, SkipMode::Manual)
    }
}

/// Source of the "unblock" signal that lets a virtually complete load finish.
pub trait SkipSignal {
    /// Called once, on the tick presentation progress first reaches 1.0.
    fn on_virtually_complete(&mut self) -> bool {
        false
    }

    /// Called once per tick while the gate waits for completion to be allowed.
    fn poll(&mut self, input: &InputSnapshot) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSkip;

impl SkipSignal for InstantSkip {
    fn on_virtually_complete(&mut self) -> bool {
        true
    }

    fn poll(&mut self, _input: &InputSnapshot) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct KeyDownSkip {
    pub action: InputAction,
}

impl SkipSignal for KeyDownSkip {
    fn poll(&mut self, input: &InputSnapshot) -> bool {
        input.was_pressed(self.action)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnyKeySkip;

impl SkipSignal for AnyKeySkip {
    fn poll(&mut self, input: &InputSnapshot) -> bool {
        input.any_input_began()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ManualSkip;

impl SkipSignal for ManualSkip {
    fn poll(&mut self, _input: &InputSnapshot) -> bool {
        false
    }
}
