use serde::{Deserialize, Serialize};

/// Logical actions a key-down skip policy can bind to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    #[default]
    Submit,
    Cancel,
    Skip,
}

const ACTION_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set_down(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn set_pressed(&mut self, action: InputAction, pressed: bool) {
        self.pressed[action.index()] = pressed;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn clear_pressed(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::Submit => 0,
            InputAction::Cancel => 1,
            InputAction::Skip => 2,
        }
    }
}

/// Gamepad face buttons, named by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    North,
    South,
    East,
    West,
}

/// Input sampled once per tick. Every `*_pressed` flag is an edge: true only
/// on the tick the press began.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: ActionStates,
    any_key_pressed: bool,
    left_click_pressed: bool,
    right_click_pressed: bool,
    middle_click_pressed: bool,
    gamepad_face_pressed: bool,
    touch_began: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        actions: ActionStates,
        any_key_pressed: bool,
        mouse_pressed: (bool, bool, bool),
        gamepad_face_pressed: bool,
        touch_began: bool,
    ) -> Self {
        Self {
            actions,
            any_key_pressed,
            left_click_pressed: mouse_pressed.0,
            right_click_pressed: mouse_pressed.1,
            middle_click_pressed: mouse_pressed.2,
            gamepad_face_pressed,
            touch_began,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set_down(action, is_down);
        self
    }

    /// Marks `action` as newly pressed this tick (and held).
    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set_down(action, true);
        self.actions.set_pressed(action, true);
        self
    }

    pub fn with_any_key_pressed(mut self, pressed: bool) -> Self {
        self.any_key_pressed = pressed;
        self
    }

    pub fn with_left_click_pressed(mut self, pressed: bool) -> Self {
        self.left_click_pressed = pressed;
        self
    }

    pub fn with_right_click_pressed(mut self, pressed: bool) -> Self {
        self.right_click_pressed = pressed;
        self
    }

    pub fn with_middle_click_pressed(mut self, pressed: bool) -> Self {
        self.middle_click_pressed = pressed;
        self
    }

    pub fn with_gamepad_face_pressed(mut self, pressed: bool) -> Self {
        self.gamepad_face_pressed = pressed;
        self
    }

    pub fn with_touch_began(mut self, began: bool) -> Self {
        self.touch_began = began;
        self
    }

    pub fn any_key_pressed(&self) -> bool {
        self.any_key_pressed
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_click_pressed(&self) -> bool {
        self.right_click_pressed
    }

    pub fn middle_click_pressed(&self) -> bool {
        self.middle_click_pressed
    }

    pub fn gamepad_face_pressed(&self) -> bool {
        self.gamepad_face_pressed
    }

    pub fn touch_began(&self) -> bool {
        self.touch_began
    }

    /// True when any keyboard key, mouse button, gamepad face button or touch
    /// began this tick.
    pub fn any_input_began(&self) -> bool {
        self.any_key_pressed
            || self.left_click_pressed
            || self.right_click_pressed
            || self.middle_click_pressed
            || self.gamepad_face_pressed
            || self.touch_began
    }
}
