use crate::iso::ScreenCoordinate;

/// Held-state inputs. Edge-triggered inputs live directly on [`InputSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    RotateLeft,
    RotateRight,
    PrimaryHeld,
    Quit,
}

const ACTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::RotateLeft => 0,
            InputAction::RotateRight => 1,
            InputAction::PrimaryHeld => 2,
            InputAction::Quit => 3,
        }
    }
}

/// Input as seen by one scene update. Cursor positions are in logical
/// frame pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    actions: ActionStates,
    cursor: Option<ScreenCoordinate>,
    confirm_pressed: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        actions: ActionStates,
        cursor: Option<ScreenCoordinate>,
        confirm_pressed: bool,
    ) -> Self {
        Self {
            actions,
            cursor,
            confirm_pressed,
        }
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn cursor(&self) -> Option<ScreenCoordinate> {
        self.cursor
    }

    pub fn primary_held(&self) -> bool {
        self.is_down(InputAction::PrimaryHeld)
    }

    /// True only on the tick the confirm key went down.
    pub fn confirm_pressed(&self) -> bool {
        self.confirm_pressed
    }

    pub fn quit_requested(&self) -> bool {
        self.is_down(InputAction::Quit)
    }

    /// `-1` for rotate-left, `1` for rotate-right, `0` when neither or both are held.
    pub fn rotation_axis(&self) -> f64 {
        let left = self.is_down(InputAction::RotateLeft) as i8;
        let right = self.is_down(InputAction::RotateRight) as i8;
        f64::from(right - left)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor(mut self, cursor: Option<ScreenCoordinate>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_confirm_pressed(mut self, confirm_pressed: bool) -> Self {
        self.confirm_pressed = confirm_pressed;
        self
    }
}
