use super::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Interact,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
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
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
        }
    }
}

/// Per-tick abstract input consumed by a simulation.
///
/// `movement` is a direction, not a displacement; the simulation scales it by
/// its own speed and the fixed timestep. Screen convention: `+y` is down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    pub movement: Vec2,
    pub interact_pressed: bool,
}

impl Intent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(x: f32, y: f32) -> Self {
        Self {
            movement: Vec2 { x, y },
            interact_pressed: false,
        }
    }

    pub fn interact() -> Self {
        Self {
            movement: Vec2::ZERO,
            interact_pressed: true,
        }
    }
}

/// Folds held-key state into per-tick intents.
///
/// Interact is edge-triggered: holding the key yields a single pressed tick,
/// and a new press requires a release first.
#[derive(Debug, Default)]
pub struct IntentCollector {
    actions: ActionStates,
    interact_is_down: bool,
    interact_pressed_edge: bool,
}

impl IntentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_action(&mut self, action: InputAction, is_down: bool) {
        if action == InputAction::Interact {
            if is_down && !self.interact_is_down {
                self.interact_pressed_edge = true;
            }
            self.interact_is_down = is_down;
        }
        self.actions.set(action, is_down);
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn intent_for_tick(&mut self) -> Intent {
        let mut x = 0.0f32;
        let mut y = 0.0f32;
        if self.actions.is_down(InputAction::MoveRight) {
            x += 1.0;
        }
        if self.actions.is_down(InputAction::MoveLeft) {
            x -= 1.0;
        }
        if self.actions.is_down(InputAction::MoveDown) {
            y += 1.0;
        }
        if self.actions.is_down(InputAction::MoveUp) {
            y -= 1.0;
        }

        let interact_pressed = self.interact_pressed_edge;
        self.interact_pressed_edge = false;

        Intent {
            movement: Vec2 { x, y },
            interact_pressed,
        }
    }
}
