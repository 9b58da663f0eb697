//! Keyboard and mouse state with held (level) and pressed/released (edge) queries.
//!
//! Edge sets are only cleared by `end_frame()`. The game loop calls it after a
//! fixed step has run, so a tap that lands on a frame without a simulation step
//! is still seen by the next one. Mouse wheel notches accumulate the same way.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Escape,
    Enter,
    Space,
    Backspace,
    Shift,
    F3,
    A,
    C,
    D,
    G,
    O,
    Q,
    S,
    T,
    V,
    W,
    X,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
    released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_pressed: HashSet<MouseBtn>,
    mouse_released: HashSet<MouseBtn>,

    /// Cursor position in physical window pixels.
    pub mouse_position: (f64, f64),
    wheel_steps: i32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        // OS key repeat re-sends presses; only the first one is an edge.
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.released.insert(key);
        }
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) {
            self.mouse_pressed.insert(btn);
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        if self.mouse_held.remove(&btn) {
            self.mouse_released.insert(btn);
        }
    }

    /// Positive values scroll up / away from the user.
    pub fn wheel(&mut self, steps: i32) {
        self.wheel_steps += steps;
    }

    pub fn wheel_steps(&self) -> i32 {
        self.wheel_steps
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.released.contains(&key)
    }

    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_held(*k))
    }

    pub fn any_just_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_just_pressed(*k))
    }

    /// -1, 0 or 1 from two opposing key groups.
    pub fn axis(&self, negative: &[Key], positive: &[Key]) -> f32 {
        let mut value = 0.0;
        if self.any_held(negative) {
            value -= 1.0;
        }
        if self.any_held(positive) {
            value += 1.0;
        }
        value
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_pressed.contains(&btn)
    }

    pub fn is_mouse_just_released(&self, btn: MouseBtn) -> bool {
        self.mouse_released.contains(&btn)
    }

    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
        self.mouse_pressed.clear();
        self.mouse_released.clear();
        self.wheel_steps = 0;
    }
}
