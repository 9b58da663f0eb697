//! winit key and button codes to engine input codes.

use tt_core::input::{InputState, Key, MouseBtn};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::KeyCode;

pub fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Key::Shift),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyC => Some(Key::C),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyG => Some(Key::G),
        KeyCode::KeyO => Some(Key::O),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyT => Some(Key::T),
        KeyCode::KeyV => Some(Key::V),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyX => Some(Key::X),
        KeyCode::KeyZ => Some(Key::Z),
        _ => None,
    }
}

pub fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

pub fn apply_key(input: &mut InputState, key_code: KeyCode, state: ElementState) {
    if let Some(key) = map_key(key_code) {
        match state {
            ElementState::Pressed => input.key_down(key),
            ElementState::Released => input.key_up(key),
        }
    }
}

pub fn apply_mouse_button(input: &mut InputState, button: MouseButton, state: ElementState) {
    if let Some(btn) = map_mouse_button(button) {
        match state {
            ElementState::Pressed => input.mouse_down(btn),
            ElementState::Released => input.mouse_up(btn),
        }
    }
}

/// Whole wheel notches; trackpad pixel deltas count one notch per 40px.
pub fn wheel_notches(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(pos) => (pos.y / 40.0).round() as i32,
    }
}
