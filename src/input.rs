//! Explicit input state.
//!
//! The event loop feeds winit events in; the scene reads the result once per
//! frame. Keeping all input in one value passed into the update (instead of
//! flags captured by event-listener closures) is what makes the interaction
//! logic testable.

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Camera pan axes driven by the arrow keys. Each axis is -1, 0 or 1.
///
/// Pressing a key sets its axis; releasing either key of a pair zeroes the
/// axis, so releasing ArrowUp stops vertical panning even while ArrowDown is
/// still held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanAxes {
    pub horizontal: i8,
    pub vertical: i8,
}

impl PanAxes {
    fn press(&mut self, key: KeyCode) {
        match key {
            KeyCode::ArrowUp => self.vertical = 1,
            KeyCode::ArrowDown => self.vertical = -1,
            KeyCode::ArrowLeft => self.horizontal = -1,
            KeyCode::ArrowRight => self.horizontal = 1,
            _ => {}
        }
    }

    fn release(&mut self, key: KeyCode) {
        match key {
            KeyCode::ArrowUp | KeyCode::ArrowDown => self.vertical = 0,
            KeyCode::ArrowLeft | KeyCode::ArrowRight => self.horizontal = 0,
            _ => {}
        }
    }
}

/// Everything the scene needs to know about the player this frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub pan: PanAxes,
    pub cursor: PhysicalPosition<f64>,
    click: Option<PhysicalPosition<f64>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from a window event. Called for every event before it reaches
    /// the scenes.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.cursor = *position,
            WindowEvent::KeyboardInput { event, .. } => {
                self.process_key(event.physical_key, event.state)
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.click = Some(self.cursor),
            _ => {}
        }
    }

    pub fn process_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match state {
            ElementState::Pressed => self.pan.press(code),
            ElementState::Released => self.pan.release(code),
        }
    }

    /// The pending click, if any. Consuming it clears it: one click is
    /// handled at most once.
    pub fn take_click(&mut self) -> Option<PhysicalPosition<f64>> {
        self.click.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputState, code: KeyCode) {
        input.process_key(PhysicalKey::Code(code), ElementState::Pressed);
    }

    fn release(input: &mut InputState, code: KeyCode) {
        input.process_key(PhysicalKey::Code(code), ElementState::Released);
    }

    #[test]
    fn arrows_drive_their_axes() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::ArrowUp);
        press(&mut input, KeyCode::ArrowRight);
        assert_eq!(
            input.pan,
            PanAxes {
                horizontal: 1,
                vertical: 1
            }
        );

        release(&mut input, KeyCode::ArrowUp);
        assert_eq!(input.pan.vertical, 0);
        assert_eq!(input.pan.horizontal, 1);

        release(&mut input, KeyCode::ArrowRight);
        assert_eq!(input.pan, PanAxes::default());
    }

    #[test]
    fn opposing_key_wins_last_press() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::ArrowUp);
        press(&mut input, KeyCode::ArrowDown);
        assert_eq!(input.pan.vertical, -1);
        // releasing either key of the pair stops the axis
        release(&mut input, KeyCode::ArrowUp);
        assert_eq!(input.pan.vertical, 0);
    }

    #[test]
    fn axes_stay_in_range() {
        let mut input = InputState::new();
        for _ in 0..3 {
            press(&mut input, KeyCode::ArrowLeft);
        }
        assert_eq!(input.pan.horizontal, -1);
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        let mut input = InputState::new();
        press(&mut input, KeyCode::KeyW);
        assert_eq!(input.pan, PanAxes::default());
    }

    #[test]
    fn clicks_are_consumed_once() {
        let mut input = InputState::new();
        input.cursor = PhysicalPosition::new(320.0, 240.0);
        input.handle_window_event(&WindowEvent::MouseInput {
            device_id: winit::event::DeviceId::dummy(),
            state: ElementState::Pressed,
            button: MouseButton::Left,
        });
        let click = input.take_click().unwrap();
        assert_eq!(click.x, 320.0);
        assert!(input.take_click().is_none());
    }
}
