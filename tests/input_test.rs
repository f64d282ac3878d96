//! Arrow-key panning and click capture semantics.

use amble::input::{InputState, PanAxes};
use winit::{
    event::ElementState,
    keyboard::{KeyCode, PhysicalKey},
};

fn press(input: &mut InputState, code: KeyCode) {
    input.process_key(PhysicalKey::Code(code), ElementState::Pressed);
}

fn release(input: &mut InputState, code: KeyCode) {
    input.process_key(PhysicalKey::Code(code), ElementState::Released);
}

#[test]
fn axes_toggle_between_minus_one_zero_and_one() {
    let mut input = InputState::new();
    assert_eq!(input.pan, PanAxes::default());

    press(&mut input, KeyCode::ArrowUp);
    assert_eq!(input.pan.vertical, 1);
    press(&mut input, KeyCode::ArrowDown);
    assert_eq!(input.pan.vertical, -1);
    press(&mut input, KeyCode::ArrowLeft);
    assert_eq!(input.pan.horizontal, -1);
    press(&mut input, KeyCode::ArrowRight);
    assert_eq!(input.pan.horizontal, 1);

    for axis in [input.pan.horizontal, input.pan.vertical] {
        assert!((-1..=1).contains(&axis));
    }
}

#[test]
fn panning_ceases_when_keys_are_released() {
    let mut input = InputState::new();
    press(&mut input, KeyCode::ArrowUp);
    press(&mut input, KeyCode::ArrowRight);

    release(&mut input, KeyCode::ArrowUp);
    release(&mut input, KeyCode::ArrowRight);
    assert_eq!(input.pan, PanAxes::default());
}

#[test]
fn releasing_either_key_of_a_pair_zeroes_the_axis() {
    let mut input = InputState::new();
    press(&mut input, KeyCode::ArrowDown);
    release(&mut input, KeyCode::ArrowUp);
    assert_eq!(input.pan.vertical, 0);
}

#[test]
fn key_repeat_does_not_change_the_axis() {
    let mut input = InputState::new();
    press(&mut input, KeyCode::ArrowLeft);
    press(&mut input, KeyCode::ArrowLeft);
    assert_eq!(input.pan.horizontal, -1);
}
