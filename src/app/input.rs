use dotmatrix::joypad::{JOY_A, JOY_B, JOY_DOWN, JOY_LEFT, JOY_RIGHT, JOY_SELECT, JOY_START, JOY_UP};
use sdl2::event::Event;
use sdl2::keyboard::{Keycode, Scancode};
use sdl2::EventPump;

/// Pumps pending events. Returns true when the frontend should quit.
pub fn poll_quit(event_pump: &mut EventPump) -> bool {
    for event in event_pump.poll_iter() {
        match event {
            Event::Quit { .. } => return true,
            Event::KeyDown {
                keycode: Some(Keycode::Escape),
                ..
            } => return true,
            _ => {}
        }
    }
    false
}

/// Samples the keyboard into the pressed-button mask the core consumes.
pub fn pressed_mask(event_pump: &EventPump) -> u8 {
    let keys = event_pump.keyboard_state();
    let down = |scancode| keys.is_scancode_pressed(scancode);
    let mut mask = 0;

    if down(Scancode::Right) || down(Scancode::D) {
        mask |= JOY_RIGHT;
    }
    if down(Scancode::Left) || down(Scancode::A) {
        mask |= JOY_LEFT;
    }
    if down(Scancode::Up) || down(Scancode::W) {
        mask |= JOY_UP;
    }
    if down(Scancode::Down) || down(Scancode::S) {
        mask |= JOY_DOWN;
    }
    if down(Scancode::Z) || down(Scancode::K) {
        mask |= JOY_A;
    }
    if down(Scancode::X) || down(Scancode::J) {
        mask |= JOY_B;
    }
    if down(Scancode::Return) || down(Scancode::Space) {
        mask |= JOY_START;
    }
    if down(Scancode::Backspace) || down(Scancode::RShift) {
        mask |= JOY_SELECT;
    }

    mask
}
