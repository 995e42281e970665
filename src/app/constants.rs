use std::time::Duration;

pub use dotmatrix::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// 154 lines x 456 dots.
pub const CYCLES_PER_FRAME: u32 = 70_224;

/// 70 224 T-cycles at 4.194304 MHz, ~59.7 Hz.
pub const TARGET_FRAME_DURATION: Duration = Duration::from_nanos(16_742_706);

pub const WINDOW_SCALE: u32 = 4;

/// Shade 0..3 to RGB, the classic pea-soup LCD palette.
pub const SHADE_COLORS: [(u8, u8, u8); 4] = [
    (0xE0, 0xF8, 0xD0),
    (0x88, 0xC0, 0x70),
    (0x34, 0x68, 0x56),
    (0x08, 0x18, 0x20),
];

/// Queue cap: ~500 ms of 48 kHz stereo f32 audio, in bytes.
pub const AUDIO_MAX_QUEUED_BYTES: u32 = 48_000 * 2 * 4 / 2;
