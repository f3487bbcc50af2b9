//! Boot splash shown while the network comes up.

use crate::{bus::DisplayBus, display::Ssd1306, error::HardwareError};

pub const SPLASH_WIDTH: u32 = 80;
pub const SPLASH_HEIGHT: u32 = 60;

/// Where the splash lands on a 128x64 panel.
pub const SPLASH_ORIGIN: (i32, i32) = (24, 2);

/// Mascot bitmap, row-major 1bpp MSB-first.
pub static SPLASH: [u8; (SPLASH_WIDTH / 8 * SPLASH_HEIGHT) as usize] = [
    0x00, 0x00, 0x00, 0x00, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x3c, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x3e, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x37, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x01, 0xf3, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x01, 0xf9, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x01, 0xb8, 0xc0, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x98, 0x78, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xc0, 0x3f, 0x80, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x01, 0xc0, 0x03, 0xe0, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x0f, 0x80, 0x00, 0x78, 0x03, 0xe0, 0x00,
    0x00, 0x0f, 0xe0, 0x1c, 0x00, 0x00, 0x1e, 0x0f, 0xf8, 0x00,
    0x00, 0x3f, 0xfc, 0x70, 0x00, 0x00, 0x07, 0x7f, 0xfe, 0x00,
    0x00, 0x7f, 0xfe, 0xe0, 0x00, 0x00, 0x03, 0xff, 0xff, 0x00,
    0x00, 0xff, 0xff, 0x80, 0x00, 0x00, 0x01, 0xff, 0xff, 0x00,
    0x01, 0xff, 0xff, 0x80, 0x00, 0x00, 0x00, 0xff, 0xff, 0x80,
    0x01, 0xff, 0xff, 0x03, 0xf0, 0x0f, 0x80, 0xff, 0xff, 0xc0,
    0x03, 0xff, 0xfe, 0x07, 0x38, 0x1c, 0xc0, 0x7f, 0xff, 0xc0,
    0x07, 0xff, 0xfe, 0x06, 0x1c, 0x30, 0x60, 0x7f, 0xff, 0xe0,
    0x07, 0xff, 0xf6, 0x0c, 0x0c, 0x70, 0x30, 0x6f, 0xff, 0xe0,
    0x07, 0xff, 0xf6, 0x0c, 0x7e, 0x7e, 0x30, 0x6f, 0xff, 0xf0,
    0x0f, 0xff, 0xf6, 0x08, 0xfe, 0x7f, 0x30, 0x6f, 0xff, 0xf0,
    0x0f, 0xff, 0xf6, 0x08, 0xfe, 0x7f, 0x30, 0x6f, 0xff, 0xf8,
    0x1f, 0xff, 0xe6, 0x08, 0xfe, 0x7f, 0x30, 0x67, 0xff, 0xf8,
    0x1f, 0xff, 0xe6, 0x08, 0xfe, 0x7f, 0x30, 0x67, 0xff, 0xf8,
    0x1f, 0xff, 0xe6, 0x0c, 0xfe, 0x7f, 0x30, 0x67, 0xff, 0xfc,
    0x3f, 0xff, 0xe6, 0x0c, 0xfc, 0x3e, 0x30, 0x47, 0xff, 0xfc,
    0x3f, 0xff, 0xe6, 0x06, 0x7c, 0x3c, 0x60, 0x43, 0xff, 0xfc,
    0x3f, 0xff, 0xc6, 0x03, 0xf8, 0x1f, 0xc0, 0x43, 0xff, 0xfe,
    0x7f, 0xff, 0xc2, 0x01, 0xf0, 0x0f, 0x80, 0xc3, 0xff, 0xfe,
    0x7f, 0xff, 0x82, 0x00, 0x00, 0x00, 0x00, 0xc1, 0xff, 0xfe,
    0x7f, 0xff, 0x82, 0x00, 0x00, 0x00, 0x00, 0xc1, 0xff, 0xfe,
    0x7f, 0xff, 0x83, 0x00, 0x1e, 0x78, 0x00, 0xc0, 0xff, 0xfe,
    0x7f, 0xff, 0x03, 0xf0, 0x3f, 0xfc, 0x07, 0xe0, 0xff, 0xff,
    0xff, 0xfe, 0x07, 0xfe, 0x3f, 0xfc, 0x3f, 0xf0, 0x7f, 0xff,
    0xff, 0xfe, 0x0c, 0x07, 0xff, 0xfc, 0xf0, 0x18, 0x7f, 0xff,
    0xff, 0xfc, 0x18, 0x00, 0xff, 0xff, 0x80, 0x0c, 0x3f, 0xff,
    0xff, 0xfc, 0x18, 0x00, 0x3f, 0xfe, 0x00, 0x0c, 0x1f, 0xff,
    0xff, 0xf8, 0x30, 0x00, 0x1f, 0xfc, 0x00, 0x06, 0x0f, 0xff,
    0xff, 0xf0, 0x20, 0x00, 0x0f, 0xf8, 0x00, 0x06, 0x07, 0xff,
    0xff, 0xe0, 0x60, 0x00, 0x0f, 0xf0, 0x00, 0x03, 0x03, 0xff,
    0x7f, 0x80, 0x60, 0x00, 0x03, 0xe0, 0x00, 0x03, 0x00, 0xfe,
    0x7e, 0x00, 0x67, 0x03, 0x01, 0xc0, 0x81, 0xe3, 0x00, 0x3c,
    0x00, 0x00, 0x67, 0x07, 0x81, 0x81, 0xc1, 0xe3, 0x00, 0x00,
    0x00, 0x00, 0x67, 0x07, 0x81, 0x81, 0xc1, 0xe3, 0x00, 0x00,
    0x00, 0x00, 0x60, 0x03, 0x01, 0x81, 0xc0, 0x03, 0x00, 0x00,
    0x00, 0x00, 0x60, 0x00, 0x01, 0x80, 0x00, 0x03, 0x00, 0x00,
    0x00, 0x00, 0x63, 0x00, 0x01, 0x80, 0x01, 0x83, 0x00, 0x00,
    0x00, 0x00, 0x63, 0x80, 0x01, 0x80, 0x03, 0xc3, 0x00, 0x00,
    0x00, 0x00, 0x23, 0x81, 0x81, 0x83, 0x83, 0xc6, 0x00, 0x00,
    0x00, 0x00, 0x33, 0x83, 0xc1, 0x83, 0x81, 0x86, 0x00, 0x00,
    0x00, 0x00, 0x10, 0x03, 0xc1, 0x83, 0x80, 0x06, 0x00, 0x00,
    0x00, 0x00, 0x18, 0x31, 0x81, 0x81, 0x1c, 0x0c, 0x00, 0x00,
    0x00, 0x00, 0x0c, 0x78, 0x01, 0x80, 0x3c, 0x18, 0x00, 0x00,
    0x00, 0x00, 0x06, 0x78, 0x01, 0x80, 0x1c, 0x38, 0x00, 0x00,
    0x00, 0x00, 0x07, 0x00, 0x03, 0xe0, 0x08, 0x70, 0x00, 0x00,
    0x00, 0x00, 0x01, 0xc0, 0x1f, 0x7c, 0x01, 0xc0, 0x00, 0x00,
    0x00, 0x00, 0x00, 0xff, 0xfc, 0x1f, 0xff, 0x80, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x1f, 0xe0, 0x03, 0xfc, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub fn show_splash<B: DisplayBus>(display: &mut Ssd1306<B>) -> Result<(), HardwareError> {
    let (x, y) = SPLASH_ORIGIN;
    display.clear();
    display.blit(&SPLASH, SPLASH_WIDTH, x, y);
    display.flush()
}
