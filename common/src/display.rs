//! SSD1306 monochrome OLED driver with an in-memory page-packed framebuffer.
//!
//! Drawing only touches the framebuffer; nothing reaches the panel until [`Ssd1306::flush`].
//! Pixels outside the panel are clipped.

use core::convert::Infallible;

use embedded_graphics::{
    image::{GetPixel, ImageRaw},
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

use crate::{
    bus::DisplayBus,
    error::{DisplayError, HardwareError},
};

#[allow(dead_code)]
mod cmd {
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_ENTIRE_ON: u8 = 0xA4;
    pub const SET_NORM_INV: u8 = 0xA6;
    pub const SET_DISP: u8 = 0xAE;
    pub const SET_MEM_ADDR: u8 = 0x20;
    pub const SET_COL_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const SET_DISP_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA0;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_COM_OUT_DIR: u8 = 0xC0;
    pub const SET_DISP_OFFSET: u8 = 0xD3;
    pub const SET_COM_PIN_CFG: u8 = 0xDA;
    pub const SET_DISP_CLK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_VCOM_DESEL: u8 = 0xDB;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
}

/// Controller RAM: 128 columns, 8 pages.
const MAX_WIDTH: u32 = 128;
const MAX_HEIGHT: u32 = 64;

/// Panels 64 pixels wide sit in the middle of the 128-column controller RAM.
const NARROW_PANEL_WIDTH: u32 = 64;
const NARROW_PANEL_COLUMN_OFFSET: u32 = 32;

/// Height of one text line in pixels.
pub const LINE_HEIGHT: i32 = 10;

/// Power-up register sequence, one entry per command or argument byte.
pub fn init_sequence(width: u32, height: u32, external_vcc: bool) -> Vec<u8> {
    vec![
        cmd::SET_DISP,
        cmd::SET_MEM_ADDR,
        0x00, // horizontal
        cmd::SET_DISP_START_LINE,
        cmd::SET_SEG_REMAP | 0x01, // column 127 mapped to SEG0
        cmd::SET_MUX_RATIO,
        height.saturating_sub(1) as u8,
        cmd::SET_COM_OUT_DIR | 0x08, // scan from COM[N] to COM0
        cmd::SET_DISP_OFFSET,
        0x00,
        cmd::SET_COM_PIN_CFG,
        if width > 2 * height { 0x02 } else { 0x12 },
        cmd::SET_DISP_CLK_DIV,
        0x80,
        cmd::SET_PRECHARGE,
        if external_vcc { 0x22 } else { 0xF1 },
        cmd::SET_VCOM_DESEL,
        0x30, // 0.83 * Vcc
        cmd::SET_CONTRAST,
        0xFF,
        cmd::SET_ENTIRE_ON, // output follows RAM
        cmd::SET_NORM_INV,
        cmd::SET_CHARGE_PUMP,
        if external_vcc { 0x10 } else { 0x14 },
        cmd::SET_DISP | 0x01,
    ]
}

pub struct Ssd1306<B> {
    bus: B,
    width: u32,
    height: u32,
    external_vcc: bool,
    buffer: Vec<u8>,
}

impl<B: DisplayBus> Ssd1306<B> {
    /// Builds the driver, runs the power-up sequence and pushes a blank frame.
    ///
    /// Width must be 1..=128 and height a whole number of pages in 8..=64; anything else
    /// is rejected before the bus is touched.
    pub fn new(
        bus: B,
        width: u32,
        height: u32,
        external_vcc: bool,
    ) -> Result<Self, DisplayError> {
        if !geometry_supported(width, height) {
            return Err(DisplayError::Geometry { width, height });
        }
        let pages = height / 8;
        let mut display = Self {
            bus,
            width,
            height,
            external_vcc,
            buffer: vec![0; (width * pages) as usize],
        };
        display.initialize()?;
        Ok(display)
    }

    pub fn initialize(&mut self) -> Result<(), HardwareError> {
        for byte in init_sequence(self.width, self.height, self.external_vcc) {
            self.bus.write_command(byte)?;
        }
        self.clear();
        self.flush()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pages(&self) -> u32 {
        self.height / 8
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    pub fn pixel(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some((index, mask)) => self.buffer[index] & mask != 0,
            None => false,
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        let Some((index, mask)) = self.index(x, y) else {
            return;
        };
        if on {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
    }

    /// Renders `text` with its top-left corner at (`x`, `y`).
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32) {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let _ = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(self);
    }

    /// Copies a row-major, MSB-first 1bpp bitmap `width` pixels wide to (`x`, `y`).
    /// Set bits light pixels; clear bits leave the framebuffer untouched.
    pub fn blit(&mut self, bitmap: &[u8], width: u32, x: i32, y: i32) {
        let raw = ImageRaw::<BinaryColor>::new(bitmap, width);
        let origin = Point::new(x, y);
        for point in raw.bounding_box().points() {
            if raw.pixel(point) == Some(BinaryColor::On) {
                let target = point + origin;
                self.set_pixel(target.x, target.y, true);
            }
        }
    }

    /// Clears the frame and writes one text line per entry, stacked from the top.
    pub fn show_lines(&mut self, lines: &[&str]) -> Result<(), HardwareError> {
        self.clear();
        for (row, line) in lines.iter().enumerate() {
            self.draw_text(line, 0, row as i32 * LINE_HEIGHT);
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), HardwareError> {
        let (mut x0, mut x1) = (0, self.width - 1);
        if self.width == NARROW_PANEL_WIDTH {
            x0 += NARROW_PANEL_COLUMN_OFFSET;
            x1 += NARROW_PANEL_COLUMN_OFFSET;
        }

        self.bus.write_command(cmd::SET_COL_ADDR)?;
        self.bus.write_command(x0 as u8)?;
        self.bus.write_command(x1 as u8)?;
        self.bus.write_command(cmd::SET_PAGE_ADDR)?;
        self.bus.write_command(0)?;
        self.bus.write_command((self.pages() - 1) as u8)?;
        self.bus.write_data(&self.buffer)
    }

    pub fn power_off(&mut self) -> Result<(), HardwareError> {
        self.bus.write_command(cmd::SET_DISP)
    }

    pub fn power_on(&mut self) -> Result<(), HardwareError> {
        self.bus.write_command(cmd::SET_DISP | 0x01)
    }

    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), HardwareError> {
        self.bus.write_command_with_arg(cmd::SET_CONTRAST, contrast)
    }

    pub fn set_inverted(&mut self, inverted: bool) -> Result<(), HardwareError> {
        self.bus.write_command(cmd::SET_NORM_INV | u8::from(inverted))
    }

    fn index(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        let index = (y / 8) * self.width as usize + x;
        Some((index, 1 << (y % 8)))
    }
}

pub fn geometry_supported(width: u32, height: u32) -> bool {
    (1..=MAX_WIDTH).contains(&width) && (8..=MAX_HEIGHT).contains(&height) && height % 8 == 0
}

impl<B: DisplayBus> OriginDimensions for Ssd1306<B> {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl<B: DisplayBus> DrawTarget for Ssd1306<B> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}
