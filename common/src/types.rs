use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: i32,
    pub g: i32,
    pub b: i32,
}

impl Rgb {
    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }

    pub fn channels(self) -> [i32; 3] {
        [self.r, self.g, self.b]
    }

    /// Integer-scales every channel by `brightness` percent, truncating toward zero.
    /// Results beyond the `i32` range saturate.
    pub fn scaled(self, brightness: i32) -> Self {
        let scale = |value: i32| {
            let wide = i64::from(value) * i64::from(brightness) / 100;
            i32::try_from(wide).unwrap_or(if wide < 0 { i32::MIN } else { i32::MAX })
        };
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }
}

/// Logical state of the RGB fixture. Brightness and channels are stored as received;
/// 0–100 and 0–255 are the expected ranges but nothing enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedState {
    pub on: bool,
    pub brightness: i32,
    pub color: Rgb,
}

impl Default for LedState {
    fn default() -> Self {
        Self {
            on: false,
            brightness: 50,
            color: Rgb::new(128, 128, 128),
        }
    }
}

impl LedState {
    pub fn is_lit(&self) -> bool {
        self.on && self.brightness > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyReading {
    pub energy_kwh: f64,
    pub cost: f64,
}

impl EnergyReading {
    pub const ZERO: Self = Self {
        energy_kwh: 0.0,
        cost: 0.0,
    };
}
