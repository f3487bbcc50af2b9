use crate::{
    config::EnergyConfig,
    energy::EnergyAccount,
    http::Command,
    types::{EnergyReading, LedState, Rgb},
};

/// Fixture state plus its energy session. The request loop is the only writer.
#[derive(Debug, Clone)]
pub struct SmartLight {
    state: LedState,
    energy: EnergyAccount,
}

impl SmartLight {
    pub fn new(energy: EnergyConfig) -> Self {
        Self {
            state: LedState::default(),
            energy: EnergyAccount::new(energy),
        }
    }

    pub fn state(&self) -> &LedState {
        &self.state
    }

    pub fn energy(&self) -> &EnergyAccount {
        &self.energy
    }

    pub fn session_start_ms(&self) -> Option<u64> {
        self.energy.session_start_ms()
    }

    /// Flips the fixture. Turning on opens a fresh energy session; turning off closes it.
    pub fn toggle_power(&mut self, now_ms: u64) {
        self.state.on = !self.state.on;
        if self.state.on {
            self.energy.start_session(now_ms);
        } else {
            self.energy.end_session();
        }
    }

    pub fn set_brightness(&mut self, brightness: i32) {
        self.state.brightness = brightness;
    }

    /// Stores the requested color already scaled by the current brightness.
    ///
    /// LED actuation scales by brightness again, so the emitted level is
    /// `value * brightness² / 100²`. Kept for compatibility with the deployed UI.
    pub fn set_color(&mut self, color: Rgb) {
        self.state.color = color.scaled(self.state.brightness);
    }

    pub fn apply(&mut self, command: Command, now_ms: u64) {
        match command {
            Command::TogglePower => self.toggle_power(now_ms),
            Command::SetBrightness(value) => self.set_brightness(value),
            Command::SetColor(color) => self.set_color(color),
            Command::Effect | Command::None => {}
        }
    }

    pub fn reading(&self, now_ms: u64) -> EnergyReading {
        self.energy.recompute(&self.state, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn light() -> SmartLight {
        SmartLight::new(EnergyConfig::default())
    }

    #[test]
    fn starts_off_at_half_brightness_mid_gray() {
        let light = light();
        assert_eq!(
            *light.state(),
            LedState {
                on: false,
                brightness: 50,
                color: Rgb::new(128, 128, 128),
            }
        );
        assert_eq!(light.session_start_ms(), None);
    }

    #[test]
    fn power_brightness_color_sequence() {
        let mut light = light();

        light.apply(Command::TogglePower, 1_000);
        assert!(light.state().on);
        assert_eq!(light.session_start_ms(), Some(1_000));

        light.apply(Command::SetBrightness(75), 2_000);
        assert_eq!(light.state().brightness, 75);
        assert_eq!(light.session_start_ms(), Some(1_000));

        light.apply(Command::SetColor(Rgb::new(200, 100, 50)), 3_000);
        assert_eq!(light.session_start_ms(), Some(1_000));
    }

    #[test]
    fn color_baseline_is_prescaled_by_brightness() {
        let mut light = light();
        light.set_brightness(75);

        light.set_color(Rgb::new(200, 100, 50));

        // Not (200, 100, 50): the stored baseline already carries the brightness.
        assert_eq!(light.state().color, Rgb::new(150, 75, 37));
    }

    #[test]
    fn oversized_brightness_saturates_color_baseline() {
        let mut light = light();
        light.set_brightness(i32::MAX);

        light.set_color(Rgb::new(255, 255, 255));

        assert_eq!(light.state().color, Rgb::new(i32::MAX, i32::MAX, i32::MAX));
    }

    #[test]
    fn negative_brightness_is_stored_and_inverts_color() {
        let mut light = light();
        light.apply(Command::SetBrightness(-5), 0);

        light.set_color(Rgb::new(200, 100, 0));

        assert_eq!(light.state().brightness, -5);
        assert_eq!(light.state().color, Rgb::new(-10, -5, 0));
        assert!(!light.state().is_lit());
    }

    #[test]
    fn toggling_off_ends_the_session() {
        let mut light = light();
        light.toggle_power(0);
        light.toggle_power(10_000);

        assert!(!light.state().on);
        assert_eq!(light.session_start_ms(), None);
        assert_eq!(light.reading(20_000), EnergyReading::ZERO);
    }

    #[test]
    fn toggling_back_on_restarts_the_session() {
        let mut light = light();
        light.toggle_power(0);
        light.toggle_power(10_000);
        light.toggle_power(50_000);

        assert_eq!(light.session_start_ms(), Some(50_000));
    }

    #[test]
    fn effect_and_unknown_change_nothing() {
        let mut light = light();
        light.toggle_power(5);
        let before = *light.state();

        light.apply(Command::Effect, 100);
        light.apply(Command::None, 200);

        assert_eq!(*light.state(), before);
        assert_eq!(light.session_start_ms(), Some(5));
    }
}
