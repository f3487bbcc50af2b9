//! RGB fixture actuation: logical [`LedState`] to three PWM duty cycles.

use embedded_hal::pwm::SetDutyCycle;

use crate::{error::HardwareError, types::LedState};

pub const DUTY_MAX: u16 = u16::MAX;

/// Duty for one channel on the 0–65535 scale.
///
/// `round(value * brightness / 100 * 65535 / 255)`, saturating at both ends when
/// unvalidated inputs push it outside the range.
pub fn channel_duty(value: i32, brightness: i32) -> u16 {
    let duty = (f64::from(value) * f64::from(brightness) / 100.0) * f64::from(DUTY_MAX) / 255.0;
    duty.round().clamp(0.0, f64::from(DUTY_MAX)) as u16
}

/// Duties for red, green and blue. All zero unless the fixture is on with non-zero brightness.
pub fn duties(state: &LedState) -> [u16; 3] {
    if !state.is_lit() {
        return [0; 3];
    }
    state
        .color
        .channels()
        .map(|value| channel_duty(value, state.brightness))
}

pub trait LedOutput {
    fn apply(&mut self, state: &LedState) -> Result<(), HardwareError>;
}

/// Three independent PWM channels driving a common RGB fixture.
pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
}

impl<R, G, B> RgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(red: R, green: G, blue: B) -> Self {
        Self { red, green, blue }
    }

    pub fn release(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

impl<R, G, B> LedOutput for RgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    fn apply(&mut self, state: &LedState) -> Result<(), HardwareError> {
        let [r, g, b] = duties(state);
        self.red
            .set_duty_cycle_fraction(r, DUTY_MAX)
            .map_err(HardwareError::pwm)?;
        self.green
            .set_duty_cycle_fraction(g, DUTY_MAX)
            .map_err(HardwareError::pwm)?;
        self.blue
            .set_duty_cycle_fraction(b, DUTY_MAX)
            .map_err(HardwareError::pwm)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use core::convert::Infallible;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::Rgb;

    /// PWM channel with a configurable resolution that remembers its last duty.
    #[derive(Debug, Default)]
    pub(crate) struct FakePwm {
        pub max: u16,
        pub duty: u16,
    }

    impl FakePwm {
        pub(crate) fn with_max(max: u16) -> Self {
            Self { max, duty: 0 }
        }
    }

    impl embedded_hal::pwm::ErrorType for FakePwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            self.max
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    fn lit(brightness: i32, color: Rgb) -> LedState {
        LedState {
            on: true,
            brightness,
            color,
        }
    }

    #[test]
    fn duty_matches_rounded_formula_across_the_range() {
        for brightness in (0..=100).step_by(5) {
            for value in (0..=255).step_by(17) {
                let expected =
                    (value as f64 * brightness as f64 / 100.0 * 65535.0 / 255.0).round() as u16;
                assert_eq!(channel_duty(value, brightness), expected);
            }
        }
    }

    #[test]
    fn full_white_at_full_brightness_is_full_duty() {
        assert_eq!(duties(&lit(100, Rgb::new(255, 255, 255))), [65535; 3]);
    }

    #[test]
    fn off_forces_zero_regardless_of_brightness() {
        let state = LedState {
            on: false,
            brightness: 100,
            color: Rgb::new(255, 10, 200),
        };
        assert_eq!(duties(&state), [0, 0, 0]);
    }

    #[test]
    fn zero_brightness_is_dark_even_when_on() {
        assert_eq!(duties(&lit(0, Rgb::new(255, 255, 255))), [0, 0, 0]);
    }

    #[test]
    fn out_of_range_inputs_saturate() {
        assert_eq!(channel_duty(255, 400), DUTY_MAX);
        assert_eq!(channel_duty(1_000, 100), DUTY_MAX);
        assert_eq!(channel_duty(-255, 100), 0);
    }

    #[test]
    fn negative_brightness_is_dark() {
        assert_eq!(duties(&lit(-5, Rgb::new(255, 255, 255))), [0, 0, 0]);
    }

    #[test]
    fn apply_rescales_into_channel_resolution() {
        let mut led = RgbLed::new(
            FakePwm::with_max(1023),
            FakePwm::with_max(1023),
            FakePwm::with_max(DUTY_MAX),
        );

        led.apply(&lit(100, Rgb::new(255, 0, 51))).unwrap();
        let (red, green, blue) = led.release();

        assert_eq!(red.duty, 1023);
        assert_eq!(green.duty, 0);
        assert_eq!(blue.duty, 13_107);
    }

    #[test]
    fn apply_is_idempotent() {
        let mut led = RgbLed::new(
            FakePwm::with_max(DUTY_MAX),
            FakePwm::with_max(DUTY_MAX),
            FakePwm::with_max(DUTY_MAX),
        );
        let state = lit(40, Rgb::new(10, 20, 30));

        led.apply(&state).unwrap();
        led.apply(&state).unwrap();
        let (red, green, blue) = led.release();

        assert_eq!(
            [red.duty, green.duty, blue.duty],
            [
                channel_duty(10, 40),
                channel_duty(20, 40),
                channel_duty(30, 40)
            ]
        );
    }
}
