use embedded_hal::{digital, i2c, pwm, spi};
use thiserror::Error;

/// Failure reported by one of the peripherals behind the LED or the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HardwareError {
    #[error("i2c write failed: {0}")]
    I2c(i2c::ErrorKind),
    #[error("spi write failed: {0}")]
    Spi(spi::ErrorKind),
    #[error("gpio write failed: {0}")]
    Pin(digital::ErrorKind),
    #[error("pwm update failed: {0}")]
    Pwm(pwm::ErrorKind),
}

impl HardwareError {
    pub fn i2c<E: i2c::Error>(err: E) -> Self {
        Self::I2c(err.kind())
    }

    pub fn spi<E: spi::Error>(err: E) -> Self {
        Self::Spi(err.kind())
    }

    pub fn pin<E: digital::Error>(err: E) -> Self {
        Self::Pin(err.kind())
    }

    pub fn pwm<E: pwm::Error>(err: E) -> Self {
        Self::Pwm(err.kind())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("unsupported panel geometry {width}x{height}")]
    Geometry { width: u32, height: u32 },
    #[error(transparent)]
    Hardware(#[from] HardwareError),
}

/// Reasons a single request is dropped without a response.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("client closed the connection before sending a request")]
    Empty,
    #[error("request is not valid utf-8")]
    NotUtf8,
    #[error("missing query parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("query parameter `{name}` is not a number: `{value}`")]
    InvalidNumber { name: &'static str, value: String },
    #[error("socket i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
