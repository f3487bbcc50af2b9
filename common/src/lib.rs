pub mod bus;
pub mod config;
pub mod display;
pub mod energy;
pub mod error;
pub mod http;
pub mod led;
pub mod light;
pub mod network;
pub mod server;
pub mod splash;
pub mod types;

pub use bus::{DisplayBus, I2cDisplayBus, SpiDisplayBus};
pub use config::{
    DisplayBusKind, DisplayConfig, EnergyConfig, HttpConfig, LedConfig, NetworkConfig,
    RuntimeConfig,
};
pub use display::Ssd1306;
pub use energy::EnergyAccount;
pub use error::{DisplayError, HardwareError, RequestError};
pub use http::Command;
pub use led::{LedOutput, RgbLed};
pub use light::SmartLight;
pub use network::{wait_for_network, NetworkLink};
pub use server::{bind_with_retry, listen, Acceptor, LightServer, LISTEN_BACKLOG};
pub use types::{EnergyReading, LedState, Rgb};
