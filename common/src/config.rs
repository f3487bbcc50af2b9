use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_pass: String::new(),
            poll_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub request_buffer_bytes: usize,
    pub bind_retry_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            request_buffer_bytes: 1024,
            bind_retry_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayBusKind {
    I2c,
    Spi,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub external_vcc: bool,
    pub bus: DisplayBusKind,
    pub i2c_address: u8,
    pub sda_pin: i32,
    pub scl_pin: i32,
    pub spi_sclk_pin: i32,
    pub spi_mosi_pin: i32,
    pub spi_dc_pin: i32,
    pub spi_rst_pin: i32,
    pub spi_cs_pin: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 64,
            external_vcc: false,
            bus: DisplayBusKind::I2c,
            i2c_address: 0x3C,
            sda_pin: 14,
            scl_pin: 15,
            spi_sclk_pin: 18,
            spi_mosi_pin: 23,
            spi_dc_pin: 16,
            spi_rst_pin: 17,
            spi_cs_pin: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedConfig {
    pub red_pin: i32,
    pub green_pin: i32,
    pub blue_pin: i32,
    pub pwm_frequency_hz: u32,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            red_pin: 13,
            green_pin: 11,
            blue_pin: 12,
            pwm_frequency_hz: 1_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnergyConfig {
    pub rated_power_kw: f64,
    pub tariff_per_kwh: f64,
    pub currency: String,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            rated_power_kw: 0.192,
            tariff_per_kwh: 0.8,
            currency: "R$".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub network: NetworkConfig,
    pub http: HttpConfig,
    pub display: DisplayConfig,
    pub led: LedConfig,
    pub energy: EnergyConfig,
}

impl RuntimeConfig {
    pub fn from_json(raw: &[u8]) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_slice(raw)?;
        config.sanitize();
        Ok(config)
    }

    pub fn sanitize(&mut self) {
        self.network.sanitize();
        self.http.sanitize();
        self.display.sanitize();
        self.led.sanitize();
        self.energy.sanitize();
    }
}

impl NetworkConfig {
    pub fn sanitize(&mut self) {
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = 1_000;
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.wifi_ssid.trim().is_empty()
    }
}

impl HttpConfig {
    pub fn sanitize(&mut self) {
        if self.port == 0 {
            self.port = 8080;
        }
        self.request_buffer_bytes = self.request_buffer_bytes.clamp(64, 8192);
        if self.bind_retry_ms == 0 {
            self.bind_retry_ms = 5_000;
        }
    }
}

impl DisplayConfig {
    pub fn sanitize(&mut self) {
        self.width = self.width.clamp(1, 128);

        // Page-packed framebuffer needs whole pages.
        let clamped = self.height.clamp(8, 64);
        self.height = clamped - clamped % 8;

        if self.i2c_address > 0x7F {
            self.i2c_address = 0x3C;
        }
    }
}

impl LedConfig {
    pub fn sanitize(&mut self) {
        self.pwm_frequency_hz = self.pwm_frequency_hz.clamp(100, 40_000);
    }
}

impl EnergyConfig {
    pub fn sanitize(&mut self) {
        if !self.rated_power_kw.is_finite() || self.rated_power_kw < 0.0 {
            self.rated_power_kw = 0.192;
        }
        if !self.tariff_per_kwh.is_finite() || self.tariff_per_kwh < 0.0 {
            self.tariff_per_kwh = 0.8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults_for_missing_sections() {
        let config = RuntimeConfig::from_json(
            br#"{"network":{"wifi_ssid":"lab","poll_interval_ms":500},"display":{"bus":"i2c"}}"#,
        )
        .unwrap();

        assert_eq!(config.network.wifi_ssid, "lab");
        assert_eq!(config.network.wifi_pass, "");
        assert_eq!(config.network.poll_interval_ms, 500);
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.request_buffer_bytes, 1024);
        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(config.energy, EnergyConfig::default());
    }

    #[test]
    fn sanitize_rounds_panel_height_down_to_whole_pages() {
        let mut display = DisplayConfig {
            height: 60,
            width: 300,
            ..DisplayConfig::default()
        };
        display.sanitize();

        assert_eq!(display.height, 56);
        assert_eq!(display.width, 128);
    }

    #[test]
    fn sanitize_restores_zero_retry_delay() {
        let mut http = HttpConfig {
            port: 0,
            request_buffer_bytes: 0,
            bind_retry_ms: 0,
        };
        http.sanitize();

        assert_eq!(http.port, 8080);
        assert_eq!(http.request_buffer_bytes, 64);
        assert_eq!(http.bind_retry_ms, 5_000);
    }

    #[test]
    fn missing_ssid_means_no_credentials() {
        let network = NetworkConfig {
            wifi_ssid: "   ".to_string(),
            ..NetworkConfig::default()
        };
        assert!(!network.has_credentials());
    }
}
