use core::convert::TryInto;
use std::{
    net::{IpAddr, SocketAddr},
    sync::OnceLock,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context};
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{
        delay::FreeRtos,
        gpio::{AnyIOPin, AnyOutputPin, PinDriver},
        i2c::{I2cConfig, I2cDriver},
        ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution, LEDC},
        modem::Modem,
        prelude::*,
        spi::{config::Config as SpiConfig, SpiBusDriver, SpiDriver, SpiDriverConfig},
    },
    log::EspLogger,
    nvs::EspDefaultNvsPartition,
    wifi::EspWifi,
};
use log::{info, warn};

use smartlight_common::{
    bind_with_retry, listen, splash, wait_for_network, DisplayBus, DisplayBusKind,
    I2cDisplayBus, LightServer, NetworkLink, RgbLed, RuntimeConfig, SmartLight, SpiDisplayBus,
    Ssd1306,
};

use crate::INDEX_HTML;

const I2C_BAUDRATE_KHZ: u32 = 400;
const SPI_BAUDRATE_MHZ: u32 = 10;

/// Station interface; association is polled, never awaited on an event.
struct StationLink {
    wifi: EspWifi<'static>,
}

impl NetworkLink for StationLink {
    fn is_connected(&mut self) -> bool {
        let associated = self.wifi.is_connected().unwrap_or(false);
        associated && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    fn local_addr(&self) -> Option<IpAddr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| IpAddr::V4(info.ip))
    }
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let mut runtime = RuntimeConfig::default();
    ensure_wifi_defaults(&mut runtime);
    runtime.sanitize();

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let display_config = runtime.display.clone();

    match display_config.bus {
        DisplayBusKind::I2c => {
            let sda = unsafe { AnyIOPin::new(display_config.sda_pin) };
            let scl = unsafe { AnyIOPin::new(display_config.scl_pin) };
            let i2c = I2cDriver::new(
                peripherals.i2c0,
                sda,
                scl,
                &I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into()),
            )
            .context("failed to set up display i2c")?;
            let bus = I2cDisplayBus::new(i2c, display_config.i2c_address);
            serve(
                bus,
                runtime,
                peripherals.modem,
                peripherals.ledc,
                sys_loop,
                nvs_partition,
            )
        }
        DisplayBusKind::Spi => {
            let sclk = unsafe { AnyOutputPin::new(display_config.spi_sclk_pin) };
            let mosi = unsafe { AnyOutputPin::new(display_config.spi_mosi_pin) };
            let driver = SpiDriver::new(
                peripherals.spi2,
                sclk,
                mosi,
                None::<AnyIOPin>,
                &SpiDriverConfig::new(),
            )
            .context("failed to set up display spi")?;
            let spi = SpiBusDriver::new(
                driver,
                &SpiConfig::new().baudrate(SPI_BAUDRATE_MHZ.MHz().into()),
            )?;
            let dc = PinDriver::output(unsafe { AnyOutputPin::new(display_config.spi_dc_pin) })?;
            let rst = PinDriver::output(unsafe { AnyOutputPin::new(display_config.spi_rst_pin) })?;
            let cs = PinDriver::output(unsafe { AnyOutputPin::new(display_config.spi_cs_pin) })?;
            let bus = SpiDisplayBus::new(spi, dc, rst, cs, &mut FreeRtos)
                .context("failed to reset display")?;
            serve(
                bus,
                runtime,
                peripherals.modem,
                peripherals.ledc,
                sys_loop,
                nvs_partition,
            )
        }
    }
}

fn serve<B: DisplayBus>(
    bus: B,
    runtime: RuntimeConfig,
    modem: Modem,
    ledc: LEDC,
    sys_loop: EspSystemEventLoop,
    nvs_partition: EspDefaultNvsPartition,
) -> anyhow::Result<()> {
    let mut display = Ssd1306::new(
        bus,
        runtime.display.width,
        runtime.display.height,
        runtime.display.external_vcc,
    )
    .context("display initialization failed")?;
    if let Err(err) = splash::show_splash(&mut display) {
        warn!("splash skipped: {err}");
    }

    let mut link = start_station(modem, sys_loop, nvs_partition, &runtime)?;
    let poll = Duration::from_millis(runtime.network.poll_interval_ms);
    let local = wait_for_network(&mut link, &mut display, poll, thread::sleep);
    info!("wifi up, station address {local:?}");

    let timer = LedcTimerDriver::new(
        ledc.timer0,
        &TimerConfig::default()
            .frequency(runtime.led.pwm_frequency_hz.Hz())
            .resolution(Resolution::Bits13),
    )
    .context("failed to configure led pwm timer")?;
    let red = LedcDriver::new(ledc.channel0, &timer, unsafe {
        AnyOutputPin::new(runtime.led.red_pin)
    })?;
    let green = LedcDriver::new(ledc.channel1, &timer, unsafe {
        AnyOutputPin::new(runtime.led.green_pin)
    })?;
    let blue = LedcDriver::new(ledc.channel2, &timer, unsafe {
        AnyOutputPin::new(runtime.led.blue_pin)
    })?;

    let mut server = LightServer::new(
        SmartLight::new(runtime.energy.clone()),
        RgbLed::new(red, green, blue),
        display,
        INDEX_HTML,
        runtime.http.request_buffer_bytes,
    );
    server.refresh(monotonic_ms());

    let addr = SocketAddr::from(([0, 0, 0, 0], runtime.http.port));
    let retry = Duration::from_millis(runtime.http.bind_retry_ms);
    let mut listener = bind_with_retry(|| listen(addr), retry, thread::sleep);
    info!("smartlight listening on http://{addr}");

    server.serve_forever(&mut listener, monotonic_ms)
}

fn ensure_wifi_defaults(runtime: &mut RuntimeConfig) {
    if runtime.network.wifi_ssid.is_empty() {
        if let Some(ssid) = option_env!("WIFI_SSID") {
            runtime.network.wifi_ssid = ssid.to_string();
        }
    }
    if runtime.network.wifi_pass.is_empty() {
        if let Some(pass) = option_env!("WIFI_PASS") {
            runtime.network.wifi_pass = pass.to_string();
        }
    }
}

fn start_station(
    modem: Modem,
    sys_loop: EspSystemEventLoop,
    nvs_partition: EspDefaultNvsPartition,
    runtime: &RuntimeConfig,
) -> anyhow::Result<StationLink> {
    let network = &runtime.network;
    if !network.has_credentials() {
        return Err(anyhow!("wifi ssid not configured; build with WIFI_SSID set"));
    }

    let mut wifi = EspWifi::new(modem, sys_loop, Some(nvs_partition))?;
    let auth_method = if network.wifi_pass.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: network
            .wifi_ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi ssid too long"))?,
        password: network
            .wifi_pass
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi password too long"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    wifi.connect()?;
    info!("wifi started, connecting to `{}`", network.wifi_ssid);

    Ok(StationLink { wifi })
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
