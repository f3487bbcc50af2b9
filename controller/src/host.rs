use std::{
    convert::Infallible,
    io::ErrorKind,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    sync::OnceLock,
    time::{Duration, Instant},
};

use anyhow::Context;
use embedded_hal::pwm::{self, SetDutyCycle};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
};
use tracing::{debug, info, trace, warn};

use smartlight_common::{
    bind_with_retry, listen, splash, wait_for_network, Command, DisplayBus, HardwareError,
    LedOutput, LightServer, NetworkLink, RequestError, RgbLed, RuntimeConfig, SmartLight,
    Ssd1306, LISTEN_BACKLOG,
};

use crate::INDEX_HTML;

/// PWM channel that only records and logs the duty it is given.
struct LoggingPwm {
    name: &'static str,
    duty: u16,
}

impl LoggingPwm {
    fn new(name: &'static str) -> Self {
        Self { name, duty: 0 }
    }
}

impl pwm::ErrorType for LoggingPwm {
    type Error = Infallible;
}

impl SetDutyCycle for LoggingPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if duty != self.duty {
            debug!("{} duty {} -> {duty}", self.name, self.duty);
        }
        self.duty = duty;
        Ok(())
    }
}

/// Display transport with no panel behind it.
#[derive(Default)]
struct LoggingBus {
    frames: u64,
}

impl DisplayBus for LoggingBus {
    fn write_command(&mut self, command: u8) -> Result<(), HardwareError> {
        trace!("display cmd 0x{command:02X}");
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), HardwareError> {
        self.frames += 1;
        trace!("display frame {} ({} bytes)", self.frames, data.len());
        Ok(())
    }
}

/// The simulator is "associated" as soon as it starts.
struct LoopbackLink;

impl NetworkLink for LoopbackLink {
    fn is_connected(&mut self) -> bool {
        true
    }

    fn local_addr(&self) -> Option<IpAddr> {
        Some(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut runtime = load_runtime_config().await.unwrap_or_else(|err| {
        warn!("failed to load runtime config: {err:#}");
        RuntimeConfig::default()
    });
    apply_env_overrides(&mut runtime, |key| std::env::var(key).ok());
    runtime.sanitize();

    let mut display = Ssd1306::new(
        LoggingBus::default(),
        runtime.display.width,
        runtime.display.height,
        runtime.display.external_vcc,
    )
    .context("failed to initialize display")?;
    if let Err(err) = splash::show_splash(&mut display) {
        warn!("splash skipped: {err}");
    }

    let poll = Duration::from_millis(runtime.network.poll_interval_ms);
    let (display, local) = tokio::task::spawn_blocking(move || {
        let local = wait_for_network(&mut LoopbackLink, &mut display, poll, std::thread::sleep);
        (display, local)
    })
    .await
    .context("network wait aborted")?;
    info!("simulated station address {local:?}");

    let led = RgbLed::new(
        LoggingPwm::new("red"),
        LoggingPwm::new("green"),
        LoggingPwm::new("blue"),
    );
    let mut server = LightServer::new(
        SmartLight::new(runtime.energy.clone()),
        led,
        display,
        INDEX_HTML,
        runtime.http.request_buffer_bytes,
    );
    server.refresh(monotonic_ms());

    let addr = SocketAddr::from(([0, 0, 0, 0], runtime.http.port));
    let retry = Duration::from_millis(runtime.http.bind_retry_ms);
    let listener = tokio::task::spawn_blocking(move || {
        bind_with_retry(|| listen(addr), retry, std::thread::sleep)
    })
    .await
    .context("bind task aborted")?;
    listener
        .set_nonblocking(true)
        .context("failed to make listener non-blocking")?;
    let listener = TcpListener::from_std(listener)
        .with_context(|| format!("failed to register listener at {addr}"))?;

    info!("smartlight listening on http://{addr} (backlog {LISTEN_BACKLOG})");

    loop {
        let (mut stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!("accept failed: {err}");
                continue;
            }
        };

        match serve_client(&mut server, &mut stream, monotonic_ms()).await {
            Ok(command) => debug!("served {peer}: {command:?}"),
            Err(err) => warn!("request from {peer} aborted: {err}"),
        }
    }
}

/// Async twin of `LightServer::serve_connection`: one read, one dispatch, one response.
async fn serve_client<S, L, B>(
    server: &mut LightServer<L, B>,
    stream: &mut S,
    now_ms: u64,
) -> Result<Command, RequestError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    L: LedOutput,
    B: DisplayBus,
{
    let mut buf = server.request_buffer();
    let read = stream.read(&mut buf).await?;
    let (command, response) = server.respond(&buf[..read], now_ms)?;
    stream.write_all(&response).await?;
    stream.flush().await?;
    Ok(command)
}

async fn load_runtime_config() -> anyhow::Result<RuntimeConfig> {
    let path = std::env::var("SMARTLIGHT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.smartlight/runtime.json"));

    match tokio::fs::read(&path).await {
        Ok(raw) => RuntimeConfig::from_json(&raw)
            .with_context(|| format!("invalid config in {}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

fn apply_env_overrides<F>(runtime: &mut RuntimeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("SMARTLIGHT_HTTP_PORT").and_then(|value| value.parse().ok()) {
        runtime.http.port = port;
    }
    if let Some(ssid) = lookup("WIFI_SSID") {
        runtime.network.wifi_ssid = ssid;
    }
    if let Some(pass) = lookup("WIFI_PASS") {
        runtime.network.wifi_pass = pass;
    }
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
