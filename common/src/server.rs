//! Single-connection request loop: accept, read once, dispatch, refresh outputs, respond,
//! close. Nothing is concurrent and no socket has a timeout, so a client that connects and
//! never sends stalls every other client until it goes away.

use std::{
    fmt::Display,
    io::{Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    time::Duration,
};

use log::{debug, info, warn};
use socket2::{Domain, Protocol, Socket, Type};

use crate::{
    bus::DisplayBus,
    display::Ssd1306,
    error::RequestError,
    http::{self, Command},
    led::LedOutput,
    light::SmartLight,
    types::EnergyReading,
};

/// Pixel rows the three status lines start on.
const STATUS_ROWS: [i32; 3] = [0, 20, 40];

/// Pending connections the kernel queues while one client is being served.
pub const LISTEN_BACKLOG: i32 = 5;

pub trait Acceptor {
    type Stream: Read + Write;

    fn accept(&mut self) -> std::io::Result<(Self::Stream, SocketAddr)>;
}

impl Acceptor for TcpListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self)
    }
}

/// Binds `addr` with address reuse and a [`LISTEN_BACKLOG`]-deep accept queue.
pub fn listen(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}

/// Calls `bind` until it succeeds, sleeping `delay` between attempts. Never gives up.
pub fn bind_with_retry<T, E, F, S>(mut bind: F, delay: Duration, mut sleep: S) -> T
where
    E: Display,
    F: FnMut() -> Result<T, E>,
    S: FnMut(Duration),
{
    let mut attempt: u64 = 1;
    loop {
        match bind() {
            Ok(bound) => {
                info!("listener bound after {attempt} attempt(s)");
                return bound;
            }
            Err(err) => {
                warn!(
                    "bind attempt {attempt} failed: {err}; retrying in {}ms",
                    delay.as_millis()
                );
                sleep(delay);
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

pub fn status_lines(reading: &EnergyReading, currency: &str) -> [String; 3] {
    [
        "Energy used:".to_string(),
        format!("{:.7} kWh", reading.energy_kwh),
        format!("Cost: {:.2} {currency}", reading.cost),
    ]
}

pub struct LightServer<L, B> {
    light: SmartLight,
    led: L,
    display: Ssd1306<B>,
    page: &'static str,
    request_buffer_bytes: usize,
}

impl<L, B> LightServer<L, B>
where
    L: LedOutput,
    B: DisplayBus,
{
    pub fn new(
        light: SmartLight,
        led: L,
        display: Ssd1306<B>,
        page: &'static str,
        request_buffer_bytes: usize,
    ) -> Self {
        Self {
            light,
            led,
            display,
            page,
            request_buffer_bytes,
        }
    }

    pub fn light(&self) -> &SmartLight {
        &self.light
    }

    pub fn led(&self) -> &L {
        &self.led
    }

    pub fn display(&self) -> &Ssd1306<B> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Ssd1306<B> {
        &mut self.display
    }

    pub fn page(&self) -> &'static str {
        self.page
    }

    pub fn request_buffer_bytes(&self) -> usize {
        self.request_buffer_bytes
    }

    /// Dispatches one raw request and refreshes the LED and the status screen.
    ///
    /// A malformed request leaves every piece of state and every output untouched.
    pub fn handle(&mut self, raw: &[u8], now_ms: u64) -> Result<Command, RequestError> {
        info!(
            "request: {}",
            http::request_line(&String::from_utf8_lossy(raw))
        );

        let command = Command::parse(raw)?;
        self.light.apply(command, now_ms);
        info!("{command:?} -> {:?}", self.light.state());

        self.refresh(now_ms);
        Ok(command)
    }

    /// Pushes the current state to the LED and redraws the energy readout.
    /// Hardware failures skip the frame and are only logged.
    pub fn refresh(&mut self, now_ms: u64) -> EnergyReading {
        let reading = self.light.reading(now_ms);

        if let Err(err) = self.led.apply(self.light.state()) {
            warn!("led update skipped: {err}");
        }

        let lines = status_lines(&reading, &self.light.energy().config().currency);
        self.display.clear();
        for (line, y) in lines.iter().zip(STATUS_ROWS) {
            self.display.draw_text(line, 0, y);
        }
        if let Err(err) = self.display.flush() {
            warn!("display frame skipped: {err}");
        }

        reading
    }

    /// Zeroed buffer sized for the single read each connection gets.
    pub fn request_buffer(&self) -> Vec<u8> {
        vec![0_u8; self.request_buffer_bytes]
    }

    /// Dispatches what one read delivered and returns the bytes to send back.
    /// Shared by the blocking and the async accept loops.
    pub fn respond(
        &mut self,
        raw: &[u8],
        now_ms: u64,
    ) -> Result<(Command, Vec<u8>), RequestError> {
        let command = self.handle(raw, now_ms)?;
        Ok((command, http::response_bytes(self.page)))
    }

    /// One read, one dispatch, one response. The stream is closed when dropped by the caller.
    pub fn serve_connection<S: Read + Write>(
        &mut self,
        stream: &mut S,
        now_ms: u64,
    ) -> Result<Command, RequestError> {
        let mut buf = self.request_buffer();
        let read = stream.read(&mut buf)?;
        let (command, response) = self.respond(&buf[..read], now_ms)?;
        stream.write_all(&response)?;
        stream.flush()?;
        Ok(command)
    }

    /// Accepts and fully serves the next client. Only an `accept` failure is returned;
    /// per-request failures are logged and the connection dropped.
    pub fn serve_next<A, C>(&mut self, acceptor: &mut A, now_ms: C) -> std::io::Result<()>
    where
        A: Acceptor,
        C: FnOnce() -> u64,
    {
        let (mut stream, peer) = acceptor.accept()?;
        match self.serve_connection(&mut stream, now_ms()) {
            Ok(command) => debug!("served {peer}: {command:?}"),
            Err(err) => warn!("request from {peer} aborted: {err}"),
        }
        Ok(())
    }

    pub fn serve_forever<A, C>(&mut self, acceptor: &mut A, mut now_ms: C) -> !
    where
        A: Acceptor,
        C: FnMut() -> u64,
    {
        loop {
            if let Err(err) = self.serve_next(acceptor, &mut now_ms) {
                warn!("accept failed: {err}");
            }
        }
    }
}
