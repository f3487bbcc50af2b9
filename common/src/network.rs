use std::{net::IpAddr, time::Duration};

use log::{info, warn};

use crate::{bus::DisplayBus, display::Ssd1306};

pub const CONNECTING_TEXT: &str = "CONNECTING...";
pub const CONNECTED_TEXT: &str = "CONNECTED!";

/// Station-mode link whose association the firmware blocks on before serving.
pub trait NetworkLink {
    fn is_connected(&mut self) -> bool;

    fn local_addr(&self) -> Option<IpAddr>;
}

/// Polls `link` every `poll` until it reports association, echoing progress on the panel.
/// There is no timeout. Display failures are logged and do not interrupt the wait.
pub fn wait_for_network<N, B, S>(
    link: &mut N,
    display: &mut Ssd1306<B>,
    poll: Duration,
    mut sleep: S,
) -> Option<IpAddr>
where
    N: NetworkLink,
    B: DisplayBus,
    S: FnMut(Duration),
{
    let mut polls: u64 = 0;
    while !link.is_connected() {
        if let Err(err) = display.show_lines(&[CONNECTING_TEXT]) {
            warn!("display frame skipped: {err}");
        }
        polls += 1;
        sleep(poll);
    }

    let addr = link.local_addr();
    let addr_text = addr.map(|addr| addr.to_string()).unwrap_or_default();
    info!("network up after {polls} poll(s), address {addr_text}");
    if let Err(err) = display.show_lines(&[CONNECTED_TEXT, &addr_text]) {
        warn!("display frame skipped: {err}");
    }
    addr
}
