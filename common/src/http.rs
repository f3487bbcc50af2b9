//! Substring-level HTTP handling: enough to pull a command out of the request line and
//! to emit the one fixed response. No header parsing, no bodies, no keep-alive.

use crate::{error::RequestError, types::Rgb};

pub const POWER_MARKER: &str = "/power";
pub const BRIGHTNESS_MARKER: &str = "/brightness?value=";
pub const COLOR_MARKER: &str = "/color?r=";
pub const EFFECT_MARKER: &str = "/effect";

pub const RESPONSE_HEAD: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePower,
    SetBrightness(i32),
    SetColor(Rgb),
    Effect,
    None,
}

impl Command {
    /// Classifies a raw request by the first marker found in its request line.
    ///
    /// Only what arrived in a single read is seen: a request line split across TCP
    /// segments is truncated and will most likely classify as [`Command::None`].
    pub fn parse(raw: &[u8]) -> Result<Self, RequestError> {
        if raw.is_empty() {
            return Err(RequestError::Empty);
        }
        let text = std::str::from_utf8(raw).map_err(|_| RequestError::NotUtf8)?;
        let line = request_line(text);

        if line.contains(POWER_MARKER) {
            return Ok(Self::TogglePower);
        }
        if let Some((_, rest)) = line.split_once(BRIGHTNESS_MARKER) {
            return parse_number("value", until_space(rest)).map(Self::SetBrightness);
        }
        if line.contains(COLOR_MARKER) {
            let query = line
                .split_once('?')
                .map(|(_, rest)| until_space(rest))
                .unwrap_or_default();
            let channel = |name: &'static str| {
                query_param(query, name)
                    .ok_or(RequestError::MissingParameter(name))
                    .and_then(|value| parse_number(name, value))
            };
            return Ok(Self::SetColor(Rgb::new(
                channel("r")?,
                channel("g")?,
                channel("b")?,
            )));
        }
        if line.contains(EFFECT_MARKER) {
            return Ok(Self::Effect);
        }
        Ok(Self::None)
    }
}

/// Everything before the first line break, or the whole text if none arrived.
pub fn request_line(text: &str) -> &str {
    text.split(['\r', '\n']).next().unwrap_or_default()
}

pub fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        (name == key).then_some(value)
    })
}

pub fn response_bytes(page: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(RESPONSE_HEAD.len() + page.len());
    out.extend_from_slice(RESPONSE_HEAD);
    out.extend_from_slice(page.as_bytes());
    out
}

fn until_space(text: &str) -> &str {
    text.split(' ').next().unwrap_or_default()
}

fn parse_number(name: &'static str, value: &str) -> Result<i32, RequestError> {
    value.parse().map_err(|_| RequestError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}
