//! Live manifest path for a capture device.
//!
//! The recorder publishes one manifest per device under a name derived from
//! the device's display name. Non-ASCII characters are replaced with a
//! placeholder, and because that can make two devices collide, the device
//! index is appended whenever a replacement happened.

use crate::config::StreamConfig;

/// Derive the manifest path for `(name, index)` using the default layout.
pub fn stream_url(name: &str, index: u32) -> String {
    stream_url_with(&StreamConfig::default(), name, index)
}

pub fn stream_url_with(cfg: &StreamConfig, name: &str, index: u32) -> String {
    let safe: String = name
        .chars()
        .map(|ch| if ch.is_ascii() { ch } else { cfg.placeholder })
        .collect();

    let stem = if safe == name {
        safe
    } else {
        format!("{}_{}", safe, index)
    };

    format!(
        "{}/{}.m3u8",
        cfg.live_prefix.trim_end_matches('/'),
        encode_component(&stem)
    )
}

/// Percent-encode everything except the characters a URI component may
/// carry verbatim: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
