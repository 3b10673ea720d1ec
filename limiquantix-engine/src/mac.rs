//! MAC address parsing.
//!
//! Accepts the usual hardware address notations for EUI-48, EUI-64 and
//! 20-octet IP-over-InfiniBand link-layer addresses:
//!
//! ```text
//! 00:1a:4a:16:01:51        00-1a-4a-16-01-51        001a.4a16.0151
//! 02:00:5e:10:00:00:00:01  ...
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

const VALID_OCTET_COUNTS: [usize; 3] = [6, 8, 20];

/// A parsed hardware address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacAddress(Vec<u8>);

impl MacAddress {
    pub fn octets(&self) -> &[u8] {
        &self.0
    }

    /// Random locally administered unicast EUI-48 address.
    pub fn random_local() -> Self {
        let bytes: [u8; 4] = rand::random();
        // 0x56 has the local bit set and the multicast bit clear
        Self(vec![0x56, 0x6f, bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, octet) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", octet)?;
        }
        Ok(())
    }
}

impl FromStr for MacAddress {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_mac(s).ok_or_else(|| {
            EngineError::ValidationFailed(format!("Failed to parse MAC address: {}", s))
        })
    }
}

fn parse_mac(s: &str) -> Option<MacAddress> {
    let bytes = s.as_bytes();
    if bytes.len() < 14 {
        return None;
    }

    let octets = match bytes[2] {
        b':' | b'-' => parse_separated(s, bytes[2] as char)?,
        _ if bytes[4] == b'.' => parse_dotted(s)?,
        _ => return None,
    };

    if VALID_OCTET_COUNTS.contains(&octets.len()) {
        Some(MacAddress(octets))
    } else {
        None
    }
}

/// `xx:xx:xx:...` or `xx-xx-xx-...`
fn parse_separated(s: &str, sep: char) -> Option<Vec<u8>> {
    s.split(sep)
        .map(|group| {
            if group.len() != 2 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            u8::from_str_radix(group, 16).ok()
        })
        .collect()
}

/// `xxxx.xxxx.xxxx`
fn parse_dotted(s: &str) -> Option<Vec<u8>> {
    let mut octets = Vec::new();
    for group in s.split('.') {
        if group.len() != 4 || !group.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        octets.push(u8::from_str_radix(&group[0..2], 16).ok()?);
        octets.push(u8::from_str_radix(&group[2..4], 16).ok()?);
    }
    Some(octets)
}
