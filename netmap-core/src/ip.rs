//! Pure IPv4/CIDR arithmetic. Everything here is a function of its
//! arguments; nothing touches the store or the services.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A parsed `A.B.C.D/N` network, stored as a 32-bit base address plus a
/// prefix length. `base` is **not** guaranteed to be the network address
/// (i.e. the host bits are not masked off on construction) — callers that
/// need the canonical base should mask with [`Cidr::masked_base`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    pub base: u32,
    pub prefix: u8,
}

impl Cidr {
    pub fn new(base: u32, prefix: u8) -> Self {
        Cidr { base, prefix }
    }

    pub fn masked_base(&self) -> u32 {
        self.base & mask(self.prefix)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", format_ip(self.base), self.prefix)
    }
}

/// Serialized as the literal `"A.B.C.D/N"` string rather than its field
/// layout, so the wire shape matches every other network field in the API.
impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_cidr(&s).map_err(D::Error::custom)
    }
}

/// A 32-bit address serialized as dotted-quad, for fields that hold a raw
/// `u32` rather than a [`Cidr`] (`Interface::ip_address`, `Route::gateway_ip`).
pub mod ip_addr {
    use super::*;

    pub fn serialize<S: Serializer>(ip: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_ip(*ip))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_ip(&s).map_err(D::Error::custom)
    }
}

/// As [`ip_addr`] but for `Option<u32>`.
pub mod opt_ip_addr {
    use super::*;

    pub fn serialize<S: Serializer>(ip: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match ip {
            Some(ip) => serializer.serialize_some(&format_ip(*ip)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| parse_ip(&s).map_err(D::Error::custom)).transpose()
    }
}

/// An "X" or "X/n" query argument, parsed once at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Host(u32),
    Net(Cidr),
}

impl Endpoint {
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s.contains('/') {
            parse_cidr(s).map(Endpoint::Net)
        } else {
            parse_ip(s).map(Endpoint::Host)
        }
    }

    pub fn is_cidr(&self) -> bool {
        matches!(self, Endpoint::Net(_))
    }

    /// This endpoint's address as a /32 network, useful for treating a
    /// host and a network uniformly in containment checks.
    pub fn as_cidr(&self) -> Cidr {
        match self {
            Endpoint::Host(ip) => Cidr::new(*ip, 32),
            Endpoint::Net(cidr) => *cidr,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Host(ip) => write!(f, "{}", format_ip(*ip)),
            Endpoint::Net(cidr) => write!(f, "{cidr}"),
        }
    }
}

pub fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        (0xFFFF_FFFFu32 << (32 - prefix as u32)) & 0xFFFF_FFFF
    }
}

/// Parses `A.B.C.D` into a 32-bit unsigned address, each octet 0-255.
pub fn parse_ip(s: &str) -> Result<u32, Error> {
    let octets: Vec<&str> = s.split('.').collect();
    if octets.len() != 4 {
        return Err(Error::format(s));
    }
    let mut addr: u32 = 0;
    for octet in octets {
        let value: u32 = octet.parse().map_err(|_| Error::format(s))?;
        if value > 255 {
            return Err(Error::format(s));
        }
        addr = (addr << 8) | value;
    }
    Ok(addr)
}

/// Parses `A.B.C.D/N` with `0 <= N <= 32`.
pub fn parse_cidr(s: &str) -> Result<Cidr, Error> {
    let (ip_part, prefix_part) = s.split_once('/').ok_or_else(|| Error::format(s))?;
    let base = parse_ip(ip_part)?;
    let prefix: u8 = prefix_part.parse().map_err(|_| Error::format(s))?;
    if prefix > 32 {
        return Err(Error::format(s));
    }
    Ok(Cidr::new(base, prefix))
}

pub fn format_ip(ip: u32) -> String {
    format!(
        "{}.{}.{}.{}",
        (ip >> 24) & 0xFF,
        (ip >> 16) & 0xFF,
        (ip >> 8) & 0xFF,
        ip & 0xFF
    )
}

pub fn contains(net: &Cidr, ip: u32) -> bool {
    ip & mask(net.prefix) == net.masked_base()
}

pub fn overlaps(a: &Cidr, b: &Cidr) -> bool {
    let m = mask(a.prefix.min(b.prefix));
    a.base & m == b.base & m
}

/// Strict: a network is never a supernet of itself.
pub fn supernet_of(a: &Cidr, b: &Cidr) -> bool {
    a.prefix < b.prefix && contains(a, b.masked_base())
}

pub fn prefixlen(net: &Cidr) -> u8 {
    net.prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_ip() {
        assert_eq!(parse_ip("192.168.1.1").unwrap(), 0xC0A80101);
    }

    #[test]
    fn rejects_out_of_range_octet() {
        assert!(parse_ip("192.168.1.256").is_err());
    }

    #[test]
    fn rejects_wrong_octet_count() {
        assert!(parse_ip("192.168.1").is_err());
    }

    #[test]
    fn parses_valid_cidr() {
        let cidr = parse_cidr("10.0.0.0/24").unwrap();
        assert_eq!(cidr.base, 0x0A000000);
        assert_eq!(cidr.prefix, 24);
    }

    #[test]
    fn rejects_prefix_over_32() {
        assert!(parse_cidr("10.0.0.0/33").is_err());
    }

    #[test]
    fn contains_checks_masked_equality() {
        let net = parse_cidr("192.168.1.0/24").unwrap();
        assert!(contains(&net, parse_ip("192.168.1.200").unwrap()));
        assert!(!contains(&net, parse_ip("192.168.2.1").unwrap()));
    }

    #[test]
    fn overlaps_is_symmetric_on_the_shorter_prefix() {
        let a = parse_cidr("10.0.0.0/8").unwrap();
        let b = parse_cidr("10.1.0.0/16").unwrap();
        assert!(overlaps(&a, &b));
        assert!(overlaps(&b, &a));
    }

    #[test]
    fn supernet_of_is_strict() {
        let a = parse_cidr("10.0.0.0/8").unwrap();
        assert!(!supernet_of(&a, &a));
        let b = parse_cidr("10.1.0.0/16").unwrap();
        assert!(supernet_of(&a, &b));
        assert!(!supernet_of(&b, &a));
    }

    #[test]
    fn endpoint_parses_host_or_net() {
        assert!(matches!(Endpoint::parse("1.2.3.4").unwrap(), Endpoint::Host(_)));
        assert!(matches!(Endpoint::parse("1.2.3.0/24").unwrap(), Endpoint::Net(_)));
    }
}
