//! The entity data model (§3). Plain data; invariants are enforced by the
//! store on write, not by these types themselves.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::ip::{self, Cidr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceStatus {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
}

impl fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceStatus::Up => write!(f, "up"),
            InterfaceStatus::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Connected,
    Static,
    Ospf,
    Bgp,
    Rip,
    Eigrp,
    Other,
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RouteType::Connected => "connected",
            RouteType::Static => "static",
            RouteType::Ospf => "ospf",
            RouteType::Bgp => "bgp",
            RouteType::Rip => "rip",
            RouteType::Eigrp => "eigrp",
            RouteType::Other => "other",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NatType {
    Source,
    Destination,
}

impl fmt::Display for NatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NatType::Source => write!(f, "source"),
            NatType::Destination => write!(f, "destination"),
        }
    }
}

/// Timestamps stamped by the store on insert/update, mirroring the source
/// model's `auto_now_add`/`auto_now` fields. They carry no routing meaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Timestamps {
    pub fn new(now: SystemTime) -> Self {
        Timestamps {
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: SystemTime) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub description: String,
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub device: String,
    pub name: String,
    #[serde(with = "ip::ip_addr")]
    pub ip_address: u32,
    pub network: Cidr,
    pub status: InterfaceStatus,
    pub timestamps: Timestamps,
}

impl Interface {
    pub fn is_up(&self) -> bool {
        matches!(self.status, InterfaceStatus::Up)
    }

    pub fn ip_display(&self) -> String {
        ip::format_ip(self.ip_address)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub device: String,
    pub destination_network: Cidr,
    #[serde(with = "ip::opt_ip_addr")]
    pub gateway_ip: Option<u32>,
    pub route_type: RouteType,
    pub metric: u32,
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatMapping {
    pub id: u64,
    pub device: String,
    pub logical: NatEndpoint,
    pub real: NatEndpoint,
    pub nat_type: NatType,
    pub description: String,
    pub timestamps: Timestamps,
}

/// Logical/real side of a NAT mapping: either a single IP or a CIDR (I4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NatEndpoint {
    Ip(u32),
    Net(Cidr),
}

impl NatEndpoint {
    pub fn parse(s: &str) -> Result<Self, crate::error::Error> {
        if s.contains('/') {
            ip::parse_cidr(s).map(NatEndpoint::Net)
        } else {
            ip::parse_ip(s).map(NatEndpoint::Ip)
        }
    }

    pub fn as_cidr(&self) -> Cidr {
        match self {
            NatEndpoint::Ip(ip) => Cidr::new(*ip, 32),
            NatEndpoint::Net(cidr) => *cidr,
        }
    }
}

impl fmt::Display for NatEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NatEndpoint::Ip(ip) => write!(f, "{}", ip::format_ip(*ip)),
            NatEndpoint::Net(cidr) => write!(f, "{cidr}"),
        }
    }
}

/// Serialized as the same `"A.B.C.D"` / `"A.B.C.D/N"` string accepted by
/// [`NatEndpoint::parse`], matching every other network field on the wire.
impl Serialize for NatEndpoint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NatEndpoint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NatEndpoint::parse(&s).map_err(serde::de::Error::custom)
    }
}
