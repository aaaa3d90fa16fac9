use serde::{Deserialize, Serialize};

use netmap_core::model::{Interface, InterfaceStatus, NatType, Route, RouteType};

use crate::id;

#[derive(Debug, Deserialize)]
pub struct DevicePayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct InterfacePayload {
    pub device: String,
    pub name: String,
    pub ip_address: String,
    pub network: String,
    pub status: InterfaceStatus,
}

#[derive(Debug, Deserialize)]
pub struct RoutePayload {
    pub device: String,
    pub destination_network: String,
    pub gateway_ip: Option<String>,
    pub route_type: RouteType,
    #[serde(default)]
    pub metric: u32,
}

#[derive(Debug, Deserialize)]
pub struct NatMappingPayload {
    pub device: String,
    pub logical: String,
    pub real: String,
    pub nat_type: NatType,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct InterfaceFilter {
    pub device: Option<String>,
    pub status: Option<InterfaceStatus>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RouteFilter {
    pub device: Option<String>,
    pub route_type: Option<RouteType>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NatFilter {
    pub device: Option<String>,
    pub nat_type: Option<NatType>,
}

#[derive(Debug, Deserialize)]
pub struct IncludeStubsQuery {
    #[serde(default, rename = "include_stub_networks")]
    pub include_stub_networks: Option<bool>,
}

impl IncludeStubsQuery {
    pub fn resolve(&self, default: bool) -> bool {
        self.include_stub_networks.unwrap_or(default)
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectionsQuery {
    pub network: Option<String>,
    pub device1_id: Option<String>,
    pub device2_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoutingPathQuery {
    pub source: String,
    pub destination: String,
}

/// Interface/Route carry no surrogate id (§3's identity is a tuple); these
/// wrappers attach the composite id a caller needs for `/interfaces/{id}`
/// and `/routes/{id}` to every list/get response.
#[derive(Debug, Serialize)]
pub struct InterfaceOut {
    pub id: String,
    #[serde(flatten)]
    pub interface: Interface,
}

impl From<Interface> for InterfaceOut {
    fn from(interface: Interface) -> Self {
        InterfaceOut {
            id: id::encode(&[&interface.device, &interface.name, &interface.ip_display()]),
            interface,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RouteOut {
    pub id: String,
    #[serde(flatten)]
    pub route: Route,
}

impl From<Route> for RouteOut {
    fn from(route: Route) -> Self {
        let gateway = route.gateway_ip.map(netmap_core::ip::format_ip).unwrap_or_else(|| id::NONE_MARKER.to_string());
        RouteOut {
            id: id::encode(&[&route.device, &route.destination_network.to_string(), &gateway]),
            route,
        }
    }
}
