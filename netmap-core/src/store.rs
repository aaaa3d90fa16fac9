//! The entity store (§4.2): CRUD over Devices, Interfaces, Routes and NAT
//! mappings with invariants I1-I5 enforced on write. The store is oblivious
//! to addressing *semantics* beyond format — containment and overlap logic
//! live entirely in [`crate::ip`].
//!
//! Entities are held in insertion order so that every query the services
//! depend on (§4.4.5) has a stable, reproducible iteration order without
//! needing a separate sequence counter.

use std::time::SystemTime;

use crate::error::Error;
use crate::ip::{self, Cidr};
use crate::model::{
    Device, Interface, InterfaceStatus, NatEndpoint, NatMapping, NatType, Route, RouteType,
    Timestamps,
};

#[derive(Debug, Default)]
pub struct Store {
    devices: Vec<Device>,
    interfaces: Vec<Interface>,
    routes: Vec<Route>,
    nat_mappings: Vec<NatMapping>,
    next_nat_id: u64,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    // ---- devices -------------------------------------------------------

    pub fn upsert_device(&mut self, name: &str, description: &str, now: SystemTime) -> Result<(), Error> {
        if name.trim().is_empty() {
            return Err(Error::validation("name", "device name must not be empty"));
        }
        match self.devices.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                existing.description = description.to_string();
                existing.timestamps.touch(now);
            }
            None => self.devices.push(Device {
                name: name.to_string(),
                description: description.to_string(),
                timestamps: Timestamps::new(now),
            }),
        }
        Ok(())
    }

    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// I5: cascades to interfaces, routes and NAT mappings owned by `name`.
    pub fn delete_device(&mut self, name: &str) -> Result<(), Error> {
        let before = self.devices.len();
        self.devices.retain(|d| d.name != name);
        if self.devices.len() == before {
            return Err(Error::not_found(format!("device `{name}`")));
        }
        self.interfaces.retain(|i| i.device != name);
        self.routes.retain(|r| r.device != name);
        self.nat_mappings.retain(|n| n.device != name);
        tracing::debug!(device = name, "device deleted, cascaded to interfaces/routes/nat mappings");
        Ok(())
    }

    // ---- interfaces ------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn upsert_interface(
        &mut self,
        device: &str,
        name: &str,
        ip_address: &str,
        network: &str,
        status: InterfaceStatus,
        now: SystemTime,
    ) -> Result<(), Error> {
        let ip = ip::parse_ip(ip_address).map_err(|_| {
            Error::validation("ip_address", format!("`{ip_address}` is not a valid IPv4 address"))
        })?;
        let net = parse_strict_network(network)?;

        // I1: the interface's IP must lie within its network.
        if !ip::contains(&net, ip) {
            return Err(Error::validation(
                "ip_address",
                format!("{ip_address} is not within network {network}"),
            ));
        }

        match self
            .interfaces
            .iter_mut()
            .find(|i| i.device == device && i.name == name && i.ip_address == ip)
        {
            Some(existing) => {
                existing.network = net;
                existing.status = status;
                existing.timestamps.touch(now);
            }
            None => self.interfaces.push(Interface {
                device: device.to_string(),
                name: name.to_string(),
                ip_address: ip,
                network: net,
                status,
                timestamps: Timestamps::new(now),
            }),
        }
        Ok(())
    }

    pub fn delete_interface(&mut self, device: &str, name: &str, ip_address: &str) -> Result<(), Error> {
        let ip = ip::parse_ip(ip_address).map_err(|_| Error::format(ip_address))?;
        let before = self.interfaces.len();
        self.interfaces
            .retain(|i| !(i.device == device && i.name == name && i.ip_address == ip));
        if self.interfaces.len() == before {
            return Err(Error::not_found(format!("interface `{device}/{name}/{ip_address}`")));
        }
        Ok(())
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn interfaces_up(&self) -> Vec<&Interface> {
        self.interfaces.iter().filter(|i| i.is_up()).collect()
    }

    pub fn interfaces_on(&self, device: &str) -> Vec<&Interface> {
        self.interfaces.iter().filter(|i| i.device == device).collect()
    }

    /// Up-interfaces carrying exactly this IP address.
    pub fn interfaces_with_ip(&self, ip: u32) -> Vec<&Interface> {
        self.interfaces
            .iter()
            .filter(|i| i.is_up() && i.ip_address == ip)
            .collect()
    }

    // ---- routes ----------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn upsert_route(
        &mut self,
        device: &str,
        destination_network: &str,
        gateway_ip: Option<&str>,
        route_type: RouteType,
        metric: u32,
        now: SystemTime,
    ) -> Result<(), Error> {
        let dest = ip::parse_cidr(destination_network)
            .map_err(|_| Error::validation("destination_network", format!("`{destination_network}` is not a valid CIDR")))?;

        let gateway = gateway_ip
            .map(|g| {
                ip::parse_ip(g).map_err(|_| Error::validation("gateway_ip", format!("`{g}` is not a valid IPv4 address")))
            })
            .transpose()?;

        // I2: connected routes carry no gateway; every other type requires one.
        match (route_type, gateway) {
            (RouteType::Connected, Some(_)) => {
                return Err(Error::validation("gateway_ip", "connected routes must not have a gateway_ip"));
            }
            (RouteType::Connected, None) => {}
            (_, None) => {
                return Err(Error::validation("gateway_ip", "non-connected routes require a gateway_ip"));
            }
            (_, Some(_)) => {}
        }

        match self
            .routes
            .iter_mut()
            .find(|r| r.device == device && r.destination_network == dest && r.gateway_ip == gateway)
        {
            Some(existing) => {
                existing.route_type = route_type;
                existing.metric = metric;
                existing.timestamps.touch(now);
            }
            None => self.routes.push(Route {
                device: device.to_string(),
                destination_network: dest,
                gateway_ip: gateway,
                route_type,
                metric,
                timestamps: Timestamps::new(now),
            }),
        }
        Ok(())
    }

    pub fn delete_route(&mut self, device: &str, destination_network: &str, gateway_ip: Option<&str>) -> Result<(), Error> {
        let dest = ip::parse_cidr(destination_network).map_err(|_| Error::format(destination_network))?;
        let gateway = gateway_ip.map(ip::parse_ip).transpose().map_err(|_| Error::format("gateway_ip"))?;
        let before = self.routes.len();
        self.routes
            .retain(|r| !(r.device == device && r.destination_network == dest && r.gateway_ip == gateway));
        if self.routes.len() == before {
            return Err(Error::not_found(format!("route `{device}/{destination_network}`")));
        }
        Ok(())
    }

    pub fn routes_on(&self, device: &str) -> Vec<&Route> {
        self.routes.iter().filter(|r| r.device == device).collect()
    }

    pub fn all_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    // ---- NAT mappings ------------------------------------------------------

    pub fn insert_nat_mapping(
        &mut self,
        device: &str,
        logical: &str,
        real: &str,
        nat_type: NatType,
        description: &str,
        now: SystemTime,
    ) -> Result<u64, Error> {
        // I4: both sides parse as either a single IP or a CIDR.
        let logical = NatEndpoint::parse(logical).map_err(|_| {
            Error::validation("logical", format!("`{logical}` is not a valid IP or CIDR"))
        })?;
        let real = NatEndpoint::parse(real)
            .map_err(|_| Error::validation("real", format!("`{real}` is not a valid IP or CIDR")))?;

        let id = self.next_nat_id;
        self.next_nat_id += 1;
        self.nat_mappings.push(NatMapping {
            id,
            device: device.to_string(),
            logical,
            real,
            nat_type,
            description: description.to_string(),
            timestamps: Timestamps::new(now),
        });
        Ok(id)
    }

    pub fn delete_nat_mapping(&mut self, id: u64) -> Result<(), Error> {
        let before = self.nat_mappings.len();
        self.nat_mappings.retain(|n| n.id != id);
        if self.nat_mappings.len() == before {
            return Err(Error::not_found(format!("NAT mapping `{id}`")));
        }
        Ok(())
    }

    pub fn nat_mapping(&self, id: u64) -> Option<&NatMapping> {
        self.nat_mappings.iter().find(|n| n.id == id)
    }

    pub fn nat_mappings(&self) -> impl Iterator<Item = &NatMapping> {
        self.nat_mappings.iter()
    }

    pub fn nat_on(&self, device: &str, nat_type: NatType) -> Vec<&NatMapping> {
        self.nat_mappings
            .iter()
            .filter(|n| n.device == device && n.nat_type == nat_type)
            .collect()
    }
}

/// I3 for Interface.network: a literal `d.d.d.d/n`, 0 <= n <= 32. Named
/// separately from `ip::parse_cidr` even though it currently delegates to
/// it, since this is the point where Interface-specific network validation
/// (beyond well-formedness) would be added if the data model grew any.
fn parse_strict_network(network: &str) -> Result<Cidr, Error> {
    let cidr = ip::parse_cidr(network)
        .map_err(|_| Error::validation("network", format!("`{network}` is not a valid CIDR")))?;
    Ok(cidr)
}
