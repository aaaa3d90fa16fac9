//! Routing service (§4.4) — the path-finding core. Every public function
//! here is a pure function of `(&Store, arguments)`; none of them mutate
//! the store or hold state across calls (§5).

use std::collections::HashSet;

use serde::Serialize;

use crate::ip::{self, Endpoint};
use crate::model::{NatEndpoint, NatType, Route, RouteType};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRelationship {
    Exact,
    Supernet,
    Subnet,
    Overlap,
    ContainsIp,
    ExactIpMatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkMatch {
    pub device: String,
    pub interface_name: String,
    pub network: String,
    pub relationship: MatchRelationship,
}

/// §4.4.1 — networks (up-interfaces) the query overlaps or lies within.
pub fn find_matching_networks(store: &Store, query: &Endpoint) -> Vec<NetworkMatch> {
    let mut matches = Vec::new();
    for iface in store.interfaces_up() {
        let relationship = match query {
            Endpoint::Net(q) => {
                if !ip::overlaps(q, &iface.network) {
                    continue;
                }
                if *q == iface.network {
                    MatchRelationship::Exact
                } else if ip::supernet_of(q, &iface.network) {
                    MatchRelationship::Supernet
                } else if ip::supernet_of(&iface.network, q) {
                    MatchRelationship::Subnet
                } else {
                    MatchRelationship::Overlap
                }
            }
            Endpoint::Host(p) => {
                if !ip::contains(&iface.network, *p) {
                    continue;
                }
                if *p == iface.ip_address {
                    MatchRelationship::ExactIpMatch
                } else {
                    MatchRelationship::ContainsIp
                }
            }
        };
        matches.push(NetworkMatch {
            device: iface.device.clone(),
            interface_name: iface.name.clone(),
            network: iface.network.to_string(),
            relationship,
        });
    }
    matches
}

#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub device: String,
    pub interface_name: Option<String>,
    pub route_type: Option<String>,
    pub network: String,
}

/// §4.4.2 — proper-subnet conflicts against a queried supernet. Empty for
/// host queries, which cannot be an aggregate.
pub fn check_supernet_conflicts(store: &Store, query: &Endpoint) -> Vec<Conflict> {
    let q = match query {
        Endpoint::Net(cidr) => cidr,
        Endpoint::Host(_) => return Vec::new(),
    };

    let mut conflicts = Vec::new();
    for iface in store.interfaces_up() {
        if ip::supernet_of(q, &iface.network) {
            conflicts.push(Conflict {
                device: iface.device.clone(),
                interface_name: Some(iface.name.clone()),
                route_type: None,
                network: iface.network.to_string(),
            });
        }
    }
    for route in store.all_routes() {
        if ip::supernet_of(q, &route.destination_network) {
            conflicts.push(Conflict {
                device: route.device.clone(),
                interface_name: None,
                route_type: Some(route.route_type.to_string()),
                network: route.destination_network.to_string(),
            });
        }
    }
    conflicts
}

#[derive(Debug, Clone, Serialize)]
pub struct NatMatch {
    pub device: String,
    pub nat_type: String,
    pub logical: String,
    pub real: String,
    pub description: String,
    pub translated: Option<String>,
    pub note: Option<String>,
}

/// §4.4.3 — first (insertion-order) NAT mapping on `device` of the given
/// type that applies to `query`, with per-IP translation computed when the
/// logical side is a CIDR and the real side a single IP.
pub fn find_nat_mapping(store: &Store, device: &str, query: &Endpoint, nat_type: NatType) -> Option<NatMatch> {
    for mapping in store.nat_on(device, nat_type) {
        let result = match (mapping.logical, query) {
            (NatEndpoint::Net(logical), Endpoint::Net(q)) if ip::overlaps(&logical, q) => Some(NatMatch {
                device: device.to_string(),
                nat_type: nat_type.to_string(),
                logical: mapping.logical.to_string(),
                real: mapping.real.to_string(),
                description: mapping.description.clone(),
                translated: None,
                note: Some("network-to-network mapping; no per-IP translation".to_string()),
            }),
            (NatEndpoint::Net(logical), Endpoint::Host(p)) if ip::contains(&logical, *p) => {
                let (translated, note) = match mapping.real {
                    NatEndpoint::Ip(real_ip) => {
                        let translated = real_ip.wrapping_add(p.wrapping_sub(logical.base));
                        (Some(ip::format_ip(translated)), None)
                    }
                    NatEndpoint::Net(_) => (None, Some("real side is a network; per-IP translation not computed".to_string())),
                };
                Some(NatMatch {
                    device: device.to_string(),
                    nat_type: nat_type.to_string(),
                    logical: mapping.logical.to_string(),
                    real: mapping.real.to_string(),
                    description: mapping.description.clone(),
                    translated,
                    note,
                })
            }
            (NatEndpoint::Ip(logical_ip), Endpoint::Host(p)) if logical_ip == *p => Some(NatMatch {
                device: device.to_string(),
                nat_type: nat_type.to_string(),
                logical: mapping.logical.to_string(),
                real: mapping.real.to_string(),
                description: mapping.description.clone(),
                translated: None,
                note: None,
            }),
            _ => None,
        };
        if result.is_some() {
            return result;
        }
    }
    None
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub network: String,
    pub gateway_ip: Option<String>,
    pub route_type: String,
}

impl From<&Route> for RouteSummary {
    fn from(route: &Route) -> Self {
        RouteSummary {
            network: route.destination_network.to_string(),
            gateway_ip: route.gateway_ip.map(ip::format_ip),
            route_type: route.route_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Hop {
    pub device: String,
    pub ingress: Option<String>,
    pub egress: Option<String>,
    pub route: Option<RouteSummary>,
    pub next_hop: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NatApplied {
    pub source: bool,
    pub destination: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RoutingResult {
    Success {
        source: String,
        destination: String,
        path: Vec<Hop>,
        nat_applied: NatApplied,
        nat_source_details: Option<NatMatch>,
        nat_destination_details: Option<NatMatch>,
    },
    Error {
        source: String,
        destination: String,
        message: String,
        path: Vec<Hop>,
        nat_applied: NatApplied,
        nat_source_details: Option<NatMatch>,
        nat_destination_details: Option<NatMatch>,
        conflicts: Option<Vec<Conflict>>,
    },
}

impl RoutingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RoutingResult::Success { .. })
    }

    pub fn path(&self) -> &[Hop] {
        match self {
            RoutingResult::Success { path, .. } | RoutingResult::Error { path, .. } => path,
        }
    }
}

fn error_result(source: &str, destination: &str, message: impl Into<String>, path: Vec<Hop>, conflicts: Option<Vec<Conflict>>) -> RoutingResult {
    RoutingResult::Error {
        source: source.to_string(),
        destination: destination.to_string(),
        message: message.into(),
        path,
        nat_applied: NatApplied::default(),
        nat_source_details: None,
        nat_destination_details: None,
        conflicts,
    }
}

/// §4.4.4 — end-to-end hop-by-hop simulation.
pub fn find_route_path(store: &Store, source: &str, destination: &str) -> RoutingResult {
    let src_endpoint = match Endpoint::parse(source) {
        Ok(e) => e,
        Err(_) => return error_result(source, destination, format!("Source `{source}` is not a valid IP or CIDR"), Vec::new(), None),
    };
    let dst_endpoint = match Endpoint::parse(destination) {
        Ok(e) => e,
        Err(_) => return error_result(source, destination, format!("Destination `{destination}` is not a valid IP or CIDR"), Vec::new(), None),
    };

    // Phase 1 — validation
    let src_conflicts = check_supernet_conflicts(store, &src_endpoint);
    if !src_conflicts.is_empty() {
        return error_result(
            source,
            destination,
            format!("Source {source} conflicts with more specific networks"),
            Vec::new(),
            Some(src_conflicts),
        );
    }
    let dst_conflicts = check_supernet_conflicts(store, &dst_endpoint);
    if !dst_conflicts.is_empty() {
        return error_result(
            source,
            destination,
            format!("Destination {destination} conflicts with more specific networks"),
            Vec::new(),
            Some(dst_conflicts),
        );
    }

    let src_matches = find_matching_networks(store, &src_endpoint);
    if src_matches.is_empty() {
        return error_result(source, destination, format!("Source {source} not found in any known network"), Vec::new(), None);
    }
    let dst_matches = find_matching_networks(store, &dst_endpoint);
    if dst_matches.is_empty() {
        return error_result(source, destination, format!("Destination {destination} not found in any known network"), Vec::new(), None);
    }

    let src_device = src_matches[0].device.clone();
    let dst_device = dst_matches[0].device.clone();

    // Phase 2 — same-device short-circuit
    if src_device == dst_device {
        let hop = Hop {
            device: src_device.clone(),
            ingress: None,
            egress: None,
            route: None,
            next_hop: None,
            note: Some("Source and destination are on the same device".to_string()),
        };
        return RoutingResult::Success {
            source: source.to_string(),
            destination: destination.to_string(),
            path: vec![hop],
            nat_applied: NatApplied::default(),
            nat_source_details: None,
            nat_destination_details: None,
        };
    }

    // Phase 3 — NAT prelude
    let mut nat_applied = NatApplied::default();
    let nat_source_details = find_nat_mapping(store, &src_device, &src_endpoint, NatType::Source);
    if nat_source_details.is_some() {
        nat_applied.source = true;
    }

    let nat_destination_details = find_nat_mapping(store, &dst_device, &dst_endpoint, NatType::Destination);
    let mut working_dst = dst_endpoint;
    if let Some(nat) = &nat_destination_details {
        nat_applied.destination = true;
        working_dst = rewritten_destination(nat).unwrap_or(working_dst);
    }

    // Phase 4 — hop-by-hop simulation
    let mut current_device = src_device;
    let mut visited: HashSet<String> = HashSet::new();
    let mut path: Vec<Hop> = Vec::new();
    let mut pending_ingress: Option<String> = None;

    let outcome = loop {
        if current_device == dst_device {
            break Termination::Reached;
        }
        if visited.contains(&current_device) {
            break Termination::Loop;
        }
        visited.insert(current_device.clone());

        let route = longest_prefix_match(&store.routes_on(&current_device), &working_dst);
        let route = match route {
            Some(r) => r,
            None => {
                break Termination::NoRoute(format!("No route found on device {current_device} for {working_dst}"));
            }
        };

        let mut next_hop_iface_name: Option<String> = None;
        let mut next_hop_device: Option<String> = None;
        let mut egress: Option<String> = None;

        if let Some(gateway) = route.gateway_ip {
            let candidate = store.interfaces_with_ip(gateway).into_iter().next();
            match candidate {
                Some(iface) => {
                    next_hop_iface_name = Some(iface.name.clone());
                    next_hop_device = Some(iface.device.clone());
                }
                None if route.route_type != RouteType::Connected => {
                    break Termination::NoRoute(format!("No next hop found for gateway {} on device {current_device}", ip::format_ip(gateway)));
                }
                None => {}
            }
            egress = store
                .interfaces_on(&current_device)
                .into_iter()
                .find(|i| i.is_up() && ip::contains(&i.network, gateway))
                .map(|i| i.name.clone());
        }

        path.push(Hop {
            device: current_device.clone(),
            ingress: pending_ingress.take(),
            egress,
            route: Some(RouteSummary::from(route)),
            next_hop: Some(next_hop_device.clone().unwrap_or_else(|| "Directly Connected".to_string())),
            note: None,
        });

        match next_hop_device {
            Some(next_device) => {
                pending_ingress = next_hop_iface_name;
                current_device = next_device;
            }
            None => break Termination::Loop,
        }
    };

    // Phase 5 — termination
    match outcome {
        Termination::Reached => {
            path.push(Hop {
                device: dst_device.clone(),
                ingress: pending_ingress,
                egress: None,
                route: None,
                next_hop: None,
                note: Some("Destination reached".to_string()),
            });
            RoutingResult::Success {
                source: source.to_string(),
                destination: destination.to_string(),
                path,
                nat_applied,
                nat_source_details,
                nat_destination_details,
            }
        }
        Termination::Loop => {
            tracing::warn!(%source, %destination, "routing loop detected");
            RoutingResult::Error {
                source: source.to_string(),
                destination: destination.to_string(),
                message: "Routing loop detected".to_string(),
                path,
                nat_applied,
                nat_source_details,
                nat_destination_details,
                conflicts: None,
            }
        }
        Termination::NoRoute(message) => RoutingResult::Error {
            source: source.to_string(),
            destination: destination.to_string(),
            message,
            path,
            nat_applied,
            nat_source_details,
            nat_destination_details,
            conflicts: None,
        },
    }
}

enum Termination {
    Reached,
    Loop,
    NoRoute(String),
}

fn rewritten_destination(nat: &NatMatch) -> Option<Endpoint> {
    if let Some(translated) = &nat.translated {
        return ip::parse_ip(translated).ok().map(Endpoint::Host);
    }
    Endpoint::parse(&nat.real).ok()
}

/// Longest-prefix match among a device's routes; ties keep the first-seen
/// route (metric is deliberately not consulted — see Design Notes §9.1).
fn longest_prefix_match<'a>(routes: &[&'a Route], working_dst: &Endpoint) -> Option<&'a Route> {
    let mut best: Option<&Route> = None;
    for route in routes {
        let matches = match working_dst {
            Endpoint::Net(q) => ip::overlaps(&route.destination_network, q),
            Endpoint::Host(p) => ip::contains(&route.destination_network, *p),
        };
        if !matches {
            continue;
        }
        match best {
            Some(current) if ip::prefixlen(&route.destination_network) <= ip::prefixlen(&current.destination_network) => {}
            _ => best = Some(route),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InterfaceStatus;
    use std::time::SystemTime;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    fn same_device_store() -> Store {
        let mut store = Store::new();
        store.upsert_device("router1", "", now()).unwrap();
        store
            .upsert_interface("router1", "eth1", "192.168.1.1", "192.168.1.0/24", InterfaceStatus::Up, now())
            .unwrap();
        store
            .upsert_route("router1", "192.168.1.0/24", None, RouteType::Connected, 0, now())
            .unwrap();
        store
    }

    #[test]
    fn s1_same_subnet_short_circuits() {
        let store = same_device_store();
        let result = find_route_path(&store, "192.168.1.5", "192.168.1.10");
        assert!(result.is_success());
        assert_eq!(result.path().len(), 1);
        assert_eq!(result.path()[0].device, "router1");
        assert_eq!(result.path()[0].note.as_deref(), Some("Source and destination are on the same device"));
    }

    fn three_hop_store() -> Store {
        let mut store = Store::new();
        for device in ["router1", "router2", "router3"] {
            store.upsert_device(device, "", now()).unwrap();
        }
        store
            .upsert_interface("router1", "eth0", "192.168.1.1", "192.168.1.0/24", InterfaceStatus::Up, now())
            .unwrap();
        store
            .upsert_interface("router1", "eth1", "10.0.0.1", "10.0.0.0/24", InterfaceStatus::Up, now())
            .unwrap();
        store
            .upsert_interface("router2", "eth0", "10.0.0.2", "10.0.0.0/24", InterfaceStatus::Up, now())
            .unwrap();
        store
            .upsert_interface("router2", "eth1", "10.1.0.1", "10.1.0.0/24", InterfaceStatus::Up, now())
            .unwrap();
        store
            .upsert_interface("router3", "eth0", "10.1.0.2", "10.1.0.0/24", InterfaceStatus::Up, now())
            .unwrap();
        store
            .upsert_interface("router3", "eth1", "172.16.0.1", "172.16.0.0/24", InterfaceStatus::Up, now())
            .unwrap();

        store
            .upsert_route("router1", "192.168.1.0/24", None, RouteType::Connected, 0, now())
            .unwrap();
        store
            .upsert_route("router1", "10.0.0.0/24", None, RouteType::Connected, 0, now())
            .unwrap();
        store
            .upsert_route("router1", "172.16.0.0/24", Some("10.0.0.2"), RouteType::Static, 1, now())
            .unwrap();
        store
            .upsert_route("router2", "10.0.0.0/24", None, RouteType::Connected, 0, now())
            .unwrap();
        store
            .upsert_route("router2", "10.1.0.0/24", None, RouteType::Connected, 0, now())
            .unwrap();
        store
            .upsert_route("router2", "172.16.0.0/24", Some("10.1.0.2"), RouteType::Static, 1, now())
            .unwrap();
        store
            .upsert_route("router3", "10.1.0.0/24", None, RouteType::Connected, 0, now())
            .unwrap();
        store
            .upsert_route("router3", "172.16.0.0/24", None, RouteType::Connected, 0, now())
            .unwrap();
        store
    }

    #[test]
    fn s2_three_hop_path() {
        let store = three_hop_store();
        let result = find_route_path(&store, "192.168.1.5", "172.16.0.10");
        assert!(result.is_success());
        let devices: Vec<&str> = result.path().iter().map(|h| h.device.as_str()).collect();
        assert_eq!(devices, vec!["router1", "router2", "router3"]);
    }

    #[test]
    fn s3_supernet_query_conflicts() {
        let store = three_hop_store();
        let result = find_route_path(&store, "10.0.0.0/8", "172.16.0.10");
        match result {
            RoutingResult::Error { conflicts: Some(conflicts), .. } => {
                assert!(conflicts.iter().any(|c| c.network == "10.0.0.0/24"));
            }
            other => panic!("expected conflict error, got {other:?}"),
        }
    }

    #[test]
    fn s5_source_nat_translation_math() {
        let mut store = Store::new();
        store.upsert_device("router1", "", now()).unwrap();
        store
            .insert_nat_mapping("router1", "192.168.1.0/24", "100.64.0.0", NatType::Source, "", now())
            .unwrap();

        let query = Endpoint::parse("192.168.1.5").unwrap();
        let nat = find_nat_mapping(&store, "router1", &query, NatType::Source).unwrap();
        assert_eq!(nat.translated.as_deref(), Some("100.64.0.5"));
    }

    #[test]
    fn s6_no_route_found() {
        let store = same_device_store();
        let result = find_route_path(&store, "192.168.1.5", "192.168.3.10");
        match result {
            RoutingResult::Error { message, path, .. } => {
                assert!(message.contains("not found in any known network") || message.contains("No route found"));
                assert!(path.is_empty());
            }
            other => panic!("expected error, got {other:?}"),
        }
    }
}
