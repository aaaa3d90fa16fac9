//! Topology service (§4.3): derives device-adjacency from shared L3
//! networks. The data model has no notion of a point-to-point link, so
//! adjacency is inferred — see the Design Notes for the over-representation
//! caveat this implies for large shared segments.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;
use crate::ip::Cidr;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub interfaces_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub device_a: String,
    pub device_b: String,
    pub network: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub fn generate_topology(store: &Store, include_stubs: bool) -> Topology {
    let nodes = store
        .devices()
        .map(|d| Node {
            id: d.name.clone(),
            label: d.name.clone(),
            interfaces_count: store.interfaces_on(&d.name).len(),
        })
        .collect();

    // Group up-interfaces by network, preserving first-seen network order
    // and first-seen device order within each network.
    let mut network_order: Vec<Cidr> = Vec::new();
    let mut devices_by_network: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for iface in store.interfaces_up() {
        let key = iface.network.to_string();
        if !devices_by_network.contains_key(&key) {
            network_order.push(iface.network);
        }
        let devices = devices_by_network.entry(key).or_default();
        if !devices.contains(&iface.device) {
            devices.push(iface.device.clone());
        }
    }

    let mut edges = Vec::new();
    for network in network_order {
        let key = network.to_string();
        let devices = devices_by_network.get(&key).expect("network was just inserted");
        if devices.len() > 1 || include_stubs {
            for i in 0..devices.len() {
                for j in (i + 1)..devices.len() {
                    edges.push(Edge {
                        device_a: devices[i].clone(),
                        device_b: devices[j].clone(),
                        network: key.clone(),
                    });
                }
            }
        }
    }

    Topology { nodes, edges }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceNetwork {
    pub network: String,
    pub interfaces: Vec<String>,
}

pub fn device_networks(store: &Store, device_id: &str, include_stubs: bool) -> Result<Vec<DeviceNetwork>, Error> {
    if store.device(device_id).is_none() {
        return Err(Error::not_found(format!("device `{device_id}`")));
    }

    let mut seen: Vec<Cidr> = Vec::new();
    let mut interfaces_by_network: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for iface in store.interfaces_up().into_iter().filter(|i| i.device == device_id) {
        let key = iface.network.to_string();
        if !interfaces_by_network.contains_key(&key) {
            seen.push(iface.network);
        }
        interfaces_by_network.entry(key).or_default().push(iface.name.clone());
    }

    let mut result = Vec::new();
    for network in seen {
        let key = network.to_string();
        let is_stub = store
            .interfaces_up()
            .into_iter()
            .filter(|i| i.network == network)
            .all(|i| i.device == device_id);

        if include_stubs || !is_stub {
            result.push(DeviceNetwork {
                network: key.clone(),
                interfaces: interfaces_by_network.remove(&key).unwrap_or_default(),
            });
        }
    }
    Ok(result)
}
