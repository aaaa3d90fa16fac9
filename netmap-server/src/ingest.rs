//! JSON seed-file ingestion, standing in for the external ingestion
//! pipeline (§3 "Lifecycle"). Read once at process start.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use serde::Deserialize;

use netmap_core::Store;

use crate::dto::{DevicePayload, InterfacePayload, NatMappingPayload, RoutePayload};

#[derive(Debug, Deserialize, Default)]
pub struct SeedData {
    #[serde(default)]
    pub devices: Vec<DevicePayload>,
    #[serde(default)]
    pub interfaces: Vec<InterfacePayload>,
    #[serde(default)]
    pub routes: Vec<RoutePayload>,
    #[serde(default)]
    pub nat_mappings: Vec<NatMappingPayload>,
}

pub fn load_seed(store: &mut Store, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)?;
    let seed: SeedData = serde_json::from_str(&raw)?;
    apply_seed(store, &seed)?;

    tracing::info!(
        devices = seed.devices.len(),
        interfaces = seed.interfaces.len(),
        routes = seed.routes.len(),
        nat_mappings = seed.nat_mappings.len(),
        path = %path.display(),
        "loaded seed data"
    );
    Ok(())
}

fn apply_seed(store: &mut Store, seed: &SeedData) -> anyhow::Result<()> {
    let now = SystemTime::now();

    for device in &seed.devices {
        store.upsert_device(&device.name, &device.description, now)?;
    }
    for iface in &seed.interfaces {
        store.upsert_interface(&iface.device, &iface.name, &iface.ip_address, &iface.network, iface.status, now)?;
    }
    for route in &seed.routes {
        store.upsert_route(
            &route.device,
            &route.destination_network,
            route.gateway_ip.as_deref(),
            route.route_type,
            route.metric,
            now,
        )?;
    }
    for nat in &seed.nat_mappings {
        store.insert_nat_mapping(&nat.device, &nat.logical, &nat.real, nat.nat_type, &nat.description, now)?;
    }
    Ok(())
}
