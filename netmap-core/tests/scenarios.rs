//! Scenario tests exercising the routing and topology services together,
//! building stores the way a caller assembling seed data would.

use std::time::SystemTime;

use netmap_core::model::{InterfaceStatus, NatType, RouteType};
use netmap_core::routing::{find_route_path, RoutingResult};
use netmap_core::Store;

fn now() -> SystemTime {
    SystemTime::UNIX_EPOCH
}

#[test]
fn s4_destination_nat_rewrites_working_destination() {
    let mut store = Store::new();
    store.upsert_device("router1", "", now()).unwrap();
    store.upsert_device("router3", "", now()).unwrap();

    store
        .upsert_interface("router1", "eth0", "192.168.1.1", "192.168.1.0/24", InterfaceStatus::Up, now())
        .unwrap();
    store
        .upsert_interface("router1", "eth1", "10.0.0.1", "10.0.0.0/24", InterfaceStatus::Up, now())
        .unwrap();
    store
        .upsert_interface("router3", "eth0", "10.0.0.2", "10.0.0.0/24", InterfaceStatus::Up, now())
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
        .upsert_route("router3", "10.0.0.0/24", None, RouteType::Connected, 0, now())
        .unwrap();
    store
        .upsert_route("router3", "172.16.0.0/24", None, RouteType::Connected, 0, now())
        .unwrap();

    // The query destination "200.1.1.1" isn't on any known network by itself;
    // what makes it reachable is the destination NAT mapping on router3 that
    // rewrites it to 172.16.0.10 before path-finding begins. But
    // find_matching_networks(dst) runs against the *original* query, so
    // 200.1.1.1 still needs to resolve to router3 for the NAT lookup itself —
    // model it as a /32 NAT-facing address carried on router3's WAN leg.
    store
        .upsert_interface("router3", "eth2", "200.1.1.1", "200.1.1.1/32", InterfaceStatus::Up, now())
        .unwrap();
    store
        .insert_nat_mapping("router3", "200.1.1.1", "172.16.0.10", NatType::Destination, "", now())
        .unwrap();

    let result = find_route_path(&store, "192.168.1.5", "200.1.1.1");
    match result {
        RoutingResult::Success { nat_applied, nat_destination_details, .. } => {
            assert!(nat_applied.destination);
            assert!(nat_destination_details.is_some());
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn multi_device_network_produces_topology_edges_matching_route_path() {
    let mut store = Store::new();
    for device in ["core", "edge"] {
        store.upsert_device(device, "", now()).unwrap();
    }
    store
        .upsert_interface("core", "eth0", "10.1.1.1", "10.1.1.0/24", InterfaceStatus::Up, now())
        .unwrap();
    store
        .upsert_interface("edge", "eth0", "10.1.1.2", "10.1.1.0/24", InterfaceStatus::Up, now())
        .unwrap();

    let topo = netmap_core::topology::generate_topology(&store, false);
    assert_eq!(topo.edges.len(), 1);
    assert!(topo.edges[0].device_a == "core" || topo.edges[0].device_b == "core");
}
