use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use netmap_core::ip::Endpoint;
use netmap_core::model::{NatMapping, Route};
use netmap_core::{routing, topology, Error};

use crate::dto::{
    ConnectionsQuery, DevicePayload, IncludeStubsQuery, InterfaceFilter, InterfaceOut, InterfacePayload,
    NatFilter, NatMappingPayload, RouteFilter, RouteOut, RoutePayload, RoutingPathQuery,
};
use crate::error::ApiError;
use crate::id;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/topology", get(get_topology))
        .route("/devices/:id/networks", get(get_device_networks))
        .route("/connections", get(get_connections))
        .route("/routing-path", get(get_routing_path))
        .route("/devices", get(list_devices).post(upsert_device))
        .route("/devices/:id", get(get_device).delete(delete_device))
        .route("/interfaces", get(list_interfaces).post(upsert_interface))
        .route("/interfaces/:id", get(get_interface).delete(delete_interface))
        .route("/routes", get(list_routes).post(upsert_route))
        .route("/routes/:id", get(get_route).delete(delete_route))
        .route("/nat-mappings", get(list_nat_mappings).post(upsert_nat_mapping))
        .route("/nat-mappings/:id", get(get_nat_mapping).delete(delete_nat_mapping))
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---- topology / routing (§4.5) ----------------------------------------

async fn get_topology(State(state): State<AppState>, Query(q): Query<IncludeStubsQuery>) -> Json<topology::Topology> {
    let store = state.store.read().expect("store lock poisoned");
    Json(topology::generate_topology(&store, q.resolve(false)))
}

async fn get_device_networks(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Query(q): Query<IncludeStubsQuery>,
) -> Result<Json<Vec<topology::DeviceNetwork>>, ApiError> {
    let store = state.store.read().expect("store lock poisoned");
    let networks = topology::device_networks(&store, &device_id, q.resolve(true))?;
    Ok(Json(networks))
}

async fn get_connections(State(state): State<AppState>, Query(q): Query<ConnectionsQuery>) -> Result<Json<Value>, ApiError> {
    let store = state.store.read().expect("store lock poisoned");

    if let Some(network) = &q.network {
        let query = Endpoint::parse(network).map_err(|_| Error::validation("network", format!("`{network}` is not a valid IP or CIDR")))?;
        let matches = routing::find_matching_networks(&store, &query);
        return Ok(Json(json!({ "network": network, "matches": matches })));
    }

    match (&q.device1_id, &q.device2_id) {
        (Some(a), Some(b)) => {
            let networks_a = topology::device_networks(&store, a, true)?;
            let networks_b = topology::device_networks(&store, b, true)?;
            let shared: Vec<String> = networks_a
                .iter()
                .map(|n| n.network.clone())
                .filter(|n| networks_b.iter().any(|other| &other.network == n))
                .collect();
            Ok(Json(json!({ "device1_id": a, "device2_id": b, "shared_networks": shared })))
        }
        _ => Err(ApiError(Error::validation(
            "network",
            "either `network` or both `device1_id` and `device2_id` are required",
        ))),
    }
}

async fn get_routing_path(State(state): State<AppState>, Query(q): Query<RoutingPathQuery>) -> (StatusCode, Json<routing::RoutingResult>) {
    let store = state.store.read().expect("store lock poisoned");
    let result = routing::find_route_path(&store, &q.source, &q.destination);
    let status = if result.is_success() { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (status, Json(result))
}

// ---- devices (§4.2a) ----------------------------------------------------

async fn list_devices(State(state): State<AppState>) -> Json<Vec<netmap_core::model::Device>> {
    let store = state.store.read().expect("store lock poisoned");
    Json(store.devices().cloned().collect())
}

async fn get_device(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<netmap_core::model::Device>, ApiError> {
    let store = state.store.read().expect("store lock poisoned");
    store.device(&id).cloned().map(Json).ok_or_else(|| ApiError(Error::not_found(format!("device `{id}`"))))
}

async fn upsert_device(State(state): State<AppState>, Json(payload): Json<DevicePayload>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    store.upsert_device(&payload.name, &payload.description, std::time::SystemTime::now())?;
    Ok(StatusCode::OK)
}

async fn delete_device(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    store.delete_device(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- interfaces ----------------------------------------------------------

async fn list_interfaces(State(state): State<AppState>, Query(filter): Query<InterfaceFilter>) -> Json<Vec<InterfaceOut>> {
    let store = state.store.read().expect("store lock poisoned");
    let interfaces = store
        .interfaces()
        .filter(|i| filter.device.as_deref().map_or(true, |d| d == i.device))
        .filter(|i| filter.status.map_or(true, |s| s == i.status))
        .cloned()
        .map(InterfaceOut::from)
        .collect();
    Json(interfaces)
}

async fn get_interface(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<InterfaceOut>, ApiError> {
    let store = state.store.read().expect("store lock poisoned");
    let (device, name, ip) = decode_interface_id(&id)?;
    store
        .interfaces_on(&device)
        .into_iter()
        .find(|i| i.name == name && i.ip_display() == ip)
        .cloned()
        .map(|i| Json(InterfaceOut::from(i)))
        .ok_or_else(|| ApiError(Error::not_found(format!("interface `{id}`"))))
}

async fn upsert_interface(State(state): State<AppState>, Json(payload): Json<InterfacePayload>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    store.upsert_interface(
        &payload.device,
        &payload.name,
        &payload.ip_address,
        &payload.network,
        payload.status,
        std::time::SystemTime::now(),
    )?;
    Ok(StatusCode::OK)
}

async fn delete_interface(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    let (device, name, ip) = decode_interface_id(&id)?;
    store.delete_interface(&device, &name, &ip)?;
    Ok(StatusCode::NO_CONTENT)
}

fn decode_interface_id(id: &str) -> Result<(String, String, String), ApiError> {
    let parts = id::decode(id, 3).ok_or_else(|| ApiError(Error::not_found(format!("interface `{id}`"))))?;
    Ok((parts[0].clone(), parts[1].clone(), parts[2].clone()))
}

// ---- routes ----------------------------------------------------------

async fn list_routes(State(state): State<AppState>, Query(filter): Query<RouteFilter>) -> Json<Vec<RouteOut>> {
    let store = state.store.read().expect("store lock poisoned");
    let routes = store
        .all_routes()
        .filter(|r| filter.device.as_deref().map_or(true, |d| d == r.device))
        .filter(|r| filter.route_type.map_or(true, |t| t == r.route_type))
        .cloned()
        .map(RouteOut::from)
        .collect();
    Json(routes)
}

async fn get_route(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<RouteOut>, ApiError> {
    let store = state.store.read().expect("store lock poisoned");
    let (device, network, gateway) = decode_route_id(&id)?;
    store
        .routes_on(&device)
        .into_iter()
        .find(|r| r.destination_network.to_string() == network && route_gateway_matches(r, &gateway))
        .cloned()
        .map(|r| Json(RouteOut::from(r)))
        .ok_or_else(|| ApiError(Error::not_found(format!("route `{id}`"))))
}

async fn upsert_route(State(state): State<AppState>, Json(payload): Json<RoutePayload>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    store.upsert_route(
        &payload.device,
        &payload.destination_network,
        payload.gateway_ip.as_deref(),
        payload.route_type,
        payload.metric,
        std::time::SystemTime::now(),
    )?;
    Ok(StatusCode::OK)
}

async fn delete_route(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    let (device, network, gateway) = decode_route_id(&id)?;
    let gateway_ref = if gateway == id::NONE_MARKER { None } else { Some(gateway.as_str()) };
    store.delete_route(&device, &network, gateway_ref)?;
    Ok(StatusCode::NO_CONTENT)
}

fn decode_route_id(id: &str) -> Result<(String, String, String), ApiError> {
    let parts = id::decode(id, 3).ok_or_else(|| ApiError(Error::not_found(format!("route `{id}`"))))?;
    Ok((parts[0].clone(), parts[1].clone(), parts[2].clone()))
}

fn route_gateway_matches(route: &Route, gateway: &str) -> bool {
    match route.gateway_ip {
        Some(ip) => netmap_core::ip::format_ip(ip) == gateway,
        None => gateway == id::NONE_MARKER,
    }
}

// ---- NAT mappings ------------------------------------------------------

async fn list_nat_mappings(State(state): State<AppState>, Query(filter): Query<NatFilter>) -> Json<Vec<NatMapping>> {
    let store = state.store.read().expect("store lock poisoned");
    let mappings = store
        .nat_mappings()
        .filter(|n| filter.device.as_deref().map_or(true, |d| d == n.device))
        .filter(|n| filter.nat_type.map_or(true, |t| t == n.nat_type))
        .cloned()
        .collect();
    Json(mappings)
}

async fn get_nat_mapping(State(state): State<AppState>, Path(id): Path<u64>) -> Result<Json<NatMapping>, ApiError> {
    let store = state.store.read().expect("store lock poisoned");
    store
        .nat_mapping(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError(Error::not_found(format!("NAT mapping `{id}`"))))
}

async fn upsert_nat_mapping(State(state): State<AppState>, Json(payload): Json<NatMappingPayload>) -> Result<Json<Value>, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    let id = store.insert_nat_mapping(
        &payload.device,
        &payload.logical,
        &payload.real,
        payload.nat_type,
        &payload.description,
        std::time::SystemTime::now(),
    )?;
    Ok(Json(json!({ "id": id })))
}

async fn delete_nat_mapping(State(state): State<AppState>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().expect("store lock poisoned");
    store.delete_nat_mapping(id)?;
    Ok(StatusCode::NO_CONTENT)
}
