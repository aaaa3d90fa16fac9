//! Interfaces and routes have no surrogate id (§3 keys them by a tuple);
//! this crate encodes that tuple as a single `~`-delimited path segment so
//! `/interfaces/{id}` and `/routes/{id}` can stay single-segment routes.

const SEP: char = '~';

pub fn encode(parts: &[&str]) -> String {
    parts.join(&SEP.to_string())
}

pub fn decode(id: &str, expected_parts: usize) -> Option<Vec<String>> {
    let parts: Vec<String> = id.split(SEP).map(str::to_string).collect();
    if parts.len() == expected_parts {
        Some(parts)
    } else {
        None
    }
}

/// Routes carry an optional gateway_ip; encode its absence as a literal `-`.
pub const NONE_MARKER: &str = "-";
