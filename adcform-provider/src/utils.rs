//! Helpers for appliance object paths and JSON identifiers

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Default administrative partition
pub const DEFAULT_PARTITION: &str = "Common";

static DESTINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:/[^/]+/)?(?P<address>.+?)[:.](?P<port>\d+|any)$")
        .expect("destination pattern is valid")
});

/// Split a full path into (partition, name). The name keeps any sub-folder.
///
/// A bare name is placed in the default partition.
pub fn split_full_path(path: &str) -> (String, String) {
    match path.strip_prefix('/').and_then(|rest| rest.split_once('/')) {
        Some((partition, name)) => (partition.to_string(), name.to_string()),
        None => (
            DEFAULT_PARTITION.to_string(),
            path.trim_start_matches('/').to_string(),
        ),
    }
}

/// Join a partition and name into a full path
pub fn full_path(partition: &str, name: &str) -> String {
    format!("/{}/{}", partition, name)
}

/// URL form of a full path: "/Common/web" -> "~Common~web"
pub fn uri_name(path: &str) -> String {
    if path.starts_with('/') {
        path.replace('/', "~")
    } else {
        path.to_string()
    }
}

/// Last path segment ("/Common/http" -> "http")
pub fn leaf_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Build a virtual server destination: "/Common/10.0.0.10:443"
pub fn format_destination(partition: &str, address: &str, port: i64) -> String {
    let separator = if address.contains(':') { '.' } else { ':' };
    format!("/{}/{}{}{}", partition, address, separator, port)
}

/// Parse a virtual server destination into (address, port); port "any" is 0
///
/// IPv4 destinations separate the port with ':' and IPv6 ones with '.'.
pub fn parse_destination(destination: &str) -> Option<(String, i64)> {
    let caps = DESTINATION.captures(destination)?;
    let port = match &caps["port"] {
        "any" => 0,
        p => p.parse().ok()?,
    };
    Some((caps["address"].to_string(), port))
}

/// SHA-256 hex digest of the canonical (key-sorted, compact) JSON text
pub fn json_hash(value: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
