//! Connection secret keys and builders.

use super::ConnectionDetails;

pub const KEY_ENDPOINT: &str = "endpoint";
pub const KEY_PORT: &str = "port";
pub const KEY_PASSWORD: &str = "password";
pub const KEY_REGION: &str = "region";

/// `endpoint` and `port` for a network endpoint. Missing parts are omitted.
pub fn endpoint_details(address: Option<&str>, port: Option<i32>) -> ConnectionDetails {
    let mut details = ConnectionDetails::new();
    if let Some(address) = address.filter(|a| !a.is_empty()) {
        details.insert(KEY_ENDPOINT.to_string(), address.as_bytes().to_vec());
    }
    if let Some(port) = port {
        details.insert(KEY_PORT.to_string(), port.to_string().into_bytes());
    }
    details
}

/// Whether `existing` already holds every entry of `details`.
pub fn contains_all(existing: &ConnectionDetails, details: &ConnectionDetails) -> bool {
    details.iter().all(|(k, v)| existing.get(k) == Some(v))
}
