//! Helpers that keep identifying data out of a [`Record`](crate::Record).

use crate::Resource;
use sha1::{
    Digest,
    Sha1,
};

/// Hex-encoded SHA-1 of `input`.
pub fn hash_of(input: impl AsRef<str>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_ref().as_bytes());
    let bytes = hasher.finalize();
    bytes.iter().fold(String::new(), |mut acc, b| {
        acc.push_str(&format!("{:02x}", b));
        acc
    })
}

/// Pseudonymous node ID.
///
/// The machine ID is not always populated and the system UUID is
/// ill-defined, so all three are hashed together. The result is stable for
/// the node's lifetime and never contains the raw name.
pub fn node_id(name: &str, machine_id: &str, system_uuid: &str) -> String {
    hash_of(format!("{name}{machine_id}{system_uuid}"))
}

/// `None` for the empty string. Absent and empty are never conflated in a
/// record.
pub fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let value = value.as_ref();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Capacity entries sorted by resource name, whatever order the source
/// enumerated them in.
pub fn sorted_capacity<I, K, V>(capacity: I) -> Vec<Resource>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut resources: Vec<Resource> = capacity.into_iter().map(|(k, v)| Resource::new(k, v)).collect();
    resources.sort_by(|a, b| a.resource.cmp(&b.resource));
    resources
}
