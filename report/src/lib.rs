//! # Census Report
//!
//! The data model shared by the volunteer and the collector.
//!
//! A [`Record`] is the single payload sent per collection cycle. It carries
//! the reporting binary's version, a caller-chosen cluster ID, the control
//! plane version and an anonymized snapshot of every node, plus any custom
//! key/value [`Extension`]s the operator opted into.
//!
//! Nothing in a record may identify a machine or a person: node IDs are
//! one-way hashes (see [`anonymize`]) and the cluster ID is opaque.

pub mod anonymize;
mod record;

pub use anonymize::{
    hash_of,
    node_id,
    non_empty,
    sorted_capacity,
};
pub use record::{
    Extension,
    Node,
    Record,
    Resource,
};

/// Version of the reporting binary, sent as the record's schema version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
