//! # Census Volunteer
//!
//! The periodic agent that reports on a cluster.
//!
//! Each cycle the [`RecordGenerator`] asks the inventory for the control
//! plane version and the node list, adds whatever custom extensions the
//! operator dropped on disk, and the [`Volunteer`] loop hands the resulting
//! record to its sink. Then it sleeps for the configured period and does it
//! again, or stops after one cycle when the period is zero.
//!
//! - **`inventory`**: the node inventory seams ([`NodeLister`], [`ServerVersioner`])
//! - **`kubernetes`**: the in-cluster Kubernetes implementation of both
//! - **`extensions`**: opt-in key/value metrics read from a file or directory
//! - **`generator`**: composes one record per call
//! - **`scheduler`**: the run loop

#[macro_use]
extern crate tracing;

pub mod extensions;
pub mod generator;
pub mod inventory;
pub mod kubernetes;
pub mod scheduler;

pub use extensions::{
    BytesExtensionsLister,
    ExtensionsError,
    ExtensionsLister,
    PathExtensionsLister,
};
pub use generator::RecordGenerator;
pub use inventory::{
    NodeLister,
    ServerVersioner,
};
pub use kubernetes::KubeClient;
pub use scheduler::{
    SchedulerState,
    Volunteer,
};
