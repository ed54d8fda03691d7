use census_report::Node;
use eyre::Result;
use futures::future::BoxFuture;

/// Enumerates the cluster's nodes, already anonymized.
pub trait NodeLister: Send + Sync {
    fn list_nodes(&self) -> BoxFuture<'_, Result<Vec<Node>>>;
}

/// Reports the control plane version.
pub trait ServerVersioner: Send + Sync {
    fn server_version(&self) -> BoxFuture<'_, Result<String>>;
}
