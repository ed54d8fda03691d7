use crate::{
    extensions::ExtensionsLister,
    inventory::{
        NodeLister,
        ServerVersioner,
    },
};
use census_report::{
    Record,
    VERSION,
};
use eyre::{
    Context as _,
    Result,
};
use std::sync::Arc;
use tracing::{
    Instrument as _,
    Span,
};

/// Composes one [`Record`] per call from the cluster inventory.
pub struct RecordGenerator {
    cluster_id: String,
    versioner: Arc<dyn ServerVersioner>,
    nodes: Arc<dyn NodeLister>,
    extensions: Arc<dyn ExtensionsLister>,
    span: Span,
}

impl RecordGenerator {
    pub fn new(
        cluster_id: impl Into<String>,
        versioner: Arc<dyn ServerVersioner>,
        nodes: Arc<dyn NodeLister>,
        extensions: Arc<dyn ExtensionsLister>,
        span: Span,
    ) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            versioner,
            nodes,
            extensions,
            span,
        }
    }

    /// Version and node failures fail the whole record. Extensions are
    /// optional and degrade to an empty list.
    pub async fn generate(&self) -> Result<Record> {
        async move {
            let master_version = self
                .versioner
                .server_version()
                .await
                .wrap_err("unable to get server version")?;

            let nodes = self.nodes.list_nodes().await.wrap_err("unable to list nodes")?;

            let extensions = self.extensions.list_extensions().unwrap_or_else(|err| {
                warn!(%err, "unable to list extensions, sending none");
                Vec::new()
            });

            let mut record = Record {
                schema_version: VERSION.to_string(),
                timestamp: String::new(),
                cluster_id: self.cluster_id.clone(),
                master_version: Some(master_version),
                nodes,
                extensions,
            };
            record.stamp_now();
            debug!(
                nodes = record.nodes.len(),
                extensions = record.extensions.len(),
                "record generated"
            );
            Ok(record)
        }
        .instrument(self.span.clone())
        .await
    }
}
