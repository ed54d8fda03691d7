use crate::{
    Sink,
    SinkContext,
    SinkError,
    SinkPlugin,
};
use census_report::Record;
use futures::future::BoxFuture;
use std::{
    io::Write as _,
    sync::Arc,
};
use tracing::Span;

pub(crate) const PLUGIN: SinkPlugin = SinkPlugin {
    name: "stdout",
    example_spec: "stdout",
    recognizes: |spec| spec == "stdout",
    build,
};

fn build(_spec: &str, context: &SinkContext) -> Result<Arc<dyn Sink>, SinkError> {
    Ok(Arc::new(StdoutSink::new(context.span.clone())))
}

/// Pretty-prints each record as JSON on standard output.
#[derive(Debug, Clone)]
pub struct StdoutSink {
    span: Span,
}

impl StdoutSink {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    pub fn render(record: &Record) -> Result<String, SinkError> {
        Ok(serde_json::to_string_pretty(record)?)
    }
}

impl Sink for StdoutSink {
    fn store<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            let json = Self::render(record)?;
            {
                // Holding the lock for the whole write keeps concurrent records from interleaving.
                let mut out = std::io::stdout().lock();
                writeln!(out, "{json}")?;
                out.flush()?;
            }
            debug!(parent: &self.span, cluster_id = %record.cluster_id, "record written to stdout");
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use census_report::Extension;

    #[test]
    fn renders_indented_json() {
        let record = Record {
            cluster_id: "cluster".to_string(),
            extensions: vec![Extension::new("k", "v")],
            ..Default::default()
        };
        let rendered = StdoutSink::render(&record).unwrap();
        assert!(rendered.contains("\n  \"clusterID\": \"cluster\""));
        let decoded: Record = serde_json::from_str(&rendered).unwrap();
        assert_eq!(decoded, record);
    }
}
