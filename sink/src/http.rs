use crate::{
    Sink,
    SinkContext,
    SinkError,
    SinkPlugin,
};
use census_report::Record;
use futures::future::BoxFuture;
use reqwest::{
    Client,
    StatusCode,
};
use std::{
    sync::Arc,
    time::Duration,
};
use tracing::{
    Instrument as _,
    Span,
};
use url::Url;

/// Path, relative to the collector's base URL, that accepts records.
pub const STATS_PATH: &str = "/api/v1/stats";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) const PLUGIN: SinkPlugin = SinkPlugin {
    name: "http",
    example_spec: "https://census.example.com",
    recognizes: |spec| spec.starts_with("http://") || spec.starts_with("https://"),
    build,
};

fn build(spec: &str, context: &SinkContext) -> Result<Arc<dyn Sink>, SinkError> {
    let base = Url::parse(spec).map_err(|e| SinkError::invalid_spec("http", spec, e))?;
    if base.host_str().filter(|h| !h.is_empty()).is_none() {
        return Err(SinkError::invalid_spec("http", spec, "missing host"));
    }
    Ok(Arc::new(HttpSink::new(&base, context.http_timeout, context.span.clone())?))
}

/// POSTs each record as JSON to a collector.
///
/// Only `204 No Content` counts as stored. There is no retry here; a failed
/// store is retried by the caller's next scheduled cycle.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    stats_url: Url,
    span: Span,
}

impl HttpSink {
    pub fn new(base: &Url, timeout: Duration, span: Span) -> Result<Self, SinkError> {
        let stats_url = base
            .join(STATS_PATH)
            .map_err(|e| SinkError::invalid_spec("http", base.as_str(), e))?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .no_gzip()
            .build()?;
        Ok(Self { client, stats_url, span })
    }

    pub fn stats_url(&self) -> &Url {
        &self.stats_url
    }
}

impl Sink for HttpSink {
    fn store<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(
            async move {
                // `json` sets `Content-Type: application/json`.
                let response = self.client.post(self.stats_url.clone()).json(record).send().await?;
                let status = response.status();
                if status != StatusCode::NO_CONTENT {
                    let body = response.text().await.unwrap_or_default();
                    debug!(%status, body = body.trim(), "collector rejected record");
                    return Err(SinkError::UnexpectedStatus(status));
                }
                debug!(url = %self.stats_url, "record accepted by collector");
                Ok(())
            }
            .instrument(self.span.clone()),
        )
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
