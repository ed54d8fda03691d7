//! # Census Sink
//!
//! Anything that can durably accept one [`Record`] is a [`Sink`]. Both the
//! volunteer (sending reports) and the collector (storing them) pick their
//! sink at startup from a connection spec string:
//!
//! | spec                                                        | sink                     |
//! |-------------------------------------------------------------|--------------------------|
//! | `stdout`                                                    | pretty JSON on stdout    |
//! | `http://host[:port]`, `https://host[:port]`                 | POST to a collector      |
//! | `clickhouse://[user[:password]@]host[:port]/database.table` | streaming warehouse insert |
//!
//! Selection walks [`SINKS`] in order and the first recognizer that claims the
//! spec builds the sink. A spec nobody claims is a configuration error.

#[macro_use]
extern crate tracing;

mod http;
mod stdout;
mod warehouse;

use census_report::Record;
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    time::Duration,
};
use tracing::Span;

pub use http::{
    HttpSink,
    STATS_PATH,
};
pub use stdout::StdoutSink;
pub use warehouse::{
    ClickHouseNode,
    ClickHouseRecordRow,
    ClickHouseSink,
    ClickHouseSpec,
};

/// Durably accept one record, or fail.
///
/// Implementations are shared between concurrent requests on the collector,
/// so `store` must be safe to call from many tasks at once. A failed write
/// must surface as an error, never as a logged success.
pub trait Sink: Send + Sync {
    fn store<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, Result<(), SinkError>>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("unknown sink spec: {0:?}")]
    UnknownSpec(String),
    #[error("invalid {sink} spec {spec:?}: {reason}")]
    InvalidSpec {
        sink: &'static str,
        spec: String,
        reason: String,
    },
    #[error("unable to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed writing record: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("received unexpected HTTP response code {0}")]
    UnexpectedStatus(reqwest::StatusCode),
    #[error("clickhouse insert failed: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),
    #[error("{0}")]
    Other(eyre::Report),
}

impl SinkError {
    pub(crate) fn invalid_spec(sink: &'static str, spec: &str, reason: impl ToString) -> Self {
        Self::InvalidSpec {
            sink,
            spec: spec.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// What every sink factory gets handed besides the spec itself.
#[derive(Debug, Clone)]
pub struct SinkContext {
    /// Logger handle; the sink's events are recorded inside this span.
    pub span: Span,
    /// Upper bound for a whole outbound HTTP store call.
    pub http_timeout: Duration,
}

impl Default for SinkContext {
    fn default() -> Self {
        Self {
            span: info_span!("sink"),
            http_timeout: Duration::from_secs(30),
        }
    }
}

/// A recognizer/factory pair for one sink implementation.
pub struct SinkPlugin {
    pub name: &'static str,
    pub example_spec: &'static str,
    pub recognizes: fn(&str) -> bool,
    pub build: fn(&str, &SinkContext) -> Result<Arc<dyn Sink>, SinkError>,
}

/// All known sinks, in the order their recognizers are tried.
pub const SINKS: &[SinkPlugin] = &[stdout::PLUGIN, http::PLUGIN, warehouse::PLUGIN];

/// Build the sink that claims `spec`.
pub fn from_spec(spec: &str, context: &SinkContext) -> Result<Arc<dyn Sink>, SinkError> {
    let spec = spec.trim();
    let plugin = SINKS
        .iter()
        .find(|plugin| (plugin.recognizes)(spec))
        .ok_or_else(|| SinkError::UnknownSpec(spec.to_string()))?;

    let sink = (plugin.build)(spec, context)?;
    info!(parent: &context.span, sink = plugin.name, "using {} sink", plugin.name);
    Ok(sink)
}

/// One `name: "example"` line per known sink, sorted by name.
pub fn sink_options() -> Vec<String> {
    let mut options: Vec<String> = SINKS
        .iter()
        .map(|plugin| format!("{}: {:?}", plugin.name, plugin.example_spec))
        .collect();
    options.sort();
    options
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn picks_sink_by_spec() {
        let context = SinkContext::default();
        assert_eq!(from_spec("stdout", &context).unwrap().name(), "stdout");
        assert_eq!(from_spec("http://localhost:8080", &context).unwrap().name(), "http");
        assert_eq!(from_spec("https://census.example.com", &context).unwrap().name(), "http");
        assert_eq!(
            from_spec("clickhouse://localhost/census.records", &context)
                .unwrap()
                .name(),
            "clickhouse"
        );
    }

    #[test]
    fn unknown_spec_is_rejected() {
        let context = SinkContext::default();
        for spec in ["", "stdout2", "ftp://example.com", "bigquery://p.d.t"] {
            match from_spec(spec, &context) {
                Err(SinkError::UnknownSpec(s)) => assert_eq!(s, spec),
                Err(e) => panic!("unexpected error for {spec:?}: {e}"),
                Ok(sink) => panic!("spec {spec:?} unexpectedly claimed by {}", sink.name()),
            }
        }
    }

    #[test]
    fn claimed_but_malformed_spec_is_an_error() {
        let context = SinkContext::default();
        assert!(matches!(
            from_spec("clickhouse://localhost/no-table", &context),
            Err(SinkError::InvalidSpec { sink: "clickhouse", .. })
        ));
        assert!(matches!(
            from_spec("http://", &context),
            Err(SinkError::InvalidSpec { sink: "http", .. })
        ));
    }

    #[test]
    fn lists_every_sink() {
        let options = sink_options();
        assert_eq!(options.len(), SINKS.len());
        assert!(options.iter().any(|o| o.starts_with("stdout: ")));
        assert!(options.windows(2).all(|w| w[0] <= w[1]));
    }
}
