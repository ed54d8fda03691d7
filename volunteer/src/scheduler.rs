use crate::generator::RecordGenerator;
use census_sink::Sink;
use eyre::{
    Context as _,
    Result,
};
use std::{
    sync::Arc,
    time::Duration,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{
    Instrument as _,
    Span,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// The reporting loop: generate, send, sleep, repeat.
pub struct Volunteer {
    generator: RecordGenerator,
    sink: Arc<dyn Sink>,
    period: Duration,
    state: watch::Sender<SchedulerState>,
    span: Span,
}

impl Volunteer {
    /// A zero `period` sends a single report and stops.
    pub fn new(generator: RecordGenerator, sink: Arc<dyn Sink>, period: Duration, span: Span) -> Self {
        let (state, _) = watch::channel(SchedulerState::Running);
        Self {
            generator,
            sink,
            period,
            state,
            span,
        }
    }

    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Generate one record and hand it to the sink.
    pub async fn run_once(&self) -> Result<()> {
        let record = self.generator.generate().await.wrap_err("failed generating report")?;
        self.sink
            .store(&record)
            .await
            .wrap_err_with(|| format!("failed sending report to {} sink", self.sink.name()))?;
        Ok(())
    }

    /// Runs until cancelled, or after the first cycle in one-shot mode.
    /// A failed cycle is logged and the loop carries on.
    pub async fn run(self, shutdown: CancellationToken) {
        let span = self.span.clone();
        async move {
            info!(period = %humantime::format_duration(self.period), "volunteer started");
            loop {
                match self.run_once().await {
                    Ok(()) => info!("report successfully sent"),
                    Err(err) => error!("{err:?}"),
                }

                if self.period.is_zero() {
                    break;
                }

                debug!("next attempt in {}", humantime::format_duration(self.period));
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        info!("shutdown requested");
                        break;
                    }
                    _ = tokio::time::sleep(self.period) => {}
                }
            }
            self.state.send_replace(SchedulerState::Stopped);
            info!("volunteer stopped");
        }
        .instrument(span)
        .await
    }
}
