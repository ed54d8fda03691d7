use census_collector::AppState;
use census_config::{
    CollectorArgs,
    CollectorConfig,
    Config,
    VolunteerArgs,
    VolunteerConfig,
};
use census_sink::SinkContext;
use census_volunteer::{
    KubeClient,
    PathExtensionsLister,
    RecordGenerator,
    Volunteer,
};
use clap::{
    Parser,
    Subcommand,
};
use color_eyre::Result;
use eyre::Context as _;
use std::{
    path::PathBuf,
    sync::Arc,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Anonymous cluster usage telemetry.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file, instead of config.yaml in the config directory.
    #[arg(long, global = true, env = "CENSUS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log more. Repeat for trace output. RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive records over HTTP and store them in a sink.
    Collector(CollectorArgs),
    /// Periodically report on the cluster this runs in.
    Volunteer(VolunteerArgs),
    /// List the available sinks with an example spec each.
    Sinks,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Sinks => {
                for option in census_sink::sink_options() {
                    println!("{option}");
                }
                Ok(())
            }
            Command::Collector(args) => {
                let config = Config::load(self.config.as_deref(), args).wrap_err("invalid configuration")?;
                run_collector(config.collector).await
            }
            Command::Volunteer(args) => {
                let config = Config::load(self.config.as_deref(), args).wrap_err("invalid configuration")?;
                run_volunteer(config.volunteer).await
            }
        }
    }
}

async fn run_collector(config: CollectorConfig) -> Result<()> {
    config.validate()?;
    let span = info_span!("collector");
    let sink = census_sink::from_spec(
        &config.sink,
        &SinkContext {
            span: span.clone(),
            ..Default::default()
        },
    )?;

    let listener = TcpListener::bind(config.listen_address)
        .await
        .wrap_err_with(|| format!("unable to listen on {}", config.listen_address))?;
    let state = AppState {
        sink,
        max_body_bytes: config.max_body_bytes,
        read_timeout: config.read_timeout,
        span,
    };
    census_collector::serve(listener, state, shutdown_on_signal()).await
}

async fn run_volunteer(config: VolunteerConfig) -> Result<()> {
    config.validate()?;
    let span = info_span!("volunteer", cluster_id = %config.cluster_id);
    let sink = census_sink::from_spec(
        &config.sink,
        &SinkContext {
            span: span.clone(),
            http_timeout: config.http_timeout,
        },
    )?;

    let kube = Arc::new(
        KubeClient::connect(config.kubernetes_api.clone(), config.http_timeout)
            .wrap_err("unable to set up Kubernetes client")?,
    );
    let extensions = Arc::new(PathExtensionsLister::new(config.extensions.clone()));
    let generator = RecordGenerator::new(config.cluster_id, kube.clone(), kube, extensions, span.clone());

    Volunteer::new(generator, sink, config.period, span)
        .run(shutdown_on_signal())
        .await;
    Ok(())
}

/// Cancelled on the first SIGINT or SIGTERM.
fn shutdown_on_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("received shutdown signal");
        cancel.cancel();
    });
    token
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{
            signal,
            SignalKind,
        };
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                warn!(%err, "unable to listen for SIGTERM");
                ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory as _;
    use std::time::Duration;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_volunteer_invocation() {
        let cli = Cli::try_parse_from([
            "census",
            "volunteer",
            "--cluster-id",
            "c1",
            "--period",
            "0s",
            "--sink",
            "stdout",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Volunteer(args) = cli.command else {
            panic!("expected the volunteer command");
        };
        assert_eq!(args.cluster_id.as_deref(), Some("c1"));
        assert_eq!(args.period, Some(Duration::ZERO));
        assert_eq!(args.sink.as_deref(), Some("stdout"));
    }

    #[test]
    fn parses_collector_invocation() {
        let cli = Cli::try_parse_from([
            "census",
            "--config",
            "/etc/census.yaml",
            "collector",
            "--listen-address",
            "127.0.0.1:9000",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/census.yaml")));
        let Command::Collector(args) = cli.command else {
            panic!("expected the collector command");
        };
        assert_eq!(args.listen_address, Some("127.0.0.1:9000".parse().unwrap()));
    }

    #[test]
    fn requires_a_command() {
        assert!(Cli::try_parse_from(["census"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["census", "sinks"]).unwrap().command,
            Command::Sinks
        ));
    }
}
