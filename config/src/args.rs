use std::{
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};
use url::Url;

/// Overrides for the `volunteer` section.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct VolunteerArgs {
    /// Stable identifier of the reporting cluster. Must not contain personal data.
    #[arg(long, env = "CENSUS_CLUSTER_ID", value_name = "ID")]
    pub cluster_id: Option<String>,

    /// Time between reports (e.g. "24h", "30m"). "0s" sends one report and exits.
    #[arg(long, env = "CENSUS_PERIOD", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub period: Option<Duration>,

    /// Where reports go: a collector URL, "stdout" or a warehouse spec.
    #[arg(long, env = "CENSUS_VOLUNTEER_SINK", value_name = "SPEC")]
    pub sink: Option<String>,

    /// JSON file, or directory of JSON files, with extra key/value metrics.
    #[arg(long, env = "CENSUS_EXTENSIONS", value_name = "PATH")]
    pub extensions: Option<PathBuf>,

    /// Upper bound for one outbound HTTP call.
    #[arg(long, env = "CENSUS_HTTP_TIMEOUT", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub http_timeout: Option<Duration>,

    /// Kubernetes API address, instead of the in-cluster service address.
    #[arg(long, env = "CENSUS_KUBERNETES_API", value_name = "URL")]
    pub kubernetes_api: Option<Url>,
}

/// Overrides for the `collector` section.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CollectorArgs {
    /// Address to listen on.
    #[arg(long, env = "CENSUS_LISTEN_ADDRESS", value_name = "ADDRESS")]
    pub listen_address: Option<SocketAddr>,

    /// Where received records are stored: "stdout" or a warehouse spec.
    #[arg(long, env = "CENSUS_COLLECTOR_SINK", value_name = "SPEC")]
    pub sink: Option<String>,

    /// Largest accepted request body.
    #[arg(long, env = "CENSUS_MAX_BODY_BYTES", value_name = "BYTES")]
    pub max_body_bytes: Option<usize>,

    /// How long a client may take to send its request body.
    #[arg(long, env = "CENSUS_READ_TIMEOUT", value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub read_timeout: Option<Duration>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    fn duration_value(duration: &Duration) -> Value {
        humantime::format_duration(*duration).to_string().into()
    }

    impl Source for VolunteerArgs {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(cluster_id) = &self.cluster_id {
                cache.insert("volunteer.cluster_id".to_string(), cluster_id.clone().into());
            }
            if let Some(period) = &self.period {
                cache.insert("volunteer.period".to_string(), duration_value(period));
            }
            if let Some(sink) = &self.sink {
                cache.insert("volunteer.sink".to_string(), sink.clone().into());
            }
            if let Some(extensions) = &self.extensions {
                cache.insert(
                    "volunteer.extensions".to_string(),
                    extensions.display().to_string().into(),
                );
            }
            if let Some(http_timeout) = &self.http_timeout {
                cache.insert("volunteer.http_timeout".to_string(), duration_value(http_timeout));
            }
            if let Some(api) = &self.kubernetes_api {
                cache.insert("volunteer.kubernetes_api".to_string(), api.to_string().into());
            }
            Ok(cache)
        }
    }

    impl Source for CollectorArgs {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(address) = &self.listen_address {
                cache.insert("collector.listen_address".to_string(), address.to_string().into());
            }
            if let Some(sink) = &self.sink {
                cache.insert("collector.sink".to_string(), sink.clone().into());
            }
            if let Some(max_body_bytes) = self.max_body_bytes {
                cache.insert("collector.max_body_bytes".to_string(), (max_body_bytes as u64).into());
            }
            if let Some(read_timeout) = &self.read_timeout {
                cache.insert("collector.read_timeout".to_string(), duration_value(read_timeout));
            }
            Ok(cache)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;
    use config::Source as _;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        volunteer: VolunteerArgs,
    }

    #[test]
    fn only_given_args_become_overrides() {
        let cli = TestCli::try_parse_from(["census", "--cluster-id", "abc", "--period", "1h 30m"]).unwrap();
        let map = cli.volunteer.collect().unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map["volunteer.cluster_id"].clone().into_string().unwrap(), "abc");
        assert_eq!(map["volunteer.period"].clone().into_string().unwrap(), "1h 30m");
    }

    #[test]
    fn sink_env_vars_are_per_command() {
        use clap::CommandFactory as _;

        #[derive(Parser)]
        struct CollectorCli {
            #[command(flatten)]
            collector: CollectorArgs,
        }

        let env_of = |command: clap::Command| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == "sink")
                .and_then(|arg| arg.get_env())
                .map(|env| env.to_string_lossy().into_owned())
        };
        assert_eq!(env_of(TestCli::command()).as_deref(), Some("CENSUS_VOLUNTEER_SINK"));
        assert_eq!(env_of(CollectorCli::command()).as_deref(), Some("CENSUS_COLLECTOR_SINK"));
    }

    #[test]
    fn rejects_malformed_duration() {
        assert!(TestCli::try_parse_from(["census", "--period", "soon"]).is_err());
    }

    #[test]
    fn collector_args_use_collector_section() {
        let args = CollectorArgs {
            listen_address: Some("127.0.0.1:9000".parse().unwrap()),
            max_body_bytes: Some(512),
            ..Default::default()
        };
        let map = args.collect().unwrap();
        assert_eq!(
            map["collector.listen_address"].clone().into_string().unwrap(),
            "127.0.0.1:9000"
        );
        assert_eq!(map["collector.max_body_bytes"].clone().into_int().unwrap(), 512);
        assert!(!map.contains_key("collector.sink"));
    }
}
