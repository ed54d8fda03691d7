use color_eyre::Result;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

const CRATES: &[&str] = &[
    "census",
    "census_collector",
    "census_config",
    "census_sink",
    "census_volunteer",
];

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

/// `RUST_LOG` wins when set. Otherwise `verbosity` raises our own crates to
/// `debug` (1) or `trace` (2+). Logs go to stderr; stdout belongs to the
/// stdout sink.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directives(verbosity)))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}

fn default_directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => return "info".to_string(),
        1 => "debug",
        _ => "trace",
    };
    let mut directives = vec!["info".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{krate}={level}")));
    directives.join(",")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_only_affects_our_crates() {
        assert_eq!(default_directives(0), "info");
        let debug = default_directives(1);
        assert!(debug.starts_with("info,"));
        assert!(debug.contains("census_sink=debug"));
        assert!(default_directives(3).contains("census_collector=trace"));
        for verbosity in 0..3 {
            EnvFilter::try_new(default_directives(verbosity)).unwrap();
        }
    }
}
