//! Command-line arguments for the relay binary.
//!
//! Flags override values from the optional configuration file, which in
//! turn overrides the built-in defaults.

use crate::config::{ConfigError, RelayConfig};
use clap::Parser;
use std::path::PathBuf;

/// Relay parcel tracking lookups to the carrier and localise the result.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "parcel-relay")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Serve on the default address:\n",
    "    $ parcel-relay\n\n",
    "  Serve with a configuration file and a shorter upstream timeout:\n",
    "    $ parcel-relay --config relay.toml --timeout 5\n\n",
    "  Query the relay:\n",
    "    $ curl 'http://localhost:8080/?tracking=TBA123456789&json=1'\n\n",
    "Set RUST_LOG=debug to trace upstream calls.",
))]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Listen address [default: 0.0.0.0:8080].
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Upstream request timeout in seconds [default: 15].
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Loads the configuration file, if any, and applies flag overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration file cannot be read
    /// or parsed.
    pub fn resolve_config(&self) -> Result<RelayConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)?,
            None => RelayConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.bind.clone_from(bind);
        }
        if let Some(secs) = self.timeout {
            config.upstream.timeout_secs = secs;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[rstest]
    fn parses_defaults() {
        let cli = Cli::parse_from(["parcel-relay"]);

        assert!(cli.config.is_none());
        assert!(cli.bind.is_none());
        assert!(cli.timeout.is_none());
    }

    #[rstest]
    fn parses_all_flags() {
        let cli = Cli::parse_from([
            "parcel-relay",
            "--config",
            "relay.toml",
            "-b",
            "127.0.0.1:9000",
            "--timeout",
            "5",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("relay.toml")));
        assert_eq!(cli.bind.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(cli.timeout, Some(5));
    }

    #[rstest]
    fn rejects_non_numeric_timeout() {
        let result = Cli::try_parse_from(["parcel-relay", "--timeout", "soon"]);

        assert!(result.is_err());
    }

    #[rstest]
    fn flags_override_file_values() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "bind = \"127.0.0.1:7000\"\n\n[upstream]\ntimeout_secs = 30"
        )
        .expect("write config");
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            timeout: Some(3),
            ..Cli::default()
        };

        let config = cli.resolve_config().expect("config resolves");

        assert_eq!(config.bind, "127.0.0.1:7000");
        assert_eq!(config.upstream.timeout_secs, 3);
    }

    #[rstest]
    fn missing_file_is_reported() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/parcel-relay.toml")),
            ..Cli::default()
        };

        let err = cli.resolve_config().expect_err("must fail");

        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
