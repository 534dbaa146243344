use crate::error::{DashboardError, Result};
use crate::session::SessionStore;
use clap::{Args, Parser, Subcommand};
use prophet_forecast::DEFAULT_MODEL_PATH;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Command line of the dashboard binary
#[derive(Debug, Clone, Parser)]
#[command(name = "ozone-dashboard")]
#[command(
    about = "Ozone (O3) level forecasting dashboard backed by a Prophet model",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the interactive dashboard (default)
    Serve,
    /// Forecast once and write the table as CSV
    Export {
        /// Number of days to forecast
        #[arg(
            short,
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(i64).range(1..)
        )]
        days: i64,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Startup configuration shared by all commands
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Path to the serialized Prophet model
    #[arg(long, env = "OZONE_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Address the dashboard listens on
    #[arg(long, env = "OZONE_BIND", default_value = "127.0.0.1:8501")]
    pub bind: String,

    /// Seed for the uncertainty simulation
    #[arg(long, env = "OZONE_SEED", default_value_t = 0)]
    pub seed: u64,

    /// Seconds of inactivity after which a session is dropped
    #[arg(long, env = "OZONE_SESSION_IDLE_SECS", default_value_t = 1800)]
    pub session_idle_secs: u64,

    /// Maximum number of live sessions
    #[arg(long, env = "OZONE_MAX_SESSIONS", default_value_t = 10_000)]
    pub max_sessions: usize,
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(DashboardError::Config("model path must not be empty".to_string()));
        }
        if self.session_idle_secs == 0 {
            return Err(DashboardError::Config(
                "session idle timeout must be at least one second".to_string(),
            ));
        }
        if self.max_sessions == 0 {
            return Err(DashboardError::Config("max sessions must be at least 1".to_string()));
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Session store with the configured expiry
    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(Duration::from_secs(self.session_idle_secs), self.max_sessions)
    }

    /// Parsed listen address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e| {
            DashboardError::Config(format!("invalid bind address '{}': {}", self.bind, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ozone-dashboard"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config.model_path, PathBuf::from("model_03_prophet.json"));
        assert!(cli.config.validate().is_ok());
    }

    #[test]
    fn test_export_rejects_non_positive_days() {
        assert!(Cli::try_parse_from(["ozone-dashboard", "export", "--days", "0"]).is_err());

        let cli = Cli::try_parse_from(["ozone-dashboard", "export", "--days", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Export { days: 3, output: None })));
    }

    #[test]
    fn test_invalid_bind_address() {
        let cli = Cli::try_parse_from(["ozone-dashboard", "--bind", "not-an-address"]).unwrap();
        assert!(matches!(cli.config.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn test_session_limits() {
        let cli = Cli::try_parse_from(["ozone-dashboard"]).unwrap();
        assert_eq!(cli.config.session_idle_secs, 1800);
        assert_eq!(cli.config.max_sessions, 10_000);

        let cli = Cli::try_parse_from(["ozone-dashboard", "--max-sessions", "0"]).unwrap();
        assert!(matches!(cli.config.validate(), Err(DashboardError::Config(_))));

        let cli =
            Cli::try_parse_from(["ozone-dashboard", "--session-idle-secs", "0"]).unwrap();
        assert!(matches!(cli.config.validate(), Err(DashboardError::Config(_))));
    }
}
