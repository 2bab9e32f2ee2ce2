use crate::error::{LifecycleError, Result};
use crate::hooks::{HookSet, HookSetBuilder};
use crate::options::Options;
use crate::signal::{Signal, SignalAction};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// File/environment backed worker configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Friendly service name used in log lines
    #[serde(default)]
    pub name: String,

    /// Graceful shutdown budget in milliseconds before termination
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Signals to watch (SIGINT, SIGTERM, SIGHUP, SIGQUIT, SIGUSR1, SIGUSR2)
    #[serde(default = "default_signals")]
    pub signals: Vec<Signal>,

    /// Action taken on signal receipt: "shutdown" or "terminate"
    #[serde(default)]
    pub signal_action: SignalAction,
}

impl WorkerConfig {
    /// Load configuration from a specific file path, layered under
    /// `LIFECYCLE__*` environment variables
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading worker configuration from: {}", path_str);

        let default_signals: Vec<String> = default_signals()
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        let settings = Config::builder()
            .set_default("name", "")?
            .set_default("shutdown_timeout_ms", default_shutdown_timeout_ms())?
            .set_default("signals", default_signals)?
            .set_default("signal_action", SignalAction::default().to_string())?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("LIFECYCLE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("signals")
                    .try_parsing(true),
            )
            .build()?;

        let config: WorkerConfig = settings.try_deserialize()?;
        config.validate()?;

        info!("Worker configuration loaded");
        debug!("Final worker configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.shutdown_timeout_ms == 0 {
            return Err(LifecycleError::config(
                "shutdown_timeout_ms must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Options derived from this configuration. Readiness probe and logger
    /// are left at their defaults.
    pub fn to_options(&self) -> Options {
        Options::default()
            .with_shutdown_timeout(self.shutdown_timeout())
            .with_signals(self.signals.clone())
            .with_signal_action(self.signal_action)
    }

    /// Hook set builder carrying the configured name. Options do not hold
    /// the name; the worker reads it from its hooks.
    pub fn hook_set_builder(&self) -> HookSetBuilder {
        HookSet::builder().name(self.name.clone())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            signals: default_signals(),
            signal_action: SignalAction::default(),
        }
    }
}

fn default_shutdown_timeout_ms() -> u64 {
    15_000
}
fn default_signals() -> Vec<Signal> {
    Signal::defaults()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Worker;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = WorkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(15));
        assert_eq!(config.signals, vec![Signal::Interrupt, Signal::Terminate]);
        assert_eq!(config.signal_action, SignalAction::Shutdown);
    }

    #[test]
    fn test_config_validation() {
        let mut config = WorkerConfig {
            shutdown_timeout_ms: 0,
            ..WorkerConfig::default()
        };
        assert!(config.validate().is_err());

        config.shutdown_timeout_ms = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
name = "api"
shutdown_timeout_ms = 250
signals = ["SIGHUP", "SIGUSR1"]
signal_action = "terminate"
"#
        )
        .unwrap();

        let config = WorkerConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.name, "api");
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(250));
        assert_eq!(config.signals, vec![Signal::Hangup, Signal::User1]);
        assert_eq!(config.signal_action, SignalAction::Terminate);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WorkerConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn test_toml_round_trip_and_options() {
        let config = WorkerConfig {
            name: "db".to_string(),
            shutdown_timeout_ms: 1200,
            signals: vec![Signal::Terminate],
            signal_action: SignalAction::Terminate,
        };
        let rendered = config.to_toml().unwrap();
        let parsed: WorkerConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);

        let options = config.to_options();
        assert_eq!(options.shutdown_timeout, Duration::from_millis(1200));
        assert_eq!(options.signals, vec![Signal::Terminate]);
        assert_eq!(options.signal_action, SignalAction::Terminate);
    }

    #[test]
    fn test_configured_name_reaches_worker() {
        let config = WorkerConfig {
            name: "api".to_string(),
            ..WorkerConfig::default()
        };
        let hooks = config
            .hook_set_builder()
            .start(|_| async { Ok(()) })
            .shutdown(|_| async { Ok(()) })
            .build()
            .unwrap();

        let worker = Worker::with_options(hooks, config.to_options());
        assert_eq!(worker.name(), "api");
    }
}
