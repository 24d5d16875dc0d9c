// src/logging.rs - Tracing setup driven by LoggingConfig

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};
use uuid::Uuid;

use crate::config::{FileLogConfig, LogFormat, LoggingConfig};
use crate::error::{Result, ResultExt};
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};

type BaseSubscriber = Layered<EnvFilter, Registry>;

/// Installs the global tracing subscriber: an env-filtered console layer
/// plus an optional non-blocking file layer.
#[derive(Debug)]
pub struct LoggingManager {
    state: ManagedState,
    config: LoggingConfig,
    /// Flushes buffered file output when dropped.
    guard: Option<WorkerGuard>,
}

impl LoggingManager {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            state: ManagedState::new("logging_manager"),
            config,
            guard: None,
        }
    }

    fn install(&mut self) {
        // RUST_LOG wins over the configured level when both are set.
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        let mut layers: Vec<Box<dyn Layer<BaseSubscriber> + Send + Sync>> = Vec::new();
        if self.config.console.enabled {
            layers.push(self.console_layer());
        }
        if let Some(file) = self.config.file.clone() {
            layers.push(self.file_layer(&file));
        }

        // An embedding application may already have a subscriber installed;
        // its choice wins and ours is discarded.
        let _ = Registry::default().with(filter).with(layers).try_init();
    }

    fn console_layer(&self) -> Box<dyn Layer<BaseSubscriber> + Send + Sync> {
        let colored = self.config.console.colored;
        match self.config.format {
            LogFormat::Json => fmt::layer().json().with_ansi(false).boxed(),
            LogFormat::Pretty => fmt::layer().with_ansi(colored).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_ansi(colored).boxed(),
        }
    }

    fn file_layer(&mut self, file: &FileLogConfig) -> Box<dyn Layer<BaseSubscriber> + Send + Sync> {
        let dir = file
            .path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let name = file
            .path
            .file_name()
            .map_or_else(|| "shoplite.log".into(), ToOwned::to_owned);

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
        self.guard = Some(guard);

        match self.config.format {
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
            LogFormat::Pretty => fmt::layer().with_ansi(false).with_writer(writer).boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        }
    }
}

#[async_trait::async_trait]
impl Manager for LoggingManager {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        if let Some(parent) = self.config.file.as_ref().and_then(|f| f.path.parent()) {
            let parent = parent.to_path_buf();
            tokio::fs::create_dir_all(&parent)
                .await
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        self.install();

        self.state.set_state(ManagerState::Running).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::ShuttingDown).await;
        self.guard.take();
        self.state.set_state(ManagerState::Shutdown).await;
        Ok(())
    }

    async fn status(&self) -> ManagerStatus {
        let mut status = self.state.status().await;
        status.add_metadata("level", serde_json::Value::String(self.config.level.clone()));
        status.add_metadata(
            "console",
            serde_json::Value::Bool(self.config.console.enabled),
        );
        status.add_metadata("file", serde_json::Value::Bool(self.config.file.is_some()));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleLogConfig;
    use crate::manager::HealthStatus;

    fn quiet_config() -> LoggingConfig {
        LoggingConfig {
            console: ConsoleLogConfig {
                enabled: false,
                colored: false,
            },
            ..LoggingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_and_shutdown() {
        let mut manager = LoggingManager::new(quiet_config());
        manager.initialize().await.unwrap();
        assert_eq!(manager.health_check().await, HealthStatus::Healthy);

        let status = manager.status().await;
        assert_eq!(
            status.metadata.get("console"),
            Some(&serde_json::Value::Bool(false))
        );

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_second_instance_tolerates_installed_subscriber() {
        let mut first = LoggingManager::new(quiet_config());
        first.initialize().await.unwrap();

        let mut second = LoggingManager::new(quiet_config());
        assert!(second.initialize().await.is_ok());
    }

    #[tokio::test]
    async fn test_file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = quiet_config();
        config.file = Some(FileLogConfig {
            path: dir.path().join("logs").join("engine.log"),
        });

        let mut manager = LoggingManager::new(config);
        manager.initialize().await.unwrap();
        assert!(dir.path().join("logs").is_dir());
        assert!(manager.guard.is_some());
        manager.shutdown().await.unwrap();
        assert!(manager.guard.is_none());
    }
}
