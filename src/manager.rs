// src/manager.rs - Lifecycle contract shared by the engine's stores

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::types::Metadata;

/// Where a manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    Created,
    Initializing,
    Running,
    ShuttingDown,
    Shutdown,
    Error,
}

impl ManagerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Shutdown => "shutdown",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time snapshot of one manager, as reported by `Manager::status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerStatus {
    pub id: Uuid,
    pub name: String,
    pub state: ManagerState,
    pub health: HealthStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    /// Manager-specific counters (collection sizes, session identity).
    pub metadata: Metadata,
}

impl ManagerStatus {
    fn new(id: Uuid, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            state: ManagerState::Created,
            health: HealthStatus::Unknown,
            started_at: None,
            last_updated: Utc::now(),
            metadata: Metadata::new(),
        }
    }

    fn transition(&mut self, state: ManagerState) {
        if state == ManagerState::Running && self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        self.state = state;
        self.last_updated = Utc::now();
    }

    /// Attaches a manager-specific counter or label.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
        self.last_updated = Utc::now();
    }
}

/// The lifecycle every store implements. `initialize` loads persisted state,
/// `shutdown` releases whatever the manager holds, and `status` reports a
/// snapshot with collection sizes in its metadata.
#[async_trait::async_trait]
pub trait Manager: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn id(&self) -> Uuid;

    async fn initialize(&mut self) -> Result<()>;

    async fn shutdown(&mut self) -> Result<()>;

    async fn status(&self) -> ManagerStatus;

    /// Health derived from the lifecycle state unless a manager overrides it.
    async fn health_check(&self) -> HealthStatus {
        match self.status().await.state {
            ManagerState::Running => HealthStatus::Healthy,
            ManagerState::Error => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }

    async fn restart(&mut self) -> Result<()> {
        self.shutdown().await?;
        self.initialize().await
    }
}

/// Identity plus status bookkeeping, embedded by every manager so the
/// `Manager` impls stay small.
pub struct ManagedState {
    id: Uuid,
    name: &'static str,
    status: RwLock<ManagerStatus>,
}

impl ManagedState {
    pub fn new(name: &'static str) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            name,
            status: RwLock::new(ManagerStatus::new(id, name)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn set_state(&self, state: ManagerState) {
        self.status.write().await.transition(state);
    }

    pub async fn set_health(&self, health: HealthStatus) {
        let mut status = self.status.write().await;
        status.health = health;
        status.last_updated = Utc::now();
    }

    pub async fn add_metadata(&self, key: impl Into<String>, value: serde_json::Value) {
        self.status.write().await.add_metadata(key, value);
    }

    pub async fn status(&self) -> ManagerStatus {
        self.status.read().await.clone()
    }

    pub async fn state(&self) -> ManagerState {
        self.status.read().await.state
    }
}

impl fmt::Debug for ManagedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManagedState({}, {})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CounterManager {
        state: ManagedState,
        ticks: u32,
    }

    impl CounterManager {
        fn new() -> Self {
            Self {
                state: ManagedState::new("counter_manager"),
                ticks: 0,
            }
        }
    }

    #[async_trait::async_trait]
    impl Manager for CounterManager {
        fn name(&self) -> &str {
            self.state.name()
        }

        fn id(&self) -> Uuid {
            self.state.id()
        }

        async fn initialize(&mut self) -> Result<()> {
            self.ticks += 1;
            self.state.set_state(ManagerState::Running).await;
            Ok(())
        }

        async fn shutdown(&mut self) -> Result<()> {
            self.state.set_state(ManagerState::Shutdown).await;
            Ok(())
        }

        async fn status(&self) -> ManagerStatus {
            let mut status = self.state.status().await;
            status.add_metadata("ticks", serde_json::Value::from(self.ticks));
            status
        }
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let mut manager = CounterManager::new();
        assert_eq!(manager.state.state().await, ManagerState::Created);
        assert_eq!(manager.health_check().await, HealthStatus::Unknown);

        manager.initialize().await.unwrap();
        assert_eq!(manager.state.state().await, ManagerState::Running);
        assert_eq!(manager.health_check().await, HealthStatus::Healthy);
        assert!(manager.status().await.started_at.is_some());

        manager.shutdown().await.unwrap();
        assert_eq!(manager.state.state().await, ManagerState::Shutdown);
    }

    #[tokio::test]
    async fn test_restart_runs_initialize_again() {
        let mut manager = CounterManager::new();
        manager.initialize().await.unwrap();
        manager.restart().await.unwrap();

        assert_eq!(manager.ticks, 2);
        assert_eq!(manager.state.state().await, ManagerState::Running);
    }

    #[tokio::test]
    async fn test_status_carries_metadata() {
        let manager = CounterManager::new();
        let status = manager.status().await;
        assert_eq!(status.name, "counter_manager");
        assert_eq!(status.metadata.get("ticks"), Some(&serde_json::Value::from(0)));
    }

    #[test]
    fn test_states_render_lowercase() {
        assert_eq!(ManagerState::ShuttingDown.to_string(), "shutting_down");
        assert_eq!(HealthStatus::Degraded.to_string(), "degraded");
    }
}
