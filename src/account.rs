// src/account.rs - Registered users and the current session

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::storage::KvStore;

/// Storage key for the registered-user collection.
pub const USERS_KEY: &str = "users";
/// Storage key for the current session user.
pub const SESSION_KEY: &str = "user";

pub(crate) const DEMO_CUSTOMER: &str = "customer@shoplite.dev";
pub(crate) const DEMO_SELLER: &str = "seller@shoplite.dev";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Seller,
}

/// A registered account. Credentials are stored and compared in plain
/// text; hashing is out of scope for this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: UserRole,
}

/// Owns the registered-user list and the single session user. Session
/// states are guest (no user), authenticated customer, authenticated
/// seller. Business failures are signaled by `None`, never by errors.
#[derive(Debug)]
pub struct AccountManager {
    state: ManagedState,
    kv: KvStore,
    seed: bool,
    users: RwLock<Vec<User>>,
    session: RwLock<Option<User>>,
}

impl AccountManager {
    pub fn new(kv: KvStore, seed: bool) -> Self {
        Self {
            state: ManagedState::new("account_manager"),
            kv,
            seed,
            users: RwLock::new(Vec::new()),
            session: RwLock::new(None),
        }
    }

    /// Registers a new account and opens a session for it. Returns `None`
    /// when the email is already taken; neither the user list nor the
    /// session changes in that case.
    pub async fn signup(&self, email: &str, password: &str, role: UserRole) -> Option<User> {
        let user = {
            let mut users = self.users.write().await;
            if users.iter().any(|u| u.email == email) {
                tracing::debug!(email, "signup rejected, email already registered");
                return None;
            }
            let user = User {
                email: email.to_string(),
                password: Some(password.to_string()),
                role,
            };
            users.push(user.clone());
            user
        };

        let snapshot = self.users.read().await.clone();
        self.persist_users(&snapshot).await;

        *self.session.write().await = Some(user.clone());
        self.persist_session(&user).await;

        tracing::info!(email, role = ?role, "account registered");
        Some(user)
    }

    /// Opens a session for an exact email/password match. An unknown email
    /// and a wrong password both yield the same `None`; the session is
    /// left untouched on failure.
    pub async fn login(&self, email: &str, password: &str) -> Option<User> {
        let found = self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email && u.password.as_deref() == Some(password))
            .cloned();

        match found {
            Some(user) => {
                *self.session.write().await = Some(user.clone());
                self.persist_session(&user).await;
                tracing::info!(email, "session opened");
                Some(user)
            }
            None => {
                tracing::debug!(email, "login failed");
                None
            }
        }
    }

    /// Ends the session; the store returns to the guest state and the
    /// persisted session key is deleted.
    pub async fn logout(&self) {
        *self.session.write().await = None;
        if let Err(e) = self.kv.remove(SESSION_KEY).await {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        tracing::info!("session closed");
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.read().await.clone()
    }

    pub async fn session_role(&self) -> Option<UserRole> {
        self.session.read().await.as_ref().map(|u| u.role)
    }

    /// Whether an account exists for `email`. Callers wanting to tell an
    /// unknown address apart from a bad password check this first; login
    /// itself does not make the distinction.
    pub async fn is_registered(&self, email: &str) -> bool {
        self.users.read().await.iter().any(|u| u.email == email)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    async fn persist_users(&self, users: &[User]) {
        if let Err(e) = self.kv.write(USERS_KEY, users).await {
            tracing::warn!(error = %e, "failed to persist registered users");
        }
    }

    async fn persist_session(&self, user: &User) {
        if let Err(e) = self.kv.write(SESSION_KEY, user).await {
            tracing::warn!(error = %e, "failed to persist session");
        }
    }

    fn demo_users() -> Vec<User> {
        vec![
            User {
                email: DEMO_CUSTOMER.to_string(),
                password: Some("password".to_string()),
                role: UserRole::Customer,
            },
            User {
                email: DEMO_SELLER.to_string(),
                password: Some("password".to_string()),
                role: UserRole::Seller,
            },
        ]
    }
}

#[async_trait::async_trait]
impl Manager for AccountManager {
    fn name(&self) -> &str {
        "account_manager"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        if self.seed && !self.kv.exists(USERS_KEY).await {
            let demo = Self::demo_users();
            if let Err(e) = self.kv.write(USERS_KEY, &demo).await {
                tracing::warn!(error = %e, "failed to seed demo accounts");
            }
        }

        let users: Vec<User> = self.kv.read(USERS_KEY, Vec::new()).await;
        let session: Option<User> = self.kv.read(SESSION_KEY, None).await;

        tracing::debug!(
            registered = users.len(),
            session = session.as_ref().map(|u| u.email.as_str()).unwrap_or("guest"),
            "accounts loaded"
        );

        *self.users.write().await = users;
        *self.session.write().await = session;

        self.state.set_state(ManagerState::Running).await;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::ShuttingDown).await;
        self.state.set_state(ManagerState::Shutdown).await;
        Ok(())
    }

    async fn status(&self) -> ManagerStatus {
        let mut status = self.state.status().await;

        let session = self
            .current_user()
            .await
            .map(|u| u.email)
            .unwrap_or_else(|| "guest".to_string());
        status.add_metadata("session", serde_json::Value::String(session));
        status.add_metadata(
            "registered_users",
            serde_json::Value::from(self.user_count().await),
        );

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn kv() -> KvStore {
        KvStore::new(Arc::new(MemoryStorage::new()))
    }

    async fn running_manager(kv: KvStore) -> AccountManager {
        let mut manager = AccountManager::new(kv, false);
        manager.initialize().await.unwrap();
        manager
    }

    #[tokio::test]
    async fn test_signup_auto_logs_in() {
        let manager = running_manager(kv()).await;

        let user = manager
            .signup("a@example.com", "secret", UserRole::Customer)
            .await;
        assert!(user.is_some());
        assert_eq!(
            manager.current_user().await.map(|u| u.email),
            Some("a@example.com".to_string())
        );
        assert_eq!(manager.session_role().await, Some(UserRole::Customer));
    }

    #[tokio::test]
    async fn test_duplicate_signup_changes_nothing() {
        let manager = running_manager(kv()).await;

        manager
            .signup("a@example.com", "secret", UserRole::Customer)
            .await;
        let second = manager
            .signup("a@example.com", "other", UserRole::Seller)
            .await;

        assert!(second.is_none());
        assert_eq!(manager.user_count().await, 1);
        // Session still belongs to the first signup.
        let session = manager.current_user().await.unwrap();
        assert_eq!(session.role, UserRole::Customer);
        assert_eq!(session.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_login_failure_leaves_session_untouched() {
        let manager = running_manager(kv()).await;
        manager
            .signup("a@example.com", "secret", UserRole::Customer)
            .await;

        assert!(manager.login("nobody@example.com", "whatever").await.is_none());
        assert!(manager.login("a@example.com", "wrong").await.is_none());
        assert_eq!(
            manager.current_user().await.map(|u| u.email),
            Some("a@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_logout_returns_to_guest() {
        let manager = running_manager(kv()).await;
        manager
            .signup("a@example.com", "secret", UserRole::Customer)
            .await;

        manager.logout().await;
        assert!(manager.current_user().await.is_none());
        assert!(manager.session_role().await.is_none());

        let back = manager.login("a@example.com", "secret").await;
        assert!(back.is_some());
    }

    #[tokio::test]
    async fn test_accounts_and_session_survive_restart() {
        let store = kv();
        {
            let manager = running_manager(store.clone()).await;
            manager
                .signup("a@example.com", "secret", UserRole::Seller)
                .await;
        }

        let reopened = running_manager(store).await;
        assert!(reopened.is_registered("a@example.com").await);
        assert_eq!(reopened.session_role().await, Some(UserRole::Seller));
    }

    #[tokio::test]
    async fn test_logout_clears_the_persisted_session() {
        let store = kv();
        {
            let manager = running_manager(store.clone()).await;
            manager
                .signup("a@example.com", "secret", UserRole::Customer)
                .await;
            manager.logout().await;
        }

        let reopened = running_manager(store).await;
        assert!(reopened.current_user().await.is_none());
        assert!(reopened.is_registered("a@example.com").await);
    }

    #[tokio::test]
    async fn test_demo_accounts_seed_once() {
        let store = kv();
        let mut manager = AccountManager::new(store.clone(), true);
        manager.initialize().await.unwrap();
        assert_eq!(manager.user_count().await, 2);
        assert!(manager.login(DEMO_CUSTOMER, "password").await.is_some());

        // A later instance must not re-seed over registered users.
        manager.signup("new@example.com", "pw", UserRole::Customer).await;
        let mut reopened = AccountManager::new(store, true);
        reopened.initialize().await.unwrap();
        assert_eq!(reopened.user_count().await, 3);
    }
}
