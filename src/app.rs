// src/app.rs - Application core wiring the stores to a storage backend

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountManager;
use crate::cart::CartManager;
use crate::catalog::{CatalogManager, Product};
use crate::config::{AppConfig, StorageBackend};
use crate::error::{Error, ManagerOperation, Result};
use crate::logging::LoggingManager;
use crate::manager::{HealthStatus, Manager};
use crate::orders::{Order, OrderManager, ShippingInfo};
use crate::storage::{FileStorage, KvStore, MemoryStorage, StorageArc};
use crate::utils::Time;
use crate::wishlist::WishlistManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationState {
    Created,
    Initializing,
    Running,
    ShuttingDown,
    Shutdown,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationHealth {
    pub status: HealthStatus,
    pub managers: HashMap<String, HealthStatus>,
    pub last_check: DateTime<Utc>,
}

/// Owns every store and the shared storage backend. Construction is cheap;
/// `initialize` loads persisted state in dependency order and `shutdown`
/// unwinds it in reverse.
#[derive(Debug)]
pub struct ApplicationCore {
    config: AppConfig,
    state: ApplicationState,
    started_at: Option<DateTime<Utc>>,
    kv: KvStore,
    logging: LoggingManager,
    account: AccountManager,
    catalog: CatalogManager,
    cart: CartManager,
    wishlist: WishlistManager,
    orders: OrderManager,
}

impl ApplicationCore {
    pub fn new(config: AppConfig) -> Self {
        let backend: StorageArc = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
            StorageBackend::File => Arc::new(FileStorage::new(config.storage.data_dir())),
        };
        let kv = KvStore::new(backend);

        Self {
            logging: LoggingManager::new(config.logging.clone()),
            account: AccountManager::new(kv.clone(), config.seed.demo_data),
            catalog: CatalogManager::new(kv.clone(), config.seed.demo_data),
            cart: CartManager::new(),
            wishlist: WishlistManager::new(),
            orders: OrderManager::new(kv.clone(), config.checkout.clone()),
            kv,
            config,
            state: ApplicationState::Created,
            started_at: None,
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        self.state = ApplicationState::Initializing;

        if let Err(e) = self.initialize_managers().await {
            self.state = ApplicationState::Error;
            return Err(e);
        }

        self.state = ApplicationState::Running;
        self.started_at = Some(Time::now());
        tracing::info!(version = crate::VERSION, "storefront engine running");
        Ok(())
    }

    /// Every manager in dependency order: logging first so the others can
    /// report, stores afterwards.
    fn managers_mut(&mut self) -> [&mut dyn Manager; 6] {
        [
            &mut self.logging,
            &mut self.account,
            &mut self.catalog,
            &mut self.cart,
            &mut self.wishlist,
            &mut self.orders,
        ]
    }

    fn managers(&self) -> [&dyn Manager; 6] {
        [
            &self.logging,
            &self.account,
            &self.catalog,
            &self.cart,
            &self.wishlist,
            &self.orders,
        ]
    }

    async fn initialize_managers(&mut self) -> Result<()> {
        for manager in self.managers_mut() {
            manager.initialize().await.map_err(|e| {
                Error::manager(
                    manager.name().to_string(),
                    ManagerOperation::Initialize,
                    e.message.clone(),
                )
                .caused_by(e)
            })?;
        }
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.state = ApplicationState::ShuttingDown;
        tracing::info!("storefront engine shutting down");

        for manager in self.managers_mut().into_iter().rev() {
            manager.shutdown().await.map_err(|e| {
                Error::manager(
                    manager.name().to_string(),
                    ManagerOperation::Shutdown,
                    e.message.clone(),
                )
                .caused_by(e)
            })?;
        }

        self.state = ApplicationState::Shutdown;
        Ok(())
    }

    /// Health across every manager; the worst individual state wins.
    pub async fn health(&self) -> ApplicationHealth {
        let mut managers = HashMap::new();
        for manager in self.managers() {
            managers.insert(manager.name().to_string(), manager.health_check().await);
        }

        let status = if managers.values().any(|h| *h == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if managers.values().all(|h| *h == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        ApplicationHealth {
            status,
            managers,
            last_check: Time::now(),
        }
    }

    /// Checkout: snapshot the cart into a placed order, then clear the
    /// cart. These are two independent store writes with no transaction
    /// spanning them. Returns `None` when the cart is empty.
    pub async fn checkout(&self, shipping: ShippingInfo) -> Option<Order> {
        let items = self.cart.items().await;
        if items.is_empty() {
            return None;
        }
        let order = self.orders.place_order(&items, shipping).await;
        self.cart.clear().await;
        Some(order)
    }

    /// Buy-now: place an order for a single line directly, leaving the cart
    /// untouched.
    pub async fn buy_now(
        &self,
        product: Product,
        quantity: u32,
        shipping: ShippingInfo,
    ) -> Order {
        let line = crate::cart::CartItem { product, quantity };
        self.orders
            .place_order(std::slice::from_ref(&line), shipping)
            .await
    }

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn kv(&self) -> &KvStore {
        &self.kv
    }

    pub fn account(&self) -> &AccountManager {
        &self.account
    }

    pub fn catalog(&self) -> &CatalogManager {
        &self.catalog
    }

    pub fn cart(&self) -> &CartManager {
        &self.cart
    }

    pub fn wishlist(&self) -> &WishlistManager {
        &self.wishlist
    }

    pub fn orders(&self) -> &OrderManager {
        &self.orders
    }
}
