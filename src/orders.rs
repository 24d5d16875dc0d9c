// src/orders.rs - Append-only log of placed orders

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cart::CartItem;
use crate::config::CheckoutConfig;
use crate::error::Result;
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::storage::KvStore;
use crate::types::{OrderId, ProductId};
use crate::utils::{IdSource, Time};

/// Storage key for the order log.
pub const ORDERS_KEY: &str = "orders";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
}

/// Value snapshot of one purchased line. Price, name and images are copied
/// at placement time and never track the live product again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetails {
    pub id: ProductId,
    pub name: String,
    pub images: Vec<String>,
    pub price: f64,
    pub quantity: u32,
    pub seller_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItemDetails>,
    pub total: f64,
    pub date: String,
    pub shipping_info: ShippingInfo,
}

/// One seller's share of a placed order: only that seller's lines, with
/// their subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOrderView {
    pub order_id: OrderId,
    pub date: String,
    pub items: Vec<OrderItemDetails>,
    pub subtotal: f64,
}

/// Owns the placed-order log. Orders are append-only; nothing here mutates
/// or deletes one after it is written.
#[derive(Debug)]
pub struct OrderManager {
    state: ManagedState,
    kv: KvStore,
    config: CheckoutConfig,
    ids: IdSource,
    orders: RwLock<Vec<Order>>,
}

impl OrderManager {
    pub fn new(kv: KvStore, config: CheckoutConfig) -> Self {
        Self {
            state: ManagedState::new("order_manager"),
            kv,
            config,
            ids: IdSource::new(),
            orders: RwLock::new(Vec::new()),
        }
    }

    /// Places an order for the given lines. Each line is snapshotted into
    /// `OrderItemDetails` with its price captured as of now, the configured
    /// processing delay is awaited, and the order is appended and
    /// persisted. Callers ensure `items` is non-empty. Once the delay has
    /// begun the placement cannot be cancelled.
    pub async fn place_order(&self, items: &[CartItem], shipping: ShippingInfo) -> Order {
        let lines: Vec<OrderItemDetails> = items
            .iter()
            .map(|item| OrderItemDetails {
                id: item.product.id,
                name: item.product.name.clone(),
                images: item.product.images.clone(),
                price: item.product.price,
                quantity: item.quantity,
                seller_email: item.product.seller_email.clone(),
            })
            .collect();
        let total = lines
            .iter()
            .map(|line| line.price * f64::from(line.quantity))
            .sum();

        // Simulated payment processing.
        let delay = self.config.processing_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let order = Order {
            id: self.ids.next().to_string(),
            items: lines,
            total,
            date: Time::iso_now(),
            shipping_info: shipping,
        };

        self.orders.write().await.push(order.clone());
        self.persist().await;

        tracing::info!(
            order_id = %order.id,
            total = order.total,
            lines = order.items.len(),
            "order placed"
        );
        order
    }

    /// Every order in this profile, oldest first. Orders carry no buyer
    /// identity, so there is no per-customer filtering here; a caller
    /// showing "my orders" is showing all of them.
    pub async fn all(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Order> {
        self.orders.read().await.iter().find(|o| o.id == id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Orders containing lines sold by `seller_email`, reduced to those
    /// lines. Sellers see their share of a mixed order, not the whole of it.
    pub async fn for_seller(&self, seller_email: &str) -> Vec<SellerOrderView> {
        self.orders
            .read()
            .await
            .iter()
            .filter_map(|order| {
                let items: Vec<OrderItemDetails> = order
                    .items
                    .iter()
                    .filter(|line| line.seller_email == seller_email)
                    .cloned()
                    .collect();
                if items.is_empty() {
                    return None;
                }
                let subtotal = items
                    .iter()
                    .map(|line| line.price * f64::from(line.quantity))
                    .sum();
                Some(SellerOrderView {
                    order_id: order.id.clone(),
                    date: order.date.clone(),
                    items,
                    subtotal,
                })
            })
            .collect()
    }

    async fn persist(&self) {
        let snapshot = self.orders.read().await.clone();
        if let Err(e) = self.kv.write(ORDERS_KEY, &snapshot).await {
            tracing::warn!(error = %e, "failed to persist orders");
        }
    }
}

#[async_trait::async_trait]
impl Manager for OrderManager {
    fn name(&self) -> &str {
        "order_manager"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        let orders: Vec<Order> = self.kv.read(ORDERS_KEY, Vec::new()).await;
        tracing::debug!(orders = orders.len(), "order log loaded");
        *self.orders.write().await = orders;

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
        status.add_metadata("orders", serde_json::Value::from(self.count().await));
        status
    }
}
