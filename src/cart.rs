// src/cart.rs - In-progress purchase lines for the current session

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::Result;
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::types::ProductId;

/// A product snapshot plus the quantity being purchased. At most one line
/// exists per product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

/// Owns the cart lines for the running session. The collection lives in
/// process memory only and is rebuilt per session; it is not persisted.
#[derive(Debug)]
pub struct CartManager {
    state: ManagedState,
    items: RwLock<Vec<CartItem>>,
}

impl CartManager {
    pub fn new() -> Self {
        Self {
            state: ManagedState::new("cart_manager"),
            items: RwLock::new(Vec::new()),
        }
    }

    /// Adds `quantity` of a product: an existing line for the same id has
    /// its quantity increased, otherwise a new line is appended. Quantities
    /// are trusted as given.
    pub async fn add(&self, product: Product, quantity: u32) {
        let product_id = product.id;
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|i| i.product.id == product_id) {
            item.quantity += quantity;
            tracing::debug!(product_id, quantity = item.quantity, "cart line merged");
        } else {
            items.push(CartItem { product, quantity });
            tracing::debug!(product_id, quantity, "cart line added");
        }
    }

    /// Sets the quantity of the line with `id`. A quantity of zero removes
    /// the line. Unknown ids are ignored.
    pub async fn update_quantity(&self, id: ProductId, quantity: u32) {
        let mut items = self.items.write().await;
        if quantity == 0 {
            items.retain(|i| i.product.id != id);
            tracing::debug!(product_id = id, "cart line removed via zero quantity");
            return;
        }
        if let Some(item) = items.iter_mut().find(|i| i.product.id == id) {
            item.quantity = quantity;
        }
    }

    /// Removes the line with `id`. Idempotent.
    pub async fn remove(&self, id: ProductId) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.product.id != id);
        items.len() != before
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
        tracing::debug!("cart cleared");
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.items.read().await.clone()
    }

    pub async fn contains(&self, id: ProductId) -> bool {
        self.items.read().await.iter().any(|i| i.product.id == id)
    }

    /// Sum of quantities across all lines.
    pub async fn item_count(&self) -> u32 {
        self.items.read().await.iter().map(|i| i.quantity).sum()
    }

    /// Sum of price times quantity across all lines.
    pub async fn total(&self) -> f64 {
        self.items
            .read()
            .await
            .iter()
            .map(|i| i.product.price * f64::from(i.quantity))
            .sum()
    }
}

impl Default for CartManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Manager for CartManager {
    fn name(&self) -> &str {
        "cart_manager"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;
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
        status.add_metadata(
            "lines",
            serde_json::Value::from(self.items.read().await.len()),
        );
        status.add_metadata("items", serde_json::Value::from(self.item_count().await));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId, price: f64) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            brand: "Soundline".to_string(),
            category: "Electronics".to_string(),
            price,
            original_price: None,
            description: String::new(),
            images: vec!["https://images.shoplite.dev/p.jpg".to_string()],
            rating: 0.0,
            reviews_count: 0,
            reviews: Vec::new(),
            stock: 5,
            tags: None,
            seller_email: "seller@shoplite.dev".to_string(),
            views: 0,
        }
    }

    #[tokio::test]
    async fn test_adding_same_product_merges_quantities() {
        let cart = CartManager::new();
        cart.add(product(1, 10.0), 2).await;
        cart.add(product(1, 10.0), 3).await;

        let items = cart.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_totals_follow_the_purchase_scenario() {
        let cart = CartManager::new();
        cart.add(product(1, 100.0), 2).await;
        assert_eq!(cart.total().await, 200.0);
        assert_eq!(cart.item_count().await, 2);

        cart.update_quantity(1, 5).await;
        assert_eq!(cart.total().await, 500.0);

        assert!(cart.remove(1).await);
        assert!(cart.items().await.is_empty());
        assert_eq!(cart.total().await, 0.0);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let cart = CartManager::new();
        cart.add(product(1, 10.0), 1).await;

        assert!(cart.remove(1).await);
        assert!(!cart.remove(1).await);
        assert!(cart.items().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_removes_the_line() {
        let cart = CartManager::new();
        cart.add(product(1, 10.0), 2).await;
        cart.update_quantity(1, 0).await;
        assert!(!cart.contains(1).await);
    }

    #[tokio::test]
    async fn test_update_quantity_ignores_unknown_ids() {
        let cart = CartManager::new();
        cart.add(product(1, 10.0), 2).await;
        cart.update_quantity(404, 7).await;
        assert_eq!(cart.item_count().await, 2);
    }

    #[tokio::test]
    async fn test_clear_empties_everything() {
        let cart = CartManager::new();
        cart.add(product(1, 10.0), 1).await;
        cart.add(product(2, 20.0), 2).await;
        cart.clear().await;

        assert_eq!(cart.item_count().await, 0);
        assert_eq!(cart.total().await, 0.0);
    }
}
