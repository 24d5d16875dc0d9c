// src/wishlist.rs - Saved products, set semantics keyed by product id

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::Result;
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::types::ProductId;

/// Owns the saved-product set for the running session. Membership is
/// keyed by product id; there are no duplicates and no quantities. Like
/// the cart, the collection is process memory only.
#[derive(Debug)]
pub struct WishlistManager {
    state: ManagedState,
    items: RwLock<Vec<Product>>,
}

impl WishlistManager {
    pub fn new() -> Self {
        Self {
            state: ManagedState::new("wishlist_manager"),
            items: RwLock::new(Vec::new()),
        }
    }

    /// Saves a product. Returns `false` (and changes nothing) when the
    /// product is already present.
    pub async fn add(&self, product: Product) -> bool {
        let mut items = self.items.write().await;
        if items.iter().any(|p| p.id == product.id) {
            return false;
        }
        tracing::debug!(product_id = product.id, "product saved to wishlist");
        items.push(product);
        true
    }

    /// Removes the product with `id`. Idempotent.
    pub async fn remove(&self, id: ProductId) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|p| p.id != id);
        items.len() != before
    }

    /// Flips membership and returns the new state: `true` when the product
    /// was just saved, `false` when it was just removed.
    pub async fn toggle(&self, product: Product) -> bool {
        let id = product.id;
        if self.add(product).await {
            true
        } else {
            self.remove(id).await;
            false
        }
    }

    pub async fn contains(&self, id: ProductId) -> bool {
        self.items.read().await.iter().any(|p| p.id == id)
    }

    pub async fn count(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn items(&self) -> Vec<Product> {
        self.items.read().await.clone()
    }
}

impl Default for WishlistManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Manager for WishlistManager {
    fn name(&self) -> &str {
        "wishlist_manager"
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
        status.add_metadata("saved", serde_json::Value::from(self.count().await));
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            brand: "Soundline".to_string(),
            category: "Electronics".to_string(),
            price: 10.0,
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
    async fn test_duplicate_add_leaves_count_unchanged() {
        let wishlist = WishlistManager::new();
        assert!(wishlist.add(product(1)).await);
        assert!(!wishlist.add(product(1)).await);
        assert_eq!(wishlist.count().await, 1);
    }

    #[tokio::test]
    async fn test_membership_checks() {
        let wishlist = WishlistManager::new();
        wishlist.add(product(1)).await;

        assert!(wishlist.contains(1).await);
        assert!(!wishlist.contains(2).await);

        assert!(wishlist.remove(1).await);
        assert!(!wishlist.remove(1).await);
        assert!(!wishlist.contains(1).await);
    }

    #[tokio::test]
    async fn test_toggle_flips_membership() {
        let wishlist = WishlistManager::new();

        assert!(wishlist.toggle(product(1)).await);
        assert!(wishlist.contains(1).await);

        assert!(!wishlist.toggle(product(1)).await);
        assert!(!wishlist.contains(1).await);
        assert_eq!(wishlist.count().await, 0);
    }
}
