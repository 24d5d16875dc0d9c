// src/catalog.rs - The product collection: seeded plus seller-added

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::account::DEMO_SELLER;
use crate::error::Result;
use crate::manager::{ManagedState, Manager, ManagerState, ManagerStatus};
use crate::storage::KvStore;
use crate::types::{ProductId, ReviewId};
use crate::utils::{IdSource, Time};

/// Storage key for the full product collection.
pub const PRODUCTS_KEY: &str = "allProducts";

/// The fixed category list used for navigation. Category names on products
/// are matched against this list case-sensitively; catalog filtering by
/// category is case-insensitive.
pub const CATEGORIES: &[&str] = &[
    "Electronics",
    "Fashion",
    "Home & Kitchen",
    "Beauty",
    "Sports",
    "Books",
];

/// Whether `name` is one of the fixed navigation categories (exact match).
pub fn is_listed_category(name: &str) -> bool {
    CATEGORIES.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub author: String,
    pub rating: u8,
    pub comment: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub description: String,
    pub images: Vec<String>,
    /// Mean of `reviews[].rating`; 0.0 while there are no reviews.
    pub rating: f64,
    /// Always `reviews.len()`.
    pub reviews_count: u32,
    /// Newest first.
    pub reviews: Vec<Review>,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub seller_email: String,
    pub views: u64,
}

impl Product {
    /// A product is on sale when it carries a strike-through price above
    /// the current one.
    pub fn is_on_sale(&self) -> bool {
        self.original_price.map_or(false, |orig| orig > self.price)
    }

    /// Whether `author` already left a review. One review per customer is
    /// the caller's policy; the store does not enforce it.
    pub fn has_review_by(&self, author: &str) -> bool {
        self.reviews.iter().any(|r| r.author == author)
    }
}

/// Fields a seller provides when listing a product. Identity and the
/// derived fields are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub description: String,
    pub images: Vec<String>,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub seller_email: String,
}

/// Replacement values for a seller edit. Identity, ownership and the
/// review/view-derived fields are preserved by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub description: String,
    pub images: Vec<String>,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub author: String,
    pub rating: u8,
    pub comment: String,
}

/// Owns the catalog. Every mutation rewrites the full collection to
/// storage; business failures are signaled by `None`/`false`.
#[derive(Debug)]
pub struct CatalogManager {
    state: ManagedState,
    kv: KvStore,
    seed: bool,
    ids: IdSource,
    products: RwLock<Vec<Product>>,
}

impl CatalogManager {
    pub fn new(kv: KvStore, seed: bool) -> Self {
        Self {
            state: ManagedState::new("catalog_manager"),
            kv,
            seed,
            ids: IdSource::new(),
            products: RwLock::new(Vec::new()),
        }
    }

    /// Lists a new product. Derived fields start at zero; the id is
    /// timestamp-derived and unique.
    pub async fn add(&self, draft: ProductDraft) -> Product {
        let product = Product {
            id: self.ids.next(),
            name: draft.name,
            brand: draft.brand,
            category: draft.category,
            price: draft.price,
            original_price: draft.original_price,
            description: draft.description,
            images: draft.images,
            rating: 0.0,
            reviews_count: 0,
            reviews: Vec::new(),
            stock: draft.stock,
            tags: draft.tags,
            seller_email: draft.seller_email,
            views: 0,
        };

        self.products.write().await.push(product.clone());
        self.persist().await;

        tracing::info!(product_id = product.id, name = %product.name, "product listed");
        product
    }

    /// Applies a seller edit, preserving id, ownership, reviews and the
    /// fields derived from them. `None` when the id is unknown.
    pub async fn update(&self, id: ProductId, changes: ProductChanges) -> Option<Product> {
        let updated = {
            let mut products = self.products.write().await;
            let product = products.iter_mut().find(|p| p.id == id)?;

            product.name = changes.name;
            product.brand = changes.brand;
            product.category = changes.category;
            product.price = changes.price;
            product.original_price = changes.original_price;
            product.description = changes.description;
            product.images = changes.images;
            product.stock = changes.stock;
            product.tags = changes.tags;

            product.clone()
        };

        self.persist().await;
        tracing::debug!(product_id = id, "product updated");
        Some(updated)
    }

    /// Removes a listing. Cart, wishlist and order entries referencing the
    /// id are left dangling; lookups for it simply return `None` from then
    /// on.
    pub async fn remove(&self, id: ProductId) -> bool {
        let removed = {
            let mut products = self.products.write().await;
            let before = products.len();
            products.retain(|p| p.id != id);
            products.len() != before
        };

        if removed {
            self.persist().await;
            tracing::info!(product_id = id, "product removed");
        }
        removed
    }

    /// Counts a product-page visit. Returns the new view count, or `None`
    /// for an unknown id.
    pub async fn increment_view(&self, id: ProductId) -> Option<u64> {
        let views = {
            let mut products = self.products.write().await;
            let product = products.iter_mut().find(|p| p.id == id)?;
            product.views += 1;
            product.views
        };

        self.persist().await;
        Some(views)
    }

    /// Prepends a review and recomputes the product's rating and review
    /// count. `None` when the id is unknown.
    pub async fn add_review(&self, id: ProductId, draft: ReviewDraft) -> Option<Product> {
        let updated = {
            let mut products = self.products.write().await;
            let product = products.iter_mut().find(|p| p.id == id)?;

            let review = Review {
                id: self.ids.next(),
                author: draft.author,
                rating: draft.rating,
                comment: draft.comment,
                date: Time::iso_now(),
            };
            product.reviews.insert(0, review);

            let sum: u32 = product.reviews.iter().map(|r| u32::from(r.rating)).sum();
            product.reviews_count = product.reviews.len() as u32;
            product.rating = f64::from(sum) / product.reviews.len() as f64;

            product.clone()
        };

        self.persist().await;
        tracing::debug!(product_id = id, rating = updated.rating, "review added");
        Some(updated)
    }

    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.products.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn all(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn by_seller(&self, seller_email: &str) -> Vec<Product> {
        self.products
            .read()
            .await
            .iter()
            .filter(|p| p.seller_email == seller_email)
            .cloned()
            .collect()
    }

    /// Products in `category`, matched case-insensitively.
    pub async fn by_category(&self, category: &str) -> Vec<Product> {
        self.products
            .read()
            .await
            .iter()
            .filter(|p| p.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over name, brand and tags.
    pub async fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.to_lowercase();
        self.products
            .read()
            .await
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.brand.to_lowercase().contains(&needle)
                    || p.tags.as_ref().is_some_and(|tags| {
                        tags.iter().any(|t| t.to_lowercase().contains(&needle))
                    })
            })
            .cloned()
            .collect()
    }

    async fn persist(&self) {
        let snapshot = self.products.read().await.clone();
        if let Err(e) = self.kv.write(PRODUCTS_KEY, &snapshot).await {
            tracing::warn!(error = %e, "failed to persist catalog");
        }
    }

    fn demo_products(ids: &IdSource) -> Vec<Product> {
        let entries = [
            (
                "Aurora Wireless Headphones",
                "Soundline",
                "Electronics",
                59.99,
                Some(79.99),
                "Over-ear wireless headphones with 30 hours of playback.",
                24,
                Some(vec!["audio".to_string(), "wireless".to_string()]),
            ),
            (
                "Stoneware Pour-Over Set",
                "Morrow Home",
                "Home & Kitchen",
                34.5,
                None,
                "Two-piece stoneware pour-over brewer and carafe.",
                12,
                Some(vec!["coffee".to_string()]),
            ),
            (
                "Trailline Running Jacket",
                "Peakform",
                "Fashion",
                89.0,
                None,
                "Windproof running jacket with reflective seams.",
                8,
                None,
            ),
            (
                "Lumen Desk Lamp",
                "Brightway",
                "Electronics",
                24.99,
                Some(29.99),
                "Dimmable LED desk lamp with a weighted base.",
                40,
                Some(vec!["lighting".to_string(), "desk".to_string()]),
            ),
        ];

        entries
            .into_iter()
            .map(
                |(name, brand, category, price, original_price, description, stock, tags)| {
                    Product {
                        id: ids.next(),
                        name: name.to_string(),
                        brand: brand.to_string(),
                        category: category.to_string(),
                        price,
                        original_price,
                        description: description.to_string(),
                        images: vec![format!(
                            "https://images.shoplite.dev/{}.jpg",
                            name.to_lowercase().replace(' ', "-")
                        )],
                        rating: 0.0,
                        reviews_count: 0,
                        reviews: Vec::new(),
                        stock,
                        tags,
                        seller_email: DEMO_SELLER.to_string(),
                        views: 0,
                    }
                },
            )
            .collect()
    }
}

#[async_trait::async_trait]
impl Manager for CatalogManager {
    fn name(&self) -> &str {
        "catalog_manager"
    }

    fn id(&self) -> Uuid {
        self.state.id()
    }

    async fn initialize(&mut self) -> Result<()> {
        self.state.set_state(ManagerState::Initializing).await;

        if self.seed && !self.kv.exists(PRODUCTS_KEY).await {
            let demo = Self::demo_products(&self.ids);
            if let Err(e) = self.kv.write(PRODUCTS_KEY, &demo).await {
                tracing::warn!(error = %e, "failed to seed demo catalog");
            }
        }

        let products: Vec<Product> = self.kv.read(PRODUCTS_KEY, Vec::new()).await;
        tracing::debug!(products = products.len(), "catalog loaded");
        *self.products.write().await = products;

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
        status.add_metadata("products", serde_json::Value::from(self.count().await));
        status
    }
}
