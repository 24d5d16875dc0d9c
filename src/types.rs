use std::collections::HashMap;
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for managers and errors
pub type Id = Uuid;

/// Generic metadata container
pub type Metadata = HashMap<String, Value>;

/// Identity of a product in the catalog (timestamp-derived, unique)
pub type ProductId = i64;

/// Identity of a review on a product
pub type ReviewId = i64;

/// Identity of a placed order
pub type OrderId = String;
