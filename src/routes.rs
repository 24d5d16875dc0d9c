// src/routes.rs - Role-gated page access, the engine's contract with navigation

use serde::{Deserialize, Serialize};

use crate::account::UserRole;
use crate::types::ProductId;

/// Every page of the storefront. The engine does not render any of them;
/// it only answers who may visit what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Home,
    Products { category: String },
    ProductDetails { id: ProductId },
    Cart,
    Wishlist,
    Checkout,
    OrderSummary { order_id: String },
    Orders,
    SellerDashboard,
    AddProduct,
    EditProduct { id: ProductId },
    Auth,
    SellerSignup,
    About,
    Contact,
    Faq,
    ShippingPolicy,
    Donate,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    Granted,
    Redirect(Route),
}

impl Route {
    /// Roles allowed on this route; `None` stands for a guest.
    fn allowed_roles(&self) -> &'static [Option<UserRole>] {
        match self {
            // Browsing is for guests and customers; sellers are steered to
            // their dashboard.
            Route::Home | Route::Products { .. } | Route::ProductDetails { .. } => {
                &[None, Some(UserRole::Customer)]
            }
            // The purchase flow requires a customer session.
            Route::Cart
            | Route::Wishlist
            | Route::Checkout
            | Route::OrderSummary { .. }
            | Route::Orders => &[Some(UserRole::Customer)],
            // Listing management requires a seller session.
            Route::SellerDashboard | Route::AddProduct | Route::EditProduct { .. } => {
                &[Some(UserRole::Seller)]
            }
            // Public pages.
            Route::Auth
            | Route::SellerSignup
            | Route::About
            | Route::Contact
            | Route::Faq
            | Route::ShippingPolicy
            | Route::Donate => &[None, Some(UserRole::Customer), Some(UserRole::Seller)],
        }
    }

    /// Checks whether a session with `role` may visit this route. A
    /// signed-in user on a disallowed page is sent to their role's landing
    /// page; a guest is sent to the auth page.
    pub fn resolve(&self, role: Option<UserRole>) -> RouteAccess {
        if self.allowed_roles().contains(&role) {
            return RouteAccess::Granted;
        }
        match role {
            Some(role) => RouteAccess::Redirect(Route::default_route(Some(role))),
            None => RouteAccess::Redirect(Route::Auth),
        }
    }

    /// The landing page for a session: sellers open on their dashboard,
    /// everyone else on the home page.
    pub fn default_route(role: Option<UserRole>) -> Route {
        match role {
            Some(UserRole::Seller) => Route::SellerDashboard,
            _ => Route::Home,
        }
    }
}
