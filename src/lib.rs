// src/lib.rs

//! Shoplite - an embeddable storefront state engine with pluggable
//! key-value persistence

#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::result_large_err)]

pub mod account;
pub mod app;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod orders;
pub mod routes;
pub mod storage;
pub mod types;
pub mod utils;
pub mod wishlist;

// Re-export commonly used types
pub use app::{ApplicationCore, ApplicationState};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use manager::{Manager, ManagerState, ManagerStatus};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
