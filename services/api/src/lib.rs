//! Grocery price-tracking API
//!
//! Accounts submit price observations (receipts) for products at shops; the
//! service stores them and answers filtered, paginated comparisons over time.
//! The router is built by [`routes::create_router`] over an [`AppState`] whose
//! repositories share one [`store::Store`].

pub mod config;
pub mod error;
pub mod extract;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
