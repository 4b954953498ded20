//! Repositories: validation and relationship rules on top of the document store
//!
//! Every repository holds a shared handle to the same [`Store`](crate::store::Store)
//! and reports failures as [`ApiError`](crate::error::ApiError) so handlers can
//! return them unchanged.

pub mod account;
pub mod product;
pub mod receipt;
pub mod shop;

pub use account::AccountRepository;
pub use product::ProductRepository;
pub use receipt::{ReceiptCriteria, ReceiptRepository};
pub use shop::ShopRepository;
