//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod pagination;
pub mod access;
pub mod auth;
pub mod bootstrap;
pub mod cart;
pub mod orders;
pub mod user_service;
pub mod role_service;
pub mod permission_service;
pub mod category_service;
pub mod product_service;
pub mod history_service;
