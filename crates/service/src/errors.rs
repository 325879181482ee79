use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("insufficient stock for product: {0}")]
    InsufficientStock(String),
    #[error("cannot create an order from an empty cart")]
    EmptyCart,
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn duplicate_name(entity: &str) -> Self {
        Self::Conflict(format!("a {} with this name already exists", entity))
    }
}
