//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_user;
mod m20240101_000002_create_user_credentials;
mod m20240101_000003_create_role;
mod m20240101_000004_create_permission;
mod m20240101_000005_create_user_role;
mod m20240101_000006_create_role_permission;
mod m20240101_000007_create_category;
mod m20240101_000008_create_product;
mod m20240101_000009_create_cart;
mod m20240101_000010_create_cart_item;
mod m20240101_000011_create_order;
mod m20240101_000012_create_order_item;
mod m20240101_000013_create_action_log;
mod m20240101_000014_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_user::Migration),
            Box::new(m20240101_000002_create_user_credentials::Migration),
            Box::new(m20240101_000003_create_role::Migration),
            Box::new(m20240101_000004_create_permission::Migration),
            Box::new(m20240101_000005_create_user_role::Migration),
            Box::new(m20240101_000006_create_role_permission::Migration),
            Box::new(m20240101_000007_create_category::Migration),
            Box::new(m20240101_000008_create_product::Migration),
            Box::new(m20240101_000009_create_cart::Migration),
            Box::new(m20240101_000010_create_cart_item::Migration),
            Box::new(m20240101_000011_create_order::Migration),
            Box::new(m20240101_000012_create_order_item::Migration),
            Box::new(m20240101_000013_create_action_log::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000014_add_indexes::Migration),
        ]
    }
}
