//! Create `product` table with optional FK to `category`.
//!
//! `stock` is decremented at checkout and restored on order cancellation.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(string_len(Product::Name, 255).not_null())
                    .col(text_null(Product::Description))
                    .col(decimal_len(Product::Price, 12, 2).not_null())
                    .col(string_len_null(Product::ImageUrl, 512))
                    .col(integer(Product::Stock).not_null())
                    .col(boolean(Product::Active).not_null())
                    // Explicitly define nullable category_id to avoid conflicting NULL/NOT NULL
                    .col(ColumnDef::new(Product::CategoryId).uuid().null())
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Product::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_category")
                            .from(Product::Table, Product::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product { Table, Id, Name, Description, Price, ImageUrl, Stock, Active, CategoryId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Category { Table, Id }
