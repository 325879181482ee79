//! Create `cart_item` table: one line per (cart, product).
//!
//! `unit_price` snapshots the product price at add time; `subtotal` is
//! quantity x unit_price, recomputed by the service on every mutation.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItem::Table)
                    .if_not_exists()
                    .col(uuid(CartItem::Id).primary_key())
                    .col(uuid(CartItem::CartId).not_null())
                    .col(uuid(CartItem::ProductId).not_null())
                    .col(integer(CartItem::Quantity).not_null())
                    .col(decimal_len(CartItem::UnitPrice, 12, 2).not_null())
                    .col(decimal_len(CartItem::Subtotal, 12, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_item_cart")
                            .from(CartItem::Table, CartItem::CartId)
                            .to(Cart::Table, Cart::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_item_product")
                            .from(CartItem::Table, CartItem::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CartItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum CartItem { Table, Id, CartId, ProductId, Quantity, UnitPrice, Subtotal }

#[derive(DeriveIden)]
enum Cart { Table, Id }

#[derive(DeriveIden)]
enum Product { Table, Id }
