//! Create `order_item` table: immutable order lines with the price locked
//! at checkout time. Product rows referenced by an order cannot be deleted.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderItem::Table)
                    .if_not_exists()
                    .col(uuid(OrderItem::Id).primary_key())
                    .col(uuid(OrderItem::OrderId).not_null())
                    .col(uuid(OrderItem::ProductId).not_null())
                    .col(integer(OrderItem::Quantity).not_null())
                    .col(decimal_len(OrderItem::UnitPrice, 12, 2).not_null())
                    .col(decimal_len(OrderItem::Subtotal, 12, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_order")
                            .from(OrderItem::Table, OrderItem::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_item_product")
                            .from(OrderItem::Table, OrderItem::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(OrderItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum OrderItem { Table, Id, OrderId, ProductId, Quantity, UnitPrice, Subtotal }

#[derive(DeriveIden)]
enum Order {
    #[sea_orm(iden = "orders")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Product { Table, Id }
