use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CartItem: one line per (cart, product)
        manager
            .create_index(
                Index::create()
                    .name("uniq_cart_item_cart_product")
                    .table(CartItem::Table)
                    .col(CartItem::CartId)
                    .col(CartItem::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Product: index on category_id
        manager
            .create_index(
                Index::create()
                    .name("idx_product_category")
                    .table(Product::Table)
                    .col(Product::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Orders: indexes on user_id and status
        manager
            .create_index(
                Index::create()
                    .name("idx_order_user")
                    .table(Order::Table)
                    .col(Order::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_status")
                    .table(Order::Table)
                    .col(Order::Status)
                    .to_owned(),
            )
            .await?;

        // OrderItem: index on order_id
        manager
            .create_index(
                Index::create()
                    .name("idx_order_item_order")
                    .table(OrderItem::Table)
                    .col(OrderItem::OrderId)
                    .to_owned(),
            )
            .await?;

        // ActionLog: index on user_id
        manager
            .create_index(
                Index::create()
                    .name("idx_action_log_user")
                    .table(ActionLog::Table)
                    .col(ActionLog::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_cart_item_cart_product").table(CartItem::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_category").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_user").table(Order::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_status").table(Order::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_item_order").table(OrderItem::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_action_log_user").table(ActionLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CartItem { Table, CartId, ProductId }

#[derive(DeriveIden)]
enum Product { Table, CategoryId }

#[derive(DeriveIden)]
enum Order {
    #[sea_orm(iden = "orders")]
    Table,
    UserId,
    Status,
}

#[derive(DeriveIden)]
enum OrderItem { Table, OrderId }

#[derive(DeriveIden)]
enum ActionLog { Table, UserId }
