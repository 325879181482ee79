//! Create `orders` table: a cart snapshot taken at checkout.
//!
//! Shipping address and payment info are flattened into the row.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(uuid(Order::Id).primary_key())
                    .col(uuid(Order::UserId).not_null())
                    .col(string_len(Order::Status, 32).not_null())
                    .col(decimal_len(Order::Total, 12, 2).not_null())
                    .col(timestamp_with_time_zone(Order::OrderedAt).not_null())
                    .col(string_len(Order::ShipFirstName, 128).not_null())
                    .col(string_len(Order::ShipLastName, 128).not_null())
                    .col(string_len(Order::ShipStreet, 255).not_null())
                    .col(string_len(Order::ShipCity, 128).not_null())
                    .col(string_len(Order::ShipPostalCode, 32).not_null())
                    .col(string_len(Order::ShipCountry, 128).not_null())
                    .col(string_len_null(Order::ShipPhone, 32))
                    .col(string_len_null(Order::ShipExtra, 512))
                    .col(string_len(Order::PaymentMethod, 32).not_null())
                    .col(string_len_null(Order::PaymentReference, 128))
                    .col(timestamp_with_time_zone_null(Order::PaidAt))
                    .col(string_len_null(Order::PaymentStatus, 32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_user")
                            .from(Order::Table, Order::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Order::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Order {
    #[sea_orm(iden = "orders")]
    Table,
    Id,
    UserId,
    Status,
    Total,
    OrderedAt,
    ShipFirstName,
    ShipLastName,
    ShipStreet,
    ShipCity,
    ShipPostalCode,
    ShipCountry,
    ShipPhone,
    ShipExtra,
    PaymentMethod,
    PaymentReference,
    PaidAt,
    PaymentStatus,
}

#[derive(DeriveIden)]
enum User { Table, Id }
