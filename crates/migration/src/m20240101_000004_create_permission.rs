//! Create `permission` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Permission::Table)
                    .if_not_exists()
                    .col(uuid(Permission::Id).primary_key())
                    .col(string_len(Permission::Name, 64).unique_key().not_null())
                    .col(string_len_null(Permission::Description, 255))
                    .col(timestamp_with_time_zone(Permission::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Permission::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Permission { Table, Id, Name, Description, CreatedAt }
