//! Create `action_log` table: free-text audit trail per user.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActionLog::Table)
                    .if_not_exists()
                    .col(uuid(ActionLog::Id).primary_key())
                    .col(uuid(ActionLog::UserId).not_null())
                    .col(string_len(ActionLog::Action, 512).not_null())
                    .col(timestamp_with_time_zone(ActionLog::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_action_log_user")
                            .from(ActionLog::Table, ActionLog::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ActionLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ActionLog { Table, Id, UserId, Action, CreatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
