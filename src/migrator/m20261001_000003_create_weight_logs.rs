use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WeightLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeightLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeightLogs::CattleId).integer().not_null())
                    .col(ColumnDef::new(WeightLogs::MeasuredAt).date().not_null())
                    .col(ColumnDef::new(WeightLogs::WeightKg).double().not_null())
                    .col(ColumnDef::new(WeightLogs::Method).string_len(24))
                    .col(ColumnDef::new(WeightLogs::Notes).text())
                    .col(ColumnDef::new(WeightLogs::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-weight_logs-cattle_id")
                            .from(WeightLogs::Table, WeightLogs::CattleId)
                            .to(Cattle::Table, Cattle::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // One observation per animal per day
        manager
            .create_index(
                Index::create()
                    .name("idx_weight_logs_cattle_measured_at")
                    .table(WeightLogs::Table)
                    .col(WeightLogs::CattleId)
                    .col(WeightLogs::MeasuredAt)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeightLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WeightLogs {
    Table,
    Id,
    CattleId,
    MeasuredAt,
    WeightKg,
    Method,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Cattle {
    Table,
    Id,
}
