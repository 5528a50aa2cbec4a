use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cattle::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cattle::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Cattle::EarTag)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Cattle::Name).string_len(100))
                    .col(ColumnDef::new(Cattle::Sex).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Cattle::Castrated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Cattle::DateOfBirth).date())
                    .col(ColumnDef::new(Cattle::Color).string_len(50))
                    .col(ColumnDef::new(Cattle::Breed).string_len(50))
                    .col(ColumnDef::new(Cattle::HornStatus).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Cattle::Status)
                            .string_len(10)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Cattle::MotherId).integer())
                    .col(ColumnDef::new(Cattle::FatherId).integer())
                    .col(ColumnDef::new(Cattle::Notes).text())
                    .col(ColumnDef::new(Cattle::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Cattle::UpdatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cattle-mother_id")
                            .from(Cattle::Table, Cattle::MotherId)
                            .to(Cattle::Table, Cattle::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cattle-father_id")
                            .from(Cattle::Table, Cattle::FatherId)
                            .to(Cattle::Table, Cattle::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // Sibling and offspring scans filter on these
        manager
            .create_index(
                Index::create()
                    .name("idx_cattle_mother_id")
                    .table(Cattle::Table)
                    .col(Cattle::MotherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cattle_father_id")
                    .table(Cattle::Table)
                    .col(Cattle::FatherId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cattle_status")
                    .table(Cattle::Table)
                    .col(Cattle::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cattle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Cattle {
    Table,
    Id,
    EarTag,
    Name,
    Sex,
    Castrated,
    DateOfBirth,
    Color,
    Breed,
    HornStatus,
    Status,
    MotherId,
    FatherId,
    Notes,
    CreatedAt,
    UpdatedAt,
}
