//! Initial schema migration.
//!
//! Creates the complete schema for Rickhouse:
//!
//! - `container_kinds`: capacity/tare templates (barrel, tote, tank sizes)
//! - `containers`: the current physical state of every vessel
//! - `transactions`: the append-only log of container changes

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum ContainerKinds {
    Table,
    Id,
    Name,
    CapacityGallons,
    TareWeight,
}

#[derive(Iden)]
enum Containers {
    Table,
    Id,
    KindId,
    Name,
    ContainerType,
    Status,
    TareWeight,
    NetWeight,
    Proof,
    TemperatureF,
    ProductId,
    Account,
    FillDate,
    EmptiedDate,
    Notes,
    Version,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    OperationId,
    Sequence,
    ContainerId,
    ContainerVersion,
    TransactionType,
    Proof,
    VolumeGallonsDelta,
    ProofGallonsDelta,
    Notes,
    ReversesOperationId,
    PriorState,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Container kinds
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ContainerKinds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContainerKinds::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContainerKinds::Name).string().not_null())
                    .col(
                        ColumnDef::new(ContainerKinds::CapacityGallons)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContainerKinds::TareWeight)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-container_kinds-name-unique")
                    .table(ContainerKinds::Table)
                    .col(ContainerKinds::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Containers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Containers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Containers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Containers::KindId).string().not_null())
                    .col(ColumnDef::new(Containers::Name).string().not_null())
                    .col(ColumnDef::new(Containers::ContainerType).string().not_null())
                    .col(
                        ColumnDef::new(Containers::Status)
                            .string()
                            .not_null()
                            .default("EMPTY"),
                    )
                    .col(ColumnDef::new(Containers::TareWeight).double().not_null())
                    .col(
                        ColumnDef::new(Containers::NetWeight)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Containers::Proof)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Containers::TemperatureF)
                            .double()
                            .not_null()
                            .default(60.0),
                    )
                    .col(ColumnDef::new(Containers::ProductId).string())
                    .col(
                        ColumnDef::new(Containers::Account)
                            .string()
                            .not_null()
                            .default("storage"),
                    )
                    .col(ColumnDef::new(Containers::FillDate).timestamp())
                    .col(ColumnDef::new(Containers::EmptiedDate).timestamp())
                    .col(ColumnDef::new(Containers::Notes).string())
                    .col(
                        ColumnDef::new(Containers::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Containers::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-containers-kind_id")
                            .from(Containers::Table, Containers::KindId)
                            .to(ContainerKinds::Table, ContainerKinds::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-containers-kind_id")
                    .table(Containers::Table)
                    .col(Containers::KindId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::OperationId).string().not_null())
                    .col(ColumnDef::new(Transactions::Sequence).integer().not_null())
                    .col(ColumnDef::new(Transactions::ContainerId).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::ContainerVersion)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Proof).double().not_null())
                    .col(
                        ColumnDef::new(Transactions::VolumeGallonsDelta)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::ProofGallonsDelta)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Notes).string())
                    .col(ColumnDef::new(Transactions::ReversesOperationId).string())
                    .col(ColumnDef::new(Transactions::PriorState).text())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-container_id")
                            .from(Transactions::Table, Transactions::ContainerId)
                            .to(Containers::Table, Containers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-container_id-version")
                    .table(Transactions::Table)
                    .col(Transactions::ContainerId)
                    .col(Transactions::ContainerVersion)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-operation_id")
                    .table(Transactions::Table)
                    .col(Transactions::OperationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-reverses_operation_id")
                    .table(Transactions::Table)
                    .col(Transactions::ReversesOperationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Containers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContainerKinds::Table).to_owned())
            .await?;
        Ok(())
    }
}
