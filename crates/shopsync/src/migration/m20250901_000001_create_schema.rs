//! Initial migration to create the shopsync database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_connections(manager).await?;
        self.create_products(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Connections::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_connections(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Connections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Connections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Connections::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Connections::ApiBase).string().not_null())
                    .col(ColumnDef::new(Connections::ApiKey).string().not_null())
                    .col(ColumnDef::new(Connections::ApiSecret).string().not_null())
                    .col(
                        ColumnDef::new(Connections::RequestsPerSecond)
                            .integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(Connections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_products(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::ConnectionId).uuid().not_null())
                    .col(
                        ColumnDef::new(Products::ExternalId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::Title).string().not_null())
                    .col(ColumnDef::new(Products::Description).text().null())
                    .col(ColumnDef::new(Products::Sku).string().null())
                    .col(ColumnDef::new(Products::Price).double().null())
                    .col(
                        ColumnDef::new(Products::Visible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Products::Attributes)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(Products::ExternalUpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Products::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_connection")
                            .from(Products::Table, Products::ConnectionId)
                            .to(Connections::Table, Connections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Natural key: one row per external product per connection.
        manager
            .create_index(
                Index::create()
                    .name("idx_products_natural_key")
                    .table(Products::Table)
                    .col(Products::ConnectionId)
                    .col(Products::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Connections {
    Table,
    Id,
    Name,
    ApiBase,
    ApiKey,
    ApiSecret,
    RequestsPerSecond,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    ConnectionId,
    ExternalId,
    Title,
    Description,
    Sku,
    Price,
    Visible,
    Attributes,
    ExternalUpdatedAt,
    SyncedAt,
}
