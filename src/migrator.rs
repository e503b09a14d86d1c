use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_reference_tables::Migration),
            Box::new(m20240101_000002_create_inventory_events_table::Migration),
            Box::new(m20240101_000003_create_requests_tables::Migration),
            Box::new(m20240101_000004_create_sku_code_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_reference_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Parts::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Parts::Sku).string().not_null().unique_key())
                        .col(ColumnDef::new(Parts::Name).string().not_null())
                        .col(ColumnDef::new(Parts::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Locations::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Locations::Description).string().null())
                        .col(ColumnDef::new(Locations::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Parts::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Parts {
        Table,
        Id,
        Sku,
        Name,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Locations {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
    }
}

mod m20240101_000002_create_inventory_events_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_inventory_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryEvents::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InventoryEvents::EventType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryEvents::QtyDelta)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryEvents::PartId).integer().not_null())
                        .col(
                            ColumnDef::new(InventoryEvents::LocationId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryEvents::RequestId).integer().null())
                        .col(ColumnDef::new(InventoryEvents::Reason).string().null())
                        .col(
                            ColumnDef::new(InventoryEvents::CreatedBy)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryEvents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Access patterns: by part, by location, by (part, location),
            // by request, and ordered range scans by created_at.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_events_part_location")
                        .table(InventoryEvents::Table)
                        .col(InventoryEvents::PartId)
                        .col(InventoryEvents::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_events_location_id")
                        .table(InventoryEvents::Table)
                        .col(InventoryEvents::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_events_request_id")
                        .table(InventoryEvents::Table)
                        .col(InventoryEvents::RequestId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_events_created_at")
                        .table(InventoryEvents::Table)
                        .col(InventoryEvents::CreatedAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryEvents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryEvents {
        Table,
        Id,
        EventType,
        QtyDelta,
        PartId,
        LocationId,
        RequestId,
        Reason,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000003_create_requests_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_requests_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Requests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Requests::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Requests::Status)
                                .string_len(16)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(ColumnDef::new(Requests::Notes).string().null())
                        .col(ColumnDef::new(Requests::CreatedBy).integer().not_null())
                        .col(ColumnDef::new(Requests::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Requests::ApprovedBy).integer().null())
                        .col(ColumnDef::new(Requests::ApprovedAt).timestamp_with_time_zone().null())
                        .col(ColumnDef::new(Requests::FulfilledBy).integer().null())
                        .col(ColumnDef::new(Requests::FulfilledAt).timestamp_with_time_zone().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requests_status")
                        .table(Requests::Table)
                        .col(Requests::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RequestItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::RequestId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RequestItems::PartId).integer().not_null())
                        .col(
                            ColumnDef::new(RequestItems::QtyRequested)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequestItems::QtyFulfilled)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RequestItems::LocationId).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_request_items_request_id")
                        .table(RequestItems::Table)
                        .col(RequestItems::RequestId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RequestItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Requests::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Requests {
        Table,
        Id,
        Status,
        Notes,
        CreatedBy,
        CreatedAt,
        ApprovedBy,
        ApprovedAt,
        FulfilledBy,
        FulfilledAt,
    }

    #[derive(DeriveIden)]
    enum RequestItems {
        Table,
        Id,
        RequestId,
        PartId,
        QtyRequested,
        QtyFulfilled,
        LocationId,
    }
}

mod m20240101_000004_create_sku_code_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_sku_code_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MakeCodes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MakeCodes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(MakeCodes::Make)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(MakeCodes::Code)
                                .string_len(2)
                                .not_null()
                                .unique_key(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ModelCodes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ModelCodes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ModelCodes::Make).string().not_null())
                        .col(ColumnDef::new(ModelCodes::Model).string().not_null())
                        .col(ColumnDef::new(ModelCodes::Code).string_len(3).not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_model_codes_make_model")
                        .table(ModelCodes::Table)
                        .col(ModelCodes::Make)
                        .col(ModelCodes::Model)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_model_codes_make_code")
                        .table(ModelCodes::Table)
                        .col(ModelCodes::Make)
                        .col(ModelCodes::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SystemCodes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SystemCodes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(SystemCodes::Code)
                                .string_len(2)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SystemCodes::Name).string().not_null())
                        .col(ColumnDef::new(SystemCodes::Description).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ComponentCodes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ComponentCodes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ComponentCodes::SystemCode)
                                .string_len(2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ComponentCodes::Code)
                                .string_len(2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ComponentCodes::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_component_codes_system_code")
                        .table(ComponentCodes::Table)
                        .col(ComponentCodes::SystemCode)
                        .col(ComponentCodes::Code)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ComponentCodes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SystemCodes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ModelCodes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MakeCodes::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum MakeCodes {
        Table,
        Id,
        Make,
        Code,
    }

    #[derive(DeriveIden)]
    enum ModelCodes {
        Table,
        Id,
        Make,
        Model,
        Code,
    }

    #[derive(DeriveIden)]
    enum SystemCodes {
        Table,
        Id,
        Code,
        Name,
        Description,
    }

    #[derive(DeriveIden)]
    enum ComponentCodes {
        Table,
        Id,
        SystemCode,
        Code,
        Name,
    }
}
