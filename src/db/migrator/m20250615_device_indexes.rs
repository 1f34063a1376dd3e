use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Natural key used by client check-in and the auto-registration upsert
        manager
            .create_index(
                Index::create()
                    .name("idx_devices_mac_hostname")
                    .table(Devices::Table)
                    .col(Devices::Mac)
                    .col(Devices::Hostname)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_devices_mac_hostname")
                    .table(Devices::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Devices {
    Table,
    Mac,
    Hostname,
}
