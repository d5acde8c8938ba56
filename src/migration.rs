//! Schema migrations. Tables are derived from the sea-orm entities so the
//! same migrator builds the Postgres schema in production and the SQLite
//! schema used by the test suite.

use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entity::{
    Addresses, BankAccounts, CartItems, Categories, OrderItems, Orders, Payments, Products, Users,
    bank_accounts, cart_items,
};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_000001_create_marketplace::Migration)]
    }
}

mod m20250101_000001_create_marketplace {
    use super::*;

    #[derive(DeriveMigrationName)]
    pub struct Migration;

    async fn create<E: EntityTrait>(
        manager: &SchemaManager<'_>,
        schema: &Schema,
        entity: E,
    ) -> Result<(), DbErr> {
        manager
            .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
            .await
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let schema = Schema::new(manager.get_database_backend());

            // Referenced tables first.
            create(manager, &schema, Users).await?;
            create(manager, &schema, Addresses).await?;
            create(manager, &schema, BankAccounts).await?;
            create(manager, &schema, Categories).await?;
            create(manager, &schema, Products).await?;
            create(manager, &schema, CartItems).await?;
            create(manager, &schema, Orders).await?;
            create(manager, &schema, OrderItems).await?;
            create(manager, &schema, Payments).await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_cart_items_user_product")
                        .table(CartItems)
                        .col(cart_items::Column::UserId)
                        .col(cart_items::Column::ProductId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            // One payout account per seller.
            manager
                .create_index(
                    Index::create()
                        .name("idx_bank_accounts_user")
                        .table(BankAccounts)
                        .col(bank_accounts::Column::UserId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CartItems).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BankAccounts).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Addresses).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users).if_exists().to_owned())
                .await
        }
    }
}
