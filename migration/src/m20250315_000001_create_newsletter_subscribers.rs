use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NewsletterSubscribers::Table)
                    .if_not_exists()
                    .col(pk_auto(NewsletterSubscribers::Id))
                    .col(string_uniq(NewsletterSubscribers::Email))
                    .col(string_uniq(NewsletterSubscribers::Token))
                    .col(string(NewsletterSubscribers::Locale))
                    .col(big_integer(NewsletterSubscribers::SubscribedAt))
                    .col(big_integer_null(NewsletterSubscribers::ConfirmedAt))
                    .col(big_integer_null(NewsletterSubscribers::UnsubscribedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(NewsletterSubscribers::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum NewsletterSubscribers {
    Table,
    Id,
    Email,
    Token,
    Locale,
    SubscribedAt,
    ConfirmedAt,
    UnsubscribedAt,
}
