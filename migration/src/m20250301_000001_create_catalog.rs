use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Films::Table)
                    .if_not_exists()
                    .col(pk_auto(Films::Id))
                    .col(string(Films::Title))
                    .col(string_null(Films::Slug))
                    .col(integer_null(Films::TmdbId))
                    .col(string_null(Films::ReleaseDate))
                    .col(double(Films::Rating).default(0.0))
                    .col(text_null(Films::Synopsis))
                    .col(string_null(Films::Genres))
                    .col(string_null(Films::PosterPath))
                    .col(string_null(Films::BackdropPath))
                    .col(string_null(Films::CarouselImage))
                    .col(boolean(Films::IsHiddenGem).default(false))
                    .col(boolean(Films::IsHuntedByMoviehunt).default(false))
                    .col(string_null(Films::TrailerKey))
                    .col(text_null(Films::WhyWatch))
                    .col(text_null(Films::WhatWeDidntLike))
                    .col(big_integer(Films::AddedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_slug")
                    .table(Films::Table)
                    .col(Films::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_rating")
                    .table(Films::Table)
                    .col(Films::Rating)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_added_at")
                    .table(Films::Table)
                    .col(Films::AddedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RemarkableStaff::Table)
                    .if_not_exists()
                    .col(pk_auto(RemarkableStaff::Id))
                    .col(integer(RemarkableStaff::FilmId))
                    .col(string(RemarkableStaff::Name))
                    .col(string(RemarkableStaff::Role))
                    .col(string_null(RemarkableStaff::PhotoPath))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_remarkable_staff_film")
                            .from(RemarkableStaff::Table, RemarkableStaff::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_remarkable_staff_film")
                    .table(RemarkableStaff::Table)
                    .col(RemarkableStaff::FilmId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmTranslations::Table)
                    .if_not_exists()
                    .col(pk_auto(FilmTranslations::Id))
                    .col(integer(FilmTranslations::FilmId))
                    .col(string(FilmTranslations::Locale))
                    .col(string_null(FilmTranslations::Title))
                    .col(text_null(FilmTranslations::Synopsis))
                    .col(string_null(FilmTranslations::Genres))
                    .col(text_null(FilmTranslations::WhyWatch))
                    .col(text_null(FilmTranslations::WhatWeDidntLike))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_film_translations_film")
                            .from(FilmTranslations::Table, FilmTranslations::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_film_translations_unique")
                    .table(FilmTranslations::Table)
                    .col(FilmTranslations::FilmId)
                    .col(FilmTranslations::Locale)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FilmTranslations::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(RemarkableStaff::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Films::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Films {
    Table,
    Id,
    Title,
    Slug,
    TmdbId,
    ReleaseDate,
    Rating,
    Synopsis,
    Genres,
    PosterPath,
    BackdropPath,
    CarouselImage,
    IsHiddenGem,
    IsHuntedByMoviehunt,
    TrailerKey,
    WhyWatch,
    WhatWeDidntLike,
    AddedAt,
}

#[derive(DeriveIden)]
enum RemarkableStaff {
    Table,
    Id,
    FilmId,
    Name,
    Role,
    PhotoPath,
}

#[derive(DeriveIden)]
enum FilmTranslations {
    Table,
    Id,
    FilmId,
    Locale,
    Title,
    Synopsis,
    Genres,
    WhyWatch,
    WhatWeDidntLike,
}
