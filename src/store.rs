use std::{collections::HashMap, sync::Arc};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    sea_query::{Alias, Expr, Func, SimpleExpr},
};
use tracing::debug;

use crate::{
    entities::{film, film_translation, remarkable_staff},
    error::StoreError,
    models::{Film, FilmPatch, Locale, NewFilm, NewStaff, SitemapEntry, StaffMember, Translation},
    slug::slugify,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Predicate {
    MinRating(f64),
    HiddenGem(bool),
    Hunted(bool),
    HasCarouselImage,
}

impl Predicate {
    fn condition(self) -> Condition {
        match self {
            Predicate::MinRating(min) => Condition::all().add(film::Column::Rating.gte(min)),
            Predicate::HiddenGem(flag) => Condition::all().add(film::Column::IsHiddenGem.eq(flag)),
            Predicate::Hunted(flag) => {
                Condition::all().add(film::Column::IsHuntedByMoviehunt.eq(flag))
            },
            Predicate::HasCarouselImage => {
                let trimmed: SimpleExpr =
                    Func::cust(Alias::new("TRIM")).arg(Expr::col(film::Column::CarouselImage)).into();
                Condition::all()
                    .add(film::Column::CarouselImage.is_not_null())
                    .add(Expr::expr(trimmed).ne(""))
            },
        }
    }

    /// Same test as [`Predicate::condition`], evaluated on a fetched row.
    pub fn matches(self, film: &Film) -> bool {
        match self {
            Predicate::MinRating(min) => film.rating >= min,
            Predicate::HiddenGem(flag) => film.is_hidden_gem == flag,
            Predicate::Hunted(flag) => film.is_hunted_by_moviehunt == flag,
            Predicate::HasCarouselImage => film.has_carousel_image(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FilmOrder {
    RatingDesc,
    #[default]
    AddedDesc,
    TitleAsc,
}

/// Filter, ordering and window for a read over `films`.
///
/// Every predicate in `all` must hold; when `any` is non-empty at least one
/// of its predicates must hold too.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilmQuery {
    pub all: Vec<Predicate>,
    pub any: Vec<Predicate>,
    pub order: FilmOrder,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl FilmQuery {
    pub fn ordered(order: FilmOrder) -> Self {
        Self { order, ..Default::default() }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.all.push(predicate);
        self
    }

    pub fn either(mut self, predicate: Predicate) -> Self {
        self.any.push(predicate);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, film: &Film) -> bool {
        self.all.iter().all(|p| p.matches(film))
            && (self.any.is_empty() || self.any.iter().any(|p| p.matches(film)))
    }

    fn apply(&self, select: Select<film::Entity>) -> Select<film::Entity> {
        let mut condition = Condition::all();
        for predicate in &self.all {
            condition = condition.add(predicate.condition());
        }
        if !self.any.is_empty() {
            let any = self.any.iter().fold(Condition::any(), |acc, p| acc.add(p.condition()));
            condition = condition.add(any);
        }

        let select = select.filter(condition);
        let select = match self.order {
            FilmOrder::RatingDesc => select
                .order_by_desc(film::Column::Rating)
                .order_by_desc(film::Column::AddedAt)
                .order_by_asc(film::Column::Id),
            FilmOrder::AddedDesc => {
                select.order_by_desc(film::Column::AddedAt).order_by_asc(film::Column::Id)
            },
            FilmOrder::TitleAsc => {
                select.order_by_asc(film::Column::Title).order_by_asc(film::Column::Id)
            },
        };
        select.offset(self.offset).limit(self.limit)
    }
}

/// Read side of the catalog, bound to the public-tier connection.
#[derive(Clone, Debug)]
pub struct FilmStore {
    db: Arc<DatabaseConnection>,
}

impl FilmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Film>, StoreError> {
        Ok(film::Entity::find().filter(film::Column::Slug.eq(slug)).one(&*self.db).await?)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Film>, StoreError> {
        Ok(film::Entity::find_by_id(id).one(&*self.db).await?)
    }

    /// Case-insensitive substring match on the title, best rated first.
    pub async fn search_by_title(&self, term: &str, limit: u64) -> Result<Vec<Film>, StoreError> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", term.replace('%', "").replace('_', " "));
        let lowered: SimpleExpr = Func::lower(Expr::col(film::Column::Title)).into();

        debug!(term = %term, limit = limit, "fuzzy title search");
        Ok(film::Entity::find()
            .filter(Expr::expr(lowered).like(pattern))
            .order_by_desc(film::Column::Rating)
            .order_by_asc(film::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    pub async fn list_all(&self) -> Result<Vec<Film>, StoreError> {
        self.list_by_filter(&FilmQuery::ordered(FilmOrder::TitleAsc)).await
    }

    pub async fn list_by_filter(&self, query: &FilmQuery) -> Result<Vec<Film>, StoreError> {
        Ok(query.apply(film::Entity::find()).all(&*self.db).await?)
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(film::Entity::find().count(&*self.db).await?)
    }

    /// Staff rows for every id in one query, grouped by film.
    pub async fn staff_for(
        &self,
        film_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<StaffMember>>, StoreError> {
        if film_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = remarkable_staff::Entity::find()
            .filter(remarkable_staff::Column::FilmId.is_in(film_ids.iter().copied()))
            .order_by_asc(remarkable_staff::Column::Id)
            .all(&*self.db)
            .await?;

        let mut grouped: HashMap<i32, Vec<StaffMember>> = HashMap::new();
        for row in rows {
            grouped.entry(row.film_id).or_default().push(row);
        }
        Ok(grouped)
    }

    pub async fn translation_for(
        &self,
        film_id: i32,
        locale: Locale,
    ) -> Result<Option<Translation>, StoreError> {
        let row = film_translation::Entity::find()
            .filter(film_translation::Column::FilmId.eq(film_id))
            .filter(film_translation::Column::Locale.eq(locale.code()))
            .one(&*self.db)
            .await?;
        Ok(row.map(Translation::from))
    }

    /// Translation rows for every id in one query.
    pub async fn translations_for(
        &self,
        film_ids: &[i32],
        locale: Locale,
    ) -> Result<HashMap<i32, Translation>, StoreError> {
        if film_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = film_translation::Entity::find()
            .filter(film_translation::Column::FilmId.is_in(film_ids.iter().copied()))
            .filter(film_translation::Column::Locale.eq(locale.code()))
            .all(&*self.db)
            .await?;

        Ok(rows.into_iter().map(|row| (row.film_id, Translation::from(row))).collect())
    }

    pub async fn sitemap_entries(&self) -> Result<Vec<SitemapEntry>, StoreError> {
        let rows: Vec<(i32, Option<String>, String, i64)> = film::Entity::find()
            .select_only()
            .columns([
                film::Column::Id,
                film::Column::Slug,
                film::Column::Title,
                film::Column::AddedAt,
            ])
            .order_by_asc(film::Column::Id)
            .into_tuple()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, slug, title, added_at)| SitemapEntry { id, slug, title, added_at })
            .collect())
    }
}

/// Write side of the catalog, bound to the admin-tier connection.
#[derive(Clone, Debug)]
pub struct FilmWriter {
    db: Arc<DatabaseConnection>,
}

impl FilmWriter {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn update_fields(&self, id: i32, patch: FilmPatch) -> Result<Film, StoreError> {
        let current = film::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or(StoreError::NotFound { table: "films", id })?;

        if patch.is_empty() {
            return Ok(current);
        }

        let mut model: film::ActiveModel = current.into();
        if let Some(title) = patch.title {
            model.title = Set(title);
        }
        if let Some(raw) = patch.slug {
            let slug = slugify(&raw);
            if slug.is_empty() {
                return Err(StoreError::InvalidSlug(raw));
            }
            if self.slug_taken(&slug, Some(id)).await? {
                return Err(StoreError::SlugTaken(slug));
            }
            model.slug = Set(Some(slug));
        }
        if let Some(rating) = patch.rating {
            model.rating = Set(rating.clamp(0.0, 10.0));
        }
        if let Some(flag) = patch.is_hidden_gem {
            model.is_hidden_gem = Set(flag);
        }
        if let Some(flag) = patch.is_hunted_by_moviehunt {
            model.is_hunted_by_moviehunt = Set(flag);
        }
        set_nullable(&mut model.release_date, patch.release_date);
        set_nullable(&mut model.synopsis, patch.synopsis);
        set_nullable(&mut model.genres, patch.genres);
        set_nullable(&mut model.poster_path, patch.poster_path);
        set_nullable(&mut model.backdrop_path, patch.backdrop_path);
        set_nullable(&mut model.carousel_image, patch.carousel_image);
        set_nullable(&mut model.trailer_key, patch.trailer_key);
        set_nullable(&mut model.why_watch, patch.why_watch);
        set_nullable(&mut model.what_we_didnt_like, patch.what_we_didnt_like);

        debug!(film_id = id, "updating film");
        Ok(model.update(&*self.db).await?)
    }

    pub async fn create_film(&self, new: NewFilm) -> Result<Film, StoreError> {
        let fallback = match new.tmdb_id {
            Some(tmdb_id) => format!("film-{tmdb_id}"),
            None => "film".to_string(),
        };
        let slug = self.unique_slug(&new.title, &fallback, None).await?;

        let model = film::ActiveModel {
            id: Default::default(),
            title: Set(new.title),
            slug: Set(Some(slug)),
            tmdb_id: Set(new.tmdb_id),
            release_date: Set(new.release_date),
            rating: Set(new.rating.clamp(0.0, 10.0)),
            synopsis: Set(new.synopsis),
            genres: Set(new.genres),
            poster_path: Set(new.poster_path),
            backdrop_path: Set(new.backdrop_path),
            carousel_image: Set(new.carousel_image),
            is_hidden_gem: Set(new.is_hidden_gem),
            is_hunted_by_moviehunt: Set(new.is_hunted_by_moviehunt),
            trailer_key: Set(new.trailer_key),
            why_watch: Set(new.why_watch),
            what_we_didnt_like: Set(new.what_we_didnt_like),
            added_at: Set(now_sec()),
        };

        Ok(model.insert(&*self.db).await?)
    }

    pub async fn replace_staff(&self, film_id: i32, staff: Vec<NewStaff>) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        remarkable_staff::Entity::delete_many()
            .filter(remarkable_staff::Column::FilmId.eq(film_id))
            .exec(&txn)
            .await?;

        for member in staff {
            let model = remarkable_staff::ActiveModel {
                id: Default::default(),
                film_id: Set(film_id),
                name: Set(member.name),
                role: Set(member.role),
                photo_path: Set(member.photo_path),
            };
            remarkable_staff::Entity::insert(model).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Inserts or replaces the `locale` overlay of a film.
    pub async fn upsert_translation(
        &self,
        film_id: i32,
        locale: Locale,
        translation: Translation,
    ) -> Result<(), StoreError> {
        let existing = film_translation::Entity::find()
            .filter(film_translation::Column::FilmId.eq(film_id))
            .filter(film_translation::Column::Locale.eq(locale.code()))
            .one(&*self.db)
            .await?;

        let mut model = match existing {
            Some(row) => film_translation::ActiveModel::from(row),
            None => film_translation::ActiveModel {
                id: Default::default(),
                film_id: Set(film_id),
                locale: Set(locale.code().to_string()),
                ..Default::default()
            },
        };
        model.title = Set(translation.title.and_then(non_empty));
        model.synopsis = Set(translation.synopsis.and_then(non_empty));
        model.genres = Set(translation.genres.and_then(non_empty));
        model.why_watch = Set(translation.why_watch.and_then(non_empty));
        model.what_we_didnt_like = Set(translation.what_we_didnt_like.and_then(non_empty));

        model.save(&*self.db).await?;
        debug!(film_id = film_id, locale = locale.code(), "saved translation");
        Ok(())
    }

    /// Removes a film with its staff and translations. Returns `false` when
    /// no such film existed.
    pub async fn delete_film(&self, id: i32) -> Result<bool, StoreError> {
        let txn = self.db.begin().await?;

        film_translation::Entity::delete_many()
            .filter(film_translation::Column::FilmId.eq(id))
            .exec(&txn)
            .await?;
        remarkable_staff::Entity::delete_many()
            .filter(remarkable_staff::Column::FilmId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = film::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(deleted.rows_affected > 0)
    }

    /// Slug for `title` not used by any film other than `except_id`,
    /// suffixed `-2`, `-3`, … on collision.
    pub async fn unique_slug(
        &self,
        title: &str,
        fallback: &str,
        except_id: Option<i32>,
    ) -> Result<String, StoreError> {
        let base = match slugify(title) {
            s if s.is_empty() => slugify(fallback),
            s => s,
        };

        let mut candidate = base.clone();
        let mut n = 2;
        while self.slug_taken(&candidate, except_id).await? {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        Ok(candidate)
    }

    async fn slug_taken(&self, slug: &str, except_id: Option<i32>) -> Result<bool, StoreError> {
        let mut select = film::Entity::find().filter(film::Column::Slug.eq(slug));
        if let Some(id) = except_id {
            select = select.filter(film::Column::Id.ne(id));
        }
        Ok(select.count(&*self.db).await? > 0)
    }
}

fn set_nullable(field: &mut sea_orm::ActiveValue<Option<String>>, value: Option<String>) {
    if let Some(value) = value {
        *field = Set(non_empty(value));
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub(crate) fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
