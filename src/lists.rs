use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    config::Config,
    curation::HiddenGemExclusions,
    error::StoreError,
    models::{CatalogEntry, Film, ListKind, Locale, Page},
    overlay::overlay_many,
    store::{FilmOrder, FilmQuery, FilmStore, Predicate},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ListSettings {
    pub top_rated_threshold: f64,
    pub hidden_gem_threshold: f64,
    pub featured_threshold: f64,
    pub featured_limit: u64,
}

impl From<&Config> for ListSettings {
    fn from(config: &Config) -> Self {
        Self {
            top_rated_threshold: config.top_rated_threshold,
            hidden_gem_threshold: config.hidden_gem_threshold,
            featured_threshold: config.featured_threshold,
            featured_limit: config.featured_limit,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub locale: Locale,
    pub with_staff: bool,
}

impl ListOptions {
    pub fn new(locale: Locale) -> Self {
        Self { locale, with_staff: false }
    }

    pub fn with_staff(mut self) -> Self {
        self.with_staff = true;
        self
    }
}

/// Named read policies over the film table.
#[derive(Clone, Debug)]
pub struct Catalog {
    store: FilmStore,
    settings: ListSettings,
    exclusions: Arc<HiddenGemExclusions>,
}

impl Catalog {
    pub fn new(store: FilmStore, settings: ListSettings, exclusions: Arc<HiddenGemExclusions>) -> Self {
        Self { store, settings, exclusions }
    }

    pub fn store(&self) -> &FilmStore {
        &self.store
    }

    pub async fn recent(&self, limit: u64, opts: ListOptions) -> Result<Vec<CatalogEntry>, StoreError> {
        let query = FilmQuery::ordered(FilmOrder::AddedDesc).limit(limit);
        let films = self.store.list_by_filter(&query).await?;
        Ok(self.compose(films, opts).await)
    }

    pub async fn top_rated(&self, limit: u64, opts: ListOptions) -> Result<Vec<CatalogEntry>, StoreError> {
        let threshold = self.settings.top_rated_threshold;
        let query = FilmQuery::ordered(FilmOrder::RatingDesc)
            .with(Predicate::MinRating(threshold))
            .limit(limit);

        let mut films = self.store.list_by_filter(&query).await?;
        films.retain(|f| query.matches(f));
        sort_by_rating(&mut films);
        Ok(self.compose(films, opts).await)
    }

    pub async fn hidden_gems(&self, limit: u64, opts: ListOptions) -> Result<Vec<CatalogEntry>, StoreError> {
        // The exclusion list is applied in memory, so the window is taken after filtering.
        let query = FilmQuery::ordered(FilmOrder::RatingDesc)
            .either(Predicate::HiddenGem(true))
            .either(Predicate::MinRating(self.settings.hidden_gem_threshold));

        let mut films = self.store.list_by_filter(&query).await?;
        let fetched = films.len();
        films.retain(|f| self.is_hidden_gem(f));
        sort_by_rating(&mut films);
        films.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        debug!(fetched = fetched, kept = films.len(), "assembled hidden gems");
        Ok(self.compose(films, opts).await)
    }

    /// Explicit curation always wins; otherwise the rating has to clear the
    /// threshold and the title must not be on the exclusion list.
    pub fn is_hidden_gem(&self, film: &Film) -> bool {
        film.is_hidden_gem
            || (film.rating >= self.settings.hidden_gem_threshold && !self.exclusions.excludes(film))
    }

    pub async fn hunted(&self, limit: u64, opts: ListOptions) -> Result<Vec<CatalogEntry>, StoreError> {
        let query = FilmQuery::ordered(FilmOrder::RatingDesc)
            .with(Predicate::Hunted(true))
            .limit(limit);
        let films = self.store.list_by_filter(&query).await?;
        Ok(self.compose(films, opts).await)
    }

    pub async fn featured(&self, opts: ListOptions) -> Result<Vec<CatalogEntry>, StoreError> {
        let query = FilmQuery::ordered(FilmOrder::RatingDesc)
            .with(Predicate::MinRating(self.settings.featured_threshold))
            .with(Predicate::HasCarouselImage)
            .limit(self.settings.featured_limit);
        let mut films = self.store.list_by_filter(&query).await?;
        films.retain(|f| query.matches(f));
        Ok(self.compose(films, opts).await)
    }

    /// Every film in title order, unwindowed.
    pub async fn all(&self, opts: ListOptions) -> Result<Vec<CatalogEntry>, StoreError> {
        let films = self.store.list_all().await?;
        Ok(self.compose(films, opts).await)
    }

    pub async fn paginated(
        &self,
        page: u64,
        per_page: u64,
        opts: ListOptions,
    ) -> Result<Page<CatalogEntry>, StoreError> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let query = FilmQuery::ordered(FilmOrder::TitleAsc)
            .offset((page - 1).saturating_mul(per_page))
            .limit(per_page);

        let (films, total) =
            futures::try_join!(self.store.list_by_filter(&query), self.store.count())?;
        let entries = self.compose(films, opts).await;
        Ok(Page { entries, page, per_page, total })
    }

    /// Dispatches on `kind`. `page` only matters for [`ListKind::All`].
    pub async fn list(
        &self,
        kind: ListKind,
        limit: u64,
        page: u64,
        opts: ListOptions,
    ) -> Result<Vec<CatalogEntry>, StoreError> {
        match kind {
            ListKind::Recent => self.recent(limit, opts).await,
            ListKind::TopRated => self.top_rated(limit, opts).await,
            ListKind::HiddenGems => self.hidden_gems(limit, opts).await,
            ListKind::Hunted => self.hunted(limit, opts).await,
            ListKind::Featured => self.featured(opts).await,
            ListKind::All => Ok(self.paginated(page, limit, opts).await?.entries),
        }
    }

    /// Joins staff (one query) and applies the locale overlay (one query).
    async fn compose(&self, films: Vec<Film>, opts: ListOptions) -> Vec<CatalogEntry> {
        let mut staff = if opts.with_staff && !films.is_empty() {
            let ids: Vec<i32> = films.iter().map(|f| f.id).collect();
            self.store.staff_for(&ids).await.unwrap_or_else(|err| {
                warn!(error = %err, "staff join failed");
                Default::default()
            })
        } else {
            Default::default()
        };

        overlay_many(&self.store, films, opts.locale)
            .await
            .into_iter()
            .map(|film| {
                let staff = staff.remove(&film.film.id).unwrap_or_default();
                CatalogEntry { film, staff }
            })
            .collect()
    }
}

/// Descending by rating; equal ratings keep their incoming order.
fn sort_by_rating(films: &mut [Film]) {
    films.sort_by(|a, b| b.rating.total_cmp(&a.rating));
}

/// Read paths render with whatever lists succeeded.
pub fn or_empty<T>(result: Result<Vec<T>, StoreError>, list: &str) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(list = list, error = %err, "list query failed, rendering empty");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    use super::*;
    use crate::testing::{film, memory_db, seed_film, seed_staff, seed_translation, test_catalog};

    fn ids(entries: &[CatalogEntry]) -> Vec<i32> {
        entries.iter().map(|e| e.film.film.id).collect()
    }

    #[tokio::test]
    async fn recent_orders_by_added_at() {
        let db = memory_db().await;
        for (id, added) in [(1, 100), (2, 300), (3, 200)] {
            let mut f = film(id, &format!("Film {id}"), 5.0);
            f.added_at = added;
            seed_film(&db, f).await;
        }

        let catalog = test_catalog(db);
        let out = catalog.recent(2, ListOptions::default()).await.unwrap();
        assert_eq!(ids(&out), vec![2, 3]);
    }

    #[tokio::test]
    async fn top_rated_respects_threshold_and_order() {
        let db = memory_db().await;
        for (id, rating) in [(1, 4.9), (2, 8.0), (3, 5.0), (4, 9.1), (5, 8.0), (6, 2.0)] {
            seed_film(&db, film(id, &format!("Film {id}"), rating)).await;
        }

        let catalog = test_catalog(db);
        let out = catalog.top_rated(10, ListOptions::default()).await.unwrap();

        assert!(out.iter().all(|e| e.film.film.rating >= 5.0));
        assert_eq!(out.len(), 4);
        assert!(out.windows(2).all(|w| w[0].film.film.rating >= w[1].film.film.rating));
        assert_eq!(out[0].film.film.id, 4);
    }

    #[test]
    fn rating_sort_is_stable_for_ties() {
        let mut films = vec![film(1, "A", 7.0), film(2, "B", 9.0), film(3, "C", 7.0), film(4, "D", 7.0)];
        sort_by_rating(&mut films);
        assert_eq!(films.iter().map(|f| f.id).collect::<Vec<_>>(), vec![2, 1, 3, 4]);
    }

    #[tokio::test]
    async fn hidden_gems_skip_excluded_titles_unless_flagged() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Pulp Fiction", 8.9)).await;
        let mut flagged = film(2, "Les Évadés", 9.3);
        flagged.is_hidden_gem = true;
        seed_film(&db, flagged).await;
        seed_film(&db, film(3, "Tampopo", 7.9)).await;
        let mut low_but_flagged = film(4, "Petit film", 5.5);
        low_but_flagged.is_hidden_gem = true;
        seed_film(&db, low_but_flagged).await;
        seed_film(&db, film(5, "Oubliable", 6.0)).await;

        let catalog = test_catalog(db);
        let out = catalog.hidden_gems(10, ListOptions::default()).await.unwrap();

        assert_eq!(ids(&out), vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn hidden_gems_cap_applies_after_exclusions() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Pulp Fiction", 9.5)).await;
        seed_film(&db, film(2, "Tampopo", 7.9)).await;
        seed_film(&db, film(3, "Paterson", 7.4)).await;

        let catalog = test_catalog(db);
        let out = catalog.hidden_gems(1, ListOptions::default()).await.unwrap();
        assert_eq!(ids(&out), vec![2]);
    }

    #[tokio::test]
    async fn hunted_and_featured_filter_on_curation() {
        let db = memory_db().await;
        let mut hunted = film(1, "Chassé", 6.5);
        hunted.is_hunted_by_moviehunt = true;
        seed_film(&db, hunted).await;
        let mut hero = film(2, "Vedette", 8.2);
        hero.carousel_image = Some("/hero.jpg".into());
        seed_film(&db, hero).await;
        let mut weak_hero = film(3, "Faible", 6.0);
        weak_hero.carousel_image = Some("/weak.jpg".into());
        seed_film(&db, weak_hero).await;
        seed_film(&db, film(4, "Sans image", 9.0)).await;

        let catalog = test_catalog(db);
        assert_eq!(ids(&catalog.hunted(10, ListOptions::default()).await.unwrap()), vec![1]);
        assert_eq!(ids(&catalog.featured(ListOptions::default()).await.unwrap()), vec![2]);
    }

    #[tokio::test]
    async fn featured_skips_whitespace_carousel_images() {
        let db = memory_db().await;
        let mut blank = film(1, "Espace", 9.0);
        blank.carousel_image = Some("   ".into());
        seed_film(&db, blank).await;
        let mut hero = film(2, "Vedette", 7.5);
        hero.carousel_image = Some("/hero.jpg".into());
        seed_film(&db, hero).await;

        let out = test_catalog(db).featured(ListOptions::default()).await.unwrap();
        assert_eq!(ids(&out), vec![2]);
        assert!(out.iter().all(|e| e.film.film.has_carousel_image()));
    }

    #[tokio::test]
    async fn paginated_walks_titles_alphabetically() {
        let db = memory_db().await;
        for (id, title) in [(1, "Zodiac"), (2, "Alien"), (3, "Memento"), (4, "Brazil"), (5, "Heat")] {
            seed_film(&db, film(id, title, 7.0)).await;
        }

        let catalog = test_catalog(db);
        let first = catalog.paginated(1, 2, ListOptions::default()).await.unwrap();
        let third = catalog.paginated(3, 2, ListOptions::default()).await.unwrap();

        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages(), 3);
        assert_eq!(ids(&first.entries), vec![2, 4]);
        assert_eq!(ids(&third.entries), vec![1]);
        assert!(!third.has_next());
    }

    #[tokio::test]
    async fn all_returns_every_film_by_title() {
        let db = memory_db().await;
        for (id, title) in [(1, "Zodiac"), (2, "Alien"), (3, "Memento")] {
            seed_film(&db, film(id, title, 1.0)).await;
        }

        let out = test_catalog(db).all(ListOptions::default()).await.unwrap();
        assert_eq!(ids(&out), vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn staff_and_locale_are_joined_when_requested() {
        let db = memory_db().await;
        seed_film(&db, film(1, "La Haine", 8.1)).await;
        seed_film(&db, film(2, "Les Misérables", 7.6)).await;
        seed_staff(&db, 1, "Mathieu Kassovitz", "Réalisateur").await;
        seed_translation(&db, 2, Locale::En, Some("Les Misérables (2019)"), None).await;

        let catalog = test_catalog(db);
        let out = catalog.recent(10, ListOptions::new(Locale::En).with_staff()).await.unwrap();

        let haine = out.iter().find(|e| e.film.film.id == 1).unwrap();
        assert_eq!(haine.staff.len(), 1);
        assert!(!haine.film.translated);

        let mis = out.iter().find(|e| e.film.film.id == 2).unwrap();
        assert!(mis.staff.is_empty());
        assert!(mis.film.translated);
        assert_eq!(mis.film.film.title, "Les Misérables (2019)");
    }

    #[tokio::test]
    async fn failing_store_surfaces_error_for_soft_handling() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([DbErr::Custom("down".into())])
            .into_connection();
        let catalog = test_catalog(Arc::new(db));

        let result = catalog.recent(5, ListOptions::default()).await;
        assert!(result.is_err());
        assert!(or_empty(result, "recent").is_empty());
    }
}
