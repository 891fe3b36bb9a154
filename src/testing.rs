//! Fixtures shared by the unit tests.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::{
    AppState,
    config::Config,
    curation::HiddenGemExclusions,
    entities::{film, film_translation, remarkable_staff},
    lists::{Catalog, ListSettings},
    models::{Film, Locale},
    newsletter::{EmailClient, Newsletter},
    slug::slugify,
    store::{FilmStore, FilmWriter},
    tmdb::TmdbClient,
};

pub async fn memory_db() -> Arc<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite memory");
    Migrator::up(&db, None).await.expect("migrate");
    Arc::new(db)
}

/// Statements recorded by a mock connection. Every other handle must be
/// dropped first.
pub fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<sea_orm::Transaction> {
    Arc::try_unwrap(db).expect("mock connection still shared").into_transaction_log()
}

pub fn film(id: i32, title: &str, rating: f64) -> Film {
    Film {
        id,
        title: title.to_string(),
        slug: Some(slugify(title)),
        tmdb_id: None,
        release_date: None,
        rating,
        synopsis: Some(format!("Synopsis de {title}")),
        genres: Some("Drame".to_string()),
        poster_path: Some(format!("/poster-{id}.jpg")),
        backdrop_path: None,
        carousel_image: None,
        is_hidden_gem: false,
        is_hunted_by_moviehunt: false,
        trailer_key: None,
        why_watch: None,
        what_we_didnt_like: None,
        added_at: 1_700_000_000 + i64::from(id),
    }
}

pub async fn seed_film(db: &DatabaseConnection, film: Film) -> Film {
    film::ActiveModel::from(film).reset_all().insert(db).await.expect("insert film")
}

pub async fn seed_staff(db: &DatabaseConnection, film_id: i32, name: &str, role: &str) {
    remarkable_staff::ActiveModel {
        id: Default::default(),
        film_id: Set(film_id),
        name: Set(name.to_string()),
        role: Set(role.to_string()),
        photo_path: Set(None),
    }
    .insert(db)
    .await
    .expect("insert staff");
}

pub async fn seed_translation(
    db: &DatabaseConnection,
    film_id: i32,
    locale: Locale,
    title: Option<&str>,
    synopsis: Option<&str>,
) {
    film_translation::ActiveModel {
        id: Default::default(),
        film_id: Set(film_id),
        locale: Set(locale.code().to_string()),
        title: Set(title.map(str::to_string)),
        synopsis: Set(synopsis.map(str::to_string)),
        genres: Set(None),
        why_watch: Set(None),
        what_we_didnt_like: Set(None),
    }
    .insert(db)
    .await
    .expect("insert translation");
}

pub fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().expect("addr"),
        site_url: "https://moviehunt.test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        admin_database_url: "sqlite::memory:".to_string(),
        admin_token: "secret-token".to_string(),
        tmdb_access_token: String::new(),
        tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
        tmdb_rps: 50,
        image_base_url: "https://image.tmdb.org/t/p/original".to_string(),
        email_api_key: String::new(),
        email_api_url: "https://api.resend.com/emails".to_string(),
        newsletter_from: "MovieHunt <test@moviehunt.test>".to_string(),
        revalidate_secs: 60,
        top_rated_threshold: 5.0,
        hidden_gem_threshold: 7.0,
        featured_threshold: 7.0,
        featured_limit: 5,
        page_size: 24,
        fuzzy_lookup_limit: 5,
        hidden_gem_exclusions_path: None,
    }
}

pub fn test_catalog(db: Arc<DatabaseConnection>) -> Catalog {
    let config = test_config();
    Catalog::new(
        FilmStore::new(db),
        ListSettings::from(&config),
        Arc::new(HiddenGemExclusions::bundled().expect("bundled exclusions")),
    )
}

pub fn test_state(db: Arc<DatabaseConnection>) -> Arc<AppState> {
    let config = Arc::new(test_config());
    let http = reqwest::Client::new();
    let store = FilmStore::new(db.clone());
    let writer = FilmWriter::new(db.clone());
    let tmdb = TmdbClient::new(
        http.clone(),
        config.tmdb_access_token.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );
    let email = EmailClient::new(
        http,
        config.email_api_key.clone(),
        config.email_api_url.clone(),
        config.newsletter_from.clone(),
    );
    let newsletter = Newsletter::new(store.clone(), writer.clone(), email, config.site_url.clone());

    Arc::new(AppState {
        catalog: test_catalog(db),
        store,
        writer,
        tmdb: Arc::new(tmdb),
        newsletter,
        config,
    })
}
