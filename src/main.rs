mod admin;
mod config;
mod curation;
mod db;
mod entities;
mod error;
mod i18n;
mod lists;
mod models;
mod newsletter;
mod overlay;
mod resolver;
mod routes;
mod slug;
mod store;
mod templates;
#[cfg(test)]
mod testing;
mod tmdb;

use std::{sync::Arc, time::Duration};

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    curation::HiddenGemExclusions,
    lists::{Catalog, ListSettings},
    newsletter::{EmailClient, Newsletter},
    store::{FilmStore, FilmWriter},
    tmdb::TmdbClient,
};

pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
    pub store: FilmStore,
    pub writer: FilmWriter,
    pub tmdb: Arc<TmdbClient>,
    pub newsletter: Newsletter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,moviehunt=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("moviehunt/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let public_db = Arc::new(db::connect(&config.database_url).await?);
    let admin_db = if config.admin_database_url == config.database_url {
        public_db.clone()
    } else {
        Arc::new(db::connect(&config.admin_database_url).await?)
    };
    db::migrate(&admin_db).await?;

    let exclusions = HiddenGemExclusions::load(config.hidden_gem_exclusions_path.as_deref())?;
    tracing::info!(
        list = %exclusions.name,
        version = exclusions.version,
        titles = exclusions.len(),
        "loaded hidden gem exclusions"
    );

    let store = FilmStore::new(public_db.clone());
    let writer = FilmWriter::new(admin_db.clone());
    let catalog = Catalog::new(store.clone(), ListSettings::from(&*config), Arc::new(exclusions));

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

    let state = Arc::new(AppState {
        config: config.clone(),
        catalog,
        store,
        writer,
        tmdb: Arc::new(tmdb),
        newsletter,
    });

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, site = %config.site_url, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    db::close(admin_db).await?;
    db::close(public_db).await?;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
