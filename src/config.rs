use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub site_url: String,
    pub database_url: String,
    pub admin_database_url: String,
    pub admin_token: String,
    pub tmdb_access_token: String,
    pub tmdb_base_url: String,
    pub tmdb_rps: u32,
    pub image_base_url: String,
    pub email_api_key: String,
    pub email_api_url: String,
    pub newsletter_from: String,
    pub revalidate_secs: u64,
    pub top_rated_threshold: f64,
    pub hidden_gem_threshold: f64,
    pub featured_threshold: f64,
    pub featured_limit: u64,
    pub page_size: u64,
    pub fuzzy_lookup_limit: u64,
    pub hidden_gem_exclusions_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://moviehunt.db?mode=rwc".to_string());
        // Falls back to the public connection string when no elevated one is configured.
        let admin_database_url =
            std::env::var("ADMIN_DATABASE_URL").unwrap_or_else(|_| database_url.clone());

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            site_url: std::env::var("SITE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            database_url,
            admin_database_url,
            admin_token: std::env::var("ADMIN_TOKEN").unwrap_or_default(),
            tmdb_access_token: std::env::var("TMDB_ACCESS_TOKEN").unwrap_or_default(),
            tmdb_base_url: std::env::var("TMDB_BASE_URL")
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),
            tmdb_rps: parse_or("TMDB_RPS", 4)?,
            image_base_url: std::env::var("IMAGE_BASE_URL")
                .unwrap_or_else(|_| "https://image.tmdb.org/t/p/original".to_string()),
            email_api_key: std::env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            newsletter_from: std::env::var("NEWSLETTER_FROM")
                .unwrap_or_else(|_| "MovieHunt <newsletter@moviehunt.fr>".to_string()),
            revalidate_secs: parse_or("REVALIDATE_SECS", 3600)?,
            top_rated_threshold: parse_or("TOP_RATED_THRESHOLD", 5.0)?,
            hidden_gem_threshold: parse_or("HIDDEN_GEM_THRESHOLD", 7.0)?,
            featured_threshold: parse_or("FEATURED_THRESHOLD", 7.0)?,
            featured_limit: parse_or("FEATURED_LIMIT", 5)?,
            page_size: parse_or("PAGE_SIZE", 24)?,
            fuzzy_lookup_limit: parse_or("FUZZY_LOOKUP_LIMIT", 5)?,
            hidden_gem_exclusions_path: std::env::var("HIDDEN_GEM_EXCLUSIONS_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().with_context(|| key.to_string()),
        _ => Ok(default),
    }
}
