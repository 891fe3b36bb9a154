use std::collections::HashMap;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    entities::newsletter_subscriber,
    error::{AppError, AppResult},
    models::{Locale, LocalizedFilm},
    overlay::overlay,
    store::{FilmOrder, FilmQuery, FilmStore, FilmWriter, now_sec},
    templates,
};

/// HTTP client for a Resend-compatible transactional email API.
#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    from: String,
}

impl EmailClient {
    pub fn new(http: reqwest::Client, api_key: String, api_url: String, from: String) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("No EMAIL_API_KEY provided - newsletter emails will only be logged");
        }
        Self { http, api_key, api_url, from }
    }

    pub async fn send(&self, to: &str, subject: &str, html: String) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            info!(to = %to, subject = %subject, "email not sent (no provider key)");
            return Ok(());
        }

        self.http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "from": self.from, "to": [to], "subject": subject, "html": html }))
            .send()
            .await?
            .error_for_status()?;
        debug!(to = %to, subject = %subject, "email sent");
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Newsletter {
    store: FilmStore,
    writer: FilmWriter,
    email: EmailClient,
    site_url: String,
}

impl Newsletter {
    pub fn new(store: FilmStore, writer: FilmWriter, email: EmailClient, site_url: String) -> Self {
        Self { store, writer, email, site_url }
    }

    /// Registers `email` and sends a confirmation link. Subscribing again
    /// after unsubscribing reactivates the address.
    pub async fn subscribe(&self, email: &str, locale: Locale) -> AppResult<()> {
        let email = normalize_email(email)
            .ok_or_else(|| AppError::bad_request("invalid email address"))?;
        let db = self.writer.db();

        let existing = newsletter_subscriber::Entity::find()
            .filter(newsletter_subscriber::Column::Email.eq(email.as_str()))
            .one(db)
            .await?;

        let subscriber = match existing {
            Some(row) if row.unsubscribed_at.is_none() && row.confirmed_at.is_some() => {
                debug!(email = %email, "already subscribed");
                return Ok(());
            },
            Some(row) => {
                let mut model: newsletter_subscriber::ActiveModel = row.into();
                model.locale = Set(locale.code().to_string());
                model.unsubscribed_at = Set(None);
                model.confirmed_at = Set(None);
                model.subscribed_at = Set(now_sec());
                model.update(db).await?
            },
            None => {
                newsletter_subscriber::ActiveModel {
                    id: Default::default(),
                    email: Set(email.clone()),
                    token: Set(uuid::Uuid::new_v4().simple().to_string()),
                    locale: Set(locale.code().to_string()),
                    subscribed_at: Set(now_sec()),
                    confirmed_at: Set(None),
                    unsubscribed_at: Set(None),
                }
                .insert(db)
                .await?
            },
        };

        let confirm_url = format!("{}/api/newsletter/confirm?token={}", self.site_url, subscriber.token);
        let html = templates::confirmation_email(locale, &confirm_url);
        self.email.send(&email, locale.strings().confirm_subject, html).await?;

        info!(email = %email, locale = locale.code(), "newsletter subscription pending");
        Ok(())
    }

    /// Returns `false` for unknown tokens.
    pub async fn confirm(&self, token: &str) -> AppResult<bool> {
        let Some(row) = self.find_by_token(token).await? else {
            return Ok(false);
        };
        if row.confirmed_at.is_some() && row.unsubscribed_at.is_none() {
            return Ok(true);
        }

        let mut model: newsletter_subscriber::ActiveModel = row.into();
        model.confirmed_at = Set(Some(now_sec()));
        model.unsubscribed_at = Set(None);
        model.update(self.writer.db()).await?;
        Ok(true)
    }

    /// Returns `false` for unknown tokens.
    pub async fn unsubscribe(&self, token: &str) -> AppResult<bool> {
        let Some(row) = self.find_by_token(token).await? else {
            return Ok(false);
        };
        if row.unsubscribed_at.is_some() {
            return Ok(true);
        }

        let mut model: newsletter_subscriber::ActiveModel = row.into();
        model.unsubscribed_at = Set(Some(now_sec()));
        model.update(self.writer.db()).await?;
        info!("newsletter unsubscribe");
        Ok(true)
    }

    /// Mails the most recently added film to every active subscriber.
    pub async fn send_latest(&self) -> AppResult<SendReport> {
        let latest = self
            .store
            .list_by_filter(&FilmQuery::ordered(FilmOrder::AddedDesc).limit(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("no film to send"))?;

        let subscribers = newsletter_subscriber::Entity::find()
            .filter(newsletter_subscriber::Column::ConfirmedAt.is_not_null())
            .filter(newsletter_subscriber::Column::UnsubscribedAt.is_null())
            .all(self.writer.db())
            .await?;

        let mut editions: HashMap<Locale, LocalizedFilm> = HashMap::new();
        let mut report = SendReport::default();

        for subscriber in subscribers {
            let locale = Locale::from_code(&subscriber.locale).unwrap_or_default();
            if !editions.contains_key(&locale) {
                let localized = overlay(&self.store, latest.clone(), locale).await;
                editions.insert(locale, localized);
            }
            let Some(film) = editions.get(&locale) else { continue };

            let unsubscribe_url =
                format!("{}/api/newsletter/unsubscribe?token={}", self.site_url, subscriber.token);
            let html = templates::newsletter_email(film, &self.site_url, &unsubscribe_url);
            let subject = format!("{} : {}", locale.strings().newsletter_subject, film.film.title);

            match self.email.send(&subscriber.email, &subject, html).await {
                Ok(()) => report.sent += 1,
                Err(err) => {
                    warn!(subscriber_id = subscriber.id, error = %err, "newsletter send failed");
                    report.failed += 1;
                },
            }
        }

        info!(film_id = latest.id, sent = report.sent, failed = report.failed, "newsletter sent");
        Ok(report)
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<newsletter_subscriber::Model>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(newsletter_subscriber::Entity::find()
            .filter(newsletter_subscriber::Column::Token.eq(token))
            .one(self.writer.db())
            .await?)
    }
}

/// Lowercased address when it looks deliverable, `None` otherwise.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && email.len() <= 254
        && !email.chars().any(char::is_whitespace);
    valid.then_some(email)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sea_orm::DatabaseConnection;

    use super::*;
    use crate::testing::{film, memory_db, seed_film, seed_translation};

    fn newsletter(db: Arc<DatabaseConnection>) -> Newsletter {
        let email = EmailClient::new(reqwest::Client::new(), String::new(), String::new(), "t@t.test".into());
        Newsletter::new(FilmStore::new(db.clone()), FilmWriter::new(db), email, "https://moviehunt.test".into())
    }

    async fn subscriber(db: &DatabaseConnection, email: &str) -> newsletter_subscriber::Model {
        newsletter_subscriber::Entity::find()
            .filter(newsletter_subscriber::Column::Email.eq(email))
            .one(db)
            .await
            .unwrap()
            .unwrap()
    }

    #[test]
    fn email_validation() {
        assert_eq!(normalize_email("  Jane.Doe@Example.FR "), Some("jane.doe@example.fr".into()));
        assert_eq!(normalize_email("nobody"), None);
        assert_eq!(normalize_email("@example.fr"), None);
        assert_eq!(normalize_email("a@b"), None);
        assert_eq!(normalize_email("a@@b.fr"), None);
        assert_eq!(normalize_email("a b@c.fr"), None);
    }

    #[tokio::test]
    async fn subscribe_confirm_unsubscribe_cycle() {
        let db = memory_db().await;
        let service = newsletter(db.clone());

        service.subscribe("fan@example.fr", Locale::En).await.unwrap();
        let row = subscriber(&db, "fan@example.fr").await;
        assert_eq!(row.locale, "en");
        assert!(row.confirmed_at.is_none());

        assert!(service.confirm(&row.token).await.unwrap());
        assert!(subscriber(&db, "fan@example.fr").await.confirmed_at.is_some());

        assert!(service.unsubscribe(&row.token).await.unwrap());
        assert!(subscriber(&db, "fan@example.fr").await.unsubscribed_at.is_some());

        service.subscribe("FAN@example.fr", Locale::Fr).await.unwrap();
        let again = subscriber(&db, "fan@example.fr").await;
        assert!(again.unsubscribed_at.is_none());
        assert_eq!(again.token, row.token);
        assert_eq!(again.locale, "fr");
    }

    #[tokio::test]
    async fn invalid_addresses_and_tokens_are_rejected() {
        let db = memory_db().await;
        let service = newsletter(db);

        let err = service.subscribe("not-an-email", Locale::Fr).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(!service.confirm("nope").await.unwrap());
        assert!(!service.unsubscribe("").await.unwrap());
    }

    #[tokio::test]
    async fn send_latest_reaches_confirmed_subscribers_only() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Ancien", 7.0)).await;
        seed_film(&db, film(2, "Nouveau", 8.0)).await;
        seed_translation(&db, 2, Locale::En, Some("New"), None).await;
        let service = newsletter(db.clone());

        for (email, locale) in [("a@x.fr", Locale::Fr), ("b@x.fr", Locale::En), ("c@x.fr", Locale::En)] {
            service.subscribe(email, locale).await.unwrap();
        }
        for email in ["a@x.fr", "b@x.fr"] {
            let token = subscriber(&db, email).await.token;
            service.confirm(&token).await.unwrap();
        }

        let report = service.send_latest().await.unwrap();
        assert_eq!(report, SendReport { sent: 2, failed: 0 });
    }

    #[tokio::test]
    async fn send_latest_without_films_is_not_found() {
        let db = memory_db().await;
        let err = newsletter(db).send_latest().await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
