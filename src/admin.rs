use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Film, FilmPatch, Locale, NewFilm, Translation},
    newsletter::SendReport,
    tmdb::{SearchHit, highlight_staff},
};

/// Cast members kept as remarkable staff on import.
const IMPORTED_CAST: usize = 6;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/search", get(search))
        .route("/admin/films", post(create_film))
        .route("/admin/films/{id}", patch(update_film).delete(delete_film))
        .route("/api/newsletter/send-latest", post(send_latest))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Bearer check against `ADMIN_TOKEN`. An unset token disables the admin surface.
async fn require_admin(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let expected = state.config.admin_token.trim();
    if expected.is_empty() {
        return AppError::new(StatusCode::FORBIDDEN, anyhow::anyhow!("admin access is disabled"))
            .into_response();
    }

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if presented != Some(expected) {
        warn!(path = %req.uri().path(), "rejected admin request");
        return AppError::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!("invalid admin token"))
            .into_response();
    }

    let mut resp = next.run(req).await;
    resp.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    resp
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<SearchHit>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::bad_request("q is required"));
    }
    Ok(Json(state.tmdb.search_movies(q).await?))
}

#[derive(Debug, Deserialize)]
struct CreateFilm {
    tmdb_id: i32,
    rating: Option<f64>,
    #[serde(default)]
    is_hidden_gem: bool,
    #[serde(default)]
    is_hunted_by_moviehunt: bool,
    carousel_image: Option<String>,
    why_watch: Option<String>,
    what_we_didnt_like: Option<String>,
}

/// Imports a film from TMDB: French details into the base row, English
/// details into the overlay, then trailer and staff.
async fn create_film(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateFilm>,
) -> AppResult<(StatusCode, Json<Film>)> {
    let tmdb = &state.tmdb;
    let (details, english, credits) = futures::try_join!(
        tmdb.movie_details(body.tmdb_id, Locale::Fr),
        tmdb.movie_details(body.tmdb_id, Locale::En),
        tmdb.credits(body.tmdb_id),
    )?;

    let trailer_key = tmdb.find_trailer(body.tmdb_id).await.unwrap_or_else(|err| {
        warn!(tmdb_id = body.tmdb_id, error = %err, "trailer lookup failed");
        None
    });

    let genres = details.genre_labels();
    let film = state
        .writer
        .create_film(NewFilm {
            title: details.title,
            tmdb_id: Some(body.tmdb_id),
            release_date: details.release_date,
            rating: body.rating.unwrap_or(details.vote_average),
            synopsis: details.overview,
            genres,
            poster_path: details.poster_path,
            backdrop_path: details.backdrop_path,
            carousel_image: body.carousel_image,
            is_hidden_gem: body.is_hidden_gem,
            is_hunted_by_moviehunt: body.is_hunted_by_moviehunt,
            trailer_key,
            why_watch: body.why_watch,
            what_we_didnt_like: body.what_we_didnt_like,
        })
        .await?;

    let overlay = Translation {
        genres: english.genre_labels(),
        title: Some(english.title),
        synopsis: english.overview,
        ..Default::default()
    };
    let attached = async {
        state.writer.replace_staff(film.id, highlight_staff(&credits, IMPORTED_CAST)).await?;
        state.writer.upsert_translation(film.id, Locale::En, overlay).await
    }
    .await;

    // A half-imported film is removed so the operator can retry cleanly.
    if let Err(err) = attached {
        warn!(film_id = film.id, error = %err, "import incomplete, removing film");
        if let Err(cleanup) = state.writer.delete_film(film.id).await {
            warn!(film_id = film.id, error = %cleanup, "could not remove half-imported film");
        }
        return Err(err.into());
    }

    info!(film_id = film.id, tmdb_id = body.tmdb_id, slug = ?film.slug, "imported film");
    Ok((StatusCode::CREATED, Json(film)))
}

async fn update_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<FilmPatch>,
) -> AppResult<Json<Film>> {
    let film = state.writer.update_fields(id, patch).await?;
    info!(film_id = id, "updated film");
    Ok(Json(film))
}

async fn delete_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    if !state.writer.delete_film(id).await? {
        return Err(AppError::not_found(format!("no film with id {id}")));
    }
    info!(film_id = id, "deleted film");
    Ok((StatusCode::OK, Json(json!({ "deleted": id }))).into_response())
}

async fn send_latest(State(state): State<Arc<AppState>>) -> AppResult<Json<SendReport>> {
    Ok(Json(state.newsletter.send_latest().await?))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        routes,
        store::FilmStore,
        testing::{film, memory_db, seed_film, test_state},
    };

    fn authed(method: &str, uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer secret-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn missing_or_wrong_token_is_unauthorized() {
        let app = routes::router(test_state(memory_db().await));

        let anonymous = Request::builder().method("DELETE").uri("/admin/films/1").body(Body::empty()).unwrap();
        assert_eq!(app.clone().oneshot(anonymous).await.unwrap().status(), StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .method("DELETE")
            .uri("/admin/films/1")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.oneshot(wrong).await.unwrap().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_admin_token_disables_the_surface() {
        let db = memory_db().await;
        let mut state = test_state(db);
        let mut config = (*state.config).clone();
        config.admin_token = String::new();
        Arc::get_mut(&mut state).unwrap().config = Arc::new(config);

        let app = routes::router(state);
        let resp = app.oneshot(authed("GET", "/admin/search?q=heat", Body::empty())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn patch_updates_and_is_not_cached() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Drive", 7.8)).await;
        let app = routes::router(test_state(db.clone()));

        let body = Body::from(r#"{"rating": 8.5, "why_watch": "La poursuite d'ouverture."}"#);
        let resp = app.oneshot(authed("PATCH", "/admin/films/1", body)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
        let stored = FilmStore::new(db).find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.rating, 8.5);
        assert_eq!(stored.why_watch.as_deref(), Some("La poursuite d'ouverture."));
    }

    #[tokio::test]
    async fn patch_with_unusable_or_taken_slug_is_rejected() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Drive", 7.8)).await;
        seed_film(&db, film(2, "Heat", 8.3)).await;
        let app = routes::router(test_state(db.clone()));

        let resp = app
            .clone()
            .oneshot(authed("PATCH", "/admin/films/1", Body::from(r#"{"slug": "!!!"}"#)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(authed("PATCH", "/admin/films/1", Body::from(r#"{"slug": "Heat"}"#)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("heat"));

        let stored = FilmStore::new(db).find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.slug.as_deref(), Some("drive"));
    }

    #[tokio::test]
    async fn patch_and_delete_unknown_film_are_not_found() {
        let app = routes::router(test_state(memory_db().await));

        let resp = app
            .clone()
            .oneshot(authed("PATCH", "/admin/films/99", Body::from(r#"{"rating": 1.0}"#)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app.oneshot(authed("DELETE", "/admin/films/99", Body::empty())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_imports_from_tmdb_with_overlay_and_staff() {
        let db = memory_db().await;
        let app = routes::router(test_state(db.clone()));

        let body = Body::from(r#"{"tmdb_id": 550, "rating": 8.0, "is_hunted_by_moviehunt": true}"#);
        let resp = app.oneshot(authed("POST", "/admin/films", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let created: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(created["slug"], "fight-club");
        assert_eq!(created["is_hunted_by_moviehunt"], true);

        let store = FilmStore::new(db);
        let id = created["id"].as_i64().unwrap() as i32;
        assert_eq!(store.staff_for(&[id]).await.unwrap()[&id].len(), 2);
        assert!(store.translation_for(id, Locale::En).await.unwrap().is_some());
    }
}
