use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Form, FromRequest, OriginalUri, Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{
    AppState, admin,
    error::{AppError, AppResult},
    i18n::{LOCALE_COOKIE, RequestLocale, switch_path},
    lists::{ListOptions, or_empty},
    models::{CatalogEntry, Film, FilmPatch, ListKind, Locale, Page},
    overlay::overlay,
    resolver::{Resolution, legacy_redirect, resolve_slug},
    templates::{self, HomeSections, View},
};

const HOME_LIST_LIMIT: u64 = 12;
const LIST_PAGE_LIMIT: u64 = 48;
const API_MAX_LIMIT: u64 = 100;

pub fn router(state: Arc<AppState>) -> Router {
    let pages = Router::new()
        .route("/", get(home))
        .route("/films", get(catalog))
        .route("/films/{slug}", get(film_detail))
        .route("/film/{id}", get(legacy_film))
        .route("/recent", get(recent))
        .route("/top-rated", get(top_rated))
        .route("/hidden-gems", get(hidden_gems))
        .route("/hunted", get(hunted));

    Router::new()
        .merge(pages.clone().route_layer(middleware::from_fn(follow_locale_cookie)))
        .nest("/en", pages)
        .route("/locale/{code}", get(switch_locale))
        .route("/api/films", get(api_list))
        .route("/api/films/{slug}", get(api_film))
        .route("/api/sitemap", get(api_sitemap))
        .route("/api/newsletter/subscribe", post(subscribe))
        .route("/api/newsletter/confirm", get(confirm))
        .route("/api/newsletter/unsubscribe", get(unsubscribe))
        .merge(admin::router(state.clone()))
        .fallback(fallback)
        .with_state(state)
}

fn view<'a>(state: &'a AppState, locale: Locale, path: &'a str) -> View<'a> {
    View { locale, path, site_url: &state.config.site_url, image_base: &state.config.image_base_url }
}

/// Public responses may be cached by the CDN for the revalidation window.
fn cached(state: &AppState, resp: impl IntoResponse) -> Response {
    let mut resp = resp.into_response();
    let policy = format!("public, s-maxage={}, stale-while-revalidate", state.config.revalidate_secs);
    if let Ok(value) = HeaderValue::from_str(&policy) {
        resp.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    resp
}

/// Marks a cached response whose locale was read from the `locale` cookie.
fn vary_by_cookie(mut resp: Response) -> Response {
    resp.headers_mut().append(header::VARY, HeaderValue::from_static("Cookie"));
    resp
}

/// Unprefixed pages always render French. A visitor whose cookie asks for
/// English is sent to the `/en` twin instead, so the cached French body
/// never depends on the cookie.
async fn follow_locale_cookie(jar: CookieJar, req: Request, next: Next) -> Response {
    let cookie_locale = jar.get(LOCALE_COOKIE).and_then(|c| Locale::from_code(c.value()));
    if cookie_locale != Some(Locale::En) {
        return next.run(req).await;
    }

    let uri = req.uri();
    let mut target = switch_path(uri.path(), Locale::En);
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }
    (
        [(header::CACHE_CONTROL, "no-store"), (header::VARY, "Cookie")],
        Redirect::to(&target),
    )
        .into_response()
}

fn html(state: &AppState, status: StatusCode, body: String) -> Response {
    if status.is_success() {
        cached(state, Html(body))
    } else {
        (status, Html(body)).into_response()
    }
}

fn moved_permanently(location: String) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

fn not_found_page(state: &AppState, locale: Locale, path: &str) -> Response {
    html(state, StatusCode::NOT_FOUND, templates::not_found_page(view(state, locale, path)))
}

async fn home(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let opts = ListOptions::new(locale);
    let catalog = &state.catalog;

    let (featured, recent, top_rated, hidden_gems, hunted, total) = futures::join!(
        catalog.featured(opts),
        catalog.recent(HOME_LIST_LIMIT, opts),
        catalog.top_rated(HOME_LIST_LIMIT, opts),
        catalog.hidden_gems(HOME_LIST_LIMIT, opts),
        catalog.hunted(HOME_LIST_LIMIT, opts),
        catalog.store().count(),
    );

    let sections = HomeSections {
        featured: or_empty(featured, "featured"),
        recent: or_empty(recent, "recent"),
        top_rated: or_empty(top_rated, "top_rated"),
        hidden_gems: or_empty(hidden_gems, "hidden_gems"),
        hunted: or_empty(hunted, "hunted"),
        total: total.map_err(|err| warn!(error = %err, "film count failed")).ok(),
    };

    html(&state, StatusCode::OK, templates::home_page(view(&state, locale, uri.path()), &sections))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u64>,
}

async fn catalog(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> Response {
    let opts = ListOptions::new(locale);
    let per_page = state.config.page_size;

    // Without `?page=` the whole catalog is rendered on one page.
    let listing = match query.page {
        Some(page) => {
            let page = page.max(1);
            state.catalog.paginated(page, per_page, opts).await.unwrap_or_else(|err| {
                warn!(page = page, error = %err, "catalog page failed, rendering empty");
                Page { entries: Vec::new(), page, per_page, total: 0 }
            })
        },
        None => {
            let entries = or_empty(state.catalog.all(opts).await, "all");
            let total = entries.len() as u64;
            Page { entries, page: 1, per_page: total.max(1), total }
        },
    };

    html(&state, StatusCode::OK, templates::catalog_page(view(&state, locale, uri.path()), &listing))
}

async fn render_list(state: &AppState, locale: Locale, path: &str, kind: ListKind) -> Response {
    let strings = locale.strings();
    let title = match kind {
        ListKind::Recent => strings.recent,
        ListKind::TopRated => strings.top_rated,
        ListKind::HiddenGems => strings.hidden_gems,
        ListKind::Hunted => strings.hunted,
        ListKind::Featured => strings.featured,
        ListKind::All => strings.all_films,
    };

    let entries = or_empty(
        state.catalog.list(kind, LIST_PAGE_LIMIT, 1, ListOptions::new(locale)).await,
        kind.path(),
    );
    html(state, StatusCode::OK, templates::list_page(view(state, locale, path), title, &entries))
}

async fn recent(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
) -> Response {
    render_list(&state, locale, uri.path(), ListKind::Recent).await
}

async fn top_rated(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
) -> Response {
    render_list(&state, locale, uri.path(), ListKind::TopRated).await
}

async fn hidden_gems(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
) -> Response {
    render_list(&state, locale, uri.path(), ListKind::HiddenGems).await
}

async fn hunted(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
) -> Response {
    render_list(&state, locale, uri.path(), ListKind::Hunted).await
}

/// Resolves a slug, treating store failures as a miss.
async fn lookup(state: &AppState, slug: &str) -> Resolution {
    resolve_slug(&state.store, slug, state.config.fuzzy_lookup_limit)
        .await
        .unwrap_or_else(|err| {
            warn!(slug = %slug, error = %err, "slug lookup failed");
            Resolution::NotFound
        })
}

/// Fetches and persists a trailer for films imported without one. Failures
/// leave the film untouched.
async fn backfill_trailer(state: &AppState, film: Film) -> Film {
    let Some(tmdb_id) = film.tmdb_id.filter(|_| film.trailer_key.is_none()) else {
        return film;
    };

    let key = match state.tmdb.find_trailer(tmdb_id).await {
        Ok(Some(key)) => key,
        Ok(None) => return film,
        Err(err) => {
            warn!(film_id = film.id, tmdb_id = tmdb_id, error = %err, "trailer backfill failed");
            return film;
        },
    };

    let patch = FilmPatch { trailer_key: Some(key), ..Default::default() };
    match state.writer.update_fields(film.id, patch).await {
        Ok(updated) => updated,
        Err(err) => {
            warn!(film_id = film.id, error = %err, "could not store trailer");
            film
        },
    }
}

async fn detail_entry(state: &AppState, film: Film, locale: Locale) -> CatalogEntry {
    let id = film.id;
    let store = &state.store;
    let (localized, staff) =
        futures::join!(overlay(store, film, locale), store.staff_for(std::slice::from_ref(&id)));
    let staff = staff
        .map(|mut grouped| grouped.remove(&id).unwrap_or_default())
        .unwrap_or_else(|err| {
            warn!(film_id = id, error = %err, "staff lookup failed");
            Vec::new()
        });
    CatalogEntry { film: localized, staff }
}

async fn film_detail(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> Response {
    let Some(film) = lookup(&state, &slug).await.into_film() else {
        return not_found_page(&state, locale, uri.path());
    };

    if let Some(canonical) = film.slug.as_deref().filter(|canonical| *canonical != slug) {
        return moved_permanently(format!("{}/films/{canonical}", locale.path_prefix()));
    }

    let film = backfill_trailer(&state, film).await;
    let entry = detail_entry(&state, film, locale).await;
    html(&state, StatusCode::OK, templates::film_page(view(&state, locale, uri.path()), &entry))
}

async fn legacy_film(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<i32>,
) -> Response {
    match legacy_redirect(&state.store, &state.writer, id).await {
        Ok(Some(slug)) => moved_permanently(format!("{}/films/{slug}", locale.path_prefix())),
        Ok(None) => not_found_page(&state, locale, uri.path()),
        Err(err) => {
            warn!(film_id = id, error = %err, "legacy redirect failed");
            let body = templates::error_page(view(&state, locale, uri.path()), &err.to_string());
            html(&state, StatusCode::INTERNAL_SERVER_ERROR, body)
        },
    }
}

#[derive(Debug, Deserialize)]
struct SwitchQuery {
    next: Option<String>,
}

async fn switch_locale(
    jar: CookieJar,
    Path(code): Path<String>,
    Query(query): Query<SwitchQuery>,
) -> AppResult<(CookieJar, Redirect)> {
    let target = Locale::from_code(&code)
        .ok_or_else(|| AppError::bad_request(format!("unsupported locale {code}")))?;

    // Only same-site paths; anything else lands on the home page.
    let next = query
        .next
        .filter(|next| next.starts_with('/') && !next.starts_with("//") && !next.contains('\\'))
        .unwrap_or_else(|| "/".to_string());

    let cookie = Cookie::build((LOCALE_COOKIE, target.code()))
        .path("/")
        .max_age(time::Duration::days(365))
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Redirect::to(&switch_path(&next, target))))
}

#[derive(Debug, Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
}

fn explicit_locale(requested: Option<&str>) -> Option<Locale> {
    requested.and_then(Locale::from_code)
}

fn query_locale(requested: Option<&str>, fallback: Locale) -> Locale {
    explicit_locale(requested).unwrap_or(fallback)
}

async fn api_film(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> AppResult<Response> {
    let from_cookie = explicit_locale(query.locale.as_deref()).is_none();
    let locale = query_locale(query.locale.as_deref(), locale);
    let film = lookup(&state, &slug)
        .await
        .into_film()
        .ok_or_else(|| AppError::not_found(format!("no film for slug {slug}")))?;

    let entry = detail_entry(&state, film, locale).await;
    let resp = cached(&state, Json(entry));
    Ok(if from_cookie { vary_by_cookie(resp) } else { resp })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    list: Option<ListKind>,
    limit: Option<u64>,
    page: Option<u64>,
    locale: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    list: ListKind,
    locale: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
    entries: Vec<CatalogEntry>,
}

async fn api_list(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    Query(query): Query<ListQuery>,
) -> Response {
    let from_cookie = explicit_locale(query.locale.as_deref()).is_none();
    let locale = query_locale(query.locale.as_deref(), locale);
    let kind = query.list.unwrap_or(ListKind::All);
    let limit = query.limit.unwrap_or(state.config.page_size).clamp(1, API_MAX_LIMIT);
    let opts = ListOptions::new(locale).with_staff();

    let body = match kind {
        ListKind::All if query.page.is_none() && query.limit.is_none() => ListResponse {
            list: kind,
            locale,
            page: None,
            total: None,
            entries: or_empty(state.catalog.all(opts).await, "all"),
        },
        ListKind::All => {
            let page = query.page.unwrap_or(1).max(1);
            match state.catalog.paginated(page, limit, opts).await {
                Ok(listing) => ListResponse {
                    list: kind,
                    locale,
                    page: Some(listing.page),
                    total: Some(listing.total),
                    entries: listing.entries,
                },
                Err(err) => {
                    warn!(page = page, error = %err, "api catalog page failed");
                    ListResponse { list: kind, locale, page: Some(page), total: None, entries: Vec::new() }
                },
            }
        },
        _ => ListResponse {
            list: kind,
            locale,
            page: None,
            total: None,
            entries: or_empty(state.catalog.list(kind, limit, 1, opts).await, kind.path()),
        },
    };

    let resp = cached(&state, Json(body));
    if from_cookie { vary_by_cookie(resp) } else { resp }
}

async fn api_sitemap(State(state): State<Arc<AppState>>) -> Response {
    let entries = or_empty(state.store.sitemap_entries().await, "sitemap");
    cached(&state, Json(entries))
}

#[derive(Debug, Deserialize)]
struct SubscribeForm {
    email: String,
    locale: Option<String>,
}

/// Accepts the HTML form post as well as JSON clients.
async fn subscribe(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    req: Request,
) -> AppResult<Response> {
    let wants_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let form: SubscribeForm = if wants_json {
        Json::<SubscribeForm>::from_request(req, &state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?
            .0
    } else {
        Form::<SubscribeForm>::from_request(req, &state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?
            .0
    };

    let locale = query_locale(form.locale.as_deref(), locale);
    state.newsletter.subscribe(&form.email, locale).await?;

    if wants_json {
        return Ok((StatusCode::ACCEPTED, Json(json!({ "status": "pending" }))).into_response());
    }
    let strings = locale.strings();
    let body = templates::message_page(
        view(&state, locale, "/api/newsletter/subscribe"),
        strings.newsletter_title,
        strings.subscribe_pending,
    );
    Ok((StatusCode::OK, Html(body)).into_response())
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    #[serde(default)]
    token: String,
}

async fn confirm(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<TokenQuery>,
) -> AppResult<Response> {
    let confirmed = state.newsletter.confirm(&query.token).await?;
    Ok(token_outcome(&state, locale, uri.path(), confirmed, locale.strings().confirmed))
}

async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<TokenQuery>,
) -> AppResult<Response> {
    let done = state.newsletter.unsubscribe(&query.token).await?;
    Ok(token_outcome(&state, locale, uri.path(), done, locale.strings().unsubscribed))
}

fn token_outcome(state: &AppState, locale: Locale, path: &str, ok: bool, message: &str) -> Response {
    let strings = locale.strings();
    let v = view(state, locale, path);
    if ok {
        (StatusCode::OK, Html(templates::message_page(v, strings.newsletter_title, message))).into_response()
    } else {
        let body = templates::message_page(v, strings.error_title, strings.invalid_link);
        (StatusCode::NOT_FOUND, Html(body)).into_response()
    }
}

async fn fallback(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
    OriginalUri(uri): OriginalUri,
) -> Response {
    not_found_page(&state, locale, uri.path())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{film, memory_db, seed_film, seed_staff, seed_translation, test_state};

    fn get_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unknown_slug_renders_not_found_page() {
        let app = router(test_state(memory_db().await));

        let resp = app.oneshot(get_req("/films/unknown-slug-xyz")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("Film introuvable"));
    }

    #[tokio::test]
    async fn detail_page_is_cached_and_localized() {
        let db = memory_db().await;
        seed_film(&db, film(1, "La Haine", 8.1)).await;
        seed_staff(&db, 1, "Vincent Cassel", "Vinz").await;
        seed_translation(&db, 1, Locale::En, Some("Hate"), Some("Twenty-four hours in the banlieue.")).await;
        let app = router(test_state(db));

        let fr = app.clone().oneshot(get_req("/films/la-haine")).await.unwrap();
        assert_eq!(fr.status(), StatusCode::OK);
        assert_eq!(fr.headers()[header::CACHE_CONTROL], "public, s-maxage=60, stale-while-revalidate");
        let fr = body_text(fr).await;
        assert!(fr.contains("La Haine"));
        assert!(fr.contains("Vincent Cassel"));

        let en = body_text(app.oneshot(get_req("/en/films/la-haine")).await.unwrap()).await;
        assert!(en.contains("Hate"));
        assert!(en.contains("Twenty-four hours in the banlieue."));
        assert!(en.contains(r#"lang="en""#));
    }

    #[tokio::test]
    async fn locale_cookie_selects_english_without_prefix() {
        let db = memory_db().await;
        seed_film(&db, film(1, "La Haine", 8.1)).await;
        seed_translation(&db, 1, Locale::En, Some("Hate"), None).await;
        let app = router(test_state(db));

        let req = axum::http::Request::builder()
            .uri("/films/la-haine")
            .header(header::COOKIE, "locale=en")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/en/films/la-haine");
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");

        let english = app.oneshot(get_req("/en/films/la-haine")).await.unwrap();
        assert!(body_text(english).await.contains("Hate"));
    }

    #[tokio::test]
    async fn cached_french_pages_ignore_other_cookies() {
        let db = memory_db().await;
        seed_film(&db, film(1, "La Haine", 8.1)).await;
        let app = router(test_state(db));

        let with_cookie = |uri: &str, cookie: &str| {
            axum::http::Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap()
        };

        let fr = app.clone().oneshot(with_cookie("/films/la-haine", "locale=fr")).await.unwrap();
        assert_eq!(fr.status(), StatusCode::OK);
        assert!(fr.headers().get(header::VARY).is_none());
        assert!(body_text(fr).await.contains(r#"lang="fr""#));

        let paged = app.clone().oneshot(with_cookie("/films?page=2", "locale=en")).await.unwrap();
        assert_eq!(paged.headers()[header::LOCATION], "/en/films?page=2");

        let home = app.oneshot(with_cookie("/", "locale=en")).await.unwrap();
        assert_eq!(home.headers()[header::LOCATION], "/en");
    }

    #[tokio::test]
    async fn api_locale_from_cookie_varies_the_cache() {
        let db = memory_db().await;
        seed_film(&db, film(1, "La Haine", 8.1)).await;
        seed_translation(&db, 1, Locale::En, Some("Hate"), None).await;
        let app = router(test_state(db));

        let req = axum::http::Request::builder()
            .uri("/api/films/la-haine")
            .header(header::COOKIE, "locale=en")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.headers()[header::VARY], "Cookie");
        assert!(body_text(resp).await.contains("Hate"));

        let explicit = app.clone().oneshot(get_req("/api/films/la-haine?locale=en")).await.unwrap();
        assert!(explicit.headers().get(header::VARY).is_none());

        let list = app.oneshot(get_req("/api/films?list=recent")).await.unwrap();
        assert_eq!(list.headers()[header::VARY], "Cookie");
    }

    #[tokio::test]
    async fn legacy_id_route_redirects_permanently() {
        let db = memory_db().await;
        let mut legacy = film(7, "Jeanne Dielman", 8.0);
        legacy.slug = None;
        seed_film(&db, legacy).await;
        let app = router(test_state(db));

        let resp = app.clone().oneshot(get_req("/en/film/7")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[header::LOCATION], "/en/films/jeanne-dielman");

        let missing = app.oneshot(get_req("/film/404")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_canonical_slug_redirects_to_canonical() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Cléo de 5 à 7", 7.9)).await;
        let app = router(test_state(db));

        let resp = app.oneshot(get_req("/films/Cleo-de-5-a-7")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[header::LOCATION], "/films/cleo-de-5-a-7");
    }

    #[tokio::test]
    async fn home_renders_every_section() {
        let db = memory_db().await;
        let mut gem = film(1, "Tampopo", 7.9);
        gem.is_hunted_by_moviehunt = true;
        seed_film(&db, gem).await;
        seed_film(&db, film(2, "Pulp Fiction", 8.9)).await;
        let app = router(test_state(db));

        let resp = app.clone().oneshot(get_req("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let page = body_text(resp).await;
        assert!(page.contains("Pépites cachées"));
        assert!(page.contains("Tampopo"));
        assert!(page.contains("2 films au catalogue"));

        let en = body_text(app.oneshot(get_req("/en")).await.unwrap()).await;
        assert!(en.contains("Hidden gems"));
    }

    #[tokio::test]
    async fn list_pages_apply_their_policy() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Pulp Fiction", 8.9)).await;
        seed_film(&db, film(2, "Tampopo", 7.9)).await;
        let app = router(test_state(db));

        let page = body_text(app.oneshot(get_req("/hidden-gems")).await.unwrap()).await;
        assert!(page.contains("Tampopo"));
        assert!(!page.contains("Pulp Fiction"));
    }

    #[tokio::test]
    async fn catalog_is_whole_without_page_and_windowed_with_it() {
        let db = memory_db().await;
        for (id, title) in [(1, "Zodiac"), (2, "Alien"), (3, "Memento")] {
            seed_film(&db, film(id, title, 7.0)).await;
        }
        let app = router(test_state(db));

        let all = body_text(app.clone().oneshot(get_req("/films")).await.unwrap()).await;
        assert!(all.contains("Alien") && all.contains("Memento") && all.contains("Zodiac"));
        assert!(!all.contains("?page=2"));

        let resp = app.oneshot(get_req("/en/films?page=1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Page 1 / 1"));
    }

    #[tokio::test]
    async fn locale_switch_sets_cookie_and_stays_on_site() {
        let app = router(test_state(memory_db().await));

        let resp = app.clone().oneshot(get_req("/locale/en?next=/films/drive")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/en/films/drive");
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("locale=en"));

        let resp = app.clone().oneshot(get_req("/locale/fr?next=//evil.example")).await.unwrap();
        assert_eq!(resp.headers()[header::LOCATION], "/");

        let resp = app.oneshot(get_req("/locale/de")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn api_returns_entries_and_json_404() {
        let db = memory_db().await;
        seed_film(&db, film(1, "Alien", 8.5)).await;
        seed_film(&db, film(2, "Brazil", 7.9)).await;
        seed_translation(&db, 2, Locale::En, Some("Brazil (1985)"), None).await;
        let app = router(test_state(db));

        let resp = app.clone().oneshot(get_req("/api/films?list=all&limit=1&page=2&locale=en")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["total"], 2);
        assert_eq!(body["entries"][0]["title"], "Brazil (1985)");
        assert_eq!(body["entries"][0]["translated"], true);

        let resp = app.clone().oneshot(get_req("/api/films/alien")).await.unwrap();
        let body: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["id"], 1);

        let missing = app.clone().oneshot(get_req("/api/films/nothing-here")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body_text(missing).await).unwrap();
        assert!(body["error"].is_string());

        let sitemap = body_text(app.oneshot(get_req("/api/sitemap")).await.unwrap()).await;
        let sitemap: serde_json::Value = serde_json::from_str(&sitemap).unwrap();
        assert_eq!(sitemap.as_array().map(Vec::len), Some(2));
        assert!(sitemap[0]["added_on"].is_number());
    }

    #[tokio::test]
    async fn newsletter_form_and_json_subscriptions() {
        let app = router(test_state(memory_db().await));

        let form = axum::http::Request::builder()
            .method("POST")
            .uri("/api/newsletter/subscribe")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=fan%40example.fr&locale=fr"))
            .unwrap();
        let resp = app.clone().oneshot(form).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Consultez votre boîte mail"));

        let json = axum::http::Request::builder()
            .method("POST")
            .uri("/api/newsletter/subscribe")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email": "broken"}"#))
            .unwrap();
        assert_eq!(app.clone().oneshot(json).await.unwrap().status(), StatusCode::BAD_REQUEST);

        let bad_token = app.oneshot(get_req("/api/newsletter/confirm?token=nope")).await.unwrap();
        assert_eq!(bad_token.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_not_found_page() {
        let app = router(test_state(memory_db().await));
        let resp = app.oneshot(get_req("/en/nowhere")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("Film not found"));
    }
}
