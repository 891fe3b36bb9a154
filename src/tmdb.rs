use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{error::AppResult, models::{Locale, NewStaff}};

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        if access_token.trim().is_empty() {
            tracing::warn!("Using mock TMDB data - no TMDB_ACCESS_TOKEN provided");
        }

        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, access_token, base_url, limiter }
    }

    fn is_mock(&self) -> bool {
        self.access_token.trim().is_empty()
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<T> {
        self.limiter.until_ready().await;

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        debug!(url = %url, "TMDB request");

        Ok(self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    pub async fn search_movies(&self, title: &str) -> AppResult<Vec<SearchHit>> {
        if self.is_mock() {
            return Ok(vec![mock_hit()]);
        }

        let resp: SearchResponse = self
            .get("/search/movie", &[("query", title), ("language", Locale::Fr.tmdb_language())])
            .await?;
        Ok(resp.results)
    }

    pub async fn movie_details(&self, tmdb_id: i32, locale: Locale) -> AppResult<MovieDetails> {
        if self.is_mock() {
            let hit = mock_hit();
            return Ok(MovieDetails {
                id: tmdb_id,
                title: hit.title,
                overview: hit.overview,
                release_date: hit.release_date,
                genres: vec![Genre { name: "Drame".to_string() }],
                poster_path: hit.poster_path,
                backdrop_path: None,
                vote_average: 8.8,
            });
        }

        self.get(&format!("/movie/{tmdb_id}"), &[("language", locale.tmdb_language())]).await
    }

    pub async fn credits(&self, tmdb_id: i32) -> AppResult<Credits> {
        if self.is_mock() {
            return Ok(Credits {
                cast: vec![CastMember {
                    name: "Brad Pitt".to_string(),
                    character: Some("Tyler Durden".to_string()),
                    profile_path: None,
                    order: 0,
                }],
                crew: vec![CrewMember {
                    name: "David Fincher".to_string(),
                    job: "Director".to_string(),
                    profile_path: None,
                }],
            });
        }

        self.get(&format!("/movie/{tmdb_id}/credits"), &[]).await
    }

    pub async fn videos(&self, tmdb_id: i32, locale: Locale) -> AppResult<Vec<Video>> {
        if self.is_mock() {
            return Ok(Vec::new());
        }

        let resp: VideosResponse = self
            .get(&format!("/movie/{tmdb_id}/videos"), &[("language", locale.tmdb_language())])
            .await?;
        Ok(resp.results)
    }

    /// French trailers first, English otherwise.
    pub async fn find_trailer(&self, tmdb_id: i32) -> AppResult<Option<String>> {
        for locale in Locale::ALL {
            let videos = self.videos(tmdb_id, locale).await?;
            if let Some(key) = pick_trailer(&videos) {
                debug!(tmdb_id = tmdb_id, locale = locale.code(), key = %key, "found trailer");
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

fn mock_hit() -> SearchHit {
    SearchHit {
        id: 550,
        title: "Fight Club".to_string(),
        original_title: Some("Fight Club".to_string()),
        release_date: Some("1999-10-15".to_string()),
        overview: Some("Mock TMDB entry".to_string()),
        poster_path: Some("/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg".to_string()),
    }
}

/// Best YouTube video to embed: official trailer, any trailer, then teaser.
pub fn pick_trailer(videos: &[Video]) -> Option<String> {
    let youtube = || videos.iter().filter(|v| v.site.eq_ignore_ascii_case("youtube"));

    youtube()
        .find(|v| v.kind == "Trailer" && v.official)
        .or_else(|| youtube().find(|v| v.kind == "Trailer"))
        .or_else(|| youtube().find(|v| v.kind == "Teaser"))
        .map(|v| v.key.clone())
}

/// Directors followed by the top-billed cast.
pub fn highlight_staff(credits: &Credits, max_cast: usize) -> Vec<NewStaff> {
    let directors = credits.crew.iter().filter(|c| c.job == "Director").map(|c| NewStaff {
        name: c.name.clone(),
        role: "Director".to_string(),
        photo_path: c.profile_path.clone(),
    });

    let mut cast: Vec<&CastMember> = credits.cast.iter().collect();
    cast.sort_by_key(|c| c.order);
    let actors = cast.into_iter().take(max_cast).map(|c| NewStaff {
        name: c.name.clone(),
        role: "Actor".to_string(),
        photo_path: c.profile_path.clone(),
    });

    directors.chain(actors).collect()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchHit {
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MovieDetails {
    pub id: i32,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
}

impl MovieDetails {
    pub fn genre_labels(&self) -> Option<String> {
        let joined = self.genres.iter().map(|g| g.name.as_str()).collect::<Vec<_>>().join(", ");
        (!joined.is_empty()).then_some(joined)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    results: Vec<Video>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
}
