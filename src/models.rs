use serde::{Deserialize, Serialize};

pub use crate::entities::{film::Model as Film, remarkable_staff::Model as StaffMember};

use crate::entities::film_translation;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Fr, Locale::En];

    pub fn code(self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "fr" => Some(Locale::Fr),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    /// French rows live in `films`; every other locale is an overlay.
    pub fn is_base(self) -> bool {
        self == Locale::Fr
    }

    pub fn path_prefix(self) -> &'static str {
        match self {
            Locale::Fr => "",
            Locale::En => "/en",
        }
    }

    pub fn tmdb_language(self) -> &'static str {
        match self {
            Locale::Fr => "fr-FR",
            Locale::En => "en-US",
        }
    }
}

impl Film {
    pub fn genre_list(&self) -> Vec<&str> {
        self.genres
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect()
    }

    pub fn release_year(&self) -> Option<i16> {
        let raw = self.release_date.as_deref()?;
        let date: jiff::civil::Date = raw.get(..10).unwrap_or(raw).parse().ok()?;
        Some(date.year())
    }

    pub fn poster_url(&self, image_base: &str) -> Option<String> {
        resolve_image(self.poster_path.as_deref(), image_base)
    }

    pub fn backdrop_url(&self, image_base: &str) -> Option<String> {
        resolve_image(self.backdrop_path.as_deref(), image_base)
    }

    /// Curated carousel override first, backdrop otherwise.
    pub fn hero_url(&self, image_base: &str) -> Option<String> {
        resolve_image(self.carousel_image.as_deref(), image_base)
            .or_else(|| self.backdrop_url(image_base))
    }

    pub fn has_carousel_image(&self) -> bool {
        self.carousel_image.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn trailer_url(&self) -> Option<String> {
        self.trailer_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| format!("https://www.youtube-nocookie.com/embed/{k}"))
    }

    pub fn path(&self, locale: Locale) -> String {
        match self.slug.as_deref() {
            Some(slug) if !slug.is_empty() => format!("{}/films/{slug}", locale.path_prefix()),
            _ => format!("{}/film/{}", locale.path_prefix(), self.id),
        }
    }
}

/// Joins a stored image reference onto the image base URL unless it is
/// already absolute.
pub fn resolve_image(reference: Option<&str>, image_base: &str) -> Option<String> {
    let reference = reference.map(str::trim).filter(|r| !r.is_empty())?;
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Some(reference.to_string());
    }
    Some(format!(
        "{}/{}",
        image_base.trim_end_matches('/'),
        reference.trim_start_matches('/')
    ))
}

/// Locale overrides for a film. Any field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Translation {
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub genres: Option<String>,
    pub why_watch: Option<String>,
    pub what_we_didnt_like: Option<String>,
}

impl From<film_translation::Model> for Translation {
    fn from(row: film_translation::Model) -> Self {
        Self {
            title: row.title,
            synopsis: row.synopsis,
            genres: row.genres,
            why_watch: row.why_watch,
            what_we_didnt_like: row.what_we_didnt_like,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocalizedFilm {
    #[serde(flatten)]
    pub film: Film,
    pub locale: Locale,
    pub translated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub film: LocalizedFilm,
    pub staff: Vec<StaffMember>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub entries: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 { 0 } else { self.total.div_ceil(self.per_page) }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListKind {
    Recent,
    TopRated,
    HiddenGems,
    Hunted,
    Featured,
    All,
}

impl ListKind {
    pub fn path(self) -> &'static str {
        match self {
            ListKind::Recent => "/recent",
            ListKind::TopRated => "/top-rated",
            ListKind::HiddenGems => "/hidden-gems",
            ListKind::Hunted => "/hunted",
            ListKind::Featured => "/",
            ListKind::All => "/films",
        }
    }
}

/// Partial update of a film row. Empty strings clear nullable columns.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilmPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub release_date: Option<String>,
    pub rating: Option<f64>,
    pub synopsis: Option<String>,
    pub genres: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub carousel_image: Option<String>,
    pub is_hidden_gem: Option<bool>,
    pub is_hunted_by_moviehunt: Option<bool>,
    pub trailer_key: Option<String>,
    pub why_watch: Option<String>,
    pub what_we_didnt_like: Option<String>,
}

impl FilmPatch {
    pub fn is_empty(&self) -> bool {
        *self == FilmPatch::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewFilm {
    pub title: String,
    pub tmdb_id: Option<i32>,
    pub release_date: Option<String>,
    pub rating: f64,
    pub synopsis: Option<String>,
    pub genres: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub carousel_image: Option<String>,
    pub is_hidden_gem: bool,
    pub is_hunted_by_moviehunt: bool,
    pub trailer_key: Option<String>,
    pub why_watch: Option<String>,
    pub what_we_didnt_like: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewStaff {
    pub name: String,
    pub role: String,
    pub photo_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    pub id: i32,
    pub slug: Option<String>,
    pub title: String,
    #[serde(rename = "added_on")]
    pub added_at: i64,
}
