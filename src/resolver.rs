use tracing::{debug, info};

use crate::{
    error::StoreError,
    models::{Film, FilmPatch},
    slug::slugify,
    store::{FilmStore, FilmWriter},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Exact(Film),
    /// Found through the title fallback; the caller should redirect when the
    /// film's canonical slug differs from the one requested.
    Fuzzy(Film),
    NotFound,
}

impl Resolution {
    pub fn into_film(self) -> Option<Film> {
        match self {
            Resolution::Exact(film) | Resolution::Fuzzy(film) => Some(film),
            Resolution::NotFound => None,
        }
    }
}

/// Looks a film up by slug, falling back to a bounded title search for
/// links minted before slugs were stable.
pub async fn resolve_slug(
    store: &FilmStore,
    raw_slug: &str,
    fuzzy_limit: u64,
) -> Result<Resolution, StoreError> {
    let slug = slugify(raw_slug);
    if slug.is_empty() {
        return Ok(Resolution::NotFound);
    }

    if let Some(film) = store.find_by_slug(&slug).await? {
        return Ok(Resolution::Exact(film));
    }
    if slug != raw_slug {
        if let Some(film) = store.find_by_slug(raw_slug).await? {
            return Ok(Resolution::Exact(film));
        }
    }

    if fuzzy_limit == 0 {
        return Ok(Resolution::NotFound);
    }

    // Slug words are plain ASCII while titles keep their accents, so the
    // search runs one word at a time and candidates are compared by slug.
    let window = fuzzy_limit.saturating_mul(CANDIDATE_WINDOW);
    for term in search_terms(&slug) {
        let candidates = store.search_by_title(term, window).await?;
        debug!(slug = %slug, term = term, candidates = candidates.len(), "slug miss, tried title fallback");
        if let Some(film) = pick_candidate(&slug, candidates) {
            return Ok(Resolution::Fuzzy(film));
        }
    }

    Ok(Resolution::NotFound)
}

/// Title searches tried per slug miss.
const SEARCH_TERMS: usize = 3;
/// Candidates fetched per search, as a multiple of the fuzzy limit.
const CANDIDATE_WINDOW: u64 = 4;

/// Distinct slug words, longest first. Single letters are skipped unless
/// nothing else is left.
fn search_terms(slug: &str) -> Vec<&str> {
    let mut terms: Vec<&str> = Vec::new();
    for word in slug.split('-') {
        if word.len() >= 2 && !terms.contains(&word) {
            terms.push(word);
        }
    }
    if terms.is_empty() {
        terms.push(slug);
    }
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    terms.truncate(SEARCH_TERMS);
    terms
}

/// Prefers the candidate whose title slugifies to the requested slug, then
/// the best rated one whose title slug contains it.
fn pick_candidate(slug: &str, candidates: Vec<Film>) -> Option<Film> {
    let exact = candidates.iter().position(|f| slugify(&f.title) == slug);
    let partial = || candidates.iter().position(|f| slugify(&f.title).contains(slug));
    let idx = exact.or_else(partial)?;
    let mut candidates = candidates;
    Some(candidates.swap_remove(idx))
}

/// Slug to redirect a legacy `/film/{id}` link to, minting and persisting
/// one when the row has none. `None` when the id is unknown.
pub async fn legacy_redirect(
    store: &FilmStore,
    writer: &FilmWriter,
    id: i32,
) -> Result<Option<String>, StoreError> {
    let Some(film) = store.find_by_id(id).await? else {
        return Ok(None);
    };

    if let Some(slug) = film.slug.filter(|s| !s.is_empty()) {
        return Ok(Some(slug));
    }

    let slug = writer.unique_slug(&film.title, &format!("film-{id}"), Some(id)).await?;
    let patch = FilmPatch { slug: Some(slug.clone()), ..Default::default() };
    writer.update_fields(id, patch).await?;

    info!(film_id = id, slug = %slug, "minted slug for legacy film");
    Ok(Some(slug))
}
