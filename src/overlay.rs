use tracing::warn;

use crate::{
    models::{Film, Locale, LocalizedFilm, Translation},
    store::FilmStore,
};

/// Coalesces a translation onto its base film, field by field.
///
/// A translated value wins only when it is present and not blank; the base
/// value is kept otherwise, so overlaying never clears a field.
pub fn apply_translation(
    mut film: Film,
    translation: Option<Translation>,
    locale: Locale,
) -> LocalizedFilm {
    let Some(t) = translation else {
        return LocalizedFilm { film, locale, translated: false };
    };

    if let Some(title) = filled(t.title) {
        film.title = title;
    }
    film.synopsis = filled(t.synopsis).or(film.synopsis);
    film.genres = filled(t.genres).or(film.genres);
    film.why_watch = filled(t.why_watch).or(film.why_watch);
    film.what_we_didnt_like = filled(t.what_we_didnt_like).or(film.what_we_didnt_like);

    LocalizedFilm { film, locale, translated: true }
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn overlay(store: &FilmStore, film: Film, locale: Locale) -> LocalizedFilm {
    if locale.is_base() {
        return LocalizedFilm { film, locale, translated: false };
    }

    match store.translation_for(film.id, locale).await {
        Ok(translation) => apply_translation(film, translation, locale),
        Err(err) => {
            warn!(film_id = film.id, locale = locale.code(), error = %err, "translation lookup failed");
            LocalizedFilm { film, locale, translated: false }
        },
    }
}

/// Localizes a batch with a single translation query, preserving order.
pub async fn overlay_many(store: &FilmStore, films: Vec<Film>, locale: Locale) -> Vec<LocalizedFilm> {
    let untranslated = |films: Vec<Film>| -> Vec<LocalizedFilm> {
        films.into_iter().map(|film| LocalizedFilm { film, locale, translated: false }).collect()
    };

    if locale.is_base() || films.is_empty() {
        return untranslated(films);
    }

    let ids: Vec<i32> = films.iter().map(|f| f.id).collect();
    match store.translations_for(&ids, locale).await {
        Ok(mut translations) => films
            .into_iter()
            .map(|film| {
                let translation = translations.remove(&film.id);
                apply_translation(film, translation, locale)
            })
            .collect(),
        Err(err) => {
            warn!(count = ids.len(), locale = locale.code(), error = %err, "batch translation lookup failed");
            untranslated(films)
        },
    }
}
