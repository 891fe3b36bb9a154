use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;

use crate::models::Locale;

pub const LOCALE_COOKIE: &str = "locale";

/// UI copy for one locale.
#[derive(Debug)]
pub struct Strings {
    pub site_tagline: &'static str,
    pub home_title: &'static str,
    pub featured: &'static str,
    pub recent: &'static str,
    pub top_rated: &'static str,
    pub hidden_gems: &'static str,
    pub hunted: &'static str,
    pub all_films: &'static str,
    pub see_all: &'static str,
    pub films_count: &'static str,
    pub empty_list: &'static str,
    pub previous: &'static str,
    pub next: &'static str,
    pub page: &'static str,
    pub rating: &'static str,
    pub synopsis: &'static str,
    pub why_watch: &'static str,
    pub what_we_didnt_like: &'static str,
    pub remarkable_staff: &'static str,
    pub trailer: &'static str,
    pub machine_translated: &'static str,
    pub not_found_title: &'static str,
    pub not_found_body: &'static str,
    pub error_title: &'static str,
    pub back_home: &'static str,
    pub switch_locale: &'static str,
    pub newsletter_title: &'static str,
    pub newsletter_cta: &'static str,
    pub newsletter_placeholder: &'static str,
    pub newsletter_subject: &'static str,
    pub confirm_subject: &'static str,
    pub confirm_body: &'static str,
    pub confirm_button: &'static str,
    pub subscribe_pending: &'static str,
    pub invalid_link: &'static str,
    pub confirmed: &'static str,
    pub unsubscribed: &'static str,
    pub unsubscribe: &'static str,
    pub read_review: &'static str,
}

const FR: Strings = Strings {
    site_tagline: "Critiques et pépites de cinéma",
    home_title: "MovieHunt · critiques de films et pépites cachées",
    featured: "À la une",
    recent: "Ajouts récents",
    top_rated: "Les mieux notés",
    hidden_gems: "Pépites cachées",
    hunted: "Chassés par MovieHunt",
    all_films: "Tous les films",
    see_all: "Tout voir",
    films_count: "films au catalogue",
    empty_list: "Aucun film pour le moment.",
    previous: "Précédent",
    next: "Suivant",
    page: "Page",
    rating: "Note",
    synopsis: "Synopsis",
    why_watch: "Pourquoi le regarder",
    what_we_didnt_like: "Ce qu'on n'a pas aimé",
    remarkable_staff: "Équipe remarquable",
    trailer: "Bande-annonce",
    machine_translated: "",
    not_found_title: "Film introuvable",
    not_found_body: "Ce film n'existe pas ou a été retiré du catalogue.",
    error_title: "Une erreur est survenue",
    back_home: "Retour à l'accueil",
    switch_locale: "English",
    newsletter_title: "La newsletter MovieHunt",
    newsletter_cta: "S'inscrire",
    newsletter_placeholder: "votre@email.fr",
    newsletter_subject: "La pépite de la semaine",
    confirm_subject: "Confirmez votre inscription à MovieHunt",
    confirm_body: "Cliquez sur le lien ci-dessous pour confirmer votre inscription à la newsletter.",
    confirm_button: "Confirmer mon inscription",
    subscribe_pending: "Merci ! Consultez votre boîte mail pour confirmer votre inscription.",
    invalid_link: "Ce lien n'est plus valide.",
    confirmed: "Inscription confirmée, merci !",
    unsubscribed: "Vous êtes désinscrit de la newsletter.",
    unsubscribe: "Se désinscrire",
    read_review: "Lire la critique",
};

const EN: Strings = Strings {
    site_tagline: "Film reviews and hidden gems",
    home_title: "MovieHunt · film reviews and hidden gems",
    featured: "Featured",
    recent: "Recently added",
    top_rated: "Top rated",
    hidden_gems: "Hidden gems",
    hunted: "Hunted by MovieHunt",
    all_films: "All films",
    see_all: "See all",
    films_count: "films in the catalog",
    empty_list: "No films yet.",
    previous: "Previous",
    next: "Next",
    page: "Page",
    rating: "Rating",
    synopsis: "Synopsis",
    why_watch: "Why watch it",
    what_we_didnt_like: "What we didn't like",
    remarkable_staff: "Remarkable cast & crew",
    trailer: "Trailer",
    machine_translated: "Translated from the French review",
    not_found_title: "Film not found",
    not_found_body: "This film does not exist or was removed from the catalog.",
    error_title: "Something went wrong",
    back_home: "Back to home",
    switch_locale: "Français",
    newsletter_title: "The MovieHunt newsletter",
    newsletter_cta: "Subscribe",
    newsletter_placeholder: "you@example.com",
    newsletter_subject: "This week's gem",
    confirm_subject: "Confirm your MovieHunt subscription",
    confirm_body: "Click the link below to confirm your newsletter subscription.",
    confirm_button: "Confirm my subscription",
    subscribe_pending: "Thanks! Check your inbox to confirm your subscription.",
    invalid_link: "This link is no longer valid.",
    confirmed: "Subscription confirmed, thank you!",
    unsubscribed: "You have been unsubscribed from the newsletter.",
    unsubscribe: "Unsubscribe",
    read_review: "Read the review",
};

impl Locale {
    pub fn strings(self) -> &'static Strings {
        match self {
            Locale::Fr => &FR,
            Locale::En => &EN,
        }
    }

    pub fn other(self) -> Locale {
        match self {
            Locale::Fr => Locale::En,
            Locale::En => Locale::Fr,
        }
    }
}

/// Locale of the current request: the `/en` path prefix wins, then the
/// `locale` cookie, then French.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestLocale(pub Locale);

impl<S: Send + Sync> FromRequestParts<S> for RequestLocale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(RequestLocale(detect(&path, jar.get(LOCALE_COOKIE).map(|c| c.value()))))
    }
}

pub fn detect(path: &str, cookie: Option<&str>) -> Locale {
    if path == "/en" || path.starts_with("/en/") {
        return Locale::En;
    }
    cookie.and_then(Locale::from_code).unwrap_or_default()
}

/// Path of the same page in `target`, e.g. `/en/films/x` -> `/films/x`.
pub fn switch_path(path: &str, target: Locale) -> String {
    let bare = path.strip_prefix("/en").filter(|rest| rest.is_empty() || rest.starts_with('/')).unwrap_or(path);
    let bare = if bare.is_empty() { "/" } else { bare };
    match target {
        Locale::Fr => bare.to_string(),
        Locale::En if bare == "/" => "/en".to_string(),
        Locale::En => format!("/en{bare}"),
    }
}
