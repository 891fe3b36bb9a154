use maud::{DOCTYPE, Markup, html};

use crate::{
    i18n::switch_path,
    models::{CatalogEntry, ListKind, Locale, LocalizedFilm, Page},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

/// Request-scoped rendering context.
#[derive(Clone, Copy, Debug)]
pub struct View<'a> {
    pub locale: Locale,
    pub path: &'a str,
    pub site_url: &'a str,
    pub image_base: &'a str,
}

struct Meta {
    title: String,
    description: String,
    image: Option<String>,
}

pub struct HomeSections {
    pub featured: Vec<CatalogEntry>,
    pub recent: Vec<CatalogEntry>,
    pub top_rated: Vec<CatalogEntry>,
    pub hidden_gems: Vec<CatalogEntry>,
    pub hunted: Vec<CatalogEntry>,
    pub total: Option<u64>,
}

pub fn home_page(view: View<'_>, sections: &HomeSections) -> String {
    let s = view.locale.strings();
    let meta = Meta {
        title: s.home_title.to_string(),
        description: s.site_tagline.to_string(),
        image: sections.featured.first().and_then(|e| e.film.film.hero_url(view.image_base)),
    };

    page(
        view,
        meta,
        html! {
            @if !sections.featured.is_empty() {
                section class="grid gap-4 md:grid-cols-2" {
                    @for entry in &sections.featured {
                        (hero_card(view, entry))
                    }
                }
            }
            @if let Some(total) = sections.total {
                p class="mt-6 text-sm text-gray-500" { (total) " " (s.films_count) }
            }
            (section(view, s.recent, ListKind::Recent, &sections.recent))
            (section(view, s.top_rated, ListKind::TopRated, &sections.top_rated))
            (section(view, s.hidden_gems, ListKind::HiddenGems, &sections.hidden_gems))
            (section(view, s.hunted, ListKind::Hunted, &sections.hunted))
            (newsletter_form(view))
        },
    )
}

pub fn list_page(view: View<'_>, title: &str, entries: &[CatalogEntry]) -> String {
    let meta = Meta {
        title: format!("{title} · MovieHunt"),
        description: view.locale.strings().site_tagline.to_string(),
        image: None,
    };

    page(
        view,
        meta,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { (title) }
            (film_grid(view, entries))
        },
    )
}

pub fn catalog_page(view: View<'_>, catalog: &Page<CatalogEntry>) -> String {
    let s = view.locale.strings();
    let base = format!("{}/films", view.locale.path_prefix());
    let meta = Meta {
        title: format!("{} · {} {} · MovieHunt", s.all_films, s.page, catalog.page),
        description: s.site_tagline.to_string(),
        image: None,
    };

    page(
        view,
        meta,
        html! {
            h1 class="text-3xl font-bold text-gray-900" { (s.all_films) }
            (film_grid(view, &catalog.entries))
            nav class="mt-8 flex items-center justify-between text-sm" {
                @if catalog.page > 1 {
                    a class="text-blue-600 hover:text-blue-800" href=(format!("{base}?page={}", catalog.page - 1)) { (s.previous) }
                } @else {
                    span {}
                }
                span class="text-gray-500" { (s.page) " " (catalog.page) " / " (catalog.total_pages().max(1)) }
                @if catalog.has_next() {
                    a class="text-blue-600 hover:text-blue-800" href=(format!("{base}?page={}", catalog.page + 1)) { (s.next) }
                } @else {
                    span {}
                }
            }
        },
    )
}

pub fn film_page(view: View<'_>, entry: &CatalogEntry) -> String {
    let s = view.locale.strings();
    let film = &entry.film.film;
    let meta = Meta {
        title: match film.release_year() {
            Some(year) => format!("{} ({year}) · MovieHunt", film.title),
            None => format!("{} · MovieHunt", film.title),
        },
        description: excerpt(film.synopsis.as_deref().unwrap_or(s.site_tagline), 160),
        image: film.poster_url(view.image_base),
    };

    page(
        view,
        meta,
        html! {
            article class="grid gap-8 md:grid-cols-3" {
                div {
                    @if let Some(poster) = film.poster_url(view.image_base) {
                        img class="w-full rounded-lg shadow" src=(poster) alt=(film.title) loading="lazy";
                    }
                }
                div class="md:col-span-2" {
                    h1 class="text-3xl font-bold text-gray-900" {
                        (film.title)
                        @if let Some(year) = film.release_year() {
                            span class="ml-2 font-normal text-gray-500" { "(" (year) ")" }
                        }
                    }
                    p class="mt-2 text-gray-700" {
                        span class="font-semibold" { (s.rating) " : " }
                        (format!("{:.1}/10", film.rating))
                    }
                    @let genres = film.genre_list();
                    @if !genres.is_empty() {
                        ul class="mt-2 flex flex-wrap gap-2" {
                            @for genre in genres {
                                li class="rounded bg-gray-100 px-2 py-1 text-xs text-gray-700" { (genre) }
                            }
                        }
                    }
                    @if entry.film.translated && !s.machine_translated.is_empty() {
                        p class="mt-2 text-xs italic text-gray-500" { (s.machine_translated) }
                    }
                    @if let Some(synopsis) = &film.synopsis {
                        (text_block(s.synopsis, synopsis))
                    }
                    @if let Some(why) = &film.why_watch {
                        (text_block(s.why_watch, why))
                    }
                    @if let Some(meh) = &film.what_we_didnt_like {
                        (text_block(s.what_we_didnt_like, meh))
                    }
                    @if let Some(trailer) = film.trailer_url() {
                        h2 class="mt-8 text-xl font-semibold text-gray-900" { (s.trailer) }
                        div class="mt-3 aspect-video" {
                            iframe class="h-full w-full rounded-lg" src=(trailer) title=(s.trailer) allow="encrypted-media; picture-in-picture" allowfullscreen="true" {}
                        }
                    }
                    @if !entry.staff.is_empty() {
                        h2 class="mt-8 text-xl font-semibold text-gray-900" { (s.remarkable_staff) }
                        ul class="mt-3 grid grid-cols-2 gap-4 md:grid-cols-4" {
                            @for member in &entry.staff {
                                li class="text-sm" {
                                    @if let Some(photo) = crate::models::resolve_image(member.photo_path.as_deref(), view.image_base) {
                                        img class="mb-2 w-full rounded" src=(photo) alt=(member.name) loading="lazy";
                                    }
                                    p class="font-medium text-gray-900" { (member.name) }
                                    p class="text-gray-500" { (member.role) }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn not_found_page(view: View<'_>) -> String {
    let s = view.locale.strings();
    message_page(view, s.not_found_title, s.not_found_body)
}

pub fn error_page(view: View<'_>, message: &str) -> String {
    message_page(view, view.locale.strings().error_title, message)
}

pub fn message_page(view: View<'_>, title: &str, message: &str) -> String {
    let s = view.locale.strings();
    let meta = Meta { title: format!("{title} · MovieHunt"), description: message.to_string(), image: None };

    page(
        view,
        meta,
        html! {
            div class="mx-auto max-w-xl bg-white shadow rounded-lg p-8" {
                h1 class="text-2xl font-bold text-gray-900" { (title) }
                p class="mt-4 text-gray-700" { (message) }
                a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href=(home_path(view.locale)) { (s.back_home) }
            }
        },
    )
}

pub fn confirmation_email(locale: Locale, confirm_url: &str) -> String {
    let s = locale.strings();
    html! {
        (DOCTYPE)
        html lang=(locale.code()) {
            body style="font-family: sans-serif" {
                h1 { (s.newsletter_title) }
                p { (s.confirm_body) }
                p { a href=(confirm_url) { (s.confirm_button) } }
            }
        }
    }
    .into_string()
}

pub fn newsletter_email(film: &LocalizedFilm, site_url: &str, unsubscribe_url: &str) -> String {
    let s = film.locale.strings();
    let link = format!("{site_url}{}", film.film.path(film.locale));
    html! {
        (DOCTYPE)
        html lang=(film.locale.code()) {
            body style="font-family: sans-serif" {
                h1 { (s.newsletter_subject) }
                h2 { (film.film.title) }
                p { (s.rating) " : " (format!("{:.1}/10", film.film.rating)) }
                @if let Some(synopsis) = &film.film.synopsis {
                    p { (synopsis) }
                }
                @if let Some(why) = &film.film.why_watch {
                    h3 { (s.why_watch) }
                    p { (why) }
                }
                p { a href=(link) { (s.read_review) } }
                hr;
                p style="font-size: 12px; color: #666" { a href=(unsubscribe_url) { (s.unsubscribe) } }
            }
        }
    }
    .into_string()
}

fn page(view: View<'_>, meta: Meta, body: Markup) -> String {
    let s = view.locale.strings();
    let canonical = format!("{}{}", view.site_url, view.path);
    let fr_url = format!("{}{}", view.site_url, switch_path(view.path, Locale::Fr));
    let en_url = format!("{}{}", view.site_url, switch_path(view.path, Locale::En));
    let switch_href = format!(
        "/locale/{}?next={}",
        view.locale.other().code(),
        urlencoding::encode(&switch_path(view.path, view.locale.other()))
    );

    html! {
        (DOCTYPE)
        html lang=(view.locale.code()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (meta.title) }
                meta name="description" content=(meta.description);
                link rel="canonical" href=(canonical);
                link rel="alternate" hreflang="fr" href=(fr_url);
                link rel="alternate" hreflang="en" href=(en_url);
                meta property="og:type" content="website";
                meta property="og:site_name" content="MovieHunt";
                meta property="og:title" content=(meta.title);
                meta property="og:description" content=(meta.description);
                meta property="og:url" content=(canonical);
                @if let Some(image) = &meta.image {
                    meta property="og:image" content=(image);
                }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" {
                header class="bg-white shadow" {
                    div class="max-w-6xl mx-auto px-6 py-4 flex items-center justify-between" {
                        a class="text-2xl font-bold text-gray-900" href=(home_path(view.locale)) { "MovieHunt" }
                        nav class="flex gap-4 text-sm text-gray-700" {
                            a href=(list_path(view.locale, ListKind::All)) { (s.all_films) }
                            a href=(list_path(view.locale, ListKind::TopRated)) { (s.top_rated) }
                            a href=(list_path(view.locale, ListKind::HiddenGems)) { (s.hidden_gems) }
                            a href=(list_path(view.locale, ListKind::Hunted)) { (s.hunted) }
                            a class="font-semibold" href=(switch_href) { (s.switch_locale) }
                        }
                    }
                }
                main class="max-w-6xl mx-auto px-6 py-10" { (body) }
            }
        }
    }
    .into_string()
}

fn section(view: View<'_>, title: &str, kind: ListKind, entries: &[CatalogEntry]) -> Markup {
    html! {
        section class="mt-12" {
            div class="flex items-baseline justify-between" {
                h2 class="text-2xl font-semibold text-gray-900" { (title) }
                a class="text-sm text-blue-600 hover:text-blue-800" href=(list_path(view.locale, kind)) { (view.locale.strings().see_all) }
            }
            (film_grid(view, entries))
        }
    }
}

fn film_grid(view: View<'_>, entries: &[CatalogEntry]) -> Markup {
    html! {
        @if entries.is_empty() {
            p class="mt-4 text-gray-600" { (view.locale.strings().empty_list) }
        } @else {
            ul class="mt-4 grid grid-cols-2 gap-6 md:grid-cols-4 lg:grid-cols-6" {
                @for entry in entries {
                    li { (film_card(view, entry)) }
                }
            }
        }
    }
}

fn film_card(view: View<'_>, entry: &CatalogEntry) -> Markup {
    let film = &entry.film.film;
    html! {
        a class="block group" href=(film.path(view.locale)) {
            @if let Some(poster) = film.poster_url(view.image_base) {
                img class="w-full rounded-lg shadow group-hover:opacity-80" src=(poster) alt=(film.title) loading="lazy";
            } @else {
                div class="aspect-[2/3] w-full rounded-lg bg-gray-200" {}
            }
            p class="mt-2 text-sm font-medium text-gray-900" { (film.title) }
            p class="text-xs text-gray-500" { (format!("{:.1}", film.rating)) " ★" }
        }
    }
}

fn hero_card(view: View<'_>, entry: &CatalogEntry) -> Markup {
    let film = &entry.film.film;
    html! {
        a class="relative block overflow-hidden rounded-xl shadow" href=(film.path(view.locale)) {
            @if let Some(hero) = film.hero_url(view.image_base) {
                img class="h-64 w-full object-cover" src=(hero) alt=(film.title);
            }
            div class="absolute bottom-0 w-full bg-gradient-to-t from-black/80 p-4" {
                p class="text-xl font-semibold text-white" { (film.title) }
                p class="text-sm text-gray-200" { (format!("{:.1}/10", film.rating)) }
            }
        }
    }
}

fn text_block(title: &str, body: &str) -> Markup {
    html! {
        h2 class="mt-6 text-xl font-semibold text-gray-900" { (title) }
        @for paragraph in body.split("\n\n").filter(|p| !p.trim().is_empty()) {
            p class="mt-2 text-gray-700 leading-relaxed" { (paragraph.trim()) }
        }
    }
}

fn newsletter_form(view: View<'_>) -> Markup {
    let s = view.locale.strings();
    html! {
        section class="mt-16 bg-white shadow rounded-lg p-8" {
            h2 class="text-xl font-semibold text-gray-900" { (s.newsletter_title) }
            form class="mt-4 flex gap-3" method="post" action="/api/newsletter/subscribe" {
                input type="hidden" name="locale" value=(view.locale.code());
                input class="flex-1 rounded-md border border-gray-300 px-3 py-2" type="email" name="email" placeholder=(s.newsletter_placeholder) required="required";
                button class="rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { (s.newsletter_cta) }
            }
        }
    }
}

fn home_path(locale: Locale) -> &'static str {
    match locale {
        Locale::Fr => "/",
        Locale::En => "/en",
    }
}

fn list_path(locale: Locale, kind: ListKind) -> String {
    match kind {
        ListKind::Featured => home_path(locale).to_string(),
        _ => format!("{}{}", locale.path_prefix(), kind.path()),
    }
}

/// First `max` characters, cut on a word boundary.
fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    match cut.rfind(' ') {
        Some(idx) => format!("{}…", cut[..idx].trim_end()),
        None => format!("{cut}…"),
    }
}
