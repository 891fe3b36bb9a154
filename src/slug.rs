use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

const APOSTROPHES: [char; 4] = ['\'', '\u{2019}', '\u{2018}', '\u{02BC}'];

/// French elided articles and pronouns. An apostrophe after one of these
/// separates two words (`l'été`), anywhere else it is part of the word
/// (`don't`).
const ELISIONS: [&str; 10] = ["l", "d", "j", "n", "s", "c", "m", "t", "qu", "jusqu"];

/// Turns display text into a URL-safe `[a-z0-9-]` token.
///
/// Accents are stripped through NFD decomposition, whitespace and underscores
/// become hyphens, every other symbol is dropped, and hyphen runs collapse.
/// `slugify(slugify(s)) == slugify(s)` for every input.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();

    for c in text.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            word.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            push_hyphen(&mut out);
            word.clear();
        } else if APOSTROPHES.contains(&c) {
            if ELISIONS.contains(&word.as_str()) {
                push_hyphen(&mut out);
                word.clear();
            }
        } else if let Some(folded) = fold_ligature(c) {
            out.push_str(folded);
            word.push_str(folded);
        }
    }

    out.trim_end_matches('-').to_string()
}

fn push_hyphen(out: &mut String) {
    if !out.is_empty() && !out.ends_with('-') {
        out.push('-');
    }
}

/// Letters NFD leaves intact but readers expect spelled out.
fn fold_ligature(c: char) -> Option<&'static str> {
    match c {
        'œ' => Some("oe"),
        'æ' => Some("ae"),
        'ß' => Some("ss"),
        'ø' => Some("o"),
        'ł' => Some("l"),
        'đ' => Some("d"),
        _ => None,
    }
}
