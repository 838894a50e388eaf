use axum::http::{HeaderMap, header};
use serde::Serialize;

use crate::session::read_cookie;

/// Cookie remembering the reader's chosen locale.
pub const LOCALE_COOKIE_NAME: &str = "locale";

/// Locale
///
/// Locales served by the public surface. Every public path is prefixed by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Locale {
    En,
    Ar,
}

pub const SUPPORTED_LOCALES: [Locale; 2] = [Locale::En, Locale::Ar];

pub const DEFAULT_LOCALE: Locale = Locale::En;

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }

    /// Text direction of the locale, `ltr` or `rtl`.
    pub fn direction(&self) -> &'static str {
        match self {
            Locale::En => "ltr",
            Locale::Ar => "rtl",
        }
    }

    /// Exact, case-insensitive match against a supported code.
    pub fn from_code(code: &str) -> Option<Self> {
        SUPPORTED_LOCALES
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(code))
    }

    /// Matches a language tag such as `ar-SA` on its primary subtag.
    pub fn from_language_tag(tag: &str) -> Option<Self> {
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        Self::from_code(primary.trim())
    }
}

/// Splits a leading locale segment off `path`: `/ar/blog` → `(Ar, "/blog")`.
pub fn strip_locale(path: &str) -> Option<(Locale, &str)> {
    let rest = path.strip_prefix('/')?;
    let (segment, tail) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    Locale::from_code(segment).map(|l| (l, tail))
}

/// Picks the best supported locale from an `Accept-Language` value, honouring
/// q-weights. Ties keep header order.
pub fn negotiate(accept_language: &str) -> Option<Locale> {
    let mut candidates: Vec<(f32, Locale)> = accept_language
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.trim().split(';');
            let tag = parts.next()?.trim();
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Locale::from_language_tag(tag)
                .filter(|_| quality > 0.0)
                .map(|l| (quality, l))
        })
        .collect();

    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    candidates.first().map(|(_, l)| *l)
}

/// Locale for a request without a locale prefix: cookie, then
/// `Accept-Language`, then the default.
pub fn detect(headers: &HeaderMap) -> Locale {
    if let Some(locale) = read_cookie(headers, LOCALE_COOKIE_NAME).and_then(|c| Locale::from_code(&c)) {
        return locale;
    }

    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(negotiate)
        .unwrap_or(DEFAULT_LOCALE)
}
