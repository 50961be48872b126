//! Filename generation for materialized logos.

use uuid::Uuid;

/// Turn a display name into a filesystem-safe slug. Non-alphanumeric runs
/// collapse into single dashes; an all-symbol name falls back to "logo".
pub fn slugify(name: &str) -> String {
    let slug = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "logo".to_string()
    } else {
        slug
    }
}

/// Short random suffix appended to logo filenames so repeated resolutions of
/// similarly-named orgs never collide.
pub fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Extensions carried over from a source URL; anything else (including the
/// `.com` tail of domain-guess URLs) falls back to `png`.
const KNOWN_IMAGE_EXTENSIONS: [&str; 7] = ["png", "svg", "jpg", "jpeg", "gif", "webp", "ico"];

/// File extension taken from the source URL path, defaulting to `png` when
/// the path carries none (or something that is not an image extension).
pub fn extension_from_url(url: &str) -> String {
    let path = reqwest::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or(url).to_string());

    let file = path.rsplit('/').next().unwrap_or("");
    match file.rsplit_once('.') {
        Some((_, ext)) if KNOWN_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            ext.to_ascii_lowercase()
        }
        _ => "png".to_string(),
    }
}
