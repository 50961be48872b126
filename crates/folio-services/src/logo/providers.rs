//! External logo providers.
//!
//! Providers only produce candidate image URLs; downloading and persistence
//! happen in the resolver so every provider shares the same materialization
//! path.

use async_trait::async_trait;
use folio_core::models::LogoSource;
use folio_core::AppError;
use serde::Deserialize;

const GOOGLE_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Extensions preferred when picking among multiple search results.
const PREFERRED_EXTENSIONS: [&str; 4] = ["png", "svg", "jpg", "jpeg"];

/// A source of candidate logo image URLs.
#[async_trait]
pub trait LogoProvider: Send + Sync {
    fn source(&self) -> LogoSource;

    /// Find a candidate image URL for the given name. `Ok(None)` means this
    /// provider has nothing for the name; the resolver moves on to the next
    /// provider.
    async fn find_logo_url(&self, name: &str) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

/// Keyed image-search provider (Google Custom Search, image mode). Active
/// only when API credentials are configured.
pub struct GoogleImageSearchProvider {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    endpoint: String,
}

impl GoogleImageSearchProvider {
    pub fn new(client: reqwest::Client, api_key: String, engine_id: String) -> Self {
        Self {
            client,
            api_key,
            engine_id,
            endpoint: GOOGLE_SEARCH_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl LogoProvider for GoogleImageSearchProvider {
    fn source(&self) -> LogoSource {
        LogoSource::Google
    }

    async fn find_logo_url(&self, name: &str) -> Result<Option<String>, AppError> {
        let query = format!("{} logo", name);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query.as_str()),
                ("searchType", "image"),
                ("num", "5"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Image search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Image search returned status {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Invalid image search response: {}", e))
        })?;

        let links: Vec<String> = body.items.into_iter().map(|item| item.link).collect();
        Ok(pick_candidate(&links).cloned())
    }
}

/// Keyless fallback: guess `<name>.com` and ask a logo-by-domain service.
pub struct ClearbitProvider {
    base_url: String,
}

impl ClearbitProvider {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }
}

#[async_trait]
impl LogoProvider for ClearbitProvider {
    fn source(&self) -> LogoSource {
        LogoSource::Clearbit
    }

    async fn find_logo_url(&self, name: &str) -> Result<Option<String>, AppError> {
        let domain = domain_guess(name);
        if domain.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            domain
        )))
    }
}

/// Guess a company domain from a display name: strip everything but
/// alphanumerics and append `.com`.
fn domain_guess(name: &str) -> String {
    let compact: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if compact.is_empty() {
        String::new()
    } else {
        format!("{}.com", compact)
    }
}

/// Pick one candidate from a result list: the first URL with an image-like
/// extension, falling back to the first result unconditionally.
pub(crate) fn pick_candidate(links: &[String]) -> Option<&String> {
    links
        .iter()
        .find(|link| has_image_extension(link))
        .or_else(|| links.first())
}

fn has_image_extension(link: &str) -> bool {
    let path = link.split(['?', '#']).next().unwrap_or(link).to_lowercase();
    PREFERRED_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{}", ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_candidate_prefers_image_extension_over_earlier_results() {
        let links = vec![
            "https://example.com/about".to_string(),
            "https://example.com/logo-page.html".to_string(),
            "https://cdn.example.com/logo.svg".to_string(),
            "https://cdn.example.com/logo.png".to_string(),
        ];
        assert_eq!(
            pick_candidate(&links).unwrap(),
            "https://cdn.example.com/logo.svg"
        );
    }

    #[test]
    fn pick_candidate_falls_back_to_first_result() {
        let links = vec![
            "https://example.com/about".to_string(),
            "https://example.com/logo-page.html".to_string(),
        ];
        assert_eq!(pick_candidate(&links).unwrap(), "https://example.com/about");
    }

    #[test]
    fn pick_candidate_ignores_query_strings() {
        let links = vec![
            "https://example.com/about".to_string(),
            "https://cdn.example.com/logo.jpeg?size=256".to_string(),
        ];
        assert_eq!(
            pick_candidate(&links).unwrap(),
            "https://cdn.example.com/logo.jpeg?size=256"
        );
    }

    #[test]
    fn pick_candidate_empty_list() {
        assert!(pick_candidate(&[]).is_none());
    }

    #[test]
    fn domain_guess_strips_spaces_and_case() {
        assert_eq!(domain_guess("Docker"), "docker.com");
        assert_eq!(domain_guess("Google Cloud"), "googlecloud.com");
        assert_eq!(domain_guess("???"), "");
    }

    #[tokio::test]
    async fn clearbit_provider_builds_domain_guess_url() {
        let provider = ClearbitProvider::new("https://logo.clearbit.com".to_string());
        let url = provider.find_logo_url("Docker").await.unwrap();
        assert_eq!(url.as_deref(), Some("https://logo.clearbit.com/docker.com"));

        let none = provider.find_logo_url("???").await.unwrap();
        assert!(none.is_none());
    }
}
