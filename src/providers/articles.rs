//! Article metadata scraped from the article's own page.
//!
//! There is no catalog API for arbitrary articles; the canonical URL itself
//! is the provider. OpenGraph and standard meta tags cover the fields the
//! shelf displays.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::warn;

use super::{http_client, MetadataClient};
use crate::catalog::models::{ArticleDetails, EntityDetails, EntityKind, EntityLookup};
use crate::enrichment::RateLimited;

pub struct ArticleClient {
    client: Client,
}

impl ArticleClient {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }
}

impl Default for ArticleClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the content attribute of a meta tag by property/name key,
/// tolerating either attribute order.
fn meta_content(html: &str, key: &str) -> Option<String> {
    let escaped = regex::escape(key);
    let patterns = [
        format!(
            r#"<meta[^>]*?(?:property|name)\s*=\s*["']{}["'][^>]*?content\s*=\s*["']([^"']*)["']"#,
            escaped
        ),
        format!(
            r#"<meta[^>]*?content\s*=\s*["']([^"']*)["'][^>]*?(?:property|name)\s*=\s*["']{}["']"#,
            escaped
        ),
    ];
    for pattern in patterns {
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        if let Some(captures) = re.captures(html) {
            let content = captures[1].trim().to_string();
            if !content.is_empty() {
                return Some(content);
            }
        }
    }
    None
}

fn details_from_html(html: &str, url: &str) -> ArticleDetails {
    ArticleDetails {
        image_url: meta_content(html, "og:image"),
        description: meta_content(html, "og:description")
            .or_else(|| meta_content(html, "description")),
        site_name: meta_content(html, "og:site_name"),
        published: meta_content(html, "article:published_time"),
        info_url: Some(url.to_string()),
    }
}

#[async_trait]
impl MetadataClient for ArticleClient {
    fn kind(&self) -> EntityKind {
        EntityKind::Article
    }

    async fn fetch_details(&self, lookup: &EntityLookup) -> Result<EntityDetails, RateLimited> {
        let Some(url) = &lookup.url else {
            return Ok(EntityDetails::Article(ArticleDetails::default()));
        };

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Article fetch failed for {}: {}", url, e);
                return Ok(EntityDetails::Article(ArticleDetails::default()));
            }
        };
        if response.status().as_u16() == 429 {
            return Err(RateLimited::new(
                "The article's site is rate limiting us, try again in a minute",
            ));
        }
        if !response.status().is_success() {
            warn!("Article fetch returned status {} for {}", response.status(), url);
            return Ok(EntityDetails::Article(ArticleDetails::default()));
        }

        let html = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                warn!("Article body unreadable for {}: {}", url, e);
                return Ok(EntityDetails::Article(ArticleDetails::default()));
            }
        };

        Ok(EntityDetails::Article(details_from_html(&html, url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <meta property="og:site_name" content="Example Review of Books">
        <meta property="og:image" content="https://example.com/lead.jpg">
        <meta content="A long look at library catalogs." property="og:description">
        <meta property="article:published_time" content="2024-11-02T09:00:00Z">
        </head><body>Hello</body></html>"#;

    #[test]
    fn test_open_graph_extraction() {
        let details = details_from_html(PAGE, "https://example.com/catalogs");
        assert_eq!(details.site_name.as_deref(), Some("Example Review of Books"));
        assert_eq!(details.image_url.as_deref(), Some("https://example.com/lead.jpg"));
        // Reversed attribute order is still matched.
        assert_eq!(
            details.description.as_deref(),
            Some("A long look at library catalogs.")
        );
        assert_eq!(
            details.published.as_deref(),
            Some("2024-11-02T09:00:00Z")
        );
        assert_eq!(details.info_url.as_deref(), Some("https://example.com/catalogs"));
    }

    #[test]
    fn test_description_meta_fallback() {
        let html = r#"<meta name="description" content="Plain meta description.">"#;
        let details = details_from_html(html, "https://example.com/x");
        assert_eq!(details.description.as_deref(), Some("Plain meta description."));
        assert_eq!(details.image_url, None);
    }

    #[test]
    fn test_untagged_page_yields_absent_fields() {
        let details = details_from_html("<html><body>nothing here</body></html>", "https://e.com");
        assert_eq!(details.image_url, None);
        assert_eq!(details.description, None);
        assert_eq!(details.site_name, None);
        assert_eq!(details.published, None);
    }
}
