//! OMDb API access shared by the movie and TV clients.

use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::catalog::models::RatingEntry;
use crate::enrichment::RateLimited;

const OMDB_API_BASE: &str = "https://www.omdbapi.com/";

#[derive(Debug, Deserialize)]
pub(crate) struct OmdbResponse {
    #[serde(rename = "Response")]
    pub response: Option<String>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
    #[serde(rename = "Runtime")]
    pub runtime: Option<String>,
    #[serde(rename = "Genre")]
    pub genre: Option<String>,
    #[serde(rename = "Plot")]
    pub plot: Option<String>,
    #[serde(rename = "Poster")]
    pub poster: Option<String>,
    #[serde(rename = "Ratings")]
    pub ratings: Option<Vec<OmdbRating>>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OmdbRating {
    #[serde(rename = "Source")]
    pub source: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<String>,
}

/// OMDb marks absent fields with the literal string "N/A".
pub(crate) fn not_na(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "N/A")
}

/// Split OMDb's comma-joined genre string into a list.
pub(crate) fn split_genres(genre: Option<String>) -> Vec<String> {
    not_na(genre)
        .map(|g| g.split(", ").map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

/// Parse OMDb's "118 min" runtime format.
pub(crate) fn parse_runtime(runtime: Option<String>) -> Option<i64> {
    not_na(runtime)?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

/// Normalize OMDb's named rating list, preserving the upstream display
/// strings ("8.1/10", "94%", "81/100").
pub(crate) fn normalize_ratings(
    ratings: Vec<OmdbRating>,
    imdb_id: Option<&str>,
) -> Vec<RatingEntry> {
    ratings
        .into_iter()
        .filter_map(|r| {
            let source = r.source?;
            let display = r.value?;
            let numeric: f64 = display
                .trim_end_matches('%')
                .split('/')
                .next()?
                .trim()
                .parse()
                .ok()?;
            let url = match (source.as_str(), imdb_id) {
                ("Internet Movie Database", Some(id)) => {
                    Some(format!("https://www.imdb.com/title/{}/", id))
                }
                _ => None,
            };
            Some(RatingEntry {
                source,
                rating: numeric,
                ratings_count: None,
                url,
                display,
            })
        })
        .collect()
}

/// Thin OMDb lookup client.
pub(crate) struct OmdbApi {
    client: Client,
    api_key: String,
}

impl OmdbApi {
    pub(crate) fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    /// Look up a title. `media_type` is OMDb's `type` parameter
    /// ("movie" or "series").
    pub(crate) async fn lookup(
        &self,
        title: &str,
        media_type: &str,
        year: Option<i32>,
    ) -> Result<Option<OmdbResponse>, RateLimited> {
        let mut url = format!(
            "{}?apikey={}&t={}&type={}&plot=short",
            OMDB_API_BASE,
            self.api_key,
            urlencoding::encode(title),
            media_type
        );
        if let Some(year) = year {
            url.push_str(&format!("&y={}", year));
        }

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("OMDb request failed for '{}': {}", title, e);
                return Ok(None);
            }
        };

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(RateLimited::new(
                "OMDb rate limit reached, try again in a minute",
            ));
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("OMDb response unreadable for '{}': {}", title, e);
                return Ok(None);
            }
        };

        let parsed: OmdbResponse = match serde_json::from_str(&body) {
            Ok(p) => p,
            Err(e) => {
                warn!("OMDb response malformed for '{}': {}", title, e);
                return Ok(None);
            }
        };

        // OMDb signals daily-quota exhaustion with an error body rather
        // than a 429 status.
        if let Some(error) = &parsed.error {
            if error.to_lowercase().contains("limit") {
                return Err(RateLimited::new(
                    "OMDb daily request limit reached, try again tomorrow",
                ));
            }
        }

        if !status.is_success() || parsed.response.as_deref() == Some("False") {
            return Ok(None);
        }

        Ok(Some(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_na_filters_placeholder() {
        assert_eq!(not_na(Some("N/A".to_string())), None);
        assert_eq!(not_na(Some("".to_string())), None);
        assert_eq!(not_na(Some("Dune".to_string())), Some("Dune".to_string()));
        assert_eq!(not_na(None), None);
    }

    #[test]
    fn test_runtime_parsing() {
        assert_eq!(parse_runtime(Some("118 min".to_string())), Some(118));
        assert_eq!(parse_runtime(Some("N/A".to_string())), None);
        assert_eq!(parse_runtime(None), None);
    }

    #[test]
    fn test_ratings_normalization_keeps_all_named_sources() {
        let raw = r#"[
            {"Source": "Internet Movie Database", "Value": "8.1/10"},
            {"Source": "Rotten Tomatoes", "Value": "94%"},
            {"Source": "Metacritic", "Value": "81/100"}
        ]"#;
        let ratings: Vec<OmdbRating> = serde_json::from_str(raw).unwrap();

        let normalized = normalize_ratings(ratings, Some("tt2543164"));
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[0].source, "Internet Movie Database");
        assert_eq!(normalized[0].rating, 8.1);
        assert_eq!(normalized[0].display, "8.1/10");
        assert!(normalized[0].url.as_deref().unwrap().contains("tt2543164"));
        assert_eq!(normalized[1].rating, 94.0);
        assert_eq!(normalized[2].rating, 81.0);
    }

    #[test]
    fn test_ratings_normalization_skips_unparsable_entries() {
        let raw = r#"[
            {"Source": "Rotten Tomatoes", "Value": "not a number"},
            {"Source": "Metacritic", "Value": "81/100"}
        ]"#;
        let ratings: Vec<OmdbRating> = serde_json::from_str(raw).unwrap();

        let normalized = normalize_ratings(ratings, None);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].source, "Metacritic");
    }
}
