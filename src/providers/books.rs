//! Book metadata via Open Library and Google Books.
//!
//! Open Library contributes the cover, subjects and work key; Google Books
//! contributes the description, page count, categories and its community
//! rating. Either source failing (short of a quota error) just means its
//! fields stay absent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::{http_client, MetadataClient};
use crate::catalog::models::{BookDetails, EntityDetails, EntityKind, EntityLookup, RatingEntry};
use crate::enrichment::RateLimited;

const OPEN_LIBRARY_API_BASE: &str = "https://openlibrary.org";
const GOOGLE_BOOKS_API_BASE: &str = "https://www.googleapis.com/books/v1";

pub struct BookClient {
    client: Client,
    google_books_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenLibrarySearchResponse {
    docs: Option<Vec<OpenLibraryDoc>>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenLibraryDoc {
    key: Option<String>,
    cover_i: Option<i64>,
    subject: Option<Vec<String>>,
    number_of_pages_median: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GoogleBooksResponse {
    items: Option<Vec<GoogleVolume>>,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleVolume {
    id: Option<String>,
    #[serde(rename = "volumeInfo")]
    volume_info: Option<GoogleVolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVolumeInfo {
    description: Option<String>,
    page_count: Option<i64>,
    categories: Option<Vec<String>>,
    average_rating: Option<f64>,
    ratings_count: Option<i64>,
    info_link: Option<String>,
}

impl BookClient {
    pub fn new(google_books_api_key: Option<String>) -> Self {
        Self {
            client: http_client(),
            google_books_api_key,
        }
    }

    async fn open_library(&self, lookup: &EntityLookup) -> Result<Option<OpenLibraryDoc>, RateLimited> {
        let mut url = format!(
            "{}/search.json?title={}&limit=1",
            OPEN_LIBRARY_API_BASE,
            urlencoding::encode(&lookup.title)
        );
        if let Some(author) = &lookup.creator {
            url.push_str(&format!("&author={}", urlencoding::encode(author)));
        }

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Open Library request failed for '{}': {}", lookup.title, e);
                return Ok(None);
            }
        };
        if response.status().as_u16() == 429 {
            return Err(RateLimited::new(
                "Open Library rate limit reached, try again in a minute",
            ));
        }
        if !response.status().is_success() {
            warn!(
                "Open Library returned status {} for '{}'",
                response.status(),
                lookup.title
            );
            return Ok(None);
        }

        match response.json::<OpenLibrarySearchResponse>().await {
            Ok(body) => Ok(body.docs.and_then(|d| d.into_iter().next())),
            Err(e) => {
                warn!("Open Library response malformed for '{}': {}", lookup.title, e);
                Ok(None)
            }
        }
    }

    async fn google_books(&self, lookup: &EntityLookup) -> Result<Option<GoogleVolume>, RateLimited> {
        let mut query = format!("intitle:{}", lookup.title);
        if let Some(author) = &lookup.creator {
            query.push_str(&format!(" inauthor:{}", author));
        }
        let mut url = format!(
            "{}/volumes?q={}&maxResults=1",
            GOOGLE_BOOKS_API_BASE,
            urlencoding::encode(&query)
        );
        if let Some(key) = &self.google_books_api_key {
            url.push_str(&format!("&key={}", key));
        }

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Google Books request failed for '{}': {}", lookup.title, e);
                return Ok(None);
            }
        };
        if response.status().as_u16() == 429 {
            return Err(RateLimited::new(
                "Google Books rate limit reached, try again in a minute",
            ));
        }
        if !response.status().is_success() {
            warn!(
                "Google Books returned status {} for '{}'",
                response.status(),
                lookup.title
            );
            return Ok(None);
        }

        match response.json::<GoogleBooksResponse>().await {
            Ok(body) => Ok(body.items.and_then(|i| i.into_iter().next())),
            Err(e) => {
                warn!("Google Books response malformed for '{}': {}", lookup.title, e);
                Ok(None)
            }
        }
    }
}

fn details_from_sources(
    open_library: Option<OpenLibraryDoc>,
    google: Option<GoogleVolume>,
) -> BookDetails {
    let mut details = BookDetails::default();

    if let Some(doc) = open_library {
        details.cover_url = doc
            .cover_i
            .map(|id| format!("https://covers.openlibrary.org/b/id/{}-L.jpg", id));
        details.open_library_key = doc.key;
        details.subjects = doc
            .subject
            .unwrap_or_default()
            .into_iter()
            .take(10)
            .collect();
        details.page_count = doc.number_of_pages_median;
    }

    if let Some(volume) = google {
        details.google_books_id = volume.id;
        let info = volume.volume_info.unwrap_or_default();
        details.description = info.description;
        details.page_count = info.page_count.or(details.page_count);
        details.genre = info
            .categories
            .as_ref()
            .and_then(|c| c.first())
            .cloned();
        details.info_url = info.info_link.clone();
        if let Some(rating) = info.average_rating {
            details.ratings.push(RatingEntry {
                source: "Google Books".to_string(),
                rating,
                ratings_count: info.ratings_count,
                url: info.info_link,
                display: format!("{:.1}/5", rating),
            });
        }
    }

    details
}

#[async_trait]
impl MetadataClient for BookClient {
    fn kind(&self) -> EntityKind {
        EntityKind::Book
    }

    async fn fetch_details(&self, lookup: &EntityLookup) -> Result<EntityDetails, RateLimited> {
        let open_library = self.open_library(lookup).await?;
        let google = self.google_books(lookup).await?;
        Ok(EntityDetails::Book(details_from_sources(
            open_library,
            google,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_sources_contribute_fields() {
        let ol: OpenLibraryDoc = serde_json::from_str(
            r#"{
                "key": "/works/OL893415W",
                "cover_i": 11481354,
                "subject": ["Science fiction", "Deserts", "Ecology"],
                "number_of_pages_median": 512
            }"#,
        )
        .unwrap();
        let gb: GoogleVolume = serde_json::from_str(
            r#"{
                "id": "B1hSG45JCOC",
                "volumeInfo": {
                    "description": "The desert planet Arrakis.",
                    "pageCount": 528,
                    "categories": ["Fiction"],
                    "averageRating": 4.5,
                    "ratingsCount": 1234,
                    "infoLink": "https://books.google.com/books?id=B1hSG45JCOC"
                }
            }"#,
        )
        .unwrap();

        let details = details_from_sources(Some(ol), Some(gb));
        assert!(details.cover_url.as_deref().unwrap().contains("11481354"));
        assert_eq!(details.open_library_key.as_deref(), Some("/works/OL893415W"));
        assert_eq!(details.subjects.len(), 3);
        // Google's page count wins over Open Library's median.
        assert_eq!(details.page_count, Some(528));
        assert_eq!(details.genre.as_deref(), Some("Fiction"));
        assert_eq!(details.ratings.len(), 1);
        assert_eq!(details.ratings[0].source, "Google Books");
        assert_eq!(details.ratings[0].display, "4.5/5");
    }

    #[test]
    fn test_single_source_absence_does_not_block_the_other() {
        let ol: OpenLibraryDoc = serde_json::from_str(
            r#"{"cover_i": 42, "number_of_pages_median": 200}"#,
        )
        .unwrap();

        let details = details_from_sources(Some(ol), None);
        assert!(details.cover_url.is_some());
        assert_eq!(details.page_count, Some(200));
        assert_eq!(details.description, None);
        assert!(details.ratings.is_empty());
        // No structured category from any source: the client does not guess.
        assert_eq!(details.genre, None);
    }

    #[test]
    fn test_no_sources_yields_empty_bag() {
        assert_eq!(details_from_sources(None, None), BookDetails::default());
    }
}
