//! Podcast metadata via the iTunes Search API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::{http_client, MetadataClient};
use crate::catalog::models::{EntityDetails, EntityKind, EntityLookup, PodcastDetails};
use crate::enrichment::RateLimited;

const ITUNES_API_BASE: &str = "https://itunes.apple.com";

pub struct PodcastClient {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ItunesSearchResponse {
    results: Option<Vec<ItunesPodcast>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesPodcast {
    collection_id: Option<i64>,
    artwork_url600: Option<String>,
    artwork_url100: Option<String>,
    feed_url: Option<String>,
    track_count: Option<i64>,
    genres: Option<Vec<String>>,
    collection_view_url: Option<String>,
}

impl PodcastClient {
    pub fn new() -> Self {
        Self {
            client: http_client(),
        }
    }

    async fn itunes(&self, lookup: &EntityLookup) -> Result<Option<ItunesPodcast>, RateLimited> {
        let url = format!(
            "{}/search?media=podcast&limit=1&term={}",
            ITUNES_API_BASE,
            urlencoding::encode(&lookup.title)
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("iTunes request failed for '{}': {}", lookup.title, e);
                return Ok(None);
            }
        };
        if response.status().as_u16() == 429 {
            return Err(RateLimited::new(
                "iTunes Search rate limit reached, try again in a minute",
            ));
        }
        if !response.status().is_success() {
            warn!(
                "iTunes returned status {} for '{}'",
                response.status(),
                lookup.title
            );
            return Ok(None);
        }

        match response.json::<ItunesSearchResponse>().await {
            Ok(body) => Ok(body.results.and_then(|r| r.into_iter().next())),
            Err(e) => {
                warn!("iTunes response malformed for '{}': {}", lookup.title, e);
                Ok(None)
            }
        }
    }
}

impl Default for PodcastClient {
    fn default() -> Self {
        Self::new()
    }
}

fn details_from_itunes(podcast: ItunesPodcast) -> PodcastDetails {
    // iTunes tags every result with the umbrella "Podcasts" genre.
    let genres: Vec<String> = podcast
        .genres
        .unwrap_or_default()
        .into_iter()
        .filter(|g| g != "Podcasts")
        .collect();
    PodcastDetails {
        artwork_url: podcast.artwork_url600.or(podcast.artwork_url100),
        description: None,
        episode_count: podcast.track_count,
        genre: genres.first().cloned(),
        genres,
        ratings: Vec::new(),
        itunes_id: podcast.collection_id,
        feed_url: podcast.feed_url,
        info_url: podcast.collection_view_url,
    }
}

#[async_trait]
impl MetadataClient for PodcastClient {
    fn kind(&self) -> EntityKind {
        EntityKind::Podcast
    }

    async fn fetch_details(&self, lookup: &EntityLookup) -> Result<EntityDetails, RateLimited> {
        let details = match self.itunes(lookup).await? {
            Some(podcast) => details_from_itunes(podcast),
            None => PodcastDetails::default(),
        };
        Ok(EntityDetails::Podcast(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itunes_normalization() {
        let raw = r#"{
            "collectionId": 1200361736,
            "artworkUrl100": "https://img.example/100.jpg",
            "artworkUrl600": "https://img.example/600.jpg",
            "feedUrl": "https://feeds.example/daily.xml",
            "trackCount": 1890,
            "genres": ["News", "Podcasts", "Daily News"],
            "collectionViewUrl": "https://podcasts.apple.com/us/podcast/the-daily/id1200361736"
        }"#;
        let podcast: ItunesPodcast = serde_json::from_str(raw).unwrap();

        let details = details_from_itunes(podcast);
        assert_eq!(details.artwork_url.as_deref(), Some("https://img.example/600.jpg"));
        assert_eq!(details.episode_count, Some(1890));
        assert_eq!(details.itunes_id, Some(1200361736));
        // The umbrella genre is dropped; the first real one becomes the genre.
        assert_eq!(details.genres, vec!["News", "Daily News"]);
        assert_eq!(details.genre.as_deref(), Some("News"));
    }

    #[test]
    fn test_umbrella_genre_only_means_no_genre() {
        let raw = r#"{"collectionId": 7, "genres": ["Podcasts"]}"#;
        let podcast: ItunesPodcast = serde_json::from_str(raw).unwrap();

        let details = details_from_itunes(podcast);
        assert!(details.genres.is_empty());
        assert_eq!(details.genre, None);
    }
}
