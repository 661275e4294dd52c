//! TV show metadata via TVMaze and OMDb.
//!
//! TVMaze contributes the poster, summary, network, genres and its own
//! average rating; OMDb contributes the named ratings list. Both merge,
//! neither blocks the other.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::omdb::{self, OmdbApi};
use super::{http_client, MetadataClient};
use crate::catalog::models::{EntityDetails, EntityKind, EntityLookup, RatingEntry, TvShowDetails};
use crate::enrichment::RateLimited;

const TVMAZE_API_BASE: &str = "https://api.tvmaze.com";

lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("invalid html tag regex");
}

pub struct TvClient {
    client: Client,
    omdb: Option<OmdbApi>,
}

#[derive(Debug, Default, Deserialize)]
struct TvMazeShow {
    id: Option<i64>,
    url: Option<String>,
    network: Option<TvMazeNetwork>,
    #[serde(rename = "webChannel")]
    web_channel: Option<TvMazeNetwork>,
    genres: Option<Vec<String>>,
    rating: Option<TvMazeRating>,
    image: Option<TvMazeImage>,
    summary: Option<String>,
    externals: Option<TvMazeExternals>,
}

#[derive(Debug, Deserialize)]
struct TvMazeNetwork {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TvMazeRating {
    average: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TvMazeImage {
    original: Option<String>,
    medium: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TvMazeExternals {
    imdb: Option<String>,
}

impl TvClient {
    pub fn new(omdb_api_key: Option<String>) -> Self {
        let client = http_client();
        Self {
            omdb: omdb_api_key.map(|key| OmdbApi::new(client.clone(), key)),
            client,
        }
    }

    async fn tvmaze(&self, lookup: &EntityLookup) -> Result<Option<TvMazeShow>, RateLimited> {
        let url = format!(
            "{}/singlesearch/shows?q={}",
            TVMAZE_API_BASE,
            urlencoding::encode(&lookup.title)
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("TVMaze request failed for '{}': {}", lookup.title, e);
                return Ok(None);
            }
        };
        if response.status().as_u16() == 429 {
            return Err(RateLimited::new(
                "TVMaze rate limit reached, try again in a few seconds",
            ));
        }
        if !response.status().is_success() {
            // 404 is TVMaze's plain not-found.
            return Ok(None);
        }

        match response.json::<TvMazeShow>().await {
            Ok(show) => Ok(Some(show)),
            Err(e) => {
                warn!("TVMaze response malformed for '{}': {}", lookup.title, e);
                Ok(None)
            }
        }
    }
}

fn strip_html(raw: &str) -> String {
    HTML_TAG_RE.replace_all(raw, "").trim().to_string()
}

fn details_from_tvmaze(show: TvMazeShow) -> TvShowDetails {
    let genres = show.genres.unwrap_or_default();
    let mut ratings = Vec::new();
    if let Some(average) = show.rating.and_then(|r| r.average) {
        ratings.push(RatingEntry {
            source: "TVMaze".to_string(),
            rating: average,
            ratings_count: None,
            url: show.url.clone(),
            display: format!("{:.1}/10", average),
        });
    }
    TvShowDetails {
        poster_url: show.image.and_then(|i| i.original.or(i.medium)),
        summary: show.summary.map(|s| strip_html(&s)).filter(|s| !s.is_empty()),
        network: show
            .network
            .and_then(|n| n.name)
            .or_else(|| show.web_channel.and_then(|n| n.name)),
        genre: genres.first().cloned(),
        genres,
        ratings,
        imdb_id: show.externals.and_then(|e| e.imdb),
        tvmaze_id: show.id,
        info_url: show.url,
    }
}

#[async_trait]
impl MetadataClient for TvClient {
    fn kind(&self) -> EntityKind {
        EntityKind::TvShow
    }

    async fn fetch_details(&self, lookup: &EntityLookup) -> Result<EntityDetails, RateLimited> {
        let mut details = match self.tvmaze(lookup).await? {
            Some(show) => details_from_tvmaze(show),
            None => TvShowDetails::default(),
        };

        if let Some(omdb) = &self.omdb {
            if let Some(resp) = omdb.lookup(&lookup.title, "series", lookup.year).await? {
                let imdb_id = omdb::not_na(resp.imdb_id);
                let named = omdb::normalize_ratings(
                    resp.ratings.unwrap_or_default(),
                    imdb_id.as_deref(),
                );
                details.ratings.extend(named);
                details.imdb_id = details.imdb_id.or(imdb_id);
            }
        }

        Ok(EntityDetails::TvShow(details))
    }
}
