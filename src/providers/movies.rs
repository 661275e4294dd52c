//! Movie metadata via OMDb.

use async_trait::async_trait;

use super::omdb::{self, OmdbApi, OmdbResponse};
use super::{http_client, MetadataClient};
use crate::catalog::models::{EntityDetails, EntityKind, EntityLookup, MovieDetails};
use crate::enrichment::RateLimited;

pub struct MovieClient {
    omdb: OmdbApi,
}

impl MovieClient {
    pub fn new(omdb_api_key: String) -> Self {
        Self {
            omdb: OmdbApi::new(http_client(), omdb_api_key),
        }
    }
}

fn details_from_omdb(resp: OmdbResponse) -> MovieDetails {
    let imdb_id = omdb::not_na(resp.imdb_id);
    let genres = omdb::split_genres(resp.genre);
    MovieDetails {
        poster_url: omdb::not_na(resp.poster),
        plot: omdb::not_na(resp.plot),
        runtime_minutes: omdb::parse_runtime(resp.runtime),
        genre: genres.first().cloned(),
        genres,
        ratings: omdb::normalize_ratings(resp.ratings.unwrap_or_default(), imdb_id.as_deref()),
        info_url: imdb_id
            .as_ref()
            .map(|id| format!("https://www.imdb.com/title/{}/", id)),
        imdb_id,
    }
}

#[async_trait]
impl MetadataClient for MovieClient {
    fn kind(&self) -> EntityKind {
        EntityKind::Movie
    }

    async fn fetch_details(&self, lookup: &EntityLookup) -> Result<EntityDetails, RateLimited> {
        let details = match self.omdb.lookup(&lookup.title, "movie", lookup.year).await? {
            Some(resp) => details_from_omdb(resp),
            None => MovieDetails::default(),
        };
        Ok(EntityDetails::Movie(details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_omdb_response_normalization() {
        let raw = r#"{
            "Title": "Arrival",
            "Year": "2016",
            "Runtime": "116 min",
            "Genre": "Drama, Mystery, Sci-Fi",
            "Director": "Denis Villeneuve",
            "Plot": "A linguist works with the military to communicate with alien lifeforms.",
            "Poster": "https://img.example/arrival.jpg",
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "7.9/10"},
                {"Source": "Rotten Tomatoes", "Value": "94%"}
            ],
            "imdbID": "tt2543164",
            "Response": "True"
        }"#;
        let resp: OmdbResponse = serde_json::from_str(raw).unwrap();

        let details = details_from_omdb(resp);
        assert_eq!(details.runtime_minutes, Some(116));
        assert_eq!(details.genres, vec!["Drama", "Mystery", "Sci-Fi"]);
        assert_eq!(details.genre.as_deref(), Some("Drama"));
        assert_eq!(details.ratings.len(), 2);
        assert_eq!(details.imdb_id.as_deref(), Some("tt2543164"));
        assert!(details.info_url.as_deref().unwrap().contains("tt2543164"));
    }

    #[test]
    fn test_sparse_omdb_response_yields_absent_fields() {
        let raw = r#"{
            "Title": "Some Obscure Film",
            "Runtime": "N/A",
            "Genre": "N/A",
            "Plot": "N/A",
            "Poster": "N/A",
            "Response": "True"
        }"#;
        let resp: OmdbResponse = serde_json::from_str(raw).unwrap();

        let details = details_from_omdb(resp);
        // No structured category: the client does not guess.
        assert_eq!(details.genre, None);
        assert_eq!(details.poster_url, None);
        assert!(details.ratings.is_empty());
        assert_eq!(details, MovieDetails::default());
    }
}
