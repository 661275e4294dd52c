//! Catalog entity models.
//!
//! One entity struct per kind, each split into identifying fields (populated
//! at find-or-create time) and an optional-field details bag (populated by
//! enrichment). All details fields are independently nullable; a partial
//! provider response is still a valid, cacheable enrichment.

use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of catalog entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Book,
    Movie,
    Podcast,
    TvShow,
    Article,
}

impl EntityKind {
    /// Convert to database/URL string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Book => "book",
            EntityKind::Movie => "movie",
            EntityKind::Podcast => "podcast",
            EntityKind::TvShow => "tv_show",
            EntityKind::Article => "article",
        }
    }

    /// Convert from database/URL string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "book" => Some(EntityKind::Book),
            "movie" => Some(EntityKind::Movie),
            "podcast" => Some(EntityKind::Podcast),
            "tv_show" => Some(EntityKind::TvShow),
            "article" => Some(EntityKind::Article),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Shared enrichment types
// =============================================================================

/// A single external rating, keyed by the upstream source that produced it.
///
/// Multiple sources may rate the same entity; all are retained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    /// Upstream source name, e.g. "Rotten Tomatoes" or "Google Books".
    pub source: String,
    /// Numeric rating on whatever scale the source uses.
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The source's own display string, e.g. "94%" or "8.1/10".
    pub display: String,
}

/// Identifying fields handed to a provider client for lookup.
#[derive(Clone, Debug, Default)]
pub struct EntityLookup {
    pub title: String,
    pub creator: Option<String>,
    pub year: Option<i32>,
    /// Canonical URL, when the entity has one (articles).
    pub url: Option<String>,
}

// =============================================================================
// Books
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub published_year: Option<i32>,
    /// Unix seconds of the last successful enrichment; None = never enriched.
    pub details_fetched_at: Option<i64>,
    #[serde(flatten)]
    pub details: BookDetails,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDetails {
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i64>,
    pub subjects: Vec<String>,
    pub genre: Option<String>,
    pub ratings: Vec<RatingEntry>,
    pub open_library_key: Option<String>,
    pub google_books_id: Option<String>,
    pub info_url: Option<String>,
}

// =============================================================================
// Movies
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub details_fetched_at: Option<i64>,
    #[serde(flatten)]
    pub details: MovieDetails,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub poster_url: Option<String>,
    pub plot: Option<String>,
    pub runtime_minutes: Option<i64>,
    pub genres: Vec<String>,
    pub genre: Option<String>,
    pub ratings: Vec<RatingEntry>,
    pub imdb_id: Option<String>,
    pub info_url: Option<String>,
}

// =============================================================================
// Podcasts
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Podcast {
    pub id: String,
    pub title: String,
    pub publisher: Option<String>,
    pub details_fetched_at: Option<i64>,
    #[serde(flatten)]
    pub details: PodcastDetails,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PodcastDetails {
    pub artwork_url: Option<String>,
    pub description: Option<String>,
    pub episode_count: Option<i64>,
    pub genres: Vec<String>,
    pub genre: Option<String>,
    pub ratings: Vec<RatingEntry>,
    pub itunes_id: Option<i64>,
    pub feed_url: Option<String>,
    pub info_url: Option<String>,
}

// =============================================================================
// TV shows
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TvShow {
    pub id: String,
    pub title: String,
    pub creator: Option<String>,
    pub first_air_year: Option<i32>,
    pub details_fetched_at: Option<i64>,
    #[serde(flatten)]
    pub details: TvShowDetails,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TvShowDetails {
    pub poster_url: Option<String>,
    pub summary: Option<String>,
    pub network: Option<String>,
    pub genres: Vec<String>,
    pub genre: Option<String>,
    pub ratings: Vec<RatingEntry>,
    pub imdb_id: Option<String>,
    pub tvmaze_id: Option<i64>,
    pub info_url: Option<String>,
}

// =============================================================================
// Articles
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub details_fetched_at: Option<i64>,
    #[serde(flatten)]
    pub details: ArticleDetails,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleDetails {
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub site_name: Option<String>,
    pub published: Option<String>,
    pub info_url: Option<String>,
}

// =============================================================================
// Tagged unions over kinds
// =============================================================================

/// A catalog entity of any kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entity {
    Book(Book),
    Movie(Movie),
    Podcast(Podcast),
    TvShow(TvShow),
    Article(Article),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Book(_) => EntityKind::Book,
            Entity::Movie(_) => EntityKind::Movie,
            Entity::Podcast(_) => EntityKind::Podcast,
            Entity::TvShow(_) => EntityKind::TvShow,
            Entity::Article(_) => EntityKind::Article,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Book(b) => &b.id,
            Entity::Movie(m) => &m.id,
            Entity::Podcast(p) => &p.id,
            Entity::TvShow(t) => &t.id,
            Entity::Article(a) => &a.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Entity::Book(b) => &b.title,
            Entity::Movie(m) => &m.title,
            Entity::Podcast(p) => &p.title,
            Entity::TvShow(t) => &t.title,
            Entity::Article(a) => &a.title,
        }
    }

    pub fn details_fetched_at(&self) -> Option<i64> {
        match self {
            Entity::Book(b) => b.details_fetched_at,
            Entity::Movie(m) => m.details_fetched_at,
            Entity::Podcast(p) => p.details_fetched_at,
            Entity::TvShow(t) => t.details_fetched_at,
            Entity::Article(a) => a.details_fetched_at,
        }
    }

    /// The current details bag.
    pub fn details_bag(&self) -> EntityDetails {
        match self {
            Entity::Book(b) => EntityDetails::Book(b.details.clone()),
            Entity::Movie(m) => EntityDetails::Movie(m.details.clone()),
            Entity::Podcast(p) => EntityDetails::Podcast(p.details.clone()),
            Entity::TvShow(t) => EntityDetails::TvShow(t.details.clone()),
            Entity::Article(a) => EntityDetails::Article(a.details.clone()),
        }
    }

    /// Replace the details bag and stamp, leaving identifying fields alone.
    /// A kind-mismatched bag leaves the entity unchanged.
    pub fn with_details(mut self, details: EntityDetails, fetched_at: Option<i64>) -> Entity {
        match (&mut self, details) {
            (Entity::Book(b), EntityDetails::Book(d)) => {
                b.details = d;
                b.details_fetched_at = fetched_at;
            }
            (Entity::Movie(m), EntityDetails::Movie(d)) => {
                m.details = d;
                m.details_fetched_at = fetched_at;
            }
            (Entity::Podcast(p), EntityDetails::Podcast(d)) => {
                p.details = d;
                p.details_fetched_at = fetched_at;
            }
            (Entity::TvShow(t), EntityDetails::TvShow(d)) => {
                t.details = d;
                t.details_fetched_at = fetched_at;
            }
            (Entity::Article(a), EntityDetails::Article(d)) => {
                a.details = d;
                a.details_fetched_at = fetched_at;
            }
            _ => {}
        }
        self
    }

    /// Identifying fields for a provider lookup.
    pub fn lookup(&self) -> EntityLookup {
        match self {
            Entity::Book(b) => EntityLookup {
                title: b.title.clone(),
                creator: b.author.clone(),
                year: b.published_year,
                url: None,
            },
            Entity::Movie(m) => EntityLookup {
                title: m.title.clone(),
                creator: m.director.clone(),
                year: m.year,
                url: None,
            },
            Entity::Podcast(p) => EntityLookup {
                title: p.title.clone(),
                creator: p.publisher.clone(),
                year: None,
                url: None,
            },
            Entity::TvShow(t) => EntityLookup {
                title: t.title.clone(),
                creator: t.creator.clone(),
                year: t.first_air_year,
                url: None,
            },
            Entity::Article(a) => EntityLookup {
                title: a.title.clone(),
                creator: a.author.clone(),
                year: None,
                url: Some(a.url.clone()),
            },
        }
    }
}

/// A details bag of any kind, as returned by a provider client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntityDetails {
    Book(BookDetails),
    Movie(MovieDetails),
    Podcast(PodcastDetails),
    TvShow(TvShowDetails),
    Article(ArticleDetails),
}

impl EntityDetails {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDetails::Book(_) => EntityKind::Book,
            EntityDetails::Movie(_) => EntityKind::Movie,
            EntityDetails::Podcast(_) => EntityKind::Podcast,
            EntityDetails::TvShow(_) => EntityKind::TvShow,
            EntityDetails::Article(_) => EntityKind::Article,
        }
    }

    /// An all-absent details bag for the given kind.
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Book => EntityDetails::Book(BookDetails::default()),
            EntityKind::Movie => EntityDetails::Movie(MovieDetails::default()),
            EntityKind::Podcast => EntityDetails::Podcast(PodcastDetails::default()),
            EntityKind::TvShow => EntityDetails::TvShow(TvShowDetails::default()),
            EntityKind::Article => EntityDetails::Article(ArticleDetails::default()),
        }
    }

    /// The structured genre carried by this bag, if any.
    pub fn genre(&self) -> Option<&str> {
        match self {
            EntityDetails::Book(d) => d.genre.as_deref(),
            EntityDetails::Movie(d) => d.genre.as_deref(),
            EntityDetails::Podcast(d) => d.genre.as_deref(),
            EntityDetails::TvShow(d) => d.genre.as_deref(),
            EntityDetails::Article(_) => None,
        }
    }

    /// The free-text description carried by this bag, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            EntityDetails::Book(d) => d.description.as_deref(),
            EntityDetails::Movie(d) => d.plot.as_deref(),
            EntityDetails::Podcast(d) => d.description.as_deref(),
            EntityDetails::TvShow(d) => d.summary.as_deref(),
            EntityDetails::Article(d) => d.description.as_deref(),
        }
    }

    /// Subject/genre hint strings carried by this bag.
    pub fn subjects(&self) -> Vec<String> {
        match self {
            EntityDetails::Book(d) => d.subjects.clone(),
            EntityDetails::Movie(d) => d.genres.clone(),
            EntityDetails::Podcast(d) => d.genres.clone(),
            EntityDetails::TvShow(d) => d.genres.clone(),
            EntityDetails::Article(_) => Vec::new(),
        }
    }

    pub fn set_genre(&mut self, genre: String) {
        match self {
            EntityDetails::Book(d) => d.genre = Some(genre),
            EntityDetails::Movie(d) => d.genre = Some(genre),
            EntityDetails::Podcast(d) => d.genre = Some(genre),
            EntityDetails::TvShow(d) => d.genre = Some(genre),
            EntityDetails::Article(_) => {}
        }
    }
}
