//! SQLite-backed catalog store.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::models::{
    Article, ArticleDetails, Book, BookDetails, Entity, EntityDetails, EntityKind, Movie,
    MovieDetails, Podcast, PodcastDetails, RatingEntry, TvShow, TvShowDetails,
};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::store::{CatalogStore, NewEntity};
use crate::sqlite_persistence::migrate_if_needed;

/// SQLite-backed catalog store.
///
/// A single write connection behind a mutex: enrichment writes are short
/// single-row updates, and serializing find-or-create through the same lock
/// keeps natural-key creation race-free within one process.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

fn json_list<T: serde::de::DeserializeOwned>(raw: String) -> Vec<T> {
    serde_json::from_str(&raw).unwrap_or_default()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("Failed to serialize enrichment field")
}

fn row_to_book(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        published_year: row.get(3)?,
        details_fetched_at: row.get(4)?,
        details: BookDetails {
            cover_url: row.get(5)?,
            description: row.get(6)?,
            page_count: row.get(7)?,
            subjects: json_list(row.get::<_, String>(8)?),
            ratings: json_list::<RatingEntry>(row.get::<_, String>(9)?),
            open_library_key: row.get(10)?,
            google_books_id: row.get(11)?,
            info_url: row.get(12)?,
            genre: row.get(13)?,
        },
    })
}

fn row_to_movie(row: &Row<'_>) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        title: row.get(1)?,
        director: row.get(2)?,
        year: row.get(3)?,
        details_fetched_at: row.get(4)?,
        details: MovieDetails {
            poster_url: row.get(5)?,
            plot: row.get(6)?,
            runtime_minutes: row.get(7)?,
            genres: json_list(row.get::<_, String>(8)?),
            ratings: json_list::<RatingEntry>(row.get::<_, String>(9)?),
            imdb_id: row.get(10)?,
            info_url: row.get(11)?,
            genre: row.get(12)?,
        },
    })
}

fn row_to_podcast(row: &Row<'_>) -> rusqlite::Result<Podcast> {
    Ok(Podcast {
        id: row.get(0)?,
        title: row.get(1)?,
        publisher: row.get(2)?,
        details_fetched_at: row.get(3)?,
        details: PodcastDetails {
            artwork_url: row.get(4)?,
            description: row.get(5)?,
            episode_count: row.get(6)?,
            genres: json_list(row.get::<_, String>(7)?),
            ratings: json_list::<RatingEntry>(row.get::<_, String>(8)?),
            itunes_id: row.get(9)?,
            feed_url: row.get(10)?,
            info_url: row.get(11)?,
            genre: row.get(12)?,
        },
    })
}

fn row_to_tv_show(row: &Row<'_>) -> rusqlite::Result<TvShow> {
    Ok(TvShow {
        id: row.get(0)?,
        title: row.get(1)?,
        creator: row.get(2)?,
        first_air_year: row.get(3)?,
        details_fetched_at: row.get(4)?,
        details: TvShowDetails {
            poster_url: row.get(5)?,
            summary: row.get(6)?,
            network: row.get(7)?,
            genres: json_list(row.get::<_, String>(8)?),
            ratings: json_list::<RatingEntry>(row.get::<_, String>(9)?),
            imdb_id: row.get(10)?,
            tvmaze_id: row.get(11)?,
            info_url: row.get(12)?,
            genre: row.get(13)?,
        },
    })
}

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        author: row.get(3)?,
        details_fetched_at: row.get(4)?,
        details: ArticleDetails {
            image_url: row.get(5)?,
            description: row.get(6)?,
            site_name: row.get(7)?,
            published: row.get(8)?,
            info_url: row.get(9)?,
        },
    })
}

const BOOK_COLUMNS: &str = "id, title, author, published_year, details_fetched_at, cover_url, \
     description, page_count, subjects, ratings, open_library_key, google_books_id, info_url, genre";
const MOVIE_COLUMNS: &str = "id, title, director, year, details_fetched_at, poster_url, plot, \
     runtime_minutes, genres, ratings, imdb_id, info_url, genre";
const PODCAST_COLUMNS: &str = "id, title, publisher, details_fetched_at, artwork_url, description, \
     episode_count, genres, ratings, itunes_id, feed_url, info_url, genre";
const TV_SHOW_COLUMNS: &str = "id, title, creator, first_air_year, details_fetched_at, poster_url, \
     summary, network, genres, ratings, imdb_id, tvmaze_id, info_url, genre";
const ARTICLE_COLUMNS: &str =
    "id, title, url, author, details_fetched_at, image_url, description, site_name, published, info_url";

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn =
            Connection::open(db_path.as_ref()).context("Failed to open catalog database")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrate_if_needed(&mut conn, "catalog", CATALOG_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        migrate_if_needed(&mut conn, "catalog", CATALOG_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn get_entity_locked(
        conn: &Connection,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<Entity>> {
        let entity = match kind {
            EntityKind::Book => conn
                .query_row(
                    &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
                    params![id],
                    row_to_book,
                )
                .optional()?
                .map(Entity::Book),
            EntityKind::Movie => conn
                .query_row(
                    &format!("SELECT {} FROM movies WHERE id = ?1", MOVIE_COLUMNS),
                    params![id],
                    row_to_movie,
                )
                .optional()?
                .map(Entity::Movie),
            EntityKind::Podcast => conn
                .query_row(
                    &format!("SELECT {} FROM podcasts WHERE id = ?1", PODCAST_COLUMNS),
                    params![id],
                    row_to_podcast,
                )
                .optional()?
                .map(Entity::Podcast),
            EntityKind::TvShow => conn
                .query_row(
                    &format!("SELECT {} FROM tv_shows WHERE id = ?1", TV_SHOW_COLUMNS),
                    params![id],
                    row_to_tv_show,
                )
                .optional()?
                .map(Entity::TvShow),
            EntityKind::Article => conn
                .query_row(
                    &format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS),
                    params![id],
                    row_to_article,
                )
                .optional()?
                .map(Entity::Article),
        };
        Ok(entity)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn get_entity(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        let conn = self.conn.lock().unwrap();
        Self::get_entity_locked(&conn, kind, id)
    }

    fn find_or_create(&self, kind: EntityKind, new: &NewEntity) -> Result<Entity> {
        let conn = self.conn.lock().unwrap();

        // Natural-key lookup first; `IS` so a NULL creator matches NULL.
        let existing_id: Option<String> = match kind {
            EntityKind::Book => conn
                .query_row(
                    "SELECT id FROM books WHERE title = ?1 AND author IS ?2",
                    params![new.title, new.creator],
                    |r| r.get(0),
                )
                .optional()?,
            EntityKind::Movie => conn
                .query_row(
                    "SELECT id FROM movies WHERE title = ?1 AND director IS ?2",
                    params![new.title, new.creator],
                    |r| r.get(0),
                )
                .optional()?,
            EntityKind::Podcast => conn
                .query_row(
                    "SELECT id FROM podcasts WHERE title = ?1 AND publisher IS ?2",
                    params![new.title, new.creator],
                    |r| r.get(0),
                )
                .optional()?,
            EntityKind::TvShow => conn
                .query_row(
                    "SELECT id FROM tv_shows WHERE title = ?1 AND creator IS ?2",
                    params![new.title, new.creator],
                    |r| r.get(0),
                )
                .optional()?,
            EntityKind::Article => {
                let Some(url) = &new.url else {
                    bail!("Articles require a url");
                };
                conn.query_row(
                    "SELECT id FROM articles WHERE url = ?1",
                    params![url],
                    |r| r.get(0),
                )
                .optional()?
            }
        };

        let id = match existing_id {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                match kind {
                    EntityKind::Book => {
                        conn.execute(
                            "INSERT INTO books (id, title, author, published_year) VALUES (?1, ?2, ?3, ?4)",
                            params![id, new.title, new.creator, new.year],
                        )?;
                    }
                    EntityKind::Movie => {
                        conn.execute(
                            "INSERT INTO movies (id, title, director, year) VALUES (?1, ?2, ?3, ?4)",
                            params![id, new.title, new.creator, new.year],
                        )?;
                    }
                    EntityKind::Podcast => {
                        conn.execute(
                            "INSERT INTO podcasts (id, title, publisher) VALUES (?1, ?2, ?3)",
                            params![id, new.title, new.creator],
                        )?;
                    }
                    EntityKind::TvShow => {
                        conn.execute(
                            "INSERT INTO tv_shows (id, title, creator, first_air_year) VALUES (?1, ?2, ?3, ?4)",
                            params![id, new.title, new.creator, new.year],
                        )?;
                    }
                    EntityKind::Article => {
                        conn.execute(
                            "INSERT INTO articles (id, title, url, author) VALUES (?1, ?2, ?3, ?4)",
                            params![id, new.title, new.url, new.creator],
                        )?;
                    }
                }
                id
            }
        };

        Self::get_entity_locked(&conn, kind, &id)?
            .with_context(|| format!("Entity {} vanished after find-or-create", id))
    }

    fn put_enrichment(
        &self,
        kind: EntityKind,
        id: &str,
        details: &EntityDetails,
        fetched_at: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        let updated = match (kind, details) {
            (EntityKind::Book, EntityDetails::Book(d)) => conn.execute(
                "UPDATE books SET cover_url = ?1, description = ?2, page_count = ?3, \
                 subjects = ?4, ratings = ?5, open_library_key = ?6, google_books_id = ?7, \
                 info_url = ?8, genre = ?9, details_fetched_at = ?10 WHERE id = ?11",
                params![
                    d.cover_url,
                    d.description,
                    d.page_count,
                    to_json(&d.subjects)?,
                    to_json(&d.ratings)?,
                    d.open_library_key,
                    d.google_books_id,
                    d.info_url,
                    d.genre,
                    fetched_at,
                    id
                ],
            )?,
            (EntityKind::Movie, EntityDetails::Movie(d)) => conn.execute(
                "UPDATE movies SET poster_url = ?1, plot = ?2, runtime_minutes = ?3, \
                 genres = ?4, ratings = ?5, imdb_id = ?6, info_url = ?7, genre = ?8, \
                 details_fetched_at = ?9 WHERE id = ?10",
                params![
                    d.poster_url,
                    d.plot,
                    d.runtime_minutes,
                    to_json(&d.genres)?,
                    to_json(&d.ratings)?,
                    d.imdb_id,
                    d.info_url,
                    d.genre,
                    fetched_at,
                    id
                ],
            )?,
            (EntityKind::Podcast, EntityDetails::Podcast(d)) => conn.execute(
                "UPDATE podcasts SET artwork_url = ?1, description = ?2, episode_count = ?3, \
                 genres = ?4, ratings = ?5, itunes_id = ?6, feed_url = ?7, info_url = ?8, \
                 genre = ?9, details_fetched_at = ?10 WHERE id = ?11",
                params![
                    d.artwork_url,
                    d.description,
                    d.episode_count,
                    to_json(&d.genres)?,
                    to_json(&d.ratings)?,
                    d.itunes_id,
                    d.feed_url,
                    d.info_url,
                    d.genre,
                    fetched_at,
                    id
                ],
            )?,
            (EntityKind::TvShow, EntityDetails::TvShow(d)) => conn.execute(
                "UPDATE tv_shows SET poster_url = ?1, summary = ?2, network = ?3, genres = ?4, \
                 ratings = ?5, imdb_id = ?6, tvmaze_id = ?7, info_url = ?8, genre = ?9, \
                 details_fetched_at = ?10 WHERE id = ?11",
                params![
                    d.poster_url,
                    d.summary,
                    d.network,
                    to_json(&d.genres)?,
                    to_json(&d.ratings)?,
                    d.imdb_id,
                    d.tvmaze_id,
                    d.info_url,
                    d.genre,
                    fetched_at,
                    id
                ],
            )?,
            (EntityKind::Article, EntityDetails::Article(d)) => conn.execute(
                "UPDATE articles SET image_url = ?1, description = ?2, site_name = ?3, \
                 published = ?4, info_url = ?5, details_fetched_at = ?6 WHERE id = ?7",
                params![
                    d.image_url,
                    d.description,
                    d.site_name,
                    d.published,
                    d.info_url,
                    fetched_at,
                    id
                ],
            )?,
            (kind, details) => bail!(
                "Details kind {} does not match entity kind {}",
                details.kind(),
                kind
            ),
        };

        if updated == 0 {
            bail!("No {} entity with id {}", kind, id);
        }
        Ok(())
    }

    fn clear_enrichment_stamp(&self, kind: EntityKind, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let table = match kind {
            EntityKind::Book => "books",
            EntityKind::Movie => "movies",
            EntityKind::Podcast => "podcasts",
            EntityKind::TvShow => "tv_shows",
            EntityKind::Article => "articles",
        };
        let updated = conn.execute(
            &format!("UPDATE {} SET details_fetched_at = NULL WHERE id = ?1", table),
            params![id],
        )?;
        if updated == 0 {
            bail!("No {} entity with id {}", kind, id);
        }
        Ok(())
    }

    fn entity_count(&self, kind: EntityKind) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let table = match kind {
            EntityKind::Book => "books",
            EntityKind::Movie => "movies",
            EntityKind::Podcast => "podcasts",
            EntityKind::TvShow => "tv_shows",
            EntityKind::Article => "articles",
        };
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(count)
    }
}
