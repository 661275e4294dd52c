//! SQLite schema for the catalog database.
//!
//! One table per entity kind. Identifying columns are NOT NULL where the
//! kind requires them; every enrichment column is nullable. List-shaped
//! enrichment fields (subjects, genres, ratings) are stored as JSON text.
//! `details_fetched_at` is unix seconds, NULL until the first successful
//! enrichment.

use crate::sqlite_persistence::VersionedSchema;

const CATALOG_SCHEMA_V0: &str = "
CREATE TABLE books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT,
    published_year INTEGER,
    details_fetched_at INTEGER,
    cover_url TEXT,
    description TEXT,
    page_count INTEGER,
    subjects TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    open_library_key TEXT,
    google_books_id TEXT,
    info_url TEXT
);
CREATE INDEX idx_books_title ON books(title);

CREATE TABLE movies (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    director TEXT,
    year INTEGER,
    details_fetched_at INTEGER,
    poster_url TEXT,
    plot TEXT,
    runtime_minutes INTEGER,
    genres TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    imdb_id TEXT,
    info_url TEXT
);
CREATE INDEX idx_movies_title ON movies(title);

CREATE TABLE podcasts (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    publisher TEXT,
    details_fetched_at INTEGER,
    artwork_url TEXT,
    description TEXT,
    episode_count INTEGER,
    genres TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    itunes_id INTEGER,
    feed_url TEXT,
    info_url TEXT
);
CREATE INDEX idx_podcasts_title ON podcasts(title);

CREATE TABLE tv_shows (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    creator TEXT,
    first_air_year INTEGER,
    details_fetched_at INTEGER,
    poster_url TEXT,
    summary TEXT,
    network TEXT,
    genres TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    imdb_id TEXT,
    tvmaze_id INTEGER,
    info_url TEXT
);
CREATE INDEX idx_tv_shows_title ON tv_shows(title);

CREATE TABLE articles (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    author TEXT,
    details_fetched_at INTEGER,
    image_url TEXT,
    description TEXT,
    site_name TEXT,
    published TEXT,
    info_url TEXT
);
CREATE INDEX idx_articles_url ON articles(url);
";

const CATALOG_SCHEMA_V1: &str = "
CREATE TABLE books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT,
    published_year INTEGER,
    details_fetched_at INTEGER,
    cover_url TEXT,
    description TEXT,
    page_count INTEGER,
    subjects TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    open_library_key TEXT,
    google_books_id TEXT,
    info_url TEXT,
    genre TEXT
);
CREATE INDEX idx_books_title ON books(title);

CREATE TABLE movies (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    director TEXT,
    year INTEGER,
    details_fetched_at INTEGER,
    poster_url TEXT,
    plot TEXT,
    runtime_minutes INTEGER,
    genres TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    imdb_id TEXT,
    info_url TEXT,
    genre TEXT
);
CREATE INDEX idx_movies_title ON movies(title);

CREATE TABLE podcasts (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    publisher TEXT,
    details_fetched_at INTEGER,
    artwork_url TEXT,
    description TEXT,
    episode_count INTEGER,
    genres TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    itunes_id INTEGER,
    feed_url TEXT,
    info_url TEXT,
    genre TEXT
);
CREATE INDEX idx_podcasts_title ON podcasts(title);

CREATE TABLE tv_shows (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    creator TEXT,
    first_air_year INTEGER,
    details_fetched_at INTEGER,
    poster_url TEXT,
    summary TEXT,
    network TEXT,
    genres TEXT NOT NULL DEFAULT '[]',
    ratings TEXT NOT NULL DEFAULT '[]',
    imdb_id TEXT,
    tvmaze_id INTEGER,
    info_url TEXT,
    genre TEXT
);
CREATE INDEX idx_tv_shows_title ON tv_shows(title);

CREATE TABLE articles (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    author TEXT,
    details_fetched_at INTEGER,
    image_url TEXT,
    description TEXT,
    site_name TEXT,
    published TEXT,
    info_url TEXT
);
CREATE INDEX idx_articles_url ON articles(url);
";

// v1: genre fallback deduction landed after the initial schema.
pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        create_sql: CATALOG_SCHEMA_V0,
        migration: None,
    },
    VersionedSchema {
        version: 1,
        create_sql: CATALOG_SCHEMA_V1,
        migration: Some(|conn| {
            for table in ["books", "movies", "podcasts", "tv_shows"] {
                conn.execute(&format!("ALTER TABLE {} ADD COLUMN genre TEXT", table), [])?;
            }
            Ok(())
        }),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_persistence::migrate_if_needed;
    use rusqlite::Connection;

    #[test]
    fn test_v0_to_v1_migration_adds_genre_columns() {
        let mut conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        migrate_if_needed(&mut conn, "catalog", CATALOG_VERSIONED_SCHEMAS).unwrap();

        for table in ["books", "movies", "podcasts", "tv_shows"] {
            let has_genre: bool = conn
                .query_row(
                    &format!(
                        "SELECT 1 FROM pragma_table_info('{}') WHERE name = 'genre'",
                        table
                    ),
                    [],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            assert!(has_genre, "table {} is missing the genre column", table);
        }
    }
}
