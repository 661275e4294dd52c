//! Pure merge semantics for enrichment details.
//!
//! `merge` implements the on-success rule: fields present in the patch
//! overwrite, fields the patch lacks preserve the stored value. Force
//! refetch does not go through here at all — it replaces the whole bag,
//! so fields absent from the fresh response end up null.

use super::models::{
    ArticleDetails, BookDetails, EntityDetails, MovieDetails, PodcastDetails, TvShowDetails,
};

fn pick<T>(old: Option<T>, new: Option<T>) -> Option<T> {
    new.or(old)
}

fn pick_vec<T>(old: Vec<T>, new: Vec<T>) -> Vec<T> {
    if new.is_empty() {
        old
    } else {
        new
    }
}

pub fn merge_book(old: &BookDetails, patch: BookDetails) -> BookDetails {
    let old = old.clone();
    BookDetails {
        cover_url: pick(old.cover_url, patch.cover_url),
        description: pick(old.description, patch.description),
        page_count: pick(old.page_count, patch.page_count),
        subjects: pick_vec(old.subjects, patch.subjects),
        genre: pick(old.genre, patch.genre),
        ratings: pick_vec(old.ratings, patch.ratings),
        open_library_key: pick(old.open_library_key, patch.open_library_key),
        google_books_id: pick(old.google_books_id, patch.google_books_id),
        info_url: pick(old.info_url, patch.info_url),
    }
}

pub fn merge_movie(old: &MovieDetails, patch: MovieDetails) -> MovieDetails {
    let old = old.clone();
    MovieDetails {
        poster_url: pick(old.poster_url, patch.poster_url),
        plot: pick(old.plot, patch.plot),
        runtime_minutes: pick(old.runtime_minutes, patch.runtime_minutes),
        genres: pick_vec(old.genres, patch.genres),
        genre: pick(old.genre, patch.genre),
        ratings: pick_vec(old.ratings, patch.ratings),
        imdb_id: pick(old.imdb_id, patch.imdb_id),
        info_url: pick(old.info_url, patch.info_url),
    }
}

pub fn merge_podcast(old: &PodcastDetails, patch: PodcastDetails) -> PodcastDetails {
    let old = old.clone();
    PodcastDetails {
        artwork_url: pick(old.artwork_url, patch.artwork_url),
        description: pick(old.description, patch.description),
        episode_count: pick(old.episode_count, patch.episode_count),
        genres: pick_vec(old.genres, patch.genres),
        genre: pick(old.genre, patch.genre),
        ratings: pick_vec(old.ratings, patch.ratings),
        itunes_id: pick(old.itunes_id, patch.itunes_id),
        feed_url: pick(old.feed_url, patch.feed_url),
        info_url: pick(old.info_url, patch.info_url),
    }
}

pub fn merge_tv_show(old: &TvShowDetails, patch: TvShowDetails) -> TvShowDetails {
    let old = old.clone();
    TvShowDetails {
        poster_url: pick(old.poster_url, patch.poster_url),
        summary: pick(old.summary, patch.summary),
        network: pick(old.network, patch.network),
        genres: pick_vec(old.genres, patch.genres),
        genre: pick(old.genre, patch.genre),
        ratings: pick_vec(old.ratings, patch.ratings),
        imdb_id: pick(old.imdb_id, patch.imdb_id),
        tvmaze_id: pick(old.tvmaze_id, patch.tvmaze_id),
        info_url: pick(old.info_url, patch.info_url),
    }
}

pub fn merge_article(old: &ArticleDetails, patch: ArticleDetails) -> ArticleDetails {
    let old = old.clone();
    ArticleDetails {
        image_url: pick(old.image_url, patch.image_url),
        description: pick(old.description, patch.description),
        site_name: pick(old.site_name, patch.site_name),
        published: pick(old.published, patch.published),
        info_url: pick(old.info_url, patch.info_url),
    }
}

/// Merge a provider patch onto stored details of the same kind.
pub fn merge(old: &EntityDetails, patch: EntityDetails) -> EntityDetails {
    match (old, patch) {
        (EntityDetails::Book(o), EntityDetails::Book(p)) => EntityDetails::Book(merge_book(o, p)),
        (EntityDetails::Movie(o), EntityDetails::Movie(p)) => {
            EntityDetails::Movie(merge_movie(o, p))
        }
        (EntityDetails::Podcast(o), EntityDetails::Podcast(p)) => {
            EntityDetails::Podcast(merge_podcast(o, p))
        }
        (EntityDetails::TvShow(o), EntityDetails::TvShow(p)) => {
            EntityDetails::TvShow(merge_tv_show(o, p))
        }
        (EntityDetails::Article(o), EntityDetails::Article(p)) => {
            EntityDetails::Article(merge_article(o, p))
        }
        // Kind mismatch cannot come out of the cache; keep the patch.
        (_, patch) => patch,
    }
}
