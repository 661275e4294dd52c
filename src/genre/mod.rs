//! Genre fallback deduction.
//!
//! When no provider supplies a usable category, the entity's identifying
//! hints go to an LLM classifier constrained to a fixed per-kind
//! vocabulary. The model's reply is untrusted text, so the validation
//! ladder is the real contract: case-insensitive exact match, then
//! substring match in either direction, then the kind's fixed default.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::models::EntityKind;
use crate::llm::{CompletionOptions, LlmProvider};

const BOOK_GENRES: &[&str] = &[
    "Fiction",
    "Non-Fiction",
    "Mystery",
    "Science Fiction",
    "Fantasy",
    "Biography",
    "History",
    "Self-Help",
    "Romance",
    "Poetry",
];

const MOVIE_GENRES: &[&str] = &[
    "Drama",
    "Comedy",
    "Action",
    "Thriller",
    "Horror",
    "Science Fiction",
    "Documentary",
    "Romance",
    "Animation",
    "Crime",
];

const PODCAST_GENRES: &[&str] = &[
    "News",
    "Comedy",
    "True Crime",
    "Technology",
    "Business",
    "Health",
    "Sports",
    "Arts",
    "Science",
    "Society & Culture",
];

const TV_GENRES: &[&str] = &[
    "Drama",
    "Comedy",
    "Reality",
    "Documentary",
    "Crime",
    "Science Fiction",
    "Fantasy",
    "Animation",
    "Thriller",
    "Talk Show",
];

/// Vocabulary and fixed fallback default for a kind. Articles are not
/// classified.
pub fn kind_vocabulary(kind: EntityKind) -> Option<(&'static [&'static str], &'static str)> {
    match kind {
        EntityKind::Book => Some((BOOK_GENRES, "Non-Fiction")),
        EntityKind::Movie => Some((MOVIE_GENRES, "Drama")),
        EntityKind::Podcast => Some((PODCAST_GENRES, "Society & Culture")),
        EntityKind::TvShow => Some((TV_GENRES, "Drama")),
        EntityKind::Article => None,
    }
}

/// Context handed to the classifier.
#[derive(Clone, Debug, Default)]
pub struct GenreHints {
    pub title: String,
    pub creator: Option<String>,
    pub description: Option<String>,
    pub subjects: Vec<String>,
}

/// Lowercase and collapse non-alphanumeric runs, so "science-fiction-ish"
/// still contains "science fiction".
fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Coerce an untrusted classifier answer into a vocabulary term.
pub fn resolve_answer(answer: &str, vocabulary: &[&str], default: &str) -> String {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return default.to_string();
    }

    for term in vocabulary {
        if term.eq_ignore_ascii_case(trimmed) {
            return term.to_string();
        }
    }

    let normalized = normalize(trimmed);
    for term in vocabulary {
        let term_normalized = normalize(term);
        if normalized.contains(&term_normalized) || term_normalized.contains(&normalized) {
            return term.to_string();
        }
    }

    default.to_string()
}

fn build_prompt(kind: EntityKind, hints: &GenreHints, vocabulary: &[&str]) -> String {
    let mut prompt = format!(
        "Classify this {} into exactly one of these categories: {}.\n\nTitle: {}",
        match kind {
            EntityKind::Book => "book",
            EntityKind::Movie => "movie",
            EntityKind::Podcast => "podcast",
            EntityKind::TvShow => "TV show",
            EntityKind::Article => "article",
        },
        vocabulary.join(", "),
        hints.title
    );
    if let Some(creator) = &hints.creator {
        prompt.push_str(&format!("\nBy: {}", creator));
    }
    if !hints.subjects.is_empty() {
        prompt.push_str(&format!("\nSubjects: {}", hints.subjects.join(", ")));
    }
    if let Some(description) = &hints.description {
        prompt.push_str(&format!("\nDescription: {}", description));
    }
    prompt.push_str("\n\nAnswer with the category name only.");
    prompt
}

/// Best-effort genre classifier over an LLM backend.
pub struct GenreDeducer {
    llm: Arc<dyn LlmProvider>,
}

impl GenreDeducer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Deduce a genre for the given hints. Never errors: any classifier
    /// failure yields None and the entity is left without a deduced genre.
    pub async fn deduce(&self, kind: EntityKind, hints: &GenreHints) -> Option<String> {
        let (vocabulary, default) = kind_vocabulary(kind)?;

        let system = "You classify catalog items. Answer with a single category name \
                      from the provided list and nothing else.";
        let prompt = build_prompt(kind, hints, vocabulary);

        match self
            .llm
            .complete(system, &prompt, &CompletionOptions::default())
            .await
        {
            Ok(answer) => {
                let resolved = resolve_answer(&answer, vocabulary, default);
                debug!(
                    title = %hints.title,
                    answer = %answer.trim(),
                    resolved = %resolved,
                    "Deduced genre"
                );
                Some(resolved)
            }
            Err(e) => {
                warn!("Genre deduction failed for '{}': {}", hints.title, e);
                None
            }
        }
    }
}
