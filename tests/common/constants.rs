//! Fixture constants shared by the e2e suites.

pub const USER_ADA: &str = "ada";
pub const USER_GRACE: &str = "grace";

pub const BOOK_TITLE: &str = "Dune";
pub const BOOK_AUTHOR: &str = "Frank Herbert";

pub const MOVIE_TITLE: &str = "Arrival";

pub const ARTICLE_TITLE: &str = "A Spectre Is Haunting Unicode";
pub const ARTICLE_URL: &str = "https://example.com/unicode-ghosts";
