//! Watch-list data provider abstraction
//!
//! The picker only needs two lookups from the tracking service: a user's lists
//! and an anime's display metadata. Both report failure as values so a batch of
//! user lookups can be aggregated without bailing on the first error.
use crate::{
    error::{AnimeFetchError, UserFetchError},
    models::{AnimeId, AnimeMetadata, UserWatchRecord},
};

pub mod anilist;

pub use anilist::AniListProvider;

/// Trait for watch-list providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait WatchListProvider: Send + Sync {
    /// Fetch a user's completed and in-progress lists
    ///
    /// One network round trip. A missing user is `NOT_FOUND`; a payload that
    /// does not match the expected shape is `PARSE_FAILED`.
    async fn fetch_user_watch_data(&self, username: &str)
        -> Result<UserWatchRecord, UserFetchError>;

    /// Fetch native title and cover art for one anime
    async fn fetch_anime_metadata(&self, id: AnimeId) -> Result<AnimeMetadata, AnimeFetchError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
