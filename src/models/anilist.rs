// ============================================================================
// AniList GraphQL Response Types
// ============================================================================

use std::collections::HashSet;

use reqwest::Url;
use serde::Deserialize;

use super::{
    AnimeId, AnimeMetadata, CompletedEntry, InProgressEntry, UserWatchRecord, WatchStatus,
};

/// Payload of the user query: profile plus both list collections
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    #[serde(rename = "User")]
    pub user: UserNode,
    pub completed: ListCollection<ScoredEntry>,
    #[serde(rename = "etc")]
    pub in_progress: ListCollection<StatusEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserNode {
    pub id: i64,
    pub name: String,
    pub avatar: ImageNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageNode {
    pub large: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListCollection<E> {
    pub lists: Vec<ListGroup<E>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListGroup<E> {
    pub entries: Vec<E>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoredEntry {
    pub score: f64,
    pub media: MediaRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusEntry {
    pub status: WatchStatus,
    pub media: MediaRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaRef {
    pub id: AnimeId,
}

/// Payload of the anime query
#[derive(Debug, Clone, Deserialize)]
pub struct MediaData {
    #[serde(rename = "Media")]
    pub media: MediaNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaNode {
    pub id: AnimeId,
    pub title: MediaTitle,
    pub cover_image: ImageNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaTitle {
    pub native: String,
}

/// A field that must hold an absolute URL did not
#[derive(Debug, thiserror::Error)]
#[error("{field} is not a valid URL: {value}")]
pub struct InvalidUrl {
    pub field: &'static str,
    pub value: String,
}

fn require_url(field: &'static str, value: String) -> Result<String, InvalidUrl> {
    match Url::parse(&value) {
        Ok(_) => Ok(value),
        Err(_) => Err(InvalidUrl { field, value }),
    }
}

impl TryFrom<UserData> for UserWatchRecord {
    type Error = InvalidUrl;

    fn try_from(data: UserData) -> Result<Self, Self::Error> {
        let avatar_url = require_url("User.avatar.large", data.user.avatar.large)?;

        // Custom lists repeat entries from the main COMPLETED list
        let mut seen = HashSet::new();
        let completed = data
            .completed
            .lists
            .into_iter()
            .flat_map(|group| group.entries)
            .filter(|entry| seen.insert(entry.media.id))
            .map(|entry| CompletedEntry {
                anime_id: entry.media.id,
                score: entry.score,
            })
            .collect();

        let in_progress = data
            .in_progress
            .lists
            .into_iter()
            .flat_map(|group| group.entries)
            .map(|entry| InProgressEntry {
                anime_id: entry.media.id,
                status: entry.status,
            })
            .collect();

        Ok(UserWatchRecord {
            username: data.user.name,
            avatar_url,
            completed,
            in_progress,
        })
    }
}

impl TryFrom<MediaData> for AnimeMetadata {
    type Error = InvalidUrl;

    fn try_from(data: MediaData) -> Result<Self, Self::Error> {
        let cover_image_url = require_url("Media.coverImage.large", data.media.cover_image.large)?;

        Ok(AnimeMetadata {
            id: data.media.id,
            native_title: data.media.title.native,
            cover_image_url,
        })
    }
}
