use serde::{Deserialize, Serialize, Serializer};

pub mod anilist;

/// AniList media identifier
pub type AnimeId = i64;

/// Non-completed list state of an anime on a user's list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchStatus {
    Current,
    Paused,
    Planning,
    Dropped,
}

/// An anime the user finished, with the score they gave it
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedEntry {
    pub anime_id: AnimeId,
    pub score: f64,
}

/// An anime on one of the user's non-completed lists
#[derive(Debug, Clone, PartialEq)]
pub struct InProgressEntry {
    pub anime_id: AnimeId,
    pub status: WatchStatus,
}

/// Everything we know about one user's watch history
///
/// `completed` holds each anime ID at most once, and never shares an ID with
/// `in_progress`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserWatchRecord {
    pub username: String,
    pub avatar_url: String,
    pub completed: Vec<CompletedEntry>,
    pub in_progress: Vec<InProgressEntry>,
}

impl UserWatchRecord {
    /// Score the user gave `anime_id`, if they completed it
    pub fn score_for(&self, anime_id: AnimeId) -> Option<f64> {
        self.completed
            .iter()
            .find(|entry| entry.anime_id == anime_id)
            .map(|entry| entry.score)
    }

    /// List status of `anime_id`, if it is on a non-completed list
    pub fn status_for(&self, anime_id: AnimeId) -> Option<WatchStatus> {
        self.in_progress
            .iter()
            .find(|entry| entry.anime_id == anime_id)
            .map(|entry| entry.status)
    }
}

/// Display metadata of the picked anime
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeMetadata {
    pub id: AnimeId,
    pub native_title: String,
    pub cover_image_url: String,
}

/// What a user has to say about the picked anime
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    #[serde(serialize_with = "serialize_score")]
    Score(f64),
    Status(WatchStatus),
}

/// Whole scores go out as integers (`8`, not `8.0`); fractional ones as-is
fn serialize_score<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // Past 2^53 an f64 no longer holds every integer exactly
    if score.is_finite() && score.fract() == 0.0 && score.abs() < 9_007_199_254_740_992.0 {
        serializer.serialize_i64(*score as i64)
    } else {
        serializer.serialize_f64(*score)
    }
}

/// Per-user entry in the pick response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub username: String,
    pub avatar_url: String,
    #[serde(flatten)]
    pub mark: Mark,
}

/// Successful outcome of a duplicate pick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickResponse {
    pub anime: AnimeMetadata,
    pub users: Vec<Annotation>,
}
