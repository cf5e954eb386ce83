use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    error::PickError,
    models::PickResponse,
    services::{
        combinator::CollectAll,
        intersection::{annotate, normalize_threshold, pick_candidate, qualifying_candidates},
        providers::WatchListProvider,
    },
};

/// Where a pick currently is, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickStage {
    FetchingUsers,
    Intersecting,
    FetchingAnime,
    Done,
}

impl fmt::Display for PickStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PickStage::FetchingUsers => "fetching_users",
            PickStage::Intersecting => "intersecting",
            PickStage::FetchingAnime => "fetching_anime",
            PickStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Picks an anime that enough of a group has completed
///
/// Fans out one list fetch per user, refuses to go further unless every fetch
/// succeeded, intersects the completed lists under the duplicate threshold,
/// picks uniformly among the survivors, and annotates the pick per user.
pub struct DuplicatePicker {
    provider: Arc<dyn WatchListProvider>,
    rng: Mutex<StdRng>,
}

impl DuplicatePicker {
    pub fn new(provider: Arc<dyn WatchListProvider>, rng: StdRng) -> Self {
        Self {
            provider,
            rng: Mutex::new(rng),
        }
    }

    /// Builds a picker with a fixed seed, or one drawn from OS entropy
    pub fn with_seed(provider: Arc<dyn WatchListProvider>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(provider, rng)
    }

    /// Runs one pick for `usernames` with at least `dup` users sharing the title.
    ///
    /// A `dup` larger than the group becomes `usernames.len() - 1`, and the
    /// result is clamped to `[1, usernames.len()]`. Failures surface in
    /// detection order: user fetches, then the threshold, then the anime fetch.
    pub async fn select_duplicate(
        &self,
        usernames: &[String],
        dup: usize,
    ) -> Result<PickResponse, PickError> {
        let dup = normalize_threshold(dup, usernames.len());

        tracing::info!(
            stage = %PickStage::FetchingUsers,
            users = usernames.len(),
            dup,
            provider = self.provider.name(),
            "Fetching user lists"
        );

        let fetches = usernames
            .iter()
            .map(|username| self.provider.fetch_user_watch_data(username));
        let records = join_all(fetches)
            .await
            .into_iter()
            .collect_all()
            .map_err(|errors| {
                tracing::warn!(
                    failed = errors.len(),
                    users = usernames.len(),
                    "User list fetch failed"
                );
                PickError::FailedFetchUsers { errors }
            })?;

        let candidates = qualifying_candidates(&records, dup);

        tracing::info!(
            stage = %PickStage::Intersecting,
            candidates = candidates.len(),
            dup,
            "Computed qualifying candidates"
        );

        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            pick_candidate(&candidates, &mut *rng)
        }
        .ok_or(PickError::NoDuplicate)?;

        tracing::info!(
            stage = %PickStage::FetchingAnime,
            anime_id = picked,
            "Fetching picked anime"
        );

        let anime = self
            .provider
            .fetch_anime_metadata(picked)
            .await
            .map_err(|e| PickError::FailedFetchAnime {
                anilist_id: picked,
                cause: e.kind,
            })?;

        let users = annotate(&records, picked);

        tracing::info!(
            stage = %PickStage::Done,
            anime_id = picked,
            annotated = users.len(),
            "Pick completed"
        );

        Ok(PickResponse { anime, users })
    }
}
