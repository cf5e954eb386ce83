use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppResult;
use crate::services::{providers::AniListProvider, DuplicatePicker};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub picker: Arc<DuplicatePicker>,
}

impl AppState {
    pub fn new(picker: DuplicatePicker) -> Self {
        Self {
            picker: Arc::new(picker),
        }
    }

    /// Wires the AniList provider and the pick RNG from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let provider = AniListProvider::new(
            config.anilist_url.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        )?;

        tracing::info!(
            anilist_url = %config.anilist_url,
            timeout_secs = config.fetch_timeout_secs,
            seeded = config.pick_seed.is_some(),
            "AniList provider configured"
        );

        Ok(Self::new(DuplicatePicker::with_seed(
            Arc::new(provider),
            config.pick_seed,
        )))
    }
}
