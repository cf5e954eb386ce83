//! AniList GraphQL provider
//!
//! Every lookup is a single POST to the GraphQL endpoint. AniList reports
//! missing users and media through a null `data` (or a null root field) rather
//! than through the HTTP status, so classification works on the body alone.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{
    error::{AnimeFetchError, AppResult, FetchFailure, UserFetchError},
    models::{
        anilist::{InvalidUrl, MediaData, UserData},
        AnimeId, AnimeMetadata, UserWatchRecord,
    },
    services::providers::WatchListProvider,
};

const USER_QUERY: &str = r#"
query ($username: String!) {
  User(name: $username) {
    id
    name
    avatar {
      large
    }
  }
  completed: MediaListCollection(userName: $username, type: ANIME, status: COMPLETED) {
    lists {
      entries {
        score
        media {
          id
        }
      }
    }
  }
  etc: MediaListCollection(userName: $username, type: ANIME, status_in: [CURRENT, PAUSED, PLANNING, DROPPED]) {
    lists {
      entries {
        status
        media {
          id
        }
      }
    }
  }
}
"#;

const ANIME_QUERY: &str = r#"
query ($id: Int) {
  Media(id: $id, type: ANIME) {
    id
    title {
      native
    }
    coverImage {
      large
    }
  }
}
"#;

/// Outer GraphQL response; `errors` is ignored since `data` alone decides
#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Clone)]
pub struct AniListProvider {
    http_client: HttpClient,
    api_url: String,
}

impl AniListProvider {
    /// Creates a provider whose requests give up after `timeout`
    pub fn new(api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_url,
        })
    }

    /// Posts one GraphQL query and returns the raw response body
    async fn post_query(&self, query: &str, variables: Value) -> Result<String, reqwest::Error> {
        self.http_client
            .post(&self.api_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .text()
            .await
    }
}

/// Sorts a response body into not-found, parse-failed, or a typed record.
///
/// `root` names the field inside `data` that holds the requested entity; a null
/// there means the key does not exist.
fn classify<T, R>(body: &str, root: &str) -> Result<R, FetchFailure>
where
    T: DeserializeOwned,
    R: TryFrom<T, Error = InvalidUrl>,
{
    let envelope: GraphQlEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::debug!(error = %e, "Response body is not a GraphQL envelope");
        FetchFailure::ParseFailed
    })?;

    let data = match envelope.data {
        None => return Err(FetchFailure::NotFound),
        Some(data) if data.get(root).map_or(true, Value::is_null) => {
            return Err(FetchFailure::NotFound)
        }
        Some(data) => data,
    };

    let raw: T = serde_json::from_value(data).map_err(|e| {
        tracing::debug!(error = %e, root, "Response data has unexpected shape");
        FetchFailure::ParseFailed
    })?;

    R::try_from(raw).map_err(|e| {
        tracing::debug!(error = %e, "Response data failed validation");
        FetchFailure::ParseFailed
    })
}

pub(crate) fn parse_user_response(
    username: &str,
    body: &str,
) -> Result<UserWatchRecord, UserFetchError> {
    classify::<UserData, UserWatchRecord>(body, "User").map_err(|kind| UserFetchError {
        kind,
        username: username.to_string(),
    })
}

pub(crate) fn parse_anime_response(
    id: AnimeId,
    body: &str,
) -> Result<AnimeMetadata, AnimeFetchError> {
    classify::<MediaData, AnimeMetadata>(body, "Media")
        .map_err(|kind| AnimeFetchError { kind, id })
}

#[async_trait::async_trait]
impl WatchListProvider for AniListProvider {
    /// Transport failures (refused connection, timeout) return no payload and
    /// are reported as `NOT_FOUND`, so an AniList outage surfaces as a 400
    /// `FAILED_FETCH_USERS` naming every user. The underlying error is only
    /// visible in the `warn` log.
    async fn fetch_user_watch_data(
        &self,
        username: &str,
    ) -> Result<UserWatchRecord, UserFetchError> {
        let body = match self
            .post_query(USER_QUERY, json!({ "username": username }))
            .await
        {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "AniList user request failed");
                return Err(UserFetchError::not_found(username));
            }
        };

        let result = parse_user_response(username, &body);

        match &result {
            Ok(record) => tracing::info!(
                username = %username,
                completed = record.completed.len(),
                in_progress = record.in_progress.len(),
                provider = "anilist",
                "User lists fetched"
            ),
            Err(e) => tracing::warn!(
                username = %username,
                kind = %e.kind,
                provider = "anilist",
                "User fetch failed"
            ),
        }

        result
    }

    /// Same transport handling as user fetches: a request that never gets a
    /// body is `NOT_FOUND`.
    async fn fetch_anime_metadata(&self, id: AnimeId) -> Result<AnimeMetadata, AnimeFetchError> {
        let body = match self.post_query(ANIME_QUERY, json!({ "id": id })).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(anime_id = id, error = %e, "AniList media request failed");
                return Err(AnimeFetchError::not_found(id));
            }
        };

        let result = parse_anime_response(id, &body);

        if let Err(e) = &result {
            tracing::warn!(
                anime_id = id,
                kind = %e.kind,
                provider = "anilist",
                "Anime fetch failed"
            );
        }

        result
    }

    fn name(&self) -> &'static str {
        "anilist"
    }
}
