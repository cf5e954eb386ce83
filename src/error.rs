use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::models::AnimeId;

/// Why a single remote fetch produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchFailure {
    /// The remote returned no payload for the key
    NotFound,
    /// A payload came back but did not have the expected shape
    ParseFailed,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::NotFound => write!(f, "NOT_FOUND"),
            FetchFailure::ParseFailed => write!(f, "PARSE_FAILED"),
        }
    }
}

/// Failed watch-list fetch for one username
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} fetching user {username}")]
pub struct UserFetchError {
    #[serde(rename = "type")]
    pub kind: FetchFailure,
    pub username: String,
}

impl UserFetchError {
    pub fn not_found(username: impl Into<String>) -> Self {
        Self {
            kind: FetchFailure::NotFound,
            username: username.into(),
        }
    }

    pub fn parse_failed(username: impl Into<String>) -> Self {
        Self {
            kind: FetchFailure::ParseFailed,
            username: username.into(),
        }
    }
}

/// Failed metadata fetch for one anime
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} fetching anime {id}")]
pub struct AnimeFetchError {
    #[serde(rename = "type")]
    pub kind: FetchFailure,
    pub id: AnimeId,
}

impl AnimeFetchError {
    pub fn not_found(id: AnimeId) -> Self {
        Self {
            kind: FetchFailure::NotFound,
            id,
        }
    }

    pub fn parse_failed(id: AnimeId) -> Self {
        Self {
            kind: FetchFailure::ParseFailed,
            id,
        }
    }
}

/// Terminal failure of a duplicate pick, in the order they can be detected
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickError {
    #[error("failed to fetch {} user(s)", .errors.len())]
    FailedFetchUsers { errors: Vec<UserFetchError> },

    #[error("no anime meets the duplicate threshold")]
    NoDuplicate,

    #[error("failed to fetch picked anime {anilist_id}: {cause}")]
    FailedFetchAnime {
        #[serde(rename = "anilistId")]
        anilist_id: AnimeId,
        cause: FetchFailure,
    },
}

impl PickError {
    /// Stable machine-readable name, used as the response `message`
    pub fn code(&self) -> &'static str {
        match self {
            PickError::FailedFetchUsers { .. } => "FAILED_FETCH_USERS",
            PickError::NoDuplicate => "NO_DUPLICATE",
            PickError::FailedFetchAnime { .. } => "FAILED_FETCH_ANIME",
        }
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("no usernames supplied")]
    NoUsernames,

    #[error("Pick failed: {0}")]
    Pick(#[from] PickError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NoUsernames => (StatusCode::BAD_REQUEST, json!({ "message": "NO_USERNAMES" })),
            AppError::Pick(error) => {
                let status = match error {
                    PickError::FailedFetchUsers { .. } => StatusCode::BAD_REQUEST,
                    PickError::NoDuplicate => StatusCode::NOT_FOUND,
                    PickError::FailedFetchAnime { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, json!({ "message": error.code(), "payload": error }))
            }
            AppError::HttpClient(_) => {
                tracing::error!(error = %self, "Unhandled application error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "UNKNOWN_ERROR" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_fetch_error_wire_shape() {
        let error = UserFetchError::not_found("ghost");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({ "type": "NOT_FOUND", "username": "ghost" })
        );
        assert_eq!(error.to_string(), "NOT_FOUND fetching user ghost");
    }

    #[test]
    fn test_pick_error_wire_shape() {
        let error = PickError::FailedFetchUsers {
            errors: vec![
                UserFetchError::not_found("ghost"),
                UserFetchError::parse_failed("weird"),
            ],
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "type": "FAILED_FETCH_USERS",
                "errors": [
                    { "type": "NOT_FOUND", "username": "ghost" },
                    { "type": "PARSE_FAILED", "username": "weird" }
                ]
            })
        );

        let error = PickError::FailedFetchAnime {
            anilist_id: 21,
            cause: FetchFailure::ParseFailed,
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({ "type": "FAILED_FETCH_ANIME", "anilistId": 21, "cause": "PARSE_FAILED" })
        );
        assert_eq!(
            serde_json::to_value(PickError::NoDuplicate).unwrap(),
            json!({ "type": "NO_DUPLICATE" })
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::Pick(PickError::FailedFetchUsers { errors: vec![] }),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Pick(PickError::NoDuplicate), StatusCode::NOT_FOUND),
            (
                AppError::Pick(PickError::FailedFetchAnime {
                    anilist_id: 1,
                    cause: FetchFailure::NotFound,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::NoUsernames, StatusCode::BAD_REQUEST),
            (client_error().into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    fn client_error() -> reqwest::Error {
        reqwest::Client::new().get("not a url").build().unwrap_err()
    }

    #[tokio::test]
    async fn test_http_client_error_is_unknown() {
        let response = AppError::from(client_error()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "message": "UNKNOWN_ERROR" }));
    }
}
