//! reqwest-backed client for the tutor service and the badge minter.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use academy_core::{
    AnswerRequest, BadgeService, ClaimResult, GameId, QuizService, QuizTurn, ServiceError,
    ServiceResult, WalletAddress,
};

use crate::config::ApiConfig;
use crate::error::{ClientError, Result};

const QUIZ_START_PATH: &str = "/tutor/erc8004/quiz/start";
const QUIZ_ANSWER_PATH: &str = "/tutor/erc8004/quiz/answer";
const HEALTH_PATH: &str = "/health";

/// Reply of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub service: String,
    /// Server time as the service formats it.
    pub time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRequest<'a> {
    user_address: &'a str,
}

/// Client for the academy backend. Implements [`QuizService`] and
/// [`BadgeService`].
#[derive(Debug, Clone)]
pub struct TutorApiClient {
    config: ApiConfig,
    http: Client,
}

impl TutorApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let url = reqwest::Url::parse(&config.base_url).map_err(|err| {
            ClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ApiConfig::from_env())
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Check that the tutor service is up.
    pub async fn health(&self) -> ServiceResult<HealthStatus> {
        let response = self
            .http
            .get(self.config.endpoint(HEALTH_PATH))
            .send()
            .await
            .map_err(|err| self.request_error(err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "Health check failed"));
        }
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> ServiceResult<T> {
        response.json::<T>().await.map_err(|err| self.request_error(err))
    }

    /// Map a reqwest failure onto the collaborator error taxonomy.
    fn request_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout {
                secs: self.config.timeout.as_secs(),
            }
        } else if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Non-2xx reply without a usable detail: `"<context>: <reason phrase>"`.
fn status_error(status: StatusCode, context: &str) -> ServiceError {
    ServiceError::Status {
        status: status.as_u16(),
        message: format!("{context}: {}", status.canonical_reason().unwrap_or("")),
    }
}

/// Pull the minter's explanation out of an error body.
///
/// The service answers `{"Detail": ...}`; FastAPI's own errors use
/// `{"detail": ...}`, sometimes with a structured value.
fn error_detail(body: &Value) -> Option<String> {
    let detail = body.get("Detail").or_else(|| body.get("detail"))?;
    match detail {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl QuizService for TutorApiClient {
    async fn start_quiz(&self) -> ServiceResult<QuizTurn> {
        debug!(url = %self.config.endpoint(QUIZ_START_PATH), "starting quiz");
        let response = self
            .http
            .post(self.config.endpoint(QUIZ_START_PATH))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| self.request_error(err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "Failed to start quiz"));
        }
        let turn: QuizTurn = self.decode(response).await?;
        info!(quiz_session = %turn.session_id, "quiz session opened");
        Ok(turn)
    }

    async fn submit_answer(&self, request: &AnswerRequest) -> ServiceResult<QuizTurn> {
        debug!(quiz_session = %request.session_id, "submitting answer");
        let response = self
            .http
            .post(self.config.endpoint(QUIZ_ANSWER_PATH))
            .json(request)
            .send()
            .await
            .map_err(|err| self.request_error(err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, "Failed to submit answer"));
        }
        self.decode(response).await
    }
}

#[async_trait]
impl BadgeService for TutorApiClient {
    async fn claim_badge(&self, game: GameId, address: &WalletAddress) -> ServiceResult<ClaimResult> {
        let url = self
            .config
            .endpoint(&format!("/claim-badge/{}", game.path_segment()));
        info!(game = %game, address = %address, "claiming badge");

        let response = self
            .http
            .post(url)
            .json(&ClaimRequest {
                user_address: address.as_str(),
            })
            .send()
            .await
            .map_err(|err| self.request_error(err))?;
        let status = response.status();
        if status.is_success() {
            return self.decode(response).await;
        }

        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        match error_detail(&body) {
            Some(detail) => Err(ServiceError::Rejected(detail)),
            None => Err(status_error(status, "Failed to claim badge")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_unparseable_base_url() {
        let err = TutorApiClient::new(ApiConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = TutorApiClient::new(ApiConfig::new("ftp://tutor.local")).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn detail_prefers_capitalised_key() {
        let body = json!({"Detail": "claim_already_used", "detail": "other"});
        assert_eq!(error_detail(&body).as_deref(), Some("claim_already_used"));
    }

    #[test]
    fn detail_accepts_fastapi_shapes() {
        assert_eq!(
            error_detail(&json!({"detail": "invalid address"})).as_deref(),
            Some("invalid address")
        );
        let structured = error_detail(&json!({"detail": [{"msg": "field required"}]})).unwrap();
        assert!(structured.contains("field required"));
        assert_eq!(error_detail(&json!({"detail": null})), None);
        assert_eq!(error_detail(&json!({"message": "x"})), None);
        assert_eq!(error_detail(&Value::Null), None);
    }

    #[test]
    fn status_error_uses_reason_phrase() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "Failed to start quiz");
        assert_eq!(
            err,
            ServiceError::Status {
                status: 503,
                message: "Failed to start quiz: Service Unavailable".into(),
            }
        );
    }
}
