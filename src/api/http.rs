// src/api/http.rs

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::Config,
    error::ApiError,
    models::{
        AnswerMap, QuizDefinition, QuizId, StartAttemptResponse, SubmissionResult,
        SubmitQuizRequest,
    },
    routes,
};

use super::QuizApi;

/// `QuizApi` backed by the quiz service's HTTP endpoints.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpQuizApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
        })
    }

    /// Wraps an existing client. `base_url` must end with a slash.
    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorize(request).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn fetch_quiz(&self, quiz_id: &QuizId) -> Result<QuizDefinition, ApiError> {
        let url = routes::quiz(&self.base_url, quiz_id)?;
        tracing::debug!(%url, "fetching quiz");

        self.send_json(self.client.get(url)).await
    }

    async fn start_attempt(&self, quiz_id: &QuizId) -> Result<StartAttemptResponse, ApiError> {
        let url = routes::start_attempt(&self.base_url, quiz_id)?;
        tracing::debug!(%url, "registering attempt");

        self.send_json(self.client.post(url)).await
    }

    async fn submit_answers(
        &self,
        quiz_id: &QuizId,
        answers: &AnswerMap,
    ) -> Result<SubmissionResult, ApiError> {
        let url = routes::submit_attempt(&self.base_url, quiz_id)?;
        let body = SubmitQuizRequest {
            quiz_id: quiz_id.clone(),
            answers: answers.clone(),
        };
        tracing::debug!(%url, answered = answers.len(), "submitting answers");

        self.send_json(self.client.post(url).json(&body)).await
    }
}

/// Turns a non-success response into `ApiError::Status`, keeping the
/// server's message. The quiz service reports errors as `{"detail": ...}`;
/// `{"error": ...}` is accepted as well.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            ["detail", "error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    tracing::warn!(%status, %detail, "quiz service rejected request");
    Err(ApiError::Status { status, detail })
}
