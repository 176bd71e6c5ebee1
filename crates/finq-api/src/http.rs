//! HTTP implementation of [`QueryApi`] over the FinQ REST endpoints.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;

use finq_core::{Conversation, FinqError, JobStatusReport, JobSubmission, Result, WireMessage};

use crate::client::QueryApi;
use crate::config::ClientConfig;

/// Query-service client over HTTP + JSON.
///
/// Authorization and error mapping are uniform across endpoints: an optional
/// bearer token on every request, non-2xx responses mapped to
/// [`FinqError::Api`] (404s to [`FinqError::NotFound`]), and connection or
/// timeout failures mapped to [`FinqError::Transport`].
#[derive(Clone)]
pub struct HttpQueryApi {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    conversation_id: Option<i64>,
}

impl HttpQueryApi {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            api_token,
            timeout: Duration::from_secs(30),
        }
    }

    /// Creates a client from loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut api = Self::new(config.base_url.clone(), config.api_token.clone());
        api.timeout = config.request_timeout();
        api
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .timeout(self.timeout);
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request
    }

    async fn send(
        &self,
        request: RequestBuilder,
        entity_type: &'static str,
        entity_id: String,
    ) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| FinqError::transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(FinqError::not_found(entity_type, entity_id));
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(
            target: "api",
            %status,
            entity_type,
            entity_id = %entity_id,
            "server rejected request"
        );
        Err(FinqError::api(status.as_u16(), body))
    }
}

#[async_trait]
impl QueryApi for HttpQueryApi {
    async fn fetch_history(&self) -> Result<Vec<Conversation>> {
        let response = self
            .send(
                self.request(Method::GET, "/api/chat/history"),
                "history",
                "history".to_string(),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| FinqError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to parse conversation list: {}", e),
            })
    }

    async fn fetch_messages(&self, conversation_id: i64) -> Result<Vec<WireMessage>> {
        let path = format!("/api/chat/conversation/{}", conversation_id);
        let response = self
            .send(
                self.request(Method::GET, &path),
                "conversation",
                conversation_id.to_string(),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| FinqError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to parse message list: {}", e),
            })
    }

    async fn delete_conversation(&self, conversation_id: i64) -> Result<()> {
        let path = format!("/api/chat/conversation/{}", conversation_id);
        self.send(
            self.request(Method::DELETE, &path),
            "conversation",
            conversation_id.to_string(),
        )
        .await?;
        Ok(())
    }

    async fn submit_query(
        &self,
        query: &str,
        conversation_id: Option<i64>,
    ) -> Result<JobSubmission> {
        let body = QueryRequest {
            query,
            conversation_id,
        };
        let response = self
            .send(
                self.request(Method::POST, "/api/query").json(&body),
                "query",
                query.chars().take(30).collect(),
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| FinqError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to parse query receipt: {}", e),
            })
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusReport> {
        let path = format!("/api/jobs/{}", job_id);
        let response = self
            .send(self.request(Method::GET, &path), "job", job_id.to_string())
            .await?;
        response
            .json()
            .await
            .map_err(|e| FinqError::Serialization {
                format: "JSON".to_string(),
                message: format!("Failed to parse job status: {}", e),
            })
    }
}
