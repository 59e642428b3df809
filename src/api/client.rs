use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use super::types::{CreateVideoRequest, Job};
use crate::session::Session;

/// Typed surface of the pipeline backend consumed by the rest of the client.
///
/// `ApiClient` is the real implementation; tests substitute mocks.
#[async_trait]
pub trait QueueApi: Send + Sync {
    async fn fetch_queue(&self) -> Result<Vec<Job>, ApiError>;
    async fn get_video(&self, id: &str) -> Result<Job, ApiError>;
    async fn retry_video(&self, id: &str) -> Result<Job, ApiError>;
    async fn delete_video(&self, id: &str) -> Result<(), ApiError>;
    async fn create_video(&self, req: &CreateVideoRequest) -> Result<Job, ApiError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client for the given base URL (no trailing slash).
    pub fn new(base_url: String, session: Arc<Session>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url,
            session,
        }
    }

    /// Issue an authenticated request and return the decoded JSON body.
    ///
    /// Fails with [`ApiError::Unauthenticated`] before issuing anything when
    /// no credential is installed. A 401 response clears the session (the
    /// forced sign-out) — the only side effect of this layer. Auxiliary
    /// endpoints (`/frames/*`, `/research/*`) are consumed through this
    /// method directly, without a typed wrapper.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let Some(token) = self.session.token() else {
            return Err(ApiError::Unauthenticated);
        };

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.clear();
            return Err(ApiError::Unauthenticated);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl QueueApi for ApiClient {
    async fn fetch_queue(&self) -> Result<Vec<Job>, ApiError> {
        let body = self.send(Method::GET, "/queue", None).await?;
        Self::decode(body)
    }

    async fn get_video(&self, id: &str) -> Result<Job, ApiError> {
        let body = self.send(Method::GET, &format!("/videos/{id}"), None).await?;
        Self::decode(body)
    }

    async fn retry_video(&self, id: &str) -> Result<Job, ApiError> {
        let body = self
            .send(Method::POST, &format!("/videos/{id}/retry"), None)
            .await?;
        Self::decode(body)
    }

    async fn delete_video(&self, id: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, &format!("/videos/{id}"), None)
            .await?;
        Ok(())
    }

    async fn create_video(&self, req: &CreateVideoRequest) -> Result<Job, ApiError> {
        let payload = serde_json::to_value(req).map_err(|e| ApiError::Decode(e.to_string()))?;
        let body = self.send(Method::POST, "/videos", Some(&payload)).await?;
        Self::decode(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authed_session() -> Arc<Session> {
        let session = Arc::new(Session::new());
        session.init("secret-token".into());
        session
    }

    #[tokio::test]
    async fn fetch_queue_decodes_job_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/queue"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "j1", "status": "QUEUED", "updatedAt": "2026-07-01T10:00:00Z"},
                {"id": "j2", "status": "FAILED", "updatedAt": "2026-07-01T11:00:00Z",
                 "error": "upload rejected"}
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), authed_session());
        let jobs = client.fetch_queue().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "j1");
        assert_eq!(jobs[1].error.as_deref(), Some("upload rejected"));
    }

    #[tokio::test]
    async fn missing_credential_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/queue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), Arc::new(Session::new()));
        let result = client.fetch_queue().await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[tokio::test]
    async fn rejected_credential_clears_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/queue"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let session = authed_session();
        let client = ApiClient::new(server.uri(), Arc::clone(&session));
        let result = client.fetch_queue().await;

        assert!(matches!(result, Err(ApiError::Unauthenticated)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn non_2xx_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/videos/j9/retry"))
            .respond_with(ResponseTemplate::new(500).set_body_string("worker pool exhausted"))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), authed_session());
        let result = client.retry_video("j9").await;
        match result {
            Err(ApiError::Http { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "worker pool exhausted");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/queue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "an array"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), authed_session());
        let result = client.fetch_queue().await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/videos/j3"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), authed_session());
        assert!(client.delete_video("j3").await.is_ok());
    }

    #[tokio::test]
    async fn create_video_posts_wizard_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!(
                {"id": "new-1", "status": "QUEUED", "updatedAt": "2026-07-02T08:00:00Z",
                 "title": "Weekly recap"}
            )))
            .mount(&server)
            .await;

        let req = CreateVideoRequest {
            source_url: "https://videos.example/raw/7".into(),
            clip_start_secs: 0,
            clip_end_secs: 30,
            frame_count: 3,
            research_topic: None,
            title: "Weekly recap".into(),
            description: String::new(),
            tags: vec![],
            visibility: "public".into(),
            scheduled_at: None,
        };
        let client = ApiClient::new(server.uri(), authed_session());
        let job = client.create_video(&req).await.unwrap();
        assert_eq!(job.id, "new-1");
        assert_eq!(job.title.as_deref(), Some("Weekly recap"));
    }

    #[tokio::test]
    async fn raw_send_reaches_auxiliary_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/research/preview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 3})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), authed_session());
        let body = client
            .send(Method::POST, "/research/preview", Some(&json!({"topic": "rust"})))
            .await
            .unwrap();
        assert_eq!(body["hits"], 3);
    }
}
