//! Request dispatcher: every call to the Ideas service goes through here.
//!
//! Responsibilities:
//! - attach the bearer token from the auth provider (if there is one)
//! - fail fast when the backend URL was never configured
//! - classify failures into [`ApiError`] kinds
//! - hand back the raw JSON body on success; callers interpret its shape

use std::path::Path;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::api_types::ApiErrorBody;
use crate::auth::AuthProvider;
use crate::config::PLACEHOLDER_BASE_URL;
use crate::error::{ApiError, ApiResult};

/// File contents to send as one multipart field.
#[derive(Debug, Clone)]
pub struct UploadFile {
  pub file_name: String,
  pub bytes: Vec<u8>,
}

impl UploadFile {
  pub async fn from_path(path: &Path) -> std::io::Result<Self> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());
    Ok(Self { file_name, bytes })
  }
}

/// Authenticated JSON-over-HTTP dispatcher.
///
/// Never retries. Retry decisions belong to whoever drives the UI.
#[derive(Clone)]
pub struct Dispatcher {
  http: reqwest::Client,
  base_url: String,
  auth: Arc<dyn AuthProvider>,
}

impl Dispatcher {
  pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthProvider>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into(),
      auth,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Send a JSON request and return the parsed response body.
  ///
  /// Empty 2xx bodies (e.g. 204 on delete) come back as `Value::Null`.
  pub async fn request(
    &self,
    endpoint: &str,
    method: Method,
    body: Option<&Value>,
  ) -> ApiResult<Value> {
    self.ensure_configured()?;

    let url = self.url_for(endpoint);
    debug!(%method, %url, "dispatching request");

    let mut builder = self
      .http
      .request(method, &url)
      .header(CONTENT_TYPE, "application/json");
    builder = self.authorize(builder);
    if let Some(body) = body {
      builder = builder.json(body);
    }

    let response = builder.send().await?;
    self.classify(response).await
  }

  /// POST a single file as multipart form data.
  ///
  /// Same auth and error contract as [`Dispatcher::request`]; the content
  /// type (with boundary) is left to the form encoder.
  pub async fn upload_file(
    &self,
    endpoint: &str,
    file: UploadFile,
    field_name: &str,
  ) -> ApiResult<Value> {
    self.ensure_configured()?;

    let url = self.url_for(endpoint);
    debug!(%url, field_name, size = file.bytes.len(), "uploading file");

    let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
    let form = reqwest::multipart::Form::new().part(field_name.to_string(), part);

    let builder = self.authorize(self.http.post(&url)).multipart(form);
    let response = builder.send().await?;
    self.classify(response).await
  }

  fn url_for(&self, endpoint: &str) -> String {
    format!(
      "{}/{}",
      self.base_url.trim_end_matches('/'),
      endpoint.trim_start_matches('/')
    )
  }

  fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
    match self.auth.access_token() {
      Some(token) => builder.header(AUTHORIZATION, format!("Bearer {}", token)),
      None => {
        debug!("no session token available; sending request without Authorization");
        builder
      }
    }
  }

  /// Reject unset or placeholder base URLs before touching the network.
  fn ensure_configured(&self) -> ApiResult<()> {
    let raw = self.base_url.trim();
    if raw.is_empty() {
      return Err(ApiError::Configuration("API base URL is empty".to_string()));
    }

    let url = Url::parse(raw)
      .map_err(|e| ApiError::Configuration(format!("invalid API base URL '{}': {}", raw, e)))?;

    let placeholder_host = Url::parse(PLACEHOLDER_BASE_URL)
      .ok()
      .and_then(|u| u.host_str().map(String::from));
    let host = url.host_str().unwrap_or_default();
    if host.is_empty() || placeholder_host.as_deref() == Some(host) {
      return Err(ApiError::Configuration(format!(
        "API base URL still points at '{}'; set api.base_url or IDEAS_API_URL",
        raw
      )));
    }

    Ok(())
  }

  async fn classify(&self, response: Response) -> ApiResult<Value> {
    let status = response.status();

    if status.is_success() {
      let bytes = response.bytes().await?;
      if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
      }
      return serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ApiErrorBody>(&text) {
      Ok(body) => (body.message, body.code),
      Err(_) => (
        format!(
          "HTTP {}: {}",
          status.as_u16(),
          status.canonical_reason().unwrap_or("Unknown Status")
        ),
        None,
      ),
    };

    if status == StatusCode::UNAUTHORIZED && is_auth_message(&message) {
      warn!(%message, "server rejected session token; invalidating");
      self.auth.invalidate_token();
      return Err(ApiError::SessionExpired);
    }

    Err(ApiError::Request {
      status: status.as_u16(),
      message,
      code,
    })
  }
}

/// Whether a 401 message points at the session token. Case-insensitive.
fn is_auth_message(message: &str) -> bool {
  let lower = message.to_lowercase();
  lower.contains("token") || lower.contains("auth")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::StaticTokenProvider;
  use crate::testing::CountingAuth;
  use serde_json::json;
  use wiremock::matchers::{body_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn dispatcher(server: &MockServer, token: Option<&str>) -> (Dispatcher, Arc<CountingAuth>) {
    let auth = Arc::new(CountingAuth::new(token));
    (Dispatcher::new(server.uri(), auth.clone()), auth)
  }

  #[tokio::test]
  async fn test_attaches_bearer_token_and_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ideas"))
      .and(header("Authorization", "Bearer secret"))
      .and(header("Content-Type", "application/json"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let (dispatcher, _) = dispatcher(&server, Some("secret"));
    let value = dispatcher.request("/ideas", Method::GET, None).await.unwrap();
    assert_eq!(value, json!([]));
  }

  #[tokio::test]
  async fn test_missing_token_sends_anonymous_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ideas"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let (dispatcher, _) = dispatcher(&server, None);
    dispatcher.request("/ideas", Method::GET, None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
  }

  #[tokio::test]
  async fn test_body_is_sent_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/search/semantic"))
      .and(body_json(json!({ "query": "milk" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
      .expect(1)
      .mount(&server)
      .await;

    let (dispatcher, _) = dispatcher(&server, Some("t"));
    let value = dispatcher
      .request(
        "search/semantic",
        Method::POST,
        Some(&json!({ "query": "milk" })),
      )
      .await
      .unwrap();
    assert_eq!(value, json!({ "results": [] }));
  }

  #[tokio::test]
  async fn test_placeholder_base_url_is_configuration_error() {
    let auth = Arc::new(StaticTokenProvider::new(Some("t".to_string())));
    let dispatcher = Dispatcher::new(PLACEHOLDER_BASE_URL, auth);

    let err = dispatcher
      .request("/ideas", Method::GET, None)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Configuration(_)));
  }

  #[tokio::test]
  async fn test_empty_base_url_is_configuration_error() {
    let auth = Arc::new(StaticTokenProvider::new(None));
    let dispatcher = Dispatcher::new("  ", auth);

    let err = dispatcher
      .upload_file(
        "/ideas/audio",
        UploadFile {
          file_name: "a.m4a".to_string(),
          bytes: vec![1, 2, 3],
        },
        "audio",
      )
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Configuration(_)));
  }

  #[tokio::test]
  async fn test_empty_success_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/ideas/7"))
      .respond_with(ResponseTemplate::new(204))
      .mount(&server)
      .await;

    let (dispatcher, _) = dispatcher(&server, Some("t"));
    let value = dispatcher
      .request("/ideas/7", Method::DELETE, None)
      .await
      .unwrap();
    assert_eq!(value, Value::Null);
  }

  #[tokio::test]
  async fn test_error_body_message_and_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ideas"))
      .respond_with(
        ResponseTemplate::new(422)
          .set_body_json(json!({ "message": "transcript required", "code": "VALIDATION" })),
      )
      .mount(&server)
      .await;

    let (dispatcher, auth) = dispatcher(&server, Some("t"));
    let err = dispatcher
      .request("/ideas", Method::POST, Some(&json!({})))
      .await
      .unwrap_err();

    assert_eq!(
      err,
      ApiError::Request {
        status: 422,
        message: "transcript required".to_string(),
        code: Some("VALIDATION".to_string()),
      }
    );
    assert_eq!(auth.invalidations(), 0);
  }

  #[tokio::test]
  async fn test_non_json_error_body_synthesizes_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/user/stats"))
      .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
      .mount(&server)
      .await;

    let (dispatcher, _) = dispatcher(&server, Some("t"));
    let err = dispatcher
      .request("/user/stats", Method::GET, None)
      .await
      .unwrap_err();

    assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    assert_eq!(err.status(), Some(500));
  }

  #[tokio::test]
  async fn test_401_with_auth_message_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ideas"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(json!({ "message": "invalid auth token" })),
      )
      .mount(&server)
      .await;

    let (dispatcher, auth) = dispatcher(&server, Some("stale"));
    let err = dispatcher
      .request("/ideas", Method::GET, None)
      .await
      .unwrap_err();

    assert_eq!(err, ApiError::SessionExpired);
    assert_eq!(err.to_string(), "Session expired. Please sign in again.");
    assert_eq!(auth.invalidations(), 1);
  }

  #[tokio::test]
  async fn test_401_without_auth_message_is_plain_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ideas"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(json!({ "message": "plan expired" })),
      )
      .mount(&server)
      .await;

    let (dispatcher, auth) = dispatcher(&server, Some("t"));
    let err = dispatcher
      .request("/ideas", Method::GET, None)
      .await
      .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "plan expired");
    assert_eq!(auth.invalidations(), 0);
  }

  #[tokio::test]
  async fn test_401_with_non_json_body_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ideas"))
      .respond_with(ResponseTemplate::new(401).set_body_string("<html>denied</html>"))
      .mount(&server)
      .await;

    let (dispatcher, auth) = dispatcher(&server, Some("stale"));
    let err = dispatcher
      .request("/ideas", Method::GET, None)
      .await
      .unwrap_err();

    // Synthesized "HTTP 401: Unauthorized" carries "auth"
    assert_eq!(err, ApiError::SessionExpired);
    assert_eq!(auth.invalidations(), 1);
  }

  #[tokio::test]
  async fn test_auth_message_match_ignores_case() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ideas"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad TOKEN" })))
      .mount(&server)
      .await;

    let (dispatcher, auth) = dispatcher(&server, Some("stale"));
    let err = dispatcher
      .request("/ideas", Method::GET, None)
      .await
      .unwrap_err();

    assert_eq!(err, ApiError::SessionExpired);
    assert_eq!(auth.invalidations(), 1);
  }

  #[tokio::test]
  async fn test_transport_failure_is_network_error() {
    // Nothing listens on port 1
    let auth = Arc::new(CountingAuth::new(Some("t")));
    let dispatcher = Dispatcher::new("http://127.0.0.1:1", auth);

    let err = dispatcher
      .request("/ideas", Method::GET, None)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
  }

  #[tokio::test]
  async fn test_invalid_json_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/ideas"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let (dispatcher, _) = dispatcher(&server, None);
    let err = dispatcher
      .request("/ideas", Method::GET, None)
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
  }

  #[tokio::test]
  async fn test_upload_sends_multipart_with_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ideas/audio"))
      .and(header("Authorization", "Bearer t"))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "ok": true })))
      .expect(1)
      .mount(&server)
      .await;

    let (dispatcher, _) = dispatcher(&server, Some("t"));
    let value = dispatcher
      .upload_file(
        "/ideas/audio",
        UploadFile {
          file_name: "memo.m4a".to_string(),
          bytes: b"fake-audio".to_vec(),
        },
        "audio",
      )
      .await
      .unwrap();
    assert_eq!(value, json!({ "ok": true }));

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
      .headers
      .get("content-type")
      .and_then(|v| v.to_str().ok())
      .unwrap_or_default()
      .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"audio\""));
    assert!(body.contains("filename=\"memo.m4a\""));
  }

  #[test]
  fn test_auth_message_detection() {
    assert!(is_auth_message("invalid auth token"));
    assert!(is_auth_message("Token expired"));
    assert!(is_auth_message("Unauthorized"));
    assert!(is_auth_message("HTTP 401: Unauthorized"));
    assert!(!is_auth_message("plan expired"));
  }
}
