//! REST transport.
//!
//! [`Remote`] is the seam between the data layer and HTTP; [`HttpRemote`] is
//! the reqwest implementation that applies the bearer-header contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RemoteError;
use crate::session::Session;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// A request relative to the API base (`users`, `formations/3/participants`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, RemoteError> {
        let value = serde_json::to_value(body)
            .map_err(|e| RemoteError::Decode(format!("failed to encode request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

#[async_trait]
pub trait Remote: Send + Sync {
    /// Execute a request. A successful answer without a body yields `Null`.
    async fn send(&self, request: ApiRequest) -> Result<Value, RemoteError>;
}

/// Decode a JSON answer into a typed value.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RemoteError> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Send a request and decode its answer.
pub async fn fetch<T: DeserializeOwned>(remote: &dyn Remote, request: ApiRequest) -> Result<T, RemoteError> {
    let value = remote.send(request).await?;
    decode(value)
}

/// Bearer-header contract: everything under `/api/` except `/api/auth/*`.
pub fn requires_bearer(url_path: &str) -> bool {
    url_path.starts_with("/api/") && !url_path.starts_with("/api/auth/")
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
    session: Session,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration, session: Session) -> Result<Self, RemoteError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| RemoteError::Config(format!("invalid API base URL '{base_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url,
            client,
            session,
        })
    }

    fn url_for(&self, path: &str) -> Result<reqwest::Url, RemoteError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        reqwest::Url::parse(&raw).map_err(|e| RemoteError::Config(format!("invalid URL '{raw}': {e}")))
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn send(&self, request: ApiRequest) -> Result<Value, RemoteError> {
        let url = self.url_for(&request.path)?;
        let attach_token = requires_bearer(url.path());

        let mut req = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
            Method::Put => self.client.put(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
        };

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        if attach_token {
            if let Some(token) = self.session.token() {
                req = req.bearer_auth(token);
            }
        }

        tracing::debug!(method = %request.method, url = %url, "sending API request");

        let resp = req.send().await.map_err(|e| RemoteError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| e.to_string());
        interpret_response(status, body)
    }
}

/// Turn a status and a (possibly unreadable) body into the call's result.
///
/// The status decides the class; a body that cannot be read never turns a
/// rejection or a success into a transport failure.
fn interpret_response(status: u16, body: Result<String, String>) -> Result<Value, RemoteError> {
    if !(200..300).contains(&status) {
        let message = match body {
            Ok(text) => error_message(&text),
            Err(err) => {
                tracing::debug!(status, error = %err, "failed to read error body");
                String::new()
            }
        };
        return Err(RemoteError::from_status(status, message));
    }

    let text = body.map_err(|e| RemoteError::Decode(format!("failed to read response body: {e}")))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Pull a human-readable message out of an error body (`{"message": ...}`
/// or `{"error": ...}`), falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}
