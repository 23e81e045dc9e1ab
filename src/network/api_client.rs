use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::config::{ApiConfig, ClientConfig};
use super::response::{ApiError, ApiResult, Payload};
use super::transport::{HttpRequest, HttpTransport, Method};
use crate::identity::IdentitySource;
use crate::models::{
    PushSubscriptionKeys, PushSubscriptionRecord, Suggestion, SuggestionCreate, SuggestionUpdate,
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Per-call options: method (GET by default), extra headers and an optional
/// JSON body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    /// Options carrying `body` serialized to JSON.
    pub fn json<T: Serialize>(method: Method, body: &T) -> ApiResult<Self> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Invalid(e.to_string()))?;
        Ok(Self { method, headers: Vec::new(), body: Some(body) })
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Insert or replace a header; names compare case-insensitively.
fn upsert_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
        Some(entry) => *entry = (name.to_string(), value.to_string()),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

/// JSON-over-HTTP request dispatcher.
///
/// Every call is exactly one network attempt.  Calls share no state beyond
/// the injected capabilities, so concurrent requests are independent.
pub struct ApiClient {
    api: ApiConfig,
    config: ClientConfig,
    identity: Rc<dyn IdentitySource>,
    transport: Rc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(
        api: ApiConfig,
        config: ClientConfig,
        identity: Rc<dyn IdentitySource>,
        transport: Rc<dyn HttpTransport>,
    ) -> Self {
        Self { api, config, identity, transport }
    }

    pub fn api_config(&self) -> &ApiConfig {
        &self.api
    }

    /// Assemble the outgoing request.  Caller headers override the default
    /// content type; the student key is added last for allow-listed paths.
    pub fn build_request(&self, path: &str, options: RequestOptions) -> HttpRequest {
        let mut headers = vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())];
        for (name, value) in &options.headers {
            upsert_header(&mut headers, name, value);
        }

        if self.config.requires_identity(path) {
            let key = self.identity.identity();
            upsert_header(&mut headers, &self.config.identity_header, &key);
        }

        HttpRequest {
            method: options.method,
            url: self.api.url(path),
            headers,
            body: options.body.map(|body| body.to_string()),
        }
    }

    /// Issue one request and normalize the outcome.
    ///
    /// 2xx resolves to the normalized body (empty → [`Payload::Empty`],
    /// non-JSON → [`Payload::Raw`]).  Anything else is an [`ApiError::Http`]
    /// carrying the status and parsed body; a transport rejection is an
    /// [`ApiError::Network`].
    pub async fn request(&self, path: &str, options: RequestOptions) -> ApiResult<Payload> {
        let request = self.build_request(path, options);
        log::debug!("{} {}", request.method, request.url);

        let method = request.method;
        let response = self.transport.send(request).await.map_err(|e| {
            log::warn!("{} {} failed before a response: {}", method, path, e);
            ApiError::Network(e.to_string())
        })?;

        let payload = Payload::from_text(&response.body);
        if !response.ok() {
            let err = ApiError::from_status(response.status, payload);
            log::warn!("{} {} -> {}: {}", method, path, response.status, err);
            return Err(err);
        }
        Ok(payload)
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(path, options).await?.decode()
    }

    // ---------------- Typed routes ----------------

    pub async fn health(&self) -> ApiResult<Payload> {
        self.request("/health", RequestOptions::default()).await
    }

    pub async fn create_suggestion(&self, suggestion: &SuggestionCreate) -> ApiResult<Suggestion> {
        let suggestion = suggestion.validated()?;
        let options = RequestOptions::json(Method::Post, &suggestion)?;
        self.request_json("/suggestions", options).await
    }

    /// The caller's suggestions, newest first.  With `since_answered_at`
    /// only suggestions answered after that instant are returned.
    pub async fn list_my_suggestions(
        &self,
        since_answered_at: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<Suggestion>> {
        let path = match since_answered_at {
            Some(ts) => format!(
                "/me/suggestions?since_answered_at={}",
                ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            ),
            None => "/me/suggestions".to_string(),
        };
        self.request_json(&path, RequestOptions::default()).await
    }

    /// Edit a pending suggestion.  The backend answers 409 once it has been
    /// answered.
    pub async fn update_my_suggestion(&self, id: u64, update: &SuggestionUpdate) -> ApiResult<Suggestion> {
        let update = update.validated()?;
        let options = RequestOptions::json(Method::Patch, &update)?;
        self.request_json(&format!("/me/suggestions/{}", id), options).await
    }

    pub async fn delete_my_suggestion(&self, id: u64) -> ApiResult<()> {
        self.request(&format!("/me/suggestions/{}", id), RequestOptions::new(Method::Delete))
            .await?;
        Ok(())
    }

    /// Register this device's push subscription, replacing any previous one.
    pub async fn subscribe_push(&self, keys: &PushSubscriptionKeys) -> ApiResult<PushSubscriptionRecord> {
        let options = RequestOptions::json(Method::Post, keys)?;
        self.request_json("/push/subscribe", options).await
    }

    pub async fn unsubscribe_push(&self) -> ApiResult<()> {
        self.request("/push/unsubscribe", RequestOptions::new(Method::Delete)).await?;
        Ok(())
    }
}
