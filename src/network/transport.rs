//! Single-attempt HTTP transport.
//!
//! [`FetchTransport`] drives the platform `fetch` from either a window or a
//! worker global scope.  There is no timeout and no retry: one call, one
//! network attempt.

use async_trait::async_trait;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::utils::js_error_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Parse a method name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self { status, body: body.to_string() }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<JsValue> for TransportError {
    fn from(value: JsValue) -> Self {
        TransportError(js_error_message(&value))
    }
}

#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `fetch()` of the current global scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchTransport;

impl FetchTransport {
    fn build_request(request: &HttpRequest) -> Result<Request, JsValue> {
        let opts = RequestInit::new();
        opts.set_method(request.method.as_str());
        opts.set_mode(RequestMode::Cors);

        let headers = Headers::new()?;
        for (name, value) in &request.headers {
            headers.set(name, value)?;
        }
        opts.set_headers(&headers);

        if let Some(body) = &request.body {
            opts.set_body(&JsValue::from_str(body));
        }

        Request::new_with_str_and_init(&request.url, &opts)
    }

    fn fetch(request: &Request) -> Result<js_sys::Promise, JsValue> {
        let global = js_sys::global();
        if let Some(window) = global.dyn_ref::<web_sys::Window>() {
            return Ok(window.fetch_with_request(request));
        }
        if let Some(worker) = global.dyn_ref::<web_sys::WorkerGlobalScope>() {
            return Ok(worker.fetch_with_request(request));
        }
        Err(JsValue::from_str("no fetch-capable global scope"))
    }
}

#[async_trait(?Send)]
impl HttpTransport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let js_request = Self::build_request(&request)?;
        let resp_value = JsFuture::from(Self::fetch(&js_request)?).await?;
        let resp: Response = resp_value.dyn_into()?;

        let status = resp.status();
        let text = JsFuture::from(resp.text()?).await?;
        Ok(HttpResponse { status, body: text.as_string().unwrap_or_default() })
    }
}
