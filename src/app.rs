//! Page-side bootstrap exported to JS as `App`.
//!
//! Mirrors the surface the HTML pages already use: `apiBase`, `studentKey()`,
//! `apiFetch(path, options)`, `toast(message, variant)` and
//! `openModal(title, message)`.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::components::modal::{self, ModalOptions};
use crate::identity::{BrowserCryptoSource, IdentityProvider};
use crate::network::{
    ApiClient, ApiError, ClientConfig, EndpointResolver, FetchTransport, Method, PageLocation,
    RequestOptions,
};
use crate::storage::{KeyValueStore, LocalStorageStore};
use crate::toast::{self, ToastKind};

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// JS `Error` with `status` (undefined for network failures) and `data`
/// (parsed error body or null) properties.
fn api_error_to_js(err: &ApiError) -> JsValue {
    let js_err: JsValue = js_sys::Error::new(&err.to_string()).into();
    let status = err.status().map(JsValue::from).unwrap_or(JsValue::UNDEFINED);
    let data = err
        .data()
        .and_then(|payload| to_js(&payload.to_value()).ok())
        .unwrap_or(JsValue::NULL);
    let _ = js_sys::Reflect::set(&js_err, &"status".into(), &status);
    let _ = js_sys::Reflect::set(&js_err, &"data".into(), &data);
    js_err
}

fn field(options: &JsValue, name: &str) -> Result<JsValue, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(JsValue::UNDEFINED);
    }
    js_sys::Reflect::get(options, &name.into())
}

/// Read `{method, headers, body}` from a JS options object.  An explicit
/// `body: null` is sent as JSON `null`; only `undefined` means no body.
fn parse_fetch_options(options: &JsValue) -> Result<RequestOptions, JsValue> {
    let method = match field(options, "method")?.as_string() {
        Some(name) => Method::parse(&name).ok_or_else(|| {
            JsValue::from(js_sys::Error::new(&format!("unsupported method '{}'", name)))
        })?,
        None => Method::Get,
    };

    let headers_value = field(options, "headers")?;
    let headers: BTreeMap<String, String> = if headers_value.is_undefined() || headers_value.is_null() {
        BTreeMap::new()
    } else {
        serde_wasm_bindgen::from_value(headers_value)?
    };

    let body_value = field(options, "body")?;
    let body = if body_value.is_undefined() {
        None
    } else {
        Some(serde_wasm_bindgen::from_value::<Value>(body_value)?)
    };

    Ok(RequestOptions { method, headers: headers.into_iter().collect(), body })
}

#[wasm_bindgen]
pub struct App {
    client: Rc<ApiClient>,
    identity: Rc<IdentityProvider>,
}

#[wasm_bindgen]
impl App {
    /// Resolve the API base and wire the dispatcher to local storage and
    /// `fetch`.  Must run in a page (window) context.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<App, JsValue> {
        crate::logging::init_logging();

        let store: Rc<dyn KeyValueStore> = Rc::new(
            LocalStorageStore::from_window().map_err(|e| JsValue::from_str(&e.to_string()))?,
        );
        let location = PageLocation::from_window().unwrap_or_default();
        let config = ClientConfig::default();
        let api = EndpointResolver::new(&config).resolve_from_store(&location, &*store);

        let identity = Rc::new(IdentityProvider::new(store, Box::new(BrowserCryptoSource)));
        let client = ApiClient::new(api, config, identity.clone(), Rc::new(FetchTransport));

        Ok(App { client: Rc::new(client), identity })
    }

    #[wasm_bindgen(getter, js_name = apiBase)]
    pub fn api_base(&self) -> String {
        self.client.api_config().base_url().to_string()
    }

    #[wasm_bindgen(js_name = studentKey)]
    pub fn student_key(&self) -> String {
        self.identity.student_key()
    }

    /// Promise resolving to the normalized body, rejecting with an `Error`
    /// that carries `status` and `data`.
    #[wasm_bindgen(js_name = apiFetch)]
    pub fn api_fetch(&self, path: String, options: JsValue) -> js_sys::Promise {
        let client = self.client.clone();
        future_to_promise(async move {
            let options = parse_fetch_options(&options)?;
            match client.request(&path, options).await {
                Ok(payload) => to_js(&payload.to_value()),
                Err(err) => Err(api_error_to_js(&err)),
            }
        })
    }

    pub fn toast(&self, message: &str, variant: Option<String>) {
        toast::show(message, variant.as_deref().map(ToastKind::from_variant).unwrap_or_default());
    }

    #[wasm_bindgen(js_name = openModal)]
    pub fn open_modal(&self, title: Option<String>, message: Option<String>) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        modal::open_modal(&document, &ModalOptions::new(title.as_deref(), message.as_deref()))?;
        Ok(())
    }
}
