//! Utility helpers shared across the WASM frontend.

use wasm_bindgen::{JsCast, JsValue};

/// Best-effort human readable message for a rejected JS promise or thrown
/// value.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Path component of an absolute or root-relative URL, without query string
/// or fragment.
pub fn url_path(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(idx) => {
            let after_scheme = &url[idx + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => "/",
            }
        }
        None => url,
    };
    let end = rest.find(|c| c == '?' || c == '#').unwrap_or(rest.len());
    &rest[..end]
}
