//! Tiny toast helper.
//! Creates a `#toast-root` container once per page and appends toast divs that
//! fade out after a few seconds.

use gloo_timers::callback::Timeout;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::constants::{TOAST_FADE_MS, TOAST_VISIBLE_MS};
use crate::dom_utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    Success,
    Error,
    #[default]
    Info,
}

impl ToastKind {
    /// Variant names used by the JS pages; anything unknown is `Info`.
    pub fn from_variant(variant: &str) -> Self {
        match variant {
            "success" => ToastKind::Success,
            "error" => ToastKind::Error,
            _ => ToastKind::Info,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ToastKind::Success => "toast toast-success",
            ToastKind::Error => "toast toast-error",
            ToastKind::Info => "toast toast-info",
        }
    }
}

pub fn success(msg: &str) {
    show(msg, ToastKind::Success);
}

pub fn error(msg: &str) {
    show(msg, ToastKind::Error);
}

pub fn show(message: &str, kind: ToastKind) {
    let document = match web_sys::window().and_then(|w| w.document()) {
        Some(d) => d,
        None => return,
    };
    if let Err(e) = try_show(&document, message, kind) {
        log::warn!("failed to show toast: {:?}", e);
    }
}

fn try_show(document: &Document, message: &str, kind: ToastKind) -> Result<(), JsValue> {
    ensure_styles(document)?;
    let root = ensure_root(document)?;

    let toast = dom_utils::el(document, "div", kind.class_name(), Some(message))?;
    // Prepend so newest appears on top.
    root.prepend_with_node_1(&toast)?;

    // Fade, then detach once the transition has run.
    Timeout::new(TOAST_VISIBLE_MS, move || {
        let _ = toast.class_list().add_1("toast-leaving");
        Timeout::new(TOAST_FADE_MS, move || dom_utils::remove(&toast)).forget();
    })
    .forget();
    Ok(())
}

fn ensure_root(document: &Document) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id("toast-root") {
        return Ok(el);
    }
    let root = dom_utils::el(document, "div", "toast-root", None)?;
    root.set_id("toast-root");
    dom_utils::body(document)?.append_child(&root)?;
    Ok(root)
}

fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id("toast-styles").is_some() {
        return Ok(());
    }

    let css = "
.toast-root{position:fixed;bottom:16px;left:50%;transform:translateX(-50%);display:flex;flex-direction:column;gap:8px;z-index:50}
.toast{padding:12px 16px;border-radius:16px;color:#fff;box-shadow:0 4px 12px rgba(0,0,0,.15);max-width:90vw;opacity:0;animation:toast-in .3s ease-out forwards;transition:opacity .25s,transform .25s}
.toast-success{background:#059669}
.toast-error{background:#dc2626}
.toast-info{background:#0f172a}
.toast-leaving{opacity:0 !important;transform:translateY(8px)}
@keyframes toast-in{from{transform:translateY(8px)}to{opacity:1;transform:none}}
";

    let style = dom_utils::el(document, "style", "", Some(css))?;
    style.set_id("toast-styles");
    match document.query_selector("head")? {
        Some(head) => head.append_child(&style)?,
        None => dom_utils::body(document)?.append_child(&style)?,
    };
    Ok(())
}
