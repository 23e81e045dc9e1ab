//! Blocking confirmation modal.
//!
//! One overlay per call; the confirm button or a click on the backdrop
//! removes it and hands focus back to whatever had it before.

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, MouseEvent};

use crate::constants::{DEFAULT_MODAL_TITLE, MODAL_CONFIRM_LABEL, MODAL_SUBTITLE};
use crate::dom_utils;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOptions {
    pub title: String,
    pub message: String,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self { title: DEFAULT_MODAL_TITLE.to_string(), message: String::new() }
    }
}

impl ModalOptions {
    /// Missing or empty title falls back to the default heading.
    pub fn new(title: Option<&str>, message: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            title: title.filter(|t| !t.is_empty()).map(str::to_string).unwrap_or(defaults.title),
            message: message.map(str::to_string).unwrap_or(defaults.message),
        }
    }
}

/// Build the modal and attach it to `<body>`.  Returns the overlay element.
pub fn open_modal(document: &Document, options: &ModalOptions) -> Result<Element, JsValue> {
    ensure_styles(document)?;
    let previous_focus = dom_utils::store_active_element(document);

    let overlay = dom_utils::el(document, "div", "modal-overlay", None)?;
    let card = dom_utils::el(document, "div", "modal-card", None)?;

    let head = dom_utils::el(document, "div", "modal-head", None)?;
    let title = dom_utils::el(document, "div", "modal-title", Some(&options.title))?;
    let subtitle = dom_utils::el(document, "div", "modal-subtitle", Some(MODAL_SUBTITLE))?;
    head.append_child(&title)?;
    head.append_child(&subtitle)?;

    let body = dom_utils::el(document, "div", "modal-body", Some(&options.message))?;

    let foot = dom_utils::el(document, "div", "modal-foot", None)?;
    let confirm = dom_utils::el(document, "button", "modal-confirm", Some(MODAL_CONFIRM_LABEL))?;
    foot.append_child(&confirm)?;

    card.append_child(&head)?;
    card.append_child(&body)?;
    card.append_child(&foot)?;
    overlay.append_child(&card)?;

    // Confirm button -------------------------------------------------------
    {
        let overlay = overlay.clone();
        let previous_focus = previous_focus.clone();
        let on_confirm = Closure::wrap(Box::new(move |_: MouseEvent| {
            dom_utils::remove(&overlay);
            dom_utils::restore_focus(previous_focus.clone());
        }) as Box<dyn FnMut(_)>);
        confirm.add_event_listener_with_callback("click", on_confirm.as_ref().unchecked_ref())?;
        on_confirm.forget();
    }

    // Backdrop click (but not clicks inside the card) ------------------------
    {
        let target_overlay = overlay.clone();
        let on_backdrop = Closure::wrap(Box::new(move |event: MouseEvent| {
            let is_backdrop = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .map_or(false, |t| t == target_overlay);
            if is_backdrop {
                dom_utils::remove(&target_overlay);
                dom_utils::restore_focus(previous_focus.clone());
            }
        }) as Box<dyn FnMut(_)>);
        overlay.add_event_listener_with_callback("click", on_backdrop.as_ref().unchecked_ref())?;
        on_backdrop.forget();
    }

    dom_utils::body(document)?.append_child(&overlay)?;
    dom_utils::focus_first_button(&overlay);
    Ok(overlay)
}

fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id("modal-styles").is_some() {
        return Ok(());
    }

    let css = "
.modal-overlay{position:fixed;inset:0;z-index:50;background:rgba(2,6,23,.4);backdrop-filter:blur(4px);display:flex;align-items:center;justify-content:center;padding:16px}
.modal-card{width:100%;max-width:28rem;border-radius:24px;background:#fff;box-shadow:0 20px 40px rgba(0,0,0,.2);overflow:hidden}
.modal-head{padding:20px 24px;border-bottom:1px solid #f1f5f9}
.modal-title{font-weight:600;color:#0f172a}
.modal-subtitle{font-size:14px;color:#64748b;margin-top:4px}
.modal-body{padding:20px 24px;font-size:14px;color:#334155;line-height:1.6}
.modal-foot{padding:20px 24px;background:#f8fafc;display:flex;justify-content:flex-end;gap:8px}
.modal-confirm{padding:8px 16px;border-radius:16px;background:#0f172a;color:#fff;font-size:14px;border:0;cursor:pointer}
";

    let style = dom_utils::el(document, "style", "", Some(css))?;
    style.set_id("modal-styles");
    match document.query_selector("head")? {
        Some(head) => head.append_child(&style)?,
        None => dom_utils::body(document)?.append_child(&style)?,
    };
    Ok(())
}
