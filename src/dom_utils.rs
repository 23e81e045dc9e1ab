//! dom_utils.rs – thin helper layer for the few DOM operations the feedback
//! surface needs.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

/// Create `<tag class="…">` with optional text content.
pub fn el(document: &Document, tag: &str, class: &str, text: Option<&str>) -> Result<Element, JsValue> {
    let node = document.create_element(tag)?;
    if !class.is_empty() {
        node.set_class_name(class);
    }
    if let Some(text) = text {
        node.set_text_content(Some(text));
    }
    Ok(node)
}

/// Detach an element from its parent, if it still has one.
pub fn remove(el: &Element) {
    if let Some(parent) = el.parent_node() {
        let _ = parent.remove_child(el);
    }
}

/// `document.body`, as an error when missing so callers can `?` it.
pub fn body(document: &Document) -> Result<HtmlElement, JsValue> {
    document.body().ok_or_else(|| JsValue::from_str("document has no <body>"))
}

/// Focus the first enabled button within the given container.
/// Returns true if an element was focused, false otherwise.
pub fn focus_first_button(container: &Element) -> bool {
    if let Ok(Some(element)) = container.query_selector("button:not([disabled])") {
        if let Ok(html_element) = element.dyn_into::<HtmlElement>() {
            let _ = html_element.focus();
            return true;
        }
    }
    false
}

/// Store the currently focused element for later restoration.
pub fn store_active_element(document: &Document) -> Option<HtmlElement> {
    document.active_element()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

/// Restore focus to a previously stored element.
pub fn restore_focus(element: Option<HtmlElement>) {
    if let Some(el) = element {
        let _ = el.focus();
    }
}
