use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlInputElement, HtmlSpanElement};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn update_size_label(input: &HtmlInputElement, value: &HtmlSpanElement) {
    value.set_text_content(Some(&input.value()));
}

pub fn set_tool_button(button: &web_sys::HtmlButtonElement, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
}

pub fn set_status(status_el: &Element, status_text: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_text.set_text_content(Some(text));
}

/// Shows or hides the inline generation error panel.
pub fn set_error_panel(panel: &web_sys::HtmlElement, message: Option<&str>) {
    match message {
        Some(message) => {
            panel.set_text_content(Some(message));
            let _ = panel.remove_attribute("hidden");
        }
        None => {
            panel.set_text_content(None);
            let _ = panel.set_attribute("hidden", "");
        }
    }
}

pub fn set_button_busy(button: &web_sys::HtmlButtonElement, busy: bool) {
    button.set_disabled(busy);
    let value = if busy { "true" } else { "false" };
    let _ = button.set_attribute("aria-busy", value);
}
