//! WASM browser tests for the format-toolbar-js bindings.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use web_sys::{Event, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

use format_toolbar_js::{FormatToolbar, JsFormatState, ToolbarOptions};

fn mount(html: &str) -> HtmlElement {
    let element: HtmlElement = gloo_utils::document()
        .create_element("div")
        .unwrap()
        .dyn_into()
        .unwrap();
    element.set_attribute("contenteditable", "true").unwrap();
    element.set_inner_html(html);
    gloo_utils::body().append_child(&element).unwrap();
    element
}

fn select_text(element: &HtmlElement, start: u32, end: u32) {
    let document = gloo_utils::document();
    let text = element.first_child().unwrap();
    let range = document.create_range().unwrap();
    range.set_start(&text, start).unwrap();
    range.set_end(&text, end).unwrap();
    let selection = document.get_selection().unwrap().unwrap();
    selection.remove_all_ranges().unwrap();
    selection.add_range(&range).unwrap();
}

fn synchronous_toolbar(element: &HtmlElement) -> FormatToolbar {
    let options = ToolbarOptions {
        focus_settle_delay_ms: Some(0),
        ..Default::default()
    };
    let options = serde_wasm_bindgen::to_value(&options).unwrap();
    FormatToolbar::new(element.clone(), options)
        .unwrap_or_else(|_| panic!("toolbar should bind to a mounted element"))
}

#[wasm_bindgen_test]
fn test_supported_formats_and_unknown_id() {
    let element = mount("hello");
    select_text(&element, 0, 5);
    let toolbar = synchronous_toolbar(&element);

    assert_eq!(
        FormatToolbar::supported_formats(),
        vec!["bold".to_string(), "italic".to_string(), "underline".to_string()]
    );
    assert!(!toolbar.apply_format("strike"));
    assert_eq!(toolbar.get_formatted_content(), "hello");

    toolbar.destroy();
    element.remove();
}

#[wasm_bindgen_test]
fn test_reshown_popup_runs_each_click_once() {
    let element = mount("hello");
    select_text(&element, 5, 5);
    let toolbar = synchronous_toolbar(&element);
    let popup = mount(r#"<button data-format="clear">x</button>"#);
    let button: HtmlElement = popup.first_element_child().unwrap().dyn_into().unwrap();

    let calls = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&calls);
    let on_change = Closure::<dyn FnMut(JsValue)>::new(move |_change: JsValue| {
        counter.set(counter.get() + 1)
    });
    toolbar.on_change(Some(on_change.as_ref().unchecked_ref::<js_sys::Function>().clone()));
    let on_outside = js_sys::Function::new_no_args("");

    toolbar.show_popup(popup.clone().into(), on_outside.clone());
    toolbar.show_popup(popup.clone().into(), on_outside);

    // Clearing at a plain caret succeeds without touching the document.
    button.click();
    assert_eq!(calls.get(), 1);
    assert_eq!(toolbar.get_active_formats(), JsFormatState::default());
    assert!(!toolbar.get_continuous_formatting());

    toolbar.hide_popup();
    button.click();
    assert_eq!(calls.get(), 1);

    toolbar.destroy();
    popup.remove();
    element.remove();
}

#[wasm_bindgen_test]
fn test_handlers_can_query_during_a_command() {
    let element = mount("hello");
    select_text(&element, 0, 5);
    let toolbar = Rc::new(synchronous_toolbar(&element));
    let seen = Rc::new(RefCell::new(Vec::<String>::new()));

    let handler_toolbar = Rc::clone(&toolbar);
    let handler_seen = Rc::clone(&seen);
    let handler = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
        handler_seen
            .borrow_mut()
            .push(handler_toolbar.get_formatted_content());
        let _ = handler_toolbar.get_active_formats();
        let _ = handler_toolbar.update_formats_from_selection();
        let _ = handler_toolbar.get_continuous_formatting();
    });
    for event in ["input", "focus"] {
        element
            .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
            .unwrap();
    }

    let _ = toolbar.apply_format("bold");

    for content in seen.borrow().iter() {
        assert!(content.contains("hello"), "unexpected content {content:?}");
    }
    // The toolbar is not left stuck after the nested calls.
    assert_eq!(toolbar.get_formatted_content(), element.inner_html());
    assert!(!toolbar.apply_format("strike"));
    let _ = toolbar.clear_formatting();

    for event in ["input", "focus"] {
        element
            .remove_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
            .unwrap();
    }
    toolbar.destroy();
    element.remove();
}
