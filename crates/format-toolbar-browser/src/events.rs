//! DOM event subscriptions used by the toolbar.
//!
//! Every subscription is a `gloo_events::EventListener`, which removes itself
//! from its target when dropped. Store them in a [`BrowserListeners`]
//! registry so re-attaching replaces rather than duplicates.

use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node};

use format_toolbar_core::{Command, FormatError, ListenerRegistry};

/// Slot a listener occupies in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKey {
    /// Global `selectionchange` on the document.
    SelectionChange,
    /// Pointer pressed outside the popup.
    ClickOutside,
    /// The popup button at this index.
    Button(usize),
}

impl ListenerKey {
    /// Listeners that only live while the popup is shown.
    pub fn is_popup(&self) -> bool {
        matches!(self, ListenerKey::ClickOutside | ListenerKey::Button(_))
    }
}

pub type BrowserListeners = ListenerRegistry<ListenerKey, EventListener>;

/// Attribute naming the command a popup button runs.
pub const FORMAT_ATTRIBUTE: &str = "data-format";

/// Subscribe to the document-wide `selectionchange` event.
///
/// The event is global; the callback must filter selections that are not in
/// the surface.
pub fn on_selection_change(document: &Document, mut callback: impl FnMut() + 'static) -> EventListener {
    EventListener::new(document, "selectionchange", move |_event| callback())
}

/// Subscribe to pointer presses that land outside `region`.
pub fn on_pointer_outside(
    document: &Document,
    region: &Element,
    mut callback: impl FnMut() + 'static,
) -> EventListener {
    let region = region.clone();
    EventListener::new_with_options(
        document,
        "mousedown",
        EventListenerOptions::run_in_capture_phase(),
        move |event| {
            let inside = event
                .target()
                .and_then(|target| target.dyn_into::<Node>().ok())
                .is_some_and(|node| region.contains(Some(&node)));
            if !inside {
                callback();
            }
        },
    )
}

/// Subscribe to clicks on a popup button.
pub fn on_button_click(button: &Element, mut callback: impl FnMut() + 'static) -> EventListener {
    EventListener::new(button, "click", move |event| {
        event.prevent_default();
        callback();
    })
}

/// Every element under `popup` carrying a `data-format` attribute, with the
/// command it names. Buttons with unrecognised values are skipped.
pub fn popup_buttons(popup: &Element) -> Vec<(Element, Command)> {
    let selector = format!("[{FORMAT_ATTRIBUTE}]");
    let Ok(nodes) = popup.query_selector_all(&selector) else {
        return Vec::new();
    };

    let mut buttons = Vec::new();
    for i in 0..nodes.length() {
        let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(value) = element.get_attribute(FORMAT_ATTRIBUTE) else {
            continue;
        };
        match value.parse::<Command>() {
            Ok(command) => buttons.push((element, command)),
            Err(FormatError::UnknownFormat(id)) => {
                tracing::warn!(target: "format_toolbar::browser", %id, "skipping button with unknown format");
            }
            Err(e) => {
                tracing::warn!(target: "format_toolbar::browser", error = %e, "skipping button");
            }
        }
    }
    buttons
}
