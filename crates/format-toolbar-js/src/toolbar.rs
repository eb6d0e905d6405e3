//! FormatToolbar - the toolbar state wrapper for JavaScript.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

use format_toolbar_browser::{
    BrowserListeners, BrowserSurface, CommandStatus, Format, FormatChange, FormatSync,
    ListenerKey, on_button_click, on_pointer_outside, on_selection_change, popup_buttons,
    schedule_resume,
};

use crate::logging;
use crate::types::{JsFormatChange, JsFormatState, ToolbarOptions};

type SharedSync = Rc<RefCell<FormatSync<BrowserSurface>>>;

/// State shared between the toolbar and the DOM callbacks it installs.
///
/// The core observer only queues; delivery happens once the synchronizer is
/// no longer borrowed, so the callback may call back into the toolbar.
#[derive(Default)]
struct Shared {
    queue: RefCell<Vec<FormatChange>>,
    on_change: RefCell<Option<js_sys::Function>>,
    /// Last state read from the synchronizer, served while it is borrowed.
    last: Cell<FormatChange>,
    destroyed: Cell<bool>,
}

impl Shared {
    fn push(&self, change: FormatChange) {
        self.last.set(change);
        self.queue.borrow_mut().push(change);
    }

    fn remember(&self, change: FormatChange) {
        self.last.set(change);
    }

    fn flush(&self) {
        let pending: Vec<FormatChange> = self.queue.borrow_mut().drain(..).collect();
        let Some(callback) = self.on_change.borrow().clone() else {
            return;
        };
        for change in pending {
            if self.destroyed.get() {
                break;
            }
            let payload = match serde_wasm_bindgen::to_value(&JsFormatChange::from(change)) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(target: "format_toolbar::browser", "failed to serialize change: {}", e);
                    continue;
                }
            };
            if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
                tracing::warn!(target: "format_toolbar::browser", "onChange callback threw: {:?}", e);
            }
        }
    }
}

/// Complete a `destroy` that arrived while the synchronizer was borrowed.
fn settle_teardown(sync: &SharedSync, shared: &Shared) {
    if !shared.destroyed.get() {
        return;
    }
    if let Ok(mut sync) = sync.try_borrow_mut() {
        sync.teardown();
    }
}

/// Run a command and report whether it was accepted.
///
/// A deferred command is scheduled and reported as accepted; its outcome
/// reaches JS through `onChange`. Commands arriving while the toolbar is
/// already inside a call (from a JS callback) or after `destroy` are refused.
fn run(
    sync: &SharedSync,
    shared: &Rc<Shared>,
    command: impl FnOnce(&mut FormatSync<BrowserSurface>) -> CommandStatus,
) -> bool {
    if shared.destroyed.get() {
        settle_teardown(sync, shared);
        return false;
    }
    let Ok(mut guard) = sync.try_borrow_mut() else {
        tracing::debug!(target: "format_toolbar::browser", "toolbar busy, refusing command");
        return false;
    };
    let status = command(&mut guard);
    shared.remember(guard.change());
    drop(guard);
    settle_teardown(sync, shared);

    let accepted = match status {
        CommandStatus::Completed { success } => success,
        CommandStatus::Deferred(pending) if shared.destroyed.get() => {
            tracing::debug!(target: "format_toolbar::browser", command = ?pending.command(), "destroyed before deferred command was scheduled");
            drop(pending);
            false
        }
        CommandStatus::Deferred(pending) => {
            let after_sync = Rc::downgrade(sync);
            let after_shared = Rc::clone(shared);
            schedule_resume(Rc::downgrade(sync), pending, move |_| {
                if let Some(sync) = after_sync.upgrade() {
                    if let Ok(sync) = sync.try_borrow() {
                        after_shared.remember(sync.change());
                    }
                    settle_teardown(&sync, &after_shared);
                }
                after_shared.flush();
            });
            true
        }
    };
    shared.flush();
    accepted
}

/// Floating format toolbar bound to one contenteditable surface.
///
/// Keeps the set of active formats in sync with the surface's selection and
/// runs format commands without losing that selection to toolbar clicks.
/// Every method may be called from inside a DOM event the toolbar itself
/// triggered; queries then answer from the last known state.
#[wasm_bindgen]
pub struct FormatToolbar {
    sync: SharedSync,
    shared: Rc<Shared>,
    listeners: RefCell<BrowserListeners>,
    surface: HtmlElement,
    document: Document,
}

#[wasm_bindgen]
impl FormatToolbar {
    /// Bind to `surface`.
    ///
    /// Subscribes to `selectionchange` straight away so the state follows the
    /// user's selection before any command runs.
    #[wasm_bindgen(constructor)]
    pub fn new(surface: HtmlElement, options: JsValue) -> Result<FormatToolbar, JsError> {
        let options = ToolbarOptions::parse(options)?;
        let level = options
            .log_level()
            .map_err(|e| JsError::new(&format!("Invalid logLevel: {}", e)))?;
        logging::install(level);

        let config = options.sync_config();
        let element = surface.clone();
        let surface = BrowserSurface::new(surface, &config).map_err(|e| JsError::new(&e.0))?;
        let document = surface.document().clone();

        let shared = Rc::new(Shared::default());
        let mut sync = FormatSync::initialize(surface, config);
        shared.remember(sync.change());
        let observer_shared = Rc::clone(&shared);
        sync.set_observer(move |change| observer_shared.push(*change));
        let sync = Rc::new(RefCell::new(sync));

        let mut listeners = BrowserListeners::new();
        let listener_sync = Rc::downgrade(&sync);
        let listener_shared = Rc::clone(&shared);
        listeners.attach(
            ListenerKey::SelectionChange,
            on_selection_change(&document, move || {
                if listener_shared.destroyed.get() {
                    return;
                }
                let Some(sync) = listener_sync.upgrade() else {
                    return;
                };
                // A command in flight re-derives state itself.
                let Ok(mut sync) = sync.try_borrow_mut() else {
                    return;
                };
                let _ = sync.on_selection_change();
                listener_shared.remember(sync.change());
                drop(sync);
                listener_shared.flush();
            }),
        );

        tracing::debug!(target: "format_toolbar::browser", "format toolbar initialized");

        Ok(Self {
            sync,
            shared,
            listeners: RefCell::new(listeners),
            surface: element,
            document,
        })
    }

    // === Commands ===

    /// Toggle the format with id `format_id` on the current selection.
    ///
    /// Returns whether the surface accepted the change. Unknown ids return
    /// `false`. Returns `true` when the command had to wait for focus; the
    /// result then arrives through `onChange`.
    #[wasm_bindgen(js_name = applyFormat)]
    pub fn apply_format(&self, format_id: &str) -> bool {
        run(&self.sync, &self.shared, |sync| sync.apply_format_id(format_id))
    }

    /// Remove every supported format from the current selection.
    #[wasm_bindgen(js_name = clearFormatting)]
    pub fn clear_formatting(&self) -> bool {
        run(&self.sync, &self.shared, |sync| sync.clear_formatting())
    }

    // === State ===

    /// Active formats as last derived.
    #[wasm_bindgen(js_name = getActiveFormats)]
    pub fn get_active_formats(&self) -> JsFormatState {
        self.current().formats.into()
    }

    /// Re-derive the active formats from the live selection.
    #[wasm_bindgen(js_name = updateFormatsFromSelection)]
    pub fn update_formats_from_selection(&self) -> JsFormatState {
        let Ok(mut sync) = self.sync.try_borrow_mut() else {
            return self.shared.last.get().formats.into();
        };
        let state = sync.update_formats_from_selection();
        self.shared.remember(sync.change());
        state.into()
    }

    /// Whether text typed at the caret will pick up the active formats.
    #[wasm_bindgen(js_name = getContinuousFormatting)]
    pub fn get_continuous_formatting(&self) -> bool {
        self.current().continuous
    }

    /// The surface's current markup.
    #[wasm_bindgen(js_name = getFormattedContent)]
    pub fn get_formatted_content(&self) -> String {
        match self.sync.try_borrow() {
            Ok(sync) => sync.formatted_content(),
            Err(_) => self.surface.inner_html(),
        }
    }

    /// Identifiers accepted by `applyFormat`, in toolbar order.
    #[wasm_bindgen(js_name = supportedFormats)]
    pub fn supported_formats() -> Vec<String> {
        Format::ALL.iter().map(|f| f.id().to_string()).collect()
    }

    /// Register the callback invoked with `{ formats, continuous }` after
    /// every command and every selection change that alters the state.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: Option<js_sys::Function>) {
        if self.shared.destroyed.get() {
            return;
        }
        *self.shared.on_change.borrow_mut() = callback;
    }

    // === Popup ===

    /// Wire up a shown popup.
    ///
    /// Every descendant with a `data-format` attribute becomes a button
    /// running that command (`"clear"` clears formatting). `on_outside` is
    /// called when the pointer goes down outside the popup. Calling this again
    /// replaces the previous wiring.
    #[wasm_bindgen(js_name = showPopup)]
    pub fn show_popup(&self, popup: Element, on_outside: js_sys::Function) {
        if self.shared.destroyed.get() {
            return;
        }
        let Ok(mut listeners) = self.listeners.try_borrow_mut() else {
            tracing::debug!(target: "format_toolbar::browser", "listeners busy, popup not wired");
            return;
        };
        listeners.detach_where(ListenerKey::is_popup);

        listeners.attach(
            ListenerKey::ClickOutside,
            on_pointer_outside(&self.document, &popup, move || {
                if let Err(e) = on_outside.call0(&JsValue::NULL) {
                    tracing::warn!(target: "format_toolbar::browser", "onOutside callback threw: {:?}", e);
                }
            }),
        );

        let buttons = popup_buttons(&popup);
        tracing::debug!(target: "format_toolbar::browser", count = buttons.len(), "attaching popup buttons");
        for (index, (button, command)) in buttons.into_iter().enumerate() {
            let sync = Rc::clone(&self.sync);
            let shared = Rc::clone(&self.shared);
            listeners.attach(
                ListenerKey::Button(index),
                on_button_click(&button, move || {
                    run(&sync, &shared, |sync| sync.execute(command));
                }),
            );
        }
    }

    /// Detach the popup's listeners.
    #[wasm_bindgen(js_name = hidePopup)]
    pub fn hide_popup(&self) {
        let Ok(mut listeners) = self.listeners.try_borrow_mut() else {
            return;
        };
        let removed = listeners.detach_where(ListenerKey::is_popup);
        tracing::trace!(target: "format_toolbar::browser", removed, "popup listeners detached");
    }

    /// Detach every listener and forget the captured selection.
    ///
    /// Deferred commands still waiting on focus are dropped. Called while a
    /// command is running, the teardown completes as soon as it returns.
    pub fn destroy(&self) {
        self.shared.destroyed.set(true);
        if let Ok(mut listeners) = self.listeners.try_borrow_mut() {
            listeners.detach_all();
        }
        match self.sync.try_borrow_mut() {
            Ok(mut sync) => sync.teardown(),
            Err(_) => {
                tracing::debug!(target: "format_toolbar::browser", "command in flight, teardown deferred");
            }
        }
        self.shared.queue.borrow_mut().clear();
        *self.shared.on_change.borrow_mut() = None;
    }
}

impl FormatToolbar {
    fn current(&self) -> FormatChange {
        match self.sync.try_borrow() {
            Ok(sync) => sync.change(),
            Err(_) => self.shared.last.get(),
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

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

    fn toolbar_over(element: &HtmlElement, delay_ms: u32) -> FormatToolbar {
        let options = ToolbarOptions {
            focus_settle_delay_ms: Some(delay_ms),
            ..Default::default()
        };
        let options = serde_wasm_bindgen::to_value(&options).unwrap();
        FormatToolbar::new(element.clone(), options)
            .unwrap_or_else(|_| panic!("toolbar should bind to a mounted element"))
    }

    fn counting_callback(calls: &Rc<Cell<u32>>) -> Closure<dyn FnMut(JsValue)> {
        let calls = Rc::clone(calls);
        Closure::new(move |_change: JsValue| calls.set(calls.get() + 1))
    }

    #[wasm_bindgen_test]
    fn test_queries_answer_while_command_in_flight() {
        let element = mount("hello");
        select_text(&element, 0, 5);
        let toolbar = toolbar_over(&element, 0);
        let before = toolbar.get_active_formats();

        let guard = toolbar.sync.borrow_mut();
        assert_eq!(toolbar.get_active_formats(), before);
        assert_eq!(toolbar.update_formats_from_selection(), before);
        assert!(!toolbar.get_continuous_formatting());
        assert_eq!(toolbar.get_formatted_content(), "hello");
        assert!(!toolbar.apply_format("bold"));
        assert!(!toolbar.clear_formatting());
        drop(guard);

        assert_eq!(toolbar.get_formatted_content(), "hello");
        assert!(toolbar.sync.try_borrow_mut().is_ok());
        element.remove();
    }

    #[wasm_bindgen_test]
    fn test_destroy_during_command_completes_afterwards() {
        let element = mount("hello");
        select_text(&element, 0, 5);
        let toolbar = toolbar_over(&element, 0);

        let guard = toolbar.sync.borrow_mut();
        toolbar.destroy();
        assert!(guard.tracker().has_snapshot());
        drop(guard);

        assert!(!toolbar.apply_format("bold"));
        assert!(!toolbar.sync.borrow().tracker().has_snapshot());
        assert_eq!(element.inner_html(), "hello");
        element.remove();
    }

    #[wasm_bindgen_test]
    async fn test_deferred_command_dropped_by_destroy() {
        let element = mount("hello");
        select_text(&element, 0, 5);
        let toolbar = toolbar_over(&element, 10);
        let calls = Rc::new(Cell::new(0));
        let callback = counting_callback(&calls);
        toolbar.on_change(Some(callback.as_ref().unchecked_ref::<js_sys::Function>().clone()));

        // The surface is not focused yet, so the command waits for focus.
        assert!(toolbar.apply_format("bold"));
        assert_eq!(calls.get(), 0);
        toolbar.destroy();

        gloo_timers::future::TimeoutFuture::new(50).await;
        assert_eq!(calls.get(), 0);
        assert_eq!(element.inner_html(), "hello");
        element.remove();
    }

    #[wasm_bindgen_test]
    async fn test_deferred_command_reports_through_on_change() {
        let element = mount("hello");
        select_text(&element, 0, 5);
        let toolbar = toolbar_over(&element, 10);
        let calls = Rc::new(Cell::new(0));
        let callback = counting_callback(&calls);
        toolbar.on_change(Some(callback.as_ref().unchecked_ref::<js_sys::Function>().clone()));

        assert!(toolbar.apply_format("bold"));
        assert_eq!(calls.get(), 0);

        gloo_timers::future::TimeoutFuture::new(50).await;
        // Focus moving may add selectionchange notifications of its own.
        assert!(calls.get() >= 1);
        toolbar.destroy();
        element.remove();
    }
}
