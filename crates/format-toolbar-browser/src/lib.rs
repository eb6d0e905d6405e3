//! Browser DOM layer for the format toolbar.
//!
//! This crate implements the core's platform traits over a contenteditable
//! element and wires up the DOM events the toolbar reacts to. It assumes a
//! `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `surface`: Selection API capture/restore and the `execCommand` primitive
//! - `events`: selectionchange, click-outside and popup button subscriptions
//! - `schedule`: timers for deferred command continuations
//!
//! # Re-exports
//!
//! This crate re-exports `format-toolbar-core` for convenience, so consumers
//! only need to depend on `format-toolbar-browser`.

// Re-export core crate
pub use format_toolbar_core;
pub use format_toolbar_core::*;

pub mod events;
pub mod schedule;
pub mod surface;

pub use events::{
    BrowserListeners, FORMAT_ATTRIBUTE, ListenerKey, on_button_click, on_pointer_outside,
    on_selection_change, popup_buttons,
};
pub use schedule::schedule_resume;
pub use surface::{BrowserSurface, DomRange};
