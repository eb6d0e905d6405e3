//! WASM bindings for the floating format toolbar.
//!
//! Exposes [`FormatToolbar`], which binds to one contenteditable surface and
//! keeps the toolbar's active-format state in sync with it.

mod logging;
mod toolbar;
mod types;

pub use toolbar::*;
pub use types::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}
