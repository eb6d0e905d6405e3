//! Console logging for the wasm build.

use std::sync::Once;

use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

static INSTALL: Once = Once::new();

/// Install the console subscriber. Only the first call has any effect.
pub(crate) fn install(level: Level) {
    INSTALL.call_once(|| {
        let wasm_layer = tracing_wasm::WASMLayer::new(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(level)
                .build(),
        );
        // Another subscriber may already be installed by the host page.
        let _ = set_global_default(Registry::default().with(wasm_layer));
    });
}
