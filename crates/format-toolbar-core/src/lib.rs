//! format-toolbar-core: selection and format-state synchronization without
//! framework dependencies.
//!
//! This crate provides:
//! - `Format` / `FormatState` - the supported inline styles and which are active
//! - `SelectionTracker` - capture/restore of a range across focus changes
//! - `FormatSync<P>` - the command state machine, generic over a platform
//! - `SelectionPlatform` / `FormatPlatform` traits for host surfaces
//! - `MemorySurface` - a headless surface for tests and non-DOM hosts
//! - `ListenerRegistry` - idempotent listener attachment

pub mod config;
pub mod error;
pub mod format;
pub mod listeners;
pub mod memory;
pub mod platform;
pub mod selection;
pub mod sync;

pub use config::SyncConfig;
pub use error::FormatError;
pub use format::{Format, FormatChange, FormatState};
pub use listeners::ListenerRegistry;
pub use memory::{MemoryContainer, MemoryRange, MemorySurface, NodeId, SURFACE_NODE};
pub use platform::{FormatPlatform, PlatformError, RangeHandle, SelectionPlatform};
pub use selection::{SelectionSnapshot, SelectionTracker};
pub use smol_str::SmolStr;
pub use sync::{Command, CommandStatus, FormatSync, PendingCommand};
