//! Format-state synchronization.
//!
//! `FormatSync` is the single place where "the user asked for format X"
//! turns into "the surface has format X and the toolbar's state matches".
//! Every command runs the same sequence:
//!
//! 1. capture the live selection
//! 2. focus the surface if needed, possibly handing back a [`PendingCommand`]
//! 3. restore the captured selection (failure is tolerated)
//! 4. run the host's toggle or clear primitive
//! 5. re-derive [`FormatState`] and the continuous-formatting flag
//! 6. notify the observer, exactly once
//!
//! When step 2 defers, the host schedules [`FormatSync::resume`] after
//! [`PendingCommand::delay`] and steps 3 to 6 run there instead.

use std::str::FromStr;
use std::time::Duration;

use web_time::Instant;

use crate::config::SyncConfig;
use crate::error::FormatError;
use crate::format::{Format, FormatChange, FormatState};
use crate::platform::{FormatPlatform, RangeHandle};
use crate::selection::SelectionTracker;

/// A format command requested by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Toggle(Format),
    Clear,
}

impl FromStr for Command {
    type Err = FormatError;

    /// Parses a toolbar button's action: a format id or `"clear"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("clear") {
            return Ok(Command::Clear);
        }
        s.parse().map(Command::Toggle)
    }
}

/// The second half of a command, waiting for focus to settle.
#[derive(Debug)]
#[must_use = "a pending command does nothing until passed to FormatSync::resume"]
pub struct PendingCommand {
    command: Command,
    delay: Duration,
    deferred_at: Instant,
}

impl PendingCommand {
    pub fn command(&self) -> Command {
        self.command
    }

    /// How long the host should wait before resuming.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn delay_ms(&self) -> u32 {
        u32::try_from(self.delay().as_millis()).unwrap_or(u32::MAX)
    }

    pub fn deferred_at(&self) -> Instant {
        self.deferred_at
    }
}

/// Outcome of starting a command.
#[derive(Debug)]
#[must_use]
pub enum CommandStatus {
    /// All steps ran. `success` is what the primitive reported.
    Completed { success: bool },
    /// Focus had to move; resume the command later.
    Deferred(PendingCommand),
}

impl CommandStatus {
    /// True only for a completed command whose primitive succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, CommandStatus::Completed { success: true })
    }

    /// True when the command succeeded or is still on its way.
    pub fn accepted(&self) -> bool {
        match self {
            CommandStatus::Completed { success } => *success,
            CommandStatus::Deferred(_) => true,
        }
    }
}

type ChangeObserver = Box<dyn FnMut(&FormatChange)>;

/// Binds the format toolbar's state to one editable surface.
pub struct FormatSync<P: FormatPlatform> {
    platform: P,
    tracker: SelectionTracker<P::Range>,
    formats: FormatState,
    continuous: bool,
    config: SyncConfig,
    observer: Option<ChangeObserver>,
    torn_down: bool,
}

impl<P: FormatPlatform> FormatSync<P> {
    /// Bind to `platform`'s surface and derive the initial state.
    pub fn initialize(platform: P, config: SyncConfig) -> Self {
        let mut sync = Self {
            platform,
            tracker: SelectionTracker::new(),
            formats: FormatState::NONE,
            continuous: false,
            config,
            observer: None,
            torn_down: false,
        };
        sync.derive_from_live();
        sync
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn tracker(&self) -> &SelectionTracker<P::Range> {
        &self.tracker
    }

    /// Register the "format changed" observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl FnMut(&FormatChange) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    // === Queries ===

    /// The last derived format state.
    pub fn active_formats(&self) -> FormatState {
        self.formats
    }

    pub fn continuous_formatting(&self) -> bool {
        self.continuous
    }

    pub fn change(&self) -> FormatChange {
        FormatChange {
            formats: self.formats,
            continuous: self.continuous,
        }
    }

    /// Serialized markup of the bound surface.
    pub fn formatted_content(&self) -> String {
        self.platform.serialized_content()
    }

    /// Re-derive from the live selection and return the result.
    ///
    /// When the live selection is outside the surface the previous state is
    /// returned unchanged.
    pub fn update_formats_from_selection(&mut self) -> FormatState {
        self.derive_from_live();
        self.formats
    }

    // === Selection-change path ===

    /// React to a global selection-change notification.
    ///
    /// Returns false when the new selection is outside the surface; the
    /// snapshot and state then keep describing the last valid selection.
    pub fn on_selection_change(&mut self) -> bool {
        let before = self.change();
        if !self.derive_from_live() {
            tracing::trace!(target: "format_toolbar::sync", "ignoring selection outside surface");
            return false;
        }
        if self.change() != before {
            self.notify();
        }
        true
    }

    // === Commands ===

    pub fn apply_format(&mut self, format: Format) -> CommandStatus {
        self.begin(Command::Toggle(format))
    }

    /// Apply a format named by its identifier.
    ///
    /// Unknown identifiers complete unsuccessfully without touching the
    /// surface or notifying.
    pub fn apply_format_id(&mut self, id: &str) -> CommandStatus {
        match id.parse::<Format>() {
            Ok(format) => self.apply_format(format),
            Err(e) => {
                tracing::warn!(target: "format_toolbar::sync", error = %e, "rejected format command");
                CommandStatus::Completed { success: false }
            }
        }
    }

    pub fn clear_formatting(&mut self) -> CommandStatus {
        self.begin(Command::Clear)
    }

    /// Run any command, e.g. one parsed from a toolbar button.
    pub fn execute(&mut self, command: Command) -> CommandStatus {
        self.begin(command)
    }

    /// Run the deferred half of a command. Always completes.
    ///
    /// After [`teardown`](Self::teardown) the continuation is dropped and
    /// reports failure without touching the surface.
    pub fn resume(&mut self, pending: PendingCommand) -> CommandStatus {
        if self.torn_down {
            tracing::debug!(target: "format_toolbar::sync", command = ?pending.command, "dropping continuation after teardown");
            return CommandStatus::Completed { success: false };
        }
        tracing::trace!(
            target: "format_toolbar::sync",
            command = ?pending.command,
            waited = ?pending.deferred_at.elapsed(),
            "resuming deferred command"
        );
        self.finish(pending.command)
    }

    /// Drop the snapshot and observer before the surface goes away.
    pub fn teardown(&mut self) {
        self.tracker.clear();
        self.observer = None;
        self.torn_down = true;
    }

    fn begin(&mut self, command: Command) -> CommandStatus {
        tracing::debug!(target: "format_toolbar::sync", ?command, "format command");

        self.tracker.capture(&self.platform);

        if !self.platform.is_focused() {
            if let Err(e) = self.platform.focus() {
                tracing::warn!(target: "format_toolbar::sync", error = %e, "failed to focus surface");
            }
            if self.config.defers_after_focus() {
                let delay = Duration::from_millis(u64::from(self.config.focus_settle_delay_ms));
                tracing::debug!(target: "format_toolbar::sync", ?command, ?delay, "deferring until focus settles");
                return CommandStatus::Deferred(PendingCommand {
                    command,
                    delay,
                    deferred_at: Instant::now(),
                });
            }
        }

        self.finish(command)
    }

    fn finish(&mut self, command: Command) -> CommandStatus {
        if !self.tracker.restore(&mut self.platform) {
            tracing::debug!(target: "format_toolbar::sync", "continuing with the current selection");
        }

        let result = match command {
            Command::Toggle(format) => self.platform.toggle_format(format),
            Command::Clear => self.platform.clear_formats(&Format::ALL),
        }
        .map_err(FormatError::PrimitiveFailed);

        let success = match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: "format_toolbar::sync", ?command, error = %e, "command had no effect");
                false
            }
        };

        match command {
            Command::Clear if success => self.reset_after_clear(),
            _ => {
                self.derive_from_live();
            }
        }

        self.notify();
        CommandStatus::Completed { success }
    }

    /// Capture the live selection and derive state from it. False when the
    /// live selection is not inside the surface.
    fn derive_from_live(&mut self) -> bool {
        if !self.tracker.capture(&self.platform) {
            return false;
        }
        let collapsed = self
            .tracker
            .current()
            .is_some_and(|snapshot| snapshot.range().is_collapsed());

        let platform = &self.platform;
        self.formats = FormatState::derive(|format| platform.query_format(format));
        self.continuous = collapsed && !self.formats.is_empty();

        tracing::trace!(
            target: "format_toolbar::sync",
            formats = ?self.formats,
            continuous = self.continuous,
            "derived format state"
        );
        true
    }

    fn reset_after_clear(&mut self) {
        self.tracker.capture(&self.platform);
        self.formats = FormatState::NONE;
        self.continuous = false;
    }

    fn notify(&mut self) {
        let change = self.change();
        if let Some(observer) = self.observer.as_mut() {
            observer(&change);
        }
    }
}
