//! Scheduling for deferred command continuations.

use std::cell::RefCell;
use std::rc::Weak;

use gloo_timers::callback::Timeout;

use format_toolbar_core::{FormatPlatform, FormatSync, PendingCommand};

/// Run `pending` on `sync` once its delay has elapsed.
///
/// Holds only a weak handle: if the synchronizer is gone by then the
/// continuation is dropped. `after` runs once the command has completed and
/// the borrow on `sync` has been released.
pub fn schedule_resume<P, F>(sync: Weak<RefCell<FormatSync<P>>>, pending: PendingCommand, after: F)
where
    P: FormatPlatform + 'static,
    F: FnOnce(bool) + 'static,
{
    tracing::trace!(target: "format_toolbar::browser", delay = ?pending.delay(), "scheduling deferred command");
    let delay = pending.delay_ms();
    let timeout = Timeout::new(delay, move || {
        let Some(sync) = sync.upgrade() else {
            tracing::debug!(target: "format_toolbar::browser", "surface torn down before deferred command ran");
            return;
        };
        let Ok(mut guard) = sync.try_borrow_mut() else {
            tracing::warn!(target: "format_toolbar::browser", command = ?pending.command(), "surface busy, dropping deferred command");
            return;
        };
        let status = guard.resume(pending);
        drop(guard);
        after(status.is_success());
    });
    let _ = timeout.forget();
}
