//! States for the `uplink` wizard state machine.
//!
//! This modules is private and restricted to the [`wizard`](crate::wizard)
//! scope. The public interface of the state machine is provided by
//! [`wizard`](crate::wizard).
//!
//! Refer to the [`state_machine`](super::state_machine) module for an
//! overview of states, events and transitions.

use log::{debug, trace};

use super::context::AppContext;
use super::events::*;
use crate::transfer::PROGRESS_STEP;

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Trait adding the ability for a state to be run for one tick.
pub(crate) trait Runnable {
    /// A state implements this method so it can be run once per tick while
    /// the state machine is in it.
    ///
    /// During this call the state does its per-tick work (polling the link,
    /// advancing the transfer) against the shared context, consumes the
    /// decoded input for this tick, and either stays put (`None`) or
    /// requests a single transition by returning the appropriate
    /// [`Trigger`]. The trigger is then consumed to create the new state
    /// using the corresponding `From` trait implementation if available.
    fn run(&mut self, ctx: &mut AppContext, input: InputEvent) -> Option<Trigger>;
}

// Start State =================================================================

/// The initial state: a static welcome screen.
///
/// From the `StartState`, the state machine can evolve via the following
/// transitions:
///
///  * **[`Trigger::ShowMenu`] => `MenuState`** when the user confirms,
///  * **[`Trigger::Exit`] => `ExitState`** on the exit signal.
#[derive(Debug)]
pub(crate) struct StartState {
    /// Ticks spent on the start screen, used by the rendering layer to
    /// blink the continue prompt. Fresh on every entry by construction.
    pub timer: u32,
}
impl Runnable for StartState {
    fn run(&mut self, _ctx: &mut AppContext, input: InputEvent) -> Option<Trigger> {
        self.timer = self.timer.saturating_add(1);
        match input {
            InputEvent::Exit => Some(Trigger::Exit),
            InputEvent::Confirm => Some(Trigger::ShowMenu),
            _ => None,
        }
    }
}

// Menu State ==================================================================

/// The main menu: reports peripheral connectivity and gates the workflow on
/// it.
///
/// The connectivity snapshot is refreshed through the link probe once per
/// tick while in this state, and only in this state. Confirming while the
/// peripheral is disconnected is a no-op.
///
///  * **[`Trigger::BrowseFiles`] => `FileSelectState`** when the user
///    confirms and the peripheral is connected,
///  * **[`Trigger::Exit`] => `ExitState`** on the exit signal.
#[derive(Debug)]
pub(crate) struct MenuState {}
impl Runnable for MenuState {
    fn run(&mut self, ctx: &mut AppContext, input: InputEvent) -> Option<Trigger> {
        // Adapter polling happens before the input is acted upon, so the
        // confirm decision below uses this tick's snapshot.
        ctx.link_connected = ctx.link.probe_connected();
        trace!("link probe: connected={}", ctx.link_connected);

        match input {
            InputEvent::Exit => Some(Trigger::Exit),
            InputEvent::Confirm if ctx.link_connected => Some(Trigger::BrowseFiles),
            InputEvent::Confirm => {
                debug!("confirm ignored: peripheral not connected");
                None
            }
            _ => None,
        }
    }
}

// FileSelect State ============================================================

/// The file-selection screen.
///
/// The payload was auto-loaded (at most once) on entry; this state only
/// reacts to input. Confirming while nothing is loaded is a no-op, so a
/// failed load leaves the wizard parked here with upload unavailable.
///
///  * **[`Trigger::ShowMenu`] => `MenuState`** when the user cancels,
///  * **[`Trigger::BeginUpload`] => `UploadingState`** when the user
///    confirms and a payload is loaded,
///  * **[`Trigger::Exit`] => `ExitState`** on the exit signal.
#[derive(Debug)]
pub(crate) struct FileSelectState {}
impl Runnable for FileSelectState {
    fn run(&mut self, ctx: &mut AppContext, input: InputEvent) -> Option<Trigger> {
        match input {
            InputEvent::Exit => Some(Trigger::Exit),
            InputEvent::Cancel => Some(Trigger::ShowMenu),
            InputEvent::Confirm if ctx.file.loaded => Some(Trigger::BeginUpload),
            InputEvent::Confirm => {
                debug!("confirm ignored: no payload loaded");
                None
            }
            _ => None,
        }
    }
}

// Uploading State =============================================================

/// The transfer in flight.
///
/// Each tick pushes one chunk of the payload through the link adapter and
/// advances the transfer session on success; a link error aborts the
/// session with the error text as the status. Input is ignored while
/// uploading except for the exit signal; cancelling mid-transfer is not
/// part of the workflow.
///
///  * **[`Trigger::UploadDone`] => `CompleteState`** when the session
///    reaches 100% and finalizes,
///  * **[`Trigger::UploadFailed`] => `MenuState`** when the session aborts,
///  * **[`Trigger::Exit`] => `ExitState`** on the exit signal.
#[derive(Debug)]
pub(crate) struct UploadingState {
    /// Bytes pushed through the link so far.
    pub sent: usize,
}
impl Runnable for UploadingState {
    fn run(&mut self, ctx: &mut AppContext, input: InputEvent) -> Option<Trigger> {
        if input == InputEvent::Exit {
            return Some(Trigger::Exit);
        }

        if ctx.session.active() {
            let total = ctx.file.size();
            let remaining = total.saturating_sub(self.sent);
            // One progress step worth of bytes, rounded up so the payload
            // drains no slower than the progress display.
            let step = (total * PROGRESS_STEP as usize + 99) / 100;
            let len = remaining.min(step);

            match ctx.link.send_chunk(&ctx.file.bytes, self.sent, len) {
                Ok(n) => {
                    trace!("{} bytes pushed to the peripheral", n);
                    self.sent += n;
                    ctx.session.advance();
                    ctx.session.complete_if_done();
                }
                Err(e) => {
                    ctx.session.abort(format!("Upload failed: {}", e));
                }
            }
        }

        if ctx.session.is_complete() {
            Some(Trigger::UploadDone)
        } else if ctx.session.failed() {
            Some(Trigger::UploadFailed)
        } else {
            None
        }
    }
}

// Complete State ==============================================================

/// The success screen shown after a finished transfer.
///
///  * **[`Trigger::ShowMenu`] => `MenuState`** when the user confirms,
///  * **[`Trigger::Exit`] => `ExitState`** on the exit signal.
#[derive(Debug)]
pub(crate) struct CompleteState {}
impl Runnable for CompleteState {
    fn run(&mut self, _ctx: &mut AppContext, input: InputEvent) -> Option<Trigger> {
        match input {
            InputEvent::Exit => Some(Trigger::Exit),
            InputEvent::Confirm => Some(Trigger::ShowMenu),
            _ => None,
        }
    }
}

// Exit State ==================================================================

/// The terminal state. Once here, the wizard stays here; the tick loop
/// notices and terminates the process.
#[derive(Debug)]
pub(crate) struct ExitState {}
impl Runnable for ExitState {
    fn run(&mut self, _ctx: &mut AppContext, _input: InputEvent) -> Option<Trigger> {
        None
    }
}
