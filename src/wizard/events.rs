//! Events for the `uplink` wizard state machine.
//!
//! This modules is private and restricted to the [`wizard`](crate::wizard)
//! scope. The public interface of the state machine is provided by
//! [`wizard`](crate::wizard).
//!
//! Two kinds of events exist here:
//!
//!  * [`InputEvent`]: the decoded user input consumed by the wizard, one
//!    per tick. The wizard performs no raw device polling itself; the input
//!    collaborator supplies these.
//!  * the transition events, fired by a state to request a transition, and
//!    consumed through their `From` implementation to create the new state.
//!    The shared [`AppContext`] travels inside the transition event.

use super::context::AppContext;

// =============================================================================
// Public Interface
// =============================================================================

/// The decoded input for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The confirm button (advance the wizard).
    Confirm,
    /// The cancel button (go back where going back is allowed).
    Cancel,
    /// The dedicated exit signal; honored from every state.
    Exit,
    /// No input arrived this tick.
    Idle,
}

// =============================================================================
// Crate-Public Interface
// =============================================================================

/// Transition requested by a state at the end of a tick.
///
/// A state returns at most one trigger per tick; the state machine turns it
/// into the matching transition event, moving the context along. Anything a
/// state is not allowed to request is caught in the state machine's `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    ShowMenu,
    BrowseFiles,
    BeginUpload,
    UploadDone,
    UploadFailed,
    Exit,
}

// ShowMenuEvent ===============================================================

/// Event fired to trigger a transition to the menu state.
///
/// This event can happen under one of the following circumstances:
///
///  1. While at the start screen and the user confirms.
///  2. While at the file-selection screen and the user cancels.
///  3. While at the completion screen and the user confirms.
#[derive(Debug)]
pub(crate) struct ShowMenuEvent {
    pub ctx: AppContext,
}

// BrowseFilesEvent ============================================================

/// Event fired to trigger the transition to the file-selection state.
///
/// Fired from the menu state when the user confirms while the peripheral is
/// connected. The transition auto-loads the payload when none is loaded yet.
#[derive(Debug)]
pub(crate) struct BrowseFilesEvent {
    pub ctx: AppContext,
}

// BeginUploadEvent ============================================================

/// Event fired to trigger the transition to the uploading state.
///
/// Fired from the file-selection state when the user confirms and a payload
/// is loaded. The transition starts a fresh transfer session.
#[derive(Debug)]
pub(crate) struct BeginUploadEvent {
    pub ctx: AppContext,
}

// UploadDoneEvent =============================================================

/// Event fired when the transfer session reaches 100% and finalizes. It
/// triggers the transition to the completion state.
#[derive(Debug)]
pub(crate) struct UploadDoneEvent {
    pub ctx: AppContext,
}

// UploadFailedEvent ===========================================================

/// Event fired when the link aborts a transfer mid-flight. It routes the
/// wizard back to the menu state; the failure reason stays in the transfer
/// session status for the menu to surface as an error banner.
#[derive(Debug)]
pub(crate) struct UploadFailedEvent {
    pub ctx: AppContext,
}

// ExitEvent ===================================================================

/// The last event that can be triggered in the wizard. It can be fired from
/// any state in response to the dedicated exit input and moves the machine
/// into its terminal state, after which the tick loop hands control back to
/// the caller.
#[derive(Debug)]
pub(crate) struct ExitEvent {
    pub ctx: AppContext,
}
