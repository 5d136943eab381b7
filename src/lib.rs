//! Uplink is a small console wizard for pushing a payload file from the host
//! to a peripheral device over a serial link. It walks the user through one
//! linear workflow (detect the peripheral, load the payload, transfer it,
//! report completion), showing connection status, file metadata and transfer
//! progress along the way.
//!
//! The wizard core is implemented as a state machine. State machines are
//! implemented in terms of **states** and **transitions** between them with
//! the following characteristics:
//!
//! * Can only be in one state at any time.
//! * Each state can have its own associated data if needed.
//! * It is possible to have some shared data between **all** states (here
//!   the application context: settings, the payload slot, the transfer
//!   session).
//! * Transitions between states are triggered via typed **events** and
//!   follow defined semantics.
//! * Only explicitly defined transitions should be permitted and as many
//!   errors should be detected at **compile-time**.
//! * Transitioning from one state to another consumes the original state and
//!   renders it unusable. Any transition back to that state would create a
//!   new state.
//! * Data can be transferred from one state to the next by attaching it to
//!   the transition event. Such data is statically defined as part of the
//!   event type.
//!
//! The implementation of state transitions leverages `rust`'s `From` and
//! `Into` pattern. The `From` trait allows for a type to define how to
//! create itself from another type, hence providing us an intuitive and
//! simple mechanism for converting `events` into new `states`.
//!
//! Unlike a blocking event loop, the wizard runs one logical step per
//! rendered frame tick: the caller polls the decoded input, calls
//! [`wizard::Wizard::step`], and hands the resulting snapshot to the
//! rendering layer. Nothing inside a tick blocks, so errors never need to
//! cross a tick boundary as anything but data.
//!
//! The external capabilities the wizard depends on, the payload store and
//! the peripheral link, are injected as trait objects, so the whole
//! workflow runs identically against real hardware and deterministic test
//! doubles.

mod link;
mod settings;
mod store;
mod transfer;

pub mod ui;
pub mod wizard;

pub use link::{FakeLink, LinkAdapter, LinkError, SerialLink};
pub use settings::{Settings, SettingsBuilder, DEFAULT_PAYLOAD};
pub use store::{DiskStore, FileStore, LoadedFile, StoreError};
pub use transfer::{TransferSession, PROGRESS_STEP};
