//! The `uplink` wizard: the application state machine sequencing the
//! transfer workflow screens.
//!
//! **Example** - Driving the state machine one tick at a time:
//! ```ignore
//! let settings = SettingsBuilder::new().finalize();
//! let store = Box::new(DiskStore::new());
//! let link = Box::new(FakeLink::new(true));
//! let mut wizard = wizard::factory(settings, store, link);
//! while !wizard.is_finished() {
//!     let input = poll_input(tick)?;
//!     wizard.step(input);
//!     renderer.render(&wizard.snapshot())?;
//! }
//! ```

mod context;
mod events;
mod state_machine;
mod states;

pub use events::InputEvent;
pub use state_machine::{factory, Screen, Snapshot, Wizard};
