//! The rendering and input collaborators around the wizard core.
//!
//! Nothing in here makes workflow decisions: the renderer draws whatever the
//! wizard's snapshot says, and the input poller only decodes keys into the
//! per-tick [`InputEvent`](crate::wizard::InputEvent).

mod input;
mod screens;

pub use input::poll_input;
pub use screens::Renderer;
