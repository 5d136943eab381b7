//! The `uplink` wizard state machine.
//!
//! The wizard sequences the screens of the transfer workflow and gates every
//! transition on external conditions: peripheral connectivity, payload
//! availability and transfer completion. It runs one logical step per tick:
//! poll the link (menu only), consume the decoded input, fire at most one
//! transition, advance the transfer (uploading only). Nothing blocks
//! inside a tick, so control always returns to the rendering layer.
//!
//! The following state diagram summarizes the different states and
//! transitions the wizard goes through:
//!
//! ```text
//!                 START
//!                   |
//!                   v
//!               .-------.   confirm    .----------.
//!               | Start |------------->|   Menu   |<--------------.
//!               '-------'              '----------'               |
//!                                        |      ^                 |
//!                     confirm+connected  |      | cancel          |
//!                                        v      |                 |
//!                                   .------------.                |
//!                                   | FileSelect |            confirm
//!                                   '------------'                |
//!                                        |                        |
//!                       confirm+loaded   |        upload          |
//!                                        v        failed          |
//!                                  .-----------.----------->.----------.
//!                                  | Uploading |            |   Menu   |
//!                                  '-----------'            '----------'
//!                                        |
//!                            progress at 100%
//!                                        v
//!                                  .----------.
//!                                  | Complete |
//!                                  '----------'
//!
//!                  (any state) --- exit signal ---> Exit
//! ```

use log::{error, info};

use super::context::AppContext;
use super::events::*;
use super::states::*;
use crate::link::LinkAdapter;
use crate::settings::Settings;
use crate::store::FileStore;

// =============================================================================
// Public Interface
// =============================================================================

/// Names the screen the wizard is currently on. This is what the rendering
/// layer dispatches on; it carries no state data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    MainMenu,
    FileSelect,
    Uploading,
    Complete,
    Exit,
}

/// A read-only view of the wizard for the rendering layer (and for tests).
///
/// The renderer makes no decisions: everything it shows is in here.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub screen: Screen,
    /// Ticks spent on the start screen; drives the blinking prompt.
    pub start_timer: u32,
    pub file_name: String,
    pub file_size: usize,
    pub file_loaded: bool,
    pub progress: u8,
    pub status: String,
    pub transfer_failed: bool,
    pub link_connected: bool,
}

/// Encapsulates the state machine and its tick loop entry point to provide a
/// concise public interface to the module users.
pub struct Wizard {
    // `step` consumes the current state to produce the next one, so the
    // machine is parked in an Option while the exchange happens.
    sm: Option<WizardStates>,
}
impl Wizard {
    /// Run one tick of the wizard with the decoded input for this tick.
    ///
    /// At most one transition fires per tick; an input a state does not
    /// recognize is a no-op.
    pub fn step(&mut self, input: InputEvent) {
        let sm = self.sm.take().expect("the wizard always holds a state");
        self.sm = Some(sm.step(input));
    }

    /// The screen the wizard is currently on.
    pub fn screen(&self) -> Screen {
        match self.machine() {
            WizardStates::Start(_) => Screen::Start,
            WizardStates::Menu(_) => Screen::MainMenu,
            WizardStates::FileSelect(_) => Screen::FileSelect,
            WizardStates::Uploading(_) => Screen::Uploading,
            WizardStates::Complete(_) => Screen::Complete,
            WizardStates::Exit(_) => Screen::Exit,
        }
    }

    /// True once the terminal state is reached and the process should end.
    pub fn is_finished(&self) -> bool {
        self.screen() == Screen::Exit
    }

    /// Take a read-only snapshot of everything the rendering layer needs.
    pub fn snapshot(&self) -> Snapshot {
        let ctx = self.context();
        let start_timer = match self.machine() {
            WizardStates::Start(sm) => sm.state.timer,
            _ => 0,
        };
        Snapshot {
            screen: self.screen(),
            start_timer,
            file_name: ctx.file.name.clone(),
            file_size: ctx.file.size(),
            file_loaded: ctx.file.loaded,
            progress: ctx.session.progress(),
            status: ctx.session.status().to_owned(),
            transfer_failed: ctx.session.failed(),
            link_connected: ctx.link_connected,
        }
    }

    fn machine(&self) -> &WizardStates {
        self.sm.as_ref().expect("the wizard always holds a state")
    }

    fn context(&self) -> &AppContext {
        match self.machine() {
            WizardStates::Start(sm) => &sm.ctx,
            WizardStates::Menu(sm) => &sm.ctx,
            WizardStates::FileSelect(sm) => &sm.ctx,
            WizardStates::Uploading(sm) => &sm.ctx,
            WizardStates::Complete(sm) => &sm.ctx,
            WizardStates::Exit(sm) => &sm.ctx,
        }
    }
}

/// Factory function for the wizard state machine. Use it to get an instance,
/// then drive it by calling [`Wizard::step`] once per tick.
///
/// The store and link adapters are injected here, which is what makes the
/// whole workflow testable without hardware or a file system.
pub fn factory(
    settings: Settings,
    store: Box<dyn FileStore>,
    link: Box<dyn LinkAdapter>,
) -> Wizard {
    info!("=> Start");
    Wizard {
        // The machine naturally starts on the start screen.
        sm: Some(WizardStates::Start(WizardMachine::new(AppContext::new(
            settings, store, link,
        )))),
    }
}

// =============================================================================
// Private stuff
// =============================================================================

/// The raw state machine implementing the wizard workflow.
///
/// Note that using a generic type that holds the current state serves two
/// purposes. It allows for also having data shared by all states that is not
/// really part of state data (the application context with the settings, the
/// payload slot and the transfer session). Additionally, it's nicer when
/// debugging to see the state machine and the current state it is holding at
/// any time.
#[derive(Debug)]
struct WizardMachine<S: Runnable> {
    ctx: AppContext,
    state: S,
}
impl<S: Runnable> WizardMachine<S> {
    fn run(&mut self, input: InputEvent) -> Option<Trigger> {
        self.state.run(&mut self.ctx, input)
    }
}

/// The state machine starts in the `StartState`.
impl WizardMachine<StartState> {
    fn new(ctx: AppContext) -> Self {
        WizardMachine {
            ctx,
            state: StartState { timer: 0 },
        }
    }
}

/// An enum wrapper around the states of the wizard state machine. It
/// provides a simpler and more intuitive model for manipulating states and
/// their transitions.
#[derive(Debug)]
enum WizardStates {
    Start(WizardMachine<StartState>),
    Menu(WizardMachine<MenuState>),
    FileSelect(WizardMachine<FileSelectState>),
    Uploading(WizardMachine<UploadingState>),
    Complete(WizardMachine<CompleteState>),
    Exit(WizardMachine<ExitState>),
}
impl WizardStates {
    /// The unit of work in the wizard tick loop. It runs the current state
    /// for one tick and, when the state requests a transition, consumes the
    /// machine to build the next state from the matching event. State
    /// transitions from events are implemented using the rust `From`/`Into`
    /// pattern, so illegal transitions simply do not exist as code paths;
    /// an illegal trigger is a bug caught right here.
    fn step(self, input: InputEvent) -> Self {
        match self {
            WizardStates::Start(mut sm) => match sm.run(input) {
                None => WizardStates::Start(sm),
                Some(Trigger::ShowMenu) => {
                    WizardStates::Menu(ShowMenuEvent { ctx: sm.ctx }.into())
                }
                Some(Trigger::Exit) => WizardStates::Exit(ExitEvent { ctx: sm.ctx }.into()),
                Some(trigger) => {
                    unreachable!("illegal trigger {:?} at current state {:?}", trigger, sm)
                }
            },
            WizardStates::Menu(mut sm) => match sm.run(input) {
                None => WizardStates::Menu(sm),
                Some(Trigger::BrowseFiles) => {
                    WizardStates::FileSelect(BrowseFilesEvent { ctx: sm.ctx }.into())
                }
                Some(Trigger::Exit) => WizardStates::Exit(ExitEvent { ctx: sm.ctx }.into()),
                Some(trigger) => {
                    unreachable!("illegal trigger {:?} at current state {:?}", trigger, sm)
                }
            },
            WizardStates::FileSelect(mut sm) => match sm.run(input) {
                None => WizardStates::FileSelect(sm),
                Some(Trigger::ShowMenu) => {
                    WizardStates::Menu(ShowMenuEvent { ctx: sm.ctx }.into())
                }
                Some(Trigger::BeginUpload) => {
                    WizardStates::Uploading(BeginUploadEvent { ctx: sm.ctx }.into())
                }
                Some(Trigger::Exit) => WizardStates::Exit(ExitEvent { ctx: sm.ctx }.into()),
                Some(trigger) => {
                    unreachable!("illegal trigger {:?} at current state {:?}", trigger, sm)
                }
            },
            WizardStates::Uploading(mut sm) => match sm.run(input) {
                None => WizardStates::Uploading(sm),
                Some(Trigger::UploadDone) => {
                    WizardStates::Complete(UploadDoneEvent { ctx: sm.ctx }.into())
                }
                Some(Trigger::UploadFailed) => {
                    WizardStates::Menu(UploadFailedEvent { ctx: sm.ctx }.into())
                }
                Some(Trigger::Exit) => WizardStates::Exit(ExitEvent { ctx: sm.ctx }.into()),
                Some(trigger) => {
                    unreachable!("illegal trigger {:?} at current state {:?}", trigger, sm)
                }
            },
            WizardStates::Complete(mut sm) => match sm.run(input) {
                None => WizardStates::Complete(sm),
                Some(Trigger::ShowMenu) => {
                    WizardStates::Menu(ShowMenuEvent { ctx: sm.ctx }.into())
                }
                Some(Trigger::Exit) => WizardStates::Exit(ExitEvent { ctx: sm.ctx }.into()),
                Some(trigger) => {
                    unreachable!("illegal trigger {:?} at current state {:?}", trigger, sm)
                }
            },
            WizardStates::Exit(mut sm) => match sm.run(input) {
                // Terminal: the exit state never requests a transition.
                None => WizardStates::Exit(sm),
                Some(trigger) => {
                    unreachable!("illegal trigger {:?} at current state {:?}", trigger, sm)
                }
            },
        }
    }
}

// -----------------------------------------------------------------------------
// State from Event transitions
// -----------------------------------------------------------------------------

impl From<ShowMenuEvent> for WizardMachine<MenuState> {
    fn from(event: ShowMenuEvent) -> WizardMachine<MenuState> {
        info!("=> MainMenu");
        WizardMachine {
            ctx: event.ctx,
            state: MenuState {},
        }
    }
}

impl From<UploadFailedEvent> for WizardMachine<MenuState> {
    fn from(event: UploadFailedEvent) -> WizardMachine<MenuState> {
        // The failure reason stays in the session status; the menu shows it
        // as an error banner until a new transfer is started.
        error!("upload aborted: {}", event.ctx.session.status());
        info!("=> MainMenu");
        WizardMachine {
            ctx: event.ctx,
            state: MenuState {},
        }
    }
}

impl From<BrowseFilesEvent> for WizardMachine<FileSelectState> {
    fn from(event: BrowseFilesEvent) -> WizardMachine<FileSelectState> {
        info!("=> FileSelect");
        let mut ctx = event.ctx;
        // Auto-load the payload on entry, at most once per session: a file
        // that is already loaded is never reloaded.
        if !ctx.file.loaded {
            let name = ctx.payload_name();
            match ctx.store.load(&name) {
                Ok(file) => {
                    info!("payload `{}` loaded, {} bytes", file.name, file.size());
                    ctx.file = file;
                }
                Err(e) => {
                    // Non-fatal: the wizard stays on the file-selection
                    // screen with upload unavailable.
                    info!("error: {}", e.to_string());
                }
            }
        }
        WizardMachine {
            ctx,
            state: FileSelectState {},
        }
    }
}

impl From<BeginUploadEvent> for WizardMachine<UploadingState> {
    fn from(event: BeginUploadEvent) -> WizardMachine<UploadingState> {
        info!("=> Uploading");
        let mut ctx = event.ctx;
        // The guard (a loaded payload) was checked by the origin state.
        ctx.session.start();
        WizardMachine {
            ctx,
            state: UploadingState { sent: 0 },
        }
    }
}

impl From<UploadDoneEvent> for WizardMachine<CompleteState> {
    fn from(event: UploadDoneEvent) -> WizardMachine<CompleteState> {
        info!("=> Complete");
        WizardMachine {
            ctx: event.ctx,
            state: CompleteState {},
        }
    }
}

impl From<ExitEvent> for WizardMachine<ExitState> {
    fn from(event: ExitEvent) -> WizardMachine<ExitState> {
        info!("=> Exit");
        WizardMachine {
            ctx: event.ctx,
            state: ExitState {},
        }
    }
}
