//! End-to-end tests for the wizard workflow, driven tick by tick against an
//! in-memory payload store and a scripted link double.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use uplink::wizard::{self, InputEvent, Screen, Wizard};
use uplink::{
    FakeLink, FileStore, LoadedFile, SettingsBuilder, StoreError, DEFAULT_PAYLOAD, PROGRESS_STEP,
};

// =============================================================================
// Test doubles and helpers
// =============================================================================

/// An in-memory payload store counting how often `load` was invoked.
#[derive(Debug, Default)]
struct MemStore {
    files: HashMap<String, Vec<u8>>,
    loads: Rc<Cell<u32>>,
}
impl MemStore {
    fn with_default_payload(size: usize) -> (Self, Rc<Cell<u32>>) {
        let mut files = HashMap::new();
        files.insert(DEFAULT_PAYLOAD.to_owned(), vec![0x42; size]);
        let loads = Rc::new(Cell::new(0));
        (
            MemStore {
                files,
                loads: Rc::clone(&loads),
            },
            loads,
        )
    }

    fn empty() -> (Self, Rc<Cell<u32>>) {
        let loads = Rc::new(Cell::new(0));
        (
            MemStore {
                files: HashMap::new(),
                loads: Rc::clone(&loads),
            },
            loads,
        )
    }
}
impl FileStore for MemStore {
    fn load(&mut self, name: &str) -> Result<LoadedFile, StoreError> {
        self.loads.set(self.loads.get() + 1);
        match self.files.get(name) {
            Some(bytes) => Ok(LoadedFile {
                name: name.to_owned(),
                bytes: bytes.clone(),
                loaded: true,
            }),
            None => Err(StoreError::NotFound {
                name: name.to_owned(),
            }),
        }
    }
}

fn wizard_with(store: MemStore, link: FakeLink) -> Wizard {
    let settings = SettingsBuilder::new().finalize();
    wizard::factory(settings, Box::new(store), Box::new(link))
}

fn drive(wizard: &mut Wizard, inputs: &[InputEvent]) {
    for input in inputs {
        wizard.step(*input);
    }
}

fn idle_ticks(wizard: &mut Wizard, n: u32) {
    for _ in 0..n {
        wizard.step(InputEvent::Idle);
    }
}

/// Confirm through Start and MainMenu into FileSelect.
fn enter_file_select(wizard: &mut Wizard) {
    drive(wizard, &[InputEvent::Confirm, InputEvent::Confirm]);
    assert_eq!(wizard.screen(), Screen::FileSelect);
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn starts_on_the_start_screen() {
    let (store, _) = MemStore::empty();
    let wizard = wizard_with(store, FakeLink::new(false));
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::Start);
    assert!(!snap.file_loaded);
    assert_eq!(snap.progress, 0);
    assert!(!wizard.is_finished());
}

#[test]
fn idle_ticks_do_not_leave_the_start_screen() {
    let (store, _) = MemStore::empty();
    let mut wizard = wizard_with(store, FakeLink::new(true));
    idle_ticks(&mut wizard, 100);
    assert_eq!(wizard.screen(), Screen::Start);
    // The display timer keeps counting for the blinking prompt.
    assert_eq!(wizard.snapshot().start_timer, 100);
}

#[test]
fn confirm_moves_from_start_to_menu() {
    let (store, _) = MemStore::empty();
    let mut wizard = wizard_with(store, FakeLink::new(false));
    wizard.step(InputEvent::Confirm);
    assert_eq!(wizard.screen(), Screen::MainMenu);
}

// While the probe reports the peripheral absent, confirm on the menu is a
// no-op and nothing is loaded.
#[test]
fn disconnected_peripheral_blocks_the_menu() {
    let (store, loads) = MemStore::with_default_payload(16);
    let mut wizard = wizard_with(store, FakeLink::new(false));
    wizard.step(InputEvent::Confirm);

    for _ in 0..5 {
        wizard.step(InputEvent::Confirm);
        assert_eq!(wizard.screen(), Screen::MainMenu);
    }
    assert!(!wizard.snapshot().link_connected);
    assert_eq!(loads.get(), 0);
}

// With the peripheral connected, confirm opens file selection and the
// payload auto-loads exactly once.
#[test]
fn connected_peripheral_opens_file_selection_and_loads_once() {
    let (store, loads) = MemStore::with_default_payload(16);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);

    let snap = wizard.snapshot();
    assert!(snap.link_connected);
    assert!(snap.file_loaded);
    assert_eq!(loads.get(), 1);

    // Lingering on the screen does not reload.
    idle_ticks(&mut wizard, 10);
    assert_eq!(loads.get(), 1);

    // Neither does going back to the menu and re-entering: the payload is
    // already loaded.
    drive(&mut wizard, &[InputEvent::Cancel, InputEvent::Confirm]);
    assert_eq!(wizard.screen(), Screen::FileSelect);
    assert_eq!(loads.get(), 1);
}

// A loaded payload is reported with its resolved name and exact size.
#[test]
fn loaded_payload_reports_name_and_size() {
    let (store, _) = MemStore::with_default_payload(1024);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);

    let snap = wizard.snapshot();
    assert!(snap.file_loaded);
    assert_eq!(snap.file_size, 1024);
    assert_eq!(snap.file_name, DEFAULT_PAYLOAD);
}

// A missing payload parks the wizard in file selection.
#[test]
fn missing_payload_makes_upload_unavailable() {
    let (store, loads) = MemStore::empty();
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);

    let snap = wizard.snapshot();
    assert!(!snap.file_loaded);
    assert_eq!(loads.get(), 1);

    // Confirm must not start an upload without a payload.
    for _ in 0..3 {
        wizard.step(InputEvent::Confirm);
        assert_eq!(wizard.screen(), Screen::FileSelect);
    }
    assert_eq!(wizard.snapshot().progress, 0);
}

#[test]
fn cancel_returns_from_file_selection_to_menu() {
    let (store, _) = MemStore::with_default_payload(16);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);
    wizard.step(InputEvent::Cancel);
    assert_eq!(wizard.screen(), Screen::MainMenu);
}

// A full transfer takes exactly 100 / PROGRESS_STEP ticks.
#[test]
fn upload_runs_to_completion() {
    let ticks_to_complete = (100 / PROGRESS_STEP) as u32;
    let (store, _) = MemStore::with_default_payload(1024);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);

    wizard.step(InputEvent::Confirm);
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::Uploading);
    assert_eq!(snap.progress, 0);
    assert_eq!(snap.status, "Starting upload...");

    let mut last = 0;
    for _ in 0..ticks_to_complete - 1 {
        wizard.step(InputEvent::Idle);
        let progress = wizard.snapshot().progress;
        assert!(progress >= last, "progress must be non-decreasing");
        assert_eq!(wizard.screen(), Screen::Uploading);
        last = progress;
    }
    assert_eq!(last, 100 - PROGRESS_STEP);

    wizard.step(InputEvent::Idle);
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::Complete);
    assert_eq!(snap.progress, 100);
    assert_eq!(snap.status, "Upload complete!");
    assert!(!snap.transfer_failed);
}

#[test]
fn input_is_ignored_while_uploading() {
    let (store, _) = MemStore::with_default_payload(64);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);
    wizard.step(InputEvent::Confirm);

    // Confirm and cancel neither interrupt nor restart the transfer.
    wizard.step(InputEvent::Confirm);
    wizard.step(InputEvent::Cancel);
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::Uploading);
    assert_eq!(snap.progress, 2 * PROGRESS_STEP);
}

#[test]
fn completion_screen_returns_to_menu_and_allows_another_upload() {
    let (store, loads) = MemStore::with_default_payload(64);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);
    wizard.step(InputEvent::Confirm);
    idle_ticks(&mut wizard, (100 / PROGRESS_STEP) as u32);
    assert_eq!(wizard.screen(), Screen::Complete);

    wizard.step(InputEvent::Confirm);
    assert_eq!(wizard.screen(), Screen::MainMenu);

    // Round two: the payload is still loaded, the session starts fresh.
    drive(&mut wizard, &[InputEvent::Confirm, InputEvent::Confirm]);
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::Uploading);
    assert_eq!(snap.progress, 0);
    assert_eq!(loads.get(), 1);
}

// The open-question policy: a failed transfer routes back to the menu with
// the reason surfaced, never silently treated as success.
#[test]
fn link_failure_aborts_the_upload_to_the_menu() {
    let failing_at_chunk = 10;
    let (store, _) = MemStore::with_default_payload(1000);
    let link = FakeLink::new(true).failing_after(failing_at_chunk);
    let mut wizard = wizard_with(store, link);
    enter_file_select(&mut wizard);
    wizard.step(InputEvent::Confirm);

    idle_ticks(&mut wizard, failing_at_chunk);
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::Uploading);
    assert_eq!(snap.progress, failing_at_chunk as u8 * PROGRESS_STEP);

    // The next chunk errors: the session aborts and the wizard falls back
    // to the menu with the failure banner data set.
    wizard.step(InputEvent::Idle);
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::MainMenu);
    assert!(snap.transfer_failed);
    assert!(snap.status.starts_with("Upload failed"));
    assert_eq!(snap.progress, failing_at_chunk as u8 * PROGRESS_STEP);

    // Starting a new transfer clears the failure.
    drive(&mut wizard, &[InputEvent::Confirm, InputEvent::Confirm]);
    let snap = wizard.snapshot();
    assert_eq!(snap.screen, Screen::Uploading);
    assert!(!snap.transfer_failed);
    assert_eq!(snap.progress, 0);
}

#[test]
fn exit_is_honored_from_every_screen() {
    let paths: Vec<&[InputEvent]> = vec![
        // Start, MainMenu, FileSelect, Uploading.
        &[],
        &[InputEvent::Confirm],
        &[InputEvent::Confirm, InputEvent::Confirm],
        &[
            InputEvent::Confirm,
            InputEvent::Confirm,
            InputEvent::Confirm,
        ],
    ];

    for path in &paths {
        let (store, _) = MemStore::with_default_payload(16);
        let mut wizard = wizard_with(store, FakeLink::new(true));
        drive(&mut wizard, path);
        wizard.step(InputEvent::Exit);
        assert_eq!(wizard.screen(), Screen::Exit);
        assert!(wizard.is_finished());
    }

    // And from the completion screen.
    let (store, _) = MemStore::with_default_payload(16);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    drive(
        &mut wizard,
        &[
            InputEvent::Confirm,
            InputEvent::Confirm,
            InputEvent::Confirm,
        ],
    );
    idle_ticks(&mut wizard, (100 / PROGRESS_STEP) as u32);
    assert_eq!(wizard.screen(), Screen::Complete);
    wizard.step(InputEvent::Exit);
    assert!(wizard.is_finished());
}

#[test]
fn exit_is_terminal() {
    let (store, _) = MemStore::empty();
    let mut wizard = wizard_with(store, FakeLink::new(true));
    wizard.step(InputEvent::Exit);
    assert!(wizard.is_finished());

    drive(
        &mut wizard,
        &[InputEvent::Confirm, InputEvent::Cancel, InputEvent::Idle],
    );
    assert_eq!(wizard.screen(), Screen::Exit);
    assert!(wizard.is_finished());
}

#[test]
fn connectivity_is_only_polled_on_the_menu() {
    // The connectivity snapshot is refreshed on the menu only; off the menu
    // it keeps the value captured there.
    let (store, _) = MemStore::with_default_payload(16);
    let mut wizard = wizard_with(store, FakeLink::new(true));
    enter_file_select(&mut wizard);
    let before = wizard.snapshot().link_connected;
    idle_ticks(&mut wizard, 5);
    assert_eq!(wizard.snapshot().link_connected, before);
}
