//! Shared data carried by the wizard state machine across all states.

use crate::link::LinkAdapter;
use crate::settings::{Settings, DEFAULT_PAYLOAD};
use crate::store::{FileStore, LoadedFile};
use crate::transfer::TransferSession;

/// All application data the wizard owns for its whole lifetime.
///
/// The wizard handles one file and one transfer at a time by design, so the
/// [`LoadedFile`] and [`TransferSession`] are single instances living here
/// rather than per-request allocations. The context is constructed once at
/// startup and moved from state to state through the transition events; no
/// state machine data lives in globals.
#[derive(Debug)]
pub(crate) struct AppContext {
    pub settings: Settings,
    /// The single payload slot. Populated at most once per entry to the
    /// file-selection state while nothing is loaded yet.
    pub file: LoadedFile,
    /// The single transfer slot. Reset only by starting a new transfer.
    pub session: TransferSession,
    /// Connectivity snapshot, refreshed once per tick while on the menu
    /// state only. Never cached across states.
    pub link_connected: bool,
    pub store: Box<dyn FileStore>,
    pub link: Box<dyn LinkAdapter>,
}
impl AppContext {
    pub(crate) fn new(
        settings: Settings,
        store: Box<dyn FileStore>,
        link: Box<dyn LinkAdapter>,
    ) -> Self {
        AppContext {
            settings,
            file: LoadedFile::empty(),
            session: TransferSession::idle(),
            link_connected: false,
            store,
            link,
        }
    }

    /// The payload name to load: the configured one, or the well-known
    /// default when none was configured.
    pub(crate) fn payload_name(&self) -> String {
        match &self.settings.payload {
            Some(value) => value.clone(),
            None => DEFAULT_PAYLOAD.into(),
        }
    }
}
