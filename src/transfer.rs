//! Transfer session progress model.
//!
//! The session owns the 0..=100 progress value shown on the uploading screen
//! and nothing else: it performs no I/O and has no side effects beyond its
//! own fields. The wizard advances it once per tick while uploading and the
//! link adapter's chunk results decide whether a tick advances or aborts it.

// =============================================================================
// Public Interface
// =============================================================================

/// Progress added by one successful tick, in percent. A full transfer takes
/// `100 / PROGRESS_STEP` ticks.
pub const PROGRESS_STEP: u8 = 2;

/// One in-progress or finished transfer.
///
/// Invariants:
///
///  * `progress` is monotonically non-decreasing while the session is
///    active.
///  * the session deactivates exactly when `progress` reaches 100 (via
///    [`complete_if_done`](TransferSession::complete_if_done)) or when a
///    failure is recorded (via [`abort`](TransferSession::abort)).
///
/// A finished session is only ever reset by starting a new one.
#[derive(Debug, Clone, Default)]
pub struct TransferSession {
    active: bool,
    progress: u8,
    status: String,
    failed: bool,
}
impl TransferSession {
    /// The idle session owned by the application before any upload.
    pub fn idle() -> Self {
        TransferSession::default()
    }

    /// Begin a new transfer, discarding any previous one.
    ///
    /// Only valid when a payload is loaded; the wizard guards the call.
    pub fn start(&mut self) {
        self.active = true;
        self.progress = 0;
        self.failed = false;
        self.status = "Starting upload...".to_owned();
    }

    /// Advance the simulated progress by one tick. Clamps at 100.
    ///
    /// The fixed per-tick step stands in for real link throughput; with a
    /// byte-accurate link the step would be derived from bytes sent.
    pub fn advance(&mut self) {
        if !self.active {
            return;
        }
        self.progress = self.progress.saturating_add(PROGRESS_STEP).min(100);
    }

    /// Finalize the session once progress has reached 100.
    ///
    /// Idempotent: calling it on an already complete session changes
    /// nothing. Returns whether the session is complete.
    pub fn complete_if_done(&mut self) -> bool {
        if self.progress >= 100 && !self.failed {
            self.active = false;
            self.status = "Upload complete!".to_owned();
            return true;
        }
        false
    }

    /// Record a transfer failure and deactivate the session.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.active = false;
        self.failed = true;
        self.status = reason.into();
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// True once the transfer ran to completion without failure.
    pub fn is_complete(&self) -> bool {
        !self.active && !self.failed && self.progress >= 100
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[test]
fn idle_session_is_inactive() {
    let session = TransferSession::idle();
    assert!(!session.active());
    assert!(!session.failed());
    assert_eq!(session.progress(), 0);
    assert!(session.status().is_empty());
}

#[test]
fn start_resets_the_session() {
    let mut session = TransferSession::idle();
    session.start();
    session.advance();
    session.abort("boom");

    session.start();
    assert!(session.active());
    assert!(!session.failed());
    assert_eq!(session.progress(), 0);
    assert_eq!(session.status(), "Starting upload...");
}

#[test]
fn advance_is_monotone_and_clamped() {
    let mut session = TransferSession::idle();
    session.start();
    let mut last = 0;
    for _ in 0..80 {
        session.advance();
        assert!(session.progress() >= last);
        assert!(session.progress() <= 100);
        last = session.progress();
    }
    assert_eq!(session.progress(), 100);
}

#[test]
fn advance_on_inactive_session_is_a_no_op() {
    let mut session = TransferSession::idle();
    session.advance();
    assert_eq!(session.progress(), 0);
}

#[test]
fn full_transfer_takes_fifty_ticks() {
    let mut session = TransferSession::idle();
    session.start();
    for tick in 1u8..=50 {
        session.advance();
        assert_eq!(session.progress(), tick * PROGRESS_STEP);
    }
    assert!(session.complete_if_done());
    assert!(!session.active());
    assert_eq!(session.status(), "Upload complete!");
}

#[test]
fn complete_if_done_is_idempotent() {
    let mut session = TransferSession::idle();
    session.start();
    for _ in 0..50 {
        session.advance();
    }
    assert!(session.complete_if_done());
    let snapshot = session.clone();
    assert!(session.complete_if_done());
    assert_eq!(session.active(), snapshot.active());
    assert_eq!(session.progress(), snapshot.progress());
    assert_eq!(session.status(), snapshot.status());
    assert_eq!(session.failed(), snapshot.failed());
}

#[test]
fn complete_if_done_before_the_end_does_nothing() {
    let mut session = TransferSession::idle();
    session.start();
    session.advance();
    assert!(!session.complete_if_done());
    assert!(session.active());
    assert_eq!(session.status(), "Starting upload...");
}

#[test]
fn abort_records_the_reason() {
    let mut session = TransferSession::idle();
    session.start();
    session.advance();
    session.abort("peripheral is not connected");
    assert!(!session.active());
    assert!(session.failed());
    assert!(!session.is_complete());
    assert_eq!(session.status(), "peripheral is not connected");
}
