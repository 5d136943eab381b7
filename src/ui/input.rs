//! Per-tick decoded keyboard input.
//!
//! The wizard consumes one [`InputEvent`] per tick and never polls devices
//! itself; this is the collaborator doing the raw polling. The poll timeout
//! doubles as the tick pacing: one call, one tick.

use std::io::stdout;
use std::{process, time::Duration};

use crossterm::{
    cursor::{Hide, MoveToColumn, Show},
    event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
    Result,
};

use crate::wizard::InputEvent;

/// Wait up to `timeout` for a key and decode it.
///
/// `Enter` confirms, `Esc` cancels, `q` requests exit. A timeout with no
/// event decodes to [`InputEvent::Idle`].
pub fn poll_input(timeout: Duration) -> Result<InputEvent> {
    enable_raw_mode()?;
    execute!(stdout(), Hide)?;
    let result = poll(timeout)?;
    execute!(stdout(), MoveToColumn(0), Show)?;
    disable_raw_mode()?;

    if result {
        // It's guaranteed that read() wont block if `poll` returns `Ok(true)`
        let event = read()?;

        if event == Event::Key(KeyCode::Enter.into()) {
            return Ok(InputEvent::Confirm);
        }
        if event == Event::Key(KeyCode::Esc.into()) {
            return Ok(InputEvent::Cancel);
        }
        if event == Event::Key(KeyCode::Char('q').into()) {
            return Ok(InputEvent::Exit);
        }
        if event
            == Event::Key(KeyEvent {
                modifiers: KeyModifiers::CONTROL,
                code: KeyCode::Char('c'),
            })
        {
            // As we are in raw mode, Ctrl+C will be captured here as a key
            // event. Catch it and exit the process if that happens
            process::exit(0);
        }
    } else {
        // Timeout expired with no event
    }

    Ok(InputEvent::Idle)
}
