//! Screen drawing for the wizard.
//!
//! The renderer consumes read-only [`Snapshot`]s and makes no workflow
//! decisions. The screen is cleared only when what is on it actually changes
//! to keep the output from flashing; within a screen only the dynamic lines
//! (the blinking prompt, the progress bar) are updated.

use std::io;

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

use crate::wizard::{Screen, Snapshot};

// =============================================================================
// Public Interface
// =============================================================================

pub struct Renderer {
    term: Term,
    // Last drawn screen content fingerprint: screen, connectivity, loaded.
    last: Option<(Screen, bool, bool)>,
    bar: Option<ProgressBar>,
    /// Ticks on the start screen before the continue prompt appears.
    blink_onset: u32,
    /// Blink half-period of the continue prompt, in ticks.
    blink_half: u32,
}
impl Renderer {
    /// A renderer paced by `tick_millis`, the wizard tick period.
    ///
    /// The continue prompt appears after one second on the start screen and
    /// blinks with a half-second half-period, whatever the tick rate.
    pub fn new(tick_millis: u64) -> Self {
        let tick_millis = tick_millis.max(1);
        Renderer {
            term: Term::stdout(),
            last: None,
            bar: None,
            blink_onset: (1000 / tick_millis) as u32,
            blink_half: ((500 / tick_millis) as u32).max(1),
        }
    }

    /// Draw the screen for this tick's snapshot.
    pub fn render(&mut self, snap: &Snapshot) -> io::Result<()> {
        let fingerprint = (snap.screen, snap.link_connected, snap.file_loaded);
        let changed = self.last != Some(fingerprint);
        if changed {
            if let Some(bar) = self.bar.take() {
                bar.finish_and_clear();
            }
            self.term.clear_screen()?;
            self.last = Some(fingerprint);
        }

        match snap.screen {
            Screen::Start => self.draw_start(snap, changed)?,
            Screen::MainMenu => {
                if changed {
                    self.draw_menu(snap)?;
                }
            }
            Screen::FileSelect => {
                if changed {
                    self.draw_file_select(snap)?;
                }
            }
            Screen::Uploading => self.draw_uploading(snap, changed)?,
            Screen::Complete => {
                if changed {
                    self.draw_complete(snap)?;
                }
            }
            Screen::Exit => {
                if changed {
                    self.term.write_line("[UP] 👋 bye")?;
                }
            }
        }
        Ok(())
    }
}
impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(50)
    }
}

// =============================================================================
// Private stuff
// =============================================================================

const BANNER_RULE: &str = "========================================";

impl Renderer {
    fn banner(&self, title: &str) -> io::Result<()> {
        self.term.write_line(BANNER_RULE)?;
        self.term
            .write_line(&format!("    {}", style(title).cyan().bold()))?;
        self.term.write_line(BANNER_RULE)?;
        self.term.write_line("")?;
        Ok(())
    }

    fn draw_start(&mut self, snap: &Snapshot, changed: bool) -> io::Result<()> {
        if changed {
            self.banner("uplink - Payload Uploader")?;
            self.term
                .write_line("Welcome! This tool pushes a payload file to a")?;
            self.term
                .write_line("peripheral device over the serial link.")?;
            self.term.write_line("")?;
        }
        // The continue prompt starts blinking after a second on screen.
        let prompt_row = 8;
        self.term.move_cursor_to(0, prompt_row)?;
        self.term.clear_line()?;
        if prompt_visible(snap.start_timer, self.blink_onset, self.blink_half) {
            self.term.write_line(&format!(
                "    {}",
                style(">>> Press Enter to Continue <<<").bold()
            ))?;
        }
        Ok(())
    }

    fn draw_menu(&mut self, snap: &Snapshot) -> io::Result<()> {
        self.banner("uplink - Payload Uploader")?;

        self.term.write_line("Peripheral Connection Status:")?;
        if snap.link_connected {
            self.term
                .write_line(&format!("  {} peripheral connected", style("[OK]").green()))?;
            self.term.write_line("")?;
            self.term.write_line("Ready to upload the payload!")?;
            self.term.write_line("")?;
            self.term.write_line(&format!(
                "    {}",
                style(">>> Press Enter to Upload <<<").bold()
            ))?;
        } else {
            self.term.write_line(&format!(
                "  {} peripheral not connected",
                style("[ERROR]").red()
            ))?;
            self.term.write_line("")?;
            self.term.write_line("Please connect the peripheral first:")?;
            self.term.write_line("  1. Plug the serial cable")?;
            self.term.write_line("  2. Power on the peripheral")?;
            self.term.write_line("")?;
            self.term
                .write_line("Upload is disabled until the peripheral is connected")?;
        }

        if snap.transfer_failed {
            self.term.write_line("")?;
            self.term
                .write_line(&format!("{}", style(&snap.status).red().bold()))?;
        }

        self.term.write_line("")?;
        self.term
            .write_line(&format!("    {}", style(">>> Press q to Exit <<<").dim()))?;
        Ok(())
    }

    fn draw_file_select(&mut self, snap: &Snapshot) -> io::Result<()> {
        self.banner("Select Payload File")?;

        self.term.write_line("File Information:")?;
        self.term
            .write_line(&format!("  Name:   {}", snap.file_name))?;
        self.term.write_line(&format!(
            "  Size:   {} bytes ({:.1} KB)",
            snap.file_size,
            snap.file_size as f64 / 1024.0
        ))?;
        self.term.write_line(&format!(
            "  Loaded: {}",
            if snap.file_loaded {
                style("Yes").green()
            } else {
                style("No").red()
            }
        ))?;
        self.term.write_line("")?;

        if snap.file_loaded {
            self.term.write_line(&format!(
                "    {}",
                style(">>> Press Enter to Upload File <<<").bold()
            ))?;
        } else {
            self.term
                .write_line("The payload could not be loaded; upload is unavailable.")?;
        }
        self.term
            .write_line(&format!("    {}", style(">>> Press Esc to Go Back <<<").dim()))?;
        Ok(())
    }

    fn draw_uploading(&mut self, snap: &Snapshot, changed: bool) -> io::Result<()> {
        if changed {
            self.banner("Uploading Payload")?;
            self.term
                .write_line(&format!("File: {}", snap.file_name))?;
            self.term
                .write_line(&format!("Size: {} bytes", snap.file_size))?;
            self.term.write_line("")?;
            self.term.write_line(&format!(
                "{}",
                style("Please do not disconnect the peripheral during upload.").yellow()
            ))?;
            self.term.write_line("")?;

            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("[UP] ⏩ {msg} [{bar:40.cyan/blue}] {pos}%")
                    .progress_chars("=>-"),
            );
            bar.set_message(snap.status.clone());
            self.bar = Some(bar);
        }
        if let Some(bar) = &self.bar {
            bar.set_position(snap.progress.into());
        }
        Ok(())
    }

    fn draw_complete(&mut self, snap: &Snapshot) -> io::Result<()> {
        self.banner("Upload Complete!")?;

        self.term
            .write_line(&format!("{}", style("SUCCESS!").green().bold()))?;
        self.term.write_line("")?;
        self.term
            .write_line(&format!("{}", style(&snap.status).green()))?;
        self.term.write_line("")?;
        self.term
            .write_line(&format!("File: {}", snap.file_name))?;
        self.term
            .write_line(&format!("Size: {} bytes", snap.file_size))?;
        self.term.write_line("")?;
        self.term.write_line(&format!(
            "    {}",
            style(">>> Press Enter to Continue <<<").bold()
        ))?;
        Ok(())
    }
}

fn prompt_visible(timer: u32, onset: u32, half: u32) -> bool {
    timer >= onset && (timer / half) % 2 == 0
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_blinks_after_one_second_at_the_default_tick() {
        // 50 ms ticks: onset after 20 ticks, 10-tick half-periods.
        let renderer = Renderer::new(50);
        assert_eq!(renderer.blink_onset, 20);
        assert_eq!(renderer.blink_half, 10);
        assert!(!prompt_visible(19, renderer.blink_onset, renderer.blink_half));
        assert!(prompt_visible(20, renderer.blink_onset, renderer.blink_half));
        assert!(!prompt_visible(30, renderer.blink_onset, renderer.blink_half));
        assert!(prompt_visible(40, renderer.blink_onset, renderer.blink_half));
    }

    #[test]
    fn blink_thresholds_follow_the_tick_period() {
        let renderer = Renderer::new(250);
        assert_eq!(renderer.blink_onset, 4);
        assert_eq!(renderer.blink_half, 2);

        // A tick slower than the half-period still blinks every tick.
        let renderer = Renderer::new(2000);
        assert_eq!(renderer.blink_onset, 0);
        assert_eq!(renderer.blink_half, 1);
    }
}
