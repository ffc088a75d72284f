//! Console rendering of session progress
//!
//! Follows a [`ProgressSubscription`] and redraws a single status line per
//! event: spinner, step counter, bar, percentage and ETA.

use console::style;

use crate::generation::{ProgressEvent, ProgressSubscription};
use crate::types::SessionStatus;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Console progress renderer
pub struct ConsoleRenderer {
    show_spinner: bool,
    show_eta: bool,
    frame: usize,
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self {
            show_spinner: true,
            show_eta: true,
            frame: 0,
        }
    }

    pub fn with_spinner(mut self, show: bool) -> Self {
        self.show_spinner = show;
        self
    }

    pub fn with_eta(mut self, show: bool) -> Self {
        self.show_eta = show;
        self
    }

    /// One line for one event
    pub fn render(&mut self, event: &ProgressEvent) -> String {
        let progress = &event.progress;
        match event.status {
            SessionStatus::Completed => {
                return format!("{} Completed {} steps", style("✓").green(), progress.total_steps);
            }
            SessionStatus::Failed => {
                let message = progress
                    .error_message
                    .as_deref()
                    .unwrap_or(&progress.status_message);
                return format!("{} {}", style("✗").red(), message);
            }
            SessionStatus::Cancelled => {
                return format!("{} Cancelled", style("⊘").yellow());
            }
            SessionStatus::Starting | SessionStatus::InProgress => {}
        }

        let spinner = if self.show_spinner {
            self.frame = (self.frame + 1) % SPINNER.len();
            format!("{} ", SPINNER[self.frame])
        } else {
            String::new()
        };

        let eta = match (self.show_eta, progress.eta_seconds) {
            (true, Some(secs)) => format!(" ETA: {}", format_duration(secs.round() as u64)),
            _ => String::new(),
        };

        format!(
            "{}[{}/{}] {} {} {}%{}",
            spinner,
            progress.current_step_number,
            progress.total_steps,
            progress.current_step,
            render_progress_bar(progress.progress as usize, 100, 30),
            progress.progress,
            eta
        )
    }

    /// Print every event until the session ends; returns the terminal event
    pub async fn follow(mut self, mut subscription: ProgressSubscription) -> Option<ProgressEvent> {
        let mut last = None;
        while let Some(event) = subscription.recv().await {
            let line = self.render(&event);
            if event.is_terminal() {
                println!("\r\x1B[K{}", line);
            } else {
                print!("\r\x1B[K{}", line);
            }
            last = Some(event);
        }
        last
    }
}

/// Render a simple progress bar
fn render_progress_bar(completed: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return format!("[{}]", " ".repeat(width));
    }

    let progress = (completed as f32 / total as f32).min(1.0);
    let filled = (progress * width as f32) as usize;
    let empty = width.saturating_sub(filled);

    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format duration as human-readable string
fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
