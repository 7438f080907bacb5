//! Terminal progress renderer.
//!
//! [`TerminalUI`] implements the poll loop's sink over an `indicatif` bar.
//! It only draws what it is handed — it owns no timers and performs no
//! polling. The bar stays hidden until the first non-zero value, matching
//! the gauge's hide-at-zero behavior.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::poll::{ProgressSink, Severity};
use crate::progress::ProgressValue;
use crate::ui::icons::{CHECK, CROSS, LINK, WARN};

pub struct TerminalUI {
    bar: ProgressBar,
    verbose: bool,
    shown: bool,
}

impl TerminalUI {
    /// Create the renderer. With `verbose`, server-side activity log lines
    /// are printed above the bar as they arrive.
    pub fn new(verbose: bool) -> Self {
        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::hidden());
        let bar_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");
        bar.set_style(bar_style);
        bar.set_prefix("Generating");
        Self {
            bar,
            verbose,
            shown: false,
        }
    }

    /// Print the results link after a terminal transition.
    pub fn print_redirect(&self, url: &str) {
        println!("{} Results: {}", LINK, style(url).cyan().underlined());
    }
}

impl ProgressSink for TerminalUI {
    fn on_progress(&mut self, value: ProgressValue, label: &str) {
        if !self.shown && value.as_f64() > 0.0 {
            self.bar.set_draw_target(ProgressDrawTarget::stderr());
            self.shown = true;
        }
        self.bar.set_position(value.rounded());
        self.bar.set_message(label.to_string());
    }

    fn notify(&mut self, severity: Severity, message: &str) {
        self.bar.finish_and_clear();
        match severity {
            Severity::Info => println!("{}{}", CHECK, style(message).green()),
            Severity::Warning => println!("{}{}", WARN, style(message).yellow()),
            Severity::Error => eprintln!("{}{}", CROSS, style(message).red()),
        }
    }

    fn on_log(&mut self, line: &str) {
        if self.verbose {
            self.bar.println(format!("  {}", style(line).dim()));
        }
    }
}
