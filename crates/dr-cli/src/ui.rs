use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{GlobalFlags, OutputFormat};

#[derive(Clone, Copy, Debug)]
pub struct UiPrefs {
    /// Show spinners and interim notes on stderr.
    pub progress: bool,
    /// Print interim notes at all (plan, task changes).
    pub chatter: bool,
}

static UI_PREFS: OnceLock<UiPrefs> = OnceLock::new();

pub fn init(flags: &GlobalFlags) {
    let is_tty = std::io::stderr().is_terminal();
    let chatter = !flags.quiet && flags.format == OutputFormat::Text;
    let _ = UI_PREFS.set(UiPrefs {
        progress: chatter && is_tty,
        chatter,
    });
}

#[must_use]
pub fn prefs() -> UiPrefs {
    *UI_PREFS.get().unwrap_or(&UiPrefs {
        progress: false,
        chatter: false,
    })
}
