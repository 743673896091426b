//! Terminal setup and teardown.
//!
//! Raw mode outlives the process if nobody turns it off, so every way out of
//! the TUI (normal exit, a failed setup step, an error in the loop, a panic)
//! goes through [`restore`].

use crossterm::{
    cursor::Show,
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Put the terminal back the way the shell expects it.
pub fn restore() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste,
        Show
    )
}

/// Restores the terminal on drop unless [`release`](Self::release) already did.
pub struct TerminalGuard {
    restore: fn() -> io::Result<()>,
    armed: bool,
}

impl TerminalGuard {
    fn new(restore: fn() -> io::Result<()>) -> Self {
        Self {
            restore,
            armed: true,
        }
    }

    /// Restore now and report the outcome.
    pub fn release(mut self) -> io::Result<()> {
        self.armed = false;
        (self.restore)()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = (self.restore)();
        }
    }
}

/// Enter raw mode and the alternate screen. If any step after raw mode
/// fails, the guard undoes what was done before the error is returned.
pub fn init() -> io::Result<(Tui, TerminalGuard)> {
    enable_raw_mode()?;
    let guard = TerminalGuard::new(restore);
    execute!(
        io::stdout(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    Ok((terminal, guard))
}

/// Restore the terminal before the default hook prints the panic.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
