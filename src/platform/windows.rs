use std::io::{self, IsTerminal};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size as console_size};

use crate::platform::TerminalControl;
use crate::terminal::TerminalGeometry;

/// Windows console backend.
///
/// Raw input clears the console's line-input, echo and processed-input
/// flags, the console equivalent of binary mode. There is no resize
/// notification channel, so geometry is only read when asked.
#[derive(Debug, Default)]
pub struct WindowsTerminal;

impl WindowsTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl TerminalControl for WindowsTerminal {
    fn input_is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn enable_raw_input(&self) -> io::Result<()> {
        enable_raw_mode()
    }

    fn restore_input(&self) -> io::Result<()> {
        disable_raw_mode()
    }

    fn size(&self) -> io::Result<TerminalGeometry> {
        // Visible window of the screen buffer, not the whole buffer.
        let (columns, rows) = console_size()?;
        TerminalGeometry::new(columns, rows)
            .ok_or_else(|| io::Error::other("console reported a zero size"))
    }
}
