use std::sync::Arc;

use parking_lot::RwLock;

use crate::platform::TerminalControl;

/// Visible size of a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalGeometry {
    pub columns: u16,
    pub rows: u16,
}

impl TerminalGeometry {
    /// `None` if either dimension is zero; some terminals report 0x0 when
    /// they have no real window.
    pub fn new(columns: u16, rows: u16) -> Option<Self> {
        if columns == 0 || rows == 0 {
            return None;
        }
        Some(Self { columns, rows })
    }
}

/// Queries the host terminal's geometry and remembers the last good answer.
///
/// Clones share the remembered value, so the resize listener and the child
/// handle see the same geometry.
#[derive(Clone)]
pub struct GeometryAdapter {
    terminal: Arc<dyn TerminalControl>,
    last: Arc<RwLock<Option<TerminalGeometry>>>,
}

impl GeometryAdapter {
    pub fn new(terminal: Arc<dyn TerminalControl>) -> Self {
        Self {
            terminal,
            last: Arc::new(RwLock::new(None)),
        }
    }

    /// Re-query the terminal.
    ///
    /// Returns `None` without touching the terminal when stdin is not a tty.
    /// A failed query also returns `None` and leaves [`last`](Self::last)
    /// unchanged.
    pub fn sync(&self) -> Option<TerminalGeometry> {
        if !self.terminal.input_is_terminal() {
            return None;
        }

        match self.terminal.size() {
            Ok(geometry) => {
                let previous = self.last.write().replace(geometry);
                if previous != Some(geometry) {
                    tracing::debug!(
                        columns = geometry.columns,
                        rows = geometry.rows,
                        "terminal geometry updated"
                    );
                }
                Some(geometry)
            }
            Err(e) => {
                tracing::trace!("terminal geometry query failed: {}", e);
                None
            }
        }
    }

    /// Last geometry a successful [`sync`](Self::sync) produced.
    pub fn last(&self) -> Option<TerminalGeometry> {
        *self.last.read()
    }
}
