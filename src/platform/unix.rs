use std::io;
use std::os::fd::RawFd;

use parking_lot::Mutex;

use crate::platform::TerminalControl;
use crate::terminal::TerminalGeometry;

/// Unix terminal backend over one descriptor, stdin by default, so geometry
/// describes the terminal the host is actually reading from.
///
/// Raw input is `cfmakeraw` with the output flags put back. The child
/// writes to a pipe, so the line discipline is the only thing turning its
/// `\n` into `\r\n` on screen.
pub struct UnixTerminal {
    fd: RawFd,
    saved: Mutex<Option<libc::termios>>,
}

impl UnixTerminal {
    pub fn new() -> Self {
        Self::from_fd(libc::STDIN_FILENO)
    }

    /// Backend for an already open terminal descriptor. The descriptor is
    /// borrowed and must stay open while the backend is in use.
    pub fn from_fd(fd: RawFd) -> Self {
        Self {
            fd,
            saved: Mutex::new(None),
        }
    }
}

impl Default for UnixTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalControl for UnixTerminal {
    fn input_is_terminal(&self) -> bool {
        unsafe { libc::isatty(self.fd) == 1 }
    }

    fn enable_raw_input(&self) -> io::Result<()> {
        let mut saved = self.saved.lock();
        let original = get_attrs(self.fd)?;

        let mut raw = original;
        unsafe { libc::cfmakeraw(&mut raw) };
        raw.c_oflag = original.c_oflag;
        set_attrs(self.fd, &raw)?;

        // Repeated calls keep the first snapshot, the one to go back to.
        if saved.is_none() {
            *saved = Some(original);
        }
        Ok(())
    }

    fn restore_input(&self) -> io::Result<()> {
        let mut saved = self.saved.lock();
        if let Some(original) = *saved {
            set_attrs(self.fd, &original)?;
            *saved = None;
        }
        Ok(())
    }

    fn size(&self) -> io::Result<TerminalGeometry> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::ioctl(self.fd, libc::TIOCGWINSZ as _, &mut ws) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        TerminalGeometry::new(ws.ws_col, ws.ws_row)
            .ok_or_else(|| io::Error::other("terminal reported a zero size"))
    }
}

fn get_attrs(fd: RawFd) -> io::Result<libc::termios> {
    let mut attrs: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut attrs) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(attrs)
}

fn set_attrs(fd: RawFd, attrs: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, attrs) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(all(test, any(target_os = "linux", target_os = "macos")))]
mod tests {
    use super::*;

    /// Both ends of a pseudo-terminal, closed on drop.
    struct PtyPair {
        master: RawFd,
        slave: RawFd,
    }

    impl PtyPair {
        fn open(columns: u16, rows: u16) -> Self {
            let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
            ws.ws_col = columns;
            ws.ws_row = rows;
            let (mut master, mut slave) = (-1, -1);
            // `termp` is `*const` on some targets and `*mut` on others.
            let termp: *mut libc::termios = std::ptr::null_mut();
            let rc = unsafe {
                libc::openpty(&mut master, &mut slave, std::ptr::null_mut(), termp as _, &mut ws)
            };
            assert_eq!(rc, 0, "openpty failed: {}", io::Error::last_os_error());
            Self { master, slave }
        }
    }

    impl Drop for PtyPair {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.slave);
                libc::close(self.master);
            }
        }
    }

    #[test]
    fn reports_pty_dimensions() {
        let pty = PtyPair::open(132, 43);
        let terminal = UnixTerminal::from_fd(pty.slave);

        assert!(terminal.input_is_terminal());
        assert_eq!(terminal.size().unwrap(), TerminalGeometry::new(132, 43).unwrap());
    }

    #[test]
    fn adapter_follows_pty_resize() {
        let pty = PtyPair::open(80, 24);
        let adapter =
            crate::terminal::GeometryAdapter::new(std::sync::Arc::new(UnixTerminal::from_fd(pty.slave)));
        assert_eq!(adapter.sync(), TerminalGeometry::new(80, 24));

        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        ws.ws_col = 100;
        ws.ws_row = 30;
        assert_eq!(unsafe { libc::ioctl(pty.master, libc::TIOCSWINSZ as _, &ws) }, 0);

        assert_eq!(adapter.sync(), TerminalGeometry::new(100, 30));
        assert_eq!(adapter.last(), TerminalGeometry::new(100, 30));
    }

    #[test]
    fn zero_sized_pty_is_an_error() {
        let pty = PtyPair::open(0, 0);
        assert!(UnixTerminal::from_fd(pty.slave).size().is_err());
    }

    #[test]
    fn raw_input_keeps_output_processing() {
        let pty = PtyPair::open(80, 24);
        let terminal = UnixTerminal::from_fd(pty.slave);
        let before = get_attrs(pty.slave).unwrap();
        assert_ne!(before.c_oflag & libc::OPOST, 0);

        terminal.enable_raw_input().unwrap();
        let raw = get_attrs(pty.slave).unwrap();
        assert_eq!(raw.c_lflag & (libc::ICANON | libc::ECHO | libc::ISIG), 0);
        assert_eq!(raw.c_iflag & (libc::ICRNL | libc::IXON), 0);
        assert_ne!(raw.c_oflag & libc::OPOST, 0);
        assert_eq!(raw.c_oflag, before.c_oflag);

        terminal.restore_input().unwrap();
        let restored = get_attrs(pty.slave).unwrap();
        assert_eq!(restored.c_lflag, before.c_lflag);
        assert_eq!(restored.c_iflag, before.c_iflag);
    }

    #[test]
    fn second_enable_keeps_first_snapshot() {
        let pty = PtyPair::open(80, 24);
        let terminal = UnixTerminal::from_fd(pty.slave);
        let before = get_attrs(pty.slave).unwrap();

        terminal.enable_raw_input().unwrap();
        terminal.enable_raw_input().unwrap();
        terminal.restore_input().unwrap();

        assert_ne!(get_attrs(pty.slave).unwrap().c_lflag & libc::ICANON, 0);
        assert_eq!(get_attrs(pty.slave).unwrap().c_lflag, before.c_lflag);
        // Nothing left to restore.
        terminal.restore_input().unwrap();
    }

    #[test]
    fn non_terminal_descriptor_is_rejected() {
        let file = tempfile::tempfile().unwrap();
        let terminal = UnixTerminal::from_fd(std::os::fd::AsRawFd::as_raw_fd(&file));

        assert!(!terminal.input_is_terminal());
        assert!(terminal.enable_raw_input().is_err());
        assert!(terminal.size().is_err());
        // Nothing was saved, so restoring is a no-op.
        terminal.restore_input().unwrap();
    }
}
