use std::io;

use crate::terminal::GeometryAdapter;

#[cfg(unix)]
use signal_hook::consts::signal::SIGWINCH;
#[cfg(unix)]
use signal_hook::iterator::Signals;
#[cfg(unix)]
use std::thread;

/// Re-syncs terminal geometry whenever the host terminal is resized.
///
/// On Unix this is a thread draining `SIGWINCH`. Other platforms have no
/// resize signal and `start` returns `Ok(None)`: geometry is then only read
/// once, at launch.
#[cfg_attr(not(unix), allow(dead_code))]
pub struct ResizeWatcher {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: thread::JoinHandle<()>,
}

impl ResizeWatcher {
    pub fn start(adapter: GeometryAdapter) -> io::Result<Option<Self>> {
        #[cfg(unix)]
        {
            let mut signals = Signals::new([SIGWINCH])?;
            let handle = signals.handle();
            let thread = thread::Builder::new()
                .name("termhost-resize".to_string())
                .spawn(move || {
                    for _ in signals.forever() {
                        adapter.sync();
                    }
                })?;
            Ok(Some(Self { handle, thread }))
        }

        #[cfg(not(unix))]
        {
            let _ = adapter;
            Ok(None)
        }
    }

    pub fn stop(self) {
        #[cfg(unix)]
        {
            self.handle.close();
            let _ = self.thread.join();
        }
    }
}
