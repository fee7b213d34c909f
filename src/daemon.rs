//! Detaching from the controlling terminal.

use std::io;

use tracing::info;

/// Fork into the background, start a new session, change directory to `/`
/// and point stdio at `/dev/null`.
///
/// Must run before any async runtime or other thread exists: only the calling
/// thread survives the fork.
pub fn daemonize() -> io::Result<()> {
    info!("Detaching from terminal");

    // SAFETY: daemon(3) only forks and redirects file descriptors; no other
    // threads exist yet, so the child inherits a consistent process.
    let rc = unsafe { libc::daemon(0, 0) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
