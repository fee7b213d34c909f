//! X11 idle source via the MIT-SCREEN-SAVER extension.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::screensaver;
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use super::{IdleError, IdleSource};

/// Reads `ms_since_user_input` for the default screen's root window.
pub struct X11Source {
    conn: RustConnection,
    root: Window,
}

impl X11Source {
    /// Connect to `display`, or to `$DISPLAY` when `None`.
    pub fn connect(display: Option<&str>) -> Result<Self, IdleError> {
        let (conn, screen_num) = x11rb::connect(display)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or(IdleError::NoScreen(screen_num))?;

        if conn
            .extension_information(screensaver::X11_EXTENSION_NAME)?
            .is_none()
        {
            return Err(IdleError::ExtensionMissing);
        }

        let version = screensaver::query_version(&conn, 1, 1)?.reply()?;
        debug!(
            "Connected to X11 screen {} (screensaver {}.{})",
            screen_num, version.server_major_version, version.server_minor_version
        );

        Ok(Self { conn, root })
    }
}

#[async_trait]
impl IdleSource for X11Source {
    async fn query_idle(&mut self) -> Result<Duration, IdleError> {
        let info = screensaver::query_info(&self.conn, self.root)?.reply()?;
        trace!("X11 idle: {} ms", info.ms_since_user_input);
        Ok(Duration::from_millis(u64::from(info.ms_since_user_input)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires X11 display
    async fn test_query_idle_live() {
        let mut source = X11Source::connect(None).unwrap();
        let first = source.query_idle().await.unwrap();
        let second = source.query_idle().await.unwrap();
        println!("Idle: {first:?} then {second:?}");
    }

    #[test]
    fn test_connect_bad_display_fails() {
        let err = X11Source::connect(Some(":4242")).err().unwrap();
        assert!(matches!(err, IdleError::Connect(_)));
    }
}
