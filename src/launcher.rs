//! Command launching.
//!
//! Spawns the watched command and waits for it to exit. Only one child runs
//! at a time: the trigger loop is suspended until `launch` returns.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::command::ResolvedCommand;

/// Errors that can occur while running the command.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{path}: failed to spawn")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for child")]
    Wait(#[source] io::Error),
}

/// Trait for anything that can run the resolved command to completion.
#[async_trait]
pub trait Launcher: Send {
    /// Run `command` and return once it has exited, whatever its status.
    async fn launch(&mut self, command: &ResolvedCommand) -> Result<ExitStatus, LaunchError>;
}

/// Exit code reported when the command could not be executed.
const EXEC_FAILED_STATUS: i32 = 127;

/// Whether a spawn error means no process could be created at all.
fn is_fork_failure(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(libc::EAGAIN | libc::ENOMEM))
}

/// Launches the command as a child process with inherited stdio.
#[derive(Debug, Default)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&mut self, command: &ResolvedCommand) -> Result<ExitStatus, LaunchError> {
        let spawned = Command::new(&command.path)
            .arg0(command.name())
            .args(command.args())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(source) if is_fork_failure(&source) => {
                return Err(LaunchError::Spawn {
                    path: command.path.display().to_string(),
                    source,
                });
            }
            // The process existed but could not exec: counts as a failed child.
            Err(source) => {
                debug!("{}: exec failed: {}", command.path.display(), source);
                return Ok(ExitStatus::from_raw(EXEC_FAILED_STATUS << 8));
            }
        };

        debug!("Spawned {} (pid {:?})", command.path.display(), child.id());

        child.wait().await.map_err(LaunchError::Wait)
    }
}
