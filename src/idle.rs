//! Idle time sources.
//!
//! This module provides a backend-agnostic way of asking the desktop how long
//! the session has gone without user input. Sources are polled; none of them
//! push notifications.

mod mutter;
mod x11;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use mutter::MutterSource;
pub use x11::X11Source;

use crate::config::Backend;

/// Trait for idle time sources.
#[async_trait]
pub trait IdleSource: Send {
    /// Time elapsed since the last input event on the active session.
    async fn query_idle(&mut self) -> Result<Duration, IdleError>;
}

/// Errors that can occur while reading the idle counter.
#[derive(Error, Debug)]
pub enum IdleError {
    #[error("cannot open display")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("X11 connection failed")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("X11 request failed")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("screen {0} not found on display")]
    NoScreen(usize),

    #[error("MIT-SCREEN-SAVER extension not available")]
    ExtensionMissing,

    #[error("D-Bus request failed")]
    DBus(#[from] zbus::Error),

    #[error("idle source unavailable: {0}")]
    Unavailable(String),
}

/// Open the idle source for the given backend.
pub async fn open(backend: Backend) -> Result<Box<dyn IdleSource>, IdleError> {
    let source: Box<dyn IdleSource> = match backend {
        Backend::X11 => Box::new(X11Source::connect(None)?),
        Backend::Mutter => Box::new(MutterSource::connect().await?),
    };
    info!("Idle source ready: {}", backend);
    Ok(source)
}

/// Open the backend and take one sample, then drop the connection.
///
/// Used before detaching so a missing display is reported on the terminal.
pub async fn probe(backend: Backend) -> Result<Duration, IdleError> {
    let mut source = open(backend).await?;
    source.query_idle().await
}
