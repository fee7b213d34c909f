//! idler - run a command once whenever the desktop session goes idle.
//!
//! Polls the desktop's idle counter and launches a user command the first
//! time the counter passes a threshold, then waits for real input before
//! arming again.

pub mod command;
pub mod config;
pub mod daemon;
pub mod idle;
pub mod launcher;
pub mod trigger;
