//! Trigger state machine and polling loop.
//!
//! Implements the once-per-idle-period rule:
//! - Fire when idle time exceeds the threshold and nothing fired yet
//! - Re-arm once an idle sample drops below the one recorded at fire time

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::command::ResolvedCommand;
use crate::config::{Config, Threshold};
use crate::idle::{IdleError, IdleSource};
use crate::launcher::{LaunchError, Launcher};

/// Decision for a single idle sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Run the command now.
    Launch,
    /// Nothing to do; sleep until the next poll.
    Wait,
}

/// Whether the current idle period has already fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriggerState {
    /// Ready to fire on the next sample beyond the threshold.
    #[default]
    Armed,
    /// Fired during this idle period, at the recorded idle time.
    Fired { at: Duration },
}

/// Once-per-idle-period trigger.
#[derive(Debug)]
pub struct Trigger {
    threshold: Threshold,
    state: TriggerState,
}

impl Trigger {
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            state: TriggerState::Armed,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Feed one idle sample and decide whether to launch.
    pub fn observe(&mut self, idle: Duration) -> TriggerDecision {
        let decision = if self.state == TriggerState::Armed && self.threshold.is_exceeded_by(idle)
        {
            self.state = TriggerState::Fired { at: idle };
            TriggerDecision::Launch
        } else {
            TriggerDecision::Wait
        };

        // A smaller sample means input happened and the idle period is over.
        if let TriggerState::Fired { at } = self.state
            && idle < at
        {
            debug!("Idle time dropped to {:?} (fired at {:?}), re-arming", idle, at);
            self.state = TriggerState::Armed;
        }

        decision
    }
}

/// Errors that stop the trigger loop.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error(transparent)]
    Idle(#[from] IdleError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

/// Poll `source` forever, launching `command` once per idle period.
///
/// Returns only when the idle source or the launcher fails. The child's exit
/// status is ignored.
pub async fn run<S, L>(
    source: &mut S,
    launcher: &mut L,
    command: &ResolvedCommand,
    config: &Config,
) -> Result<(), TriggerError>
where
    S: IdleSource + ?Sized,
    L: Launcher + ?Sized,
{
    let mut trigger = Trigger::new(config.threshold);

    info!(
        "Watching for {} of idle time, polling every {:?}",
        config.threshold, config.poll_interval
    );

    loop {
        let idle = source.query_idle().await?;
        trace!("Idle sample: {:?}", idle);

        match trigger.observe(idle) {
            TriggerDecision::Launch => {
                info!(
                    "Idle for {:?}, running {}",
                    idle,
                    command.name().to_string_lossy()
                );
                launcher.launch(command).await?;
            }
            TriggerDecision::Wait => tokio::time::sleep(config.poll_interval).await,
        }
    }
}
