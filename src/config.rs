//! Runtime configuration for idler.
//!
//! Everything is decided once at startup from the command line and never
//! changes afterwards.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

/// Default idle threshold: 10 minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Upper bound for the threshold, low enough to never overflow a millisecond
/// counter.
pub const MAX_TIMEOUT_SECS: u64 = 4_000_000;

/// Delay between two idle samples when nothing fired.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised while turning command-line input into a [`Config`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0}: invalid timeout")]
    InvalidTimeout(String),

    #[error("must specify a command")]
    MissingCommand,
}

/// Idle time the session must exceed before the command fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Threshold(Duration);

impl Threshold {
    /// Build a threshold from whole seconds, rejecting anything above
    /// [`MAX_TIMEOUT_SECS`].
    pub fn from_secs(secs: u64) -> Result<Self, ConfigError> {
        if secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout(secs.to_string()));
        }
        Ok(Self(Duration::from_secs(secs)))
    }

    /// Threshold in milliseconds, the unit idle sources report in.
    pub fn as_millis(self) -> u64 {
        // Bounded by MAX_TIMEOUT_SECS * 1000, far below u64::MAX.
        u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX)
    }

    /// Whether an idle sample lies strictly beyond this threshold.
    pub fn is_exceeded_by(self, idle: Duration) -> bool {
        idle > self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl FromStr for Threshold {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidTimeout(s.to_string());

        // Parse signed so "-5" is reported as out of range rather than garbage.
        let secs: i64 = s.trim().parse().map_err(|_| invalid())?;
        let secs = u64::try_from(secs).map_err(|_| invalid())?;
        Self::from_secs(secs).map_err(|_| invalid())
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs())
    }
}

/// Desktop backend used to read the idle counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// X11 MIT-SCREEN-SAVER extension.
    #[default]
    X11,
    /// GNOME Mutter idle monitor over the session bus.
    Mutter,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

/// Main configuration for idler.
#[derive(Debug, Clone)]
pub struct Config {
    /// Idle time before the command fires (default: 600 seconds).
    pub threshold: Threshold,

    /// Sleep between samples when nothing fired (default: 100 ms).
    pub poll_interval: Duration,

    /// Idle counter backend (default: x11).
    pub backend: Backend,

    /// Stay attached to the terminal instead of daemonizing.
    pub foreground: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            poll_interval: POLL_INTERVAL,
            backend: Backend::default(),
            foreground: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.threshold.as_millis(), 600_000);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.backend, Backend::X11);
        assert!(!config.foreground);
    }

    #[test]
    fn test_threshold_stored_in_millis() {
        for secs in [0, 1, 59, 600, 86_400, MAX_TIMEOUT_SECS] {
            let threshold = Threshold::from_secs(secs).unwrap();
            assert_eq!(threshold.as_millis(), secs * 1000);
        }
    }

    #[test]
    fn test_threshold_upper_bound() {
        assert!(Threshold::from_secs(MAX_TIMEOUT_SECS).is_ok());
        assert_eq!(
            Threshold::from_secs(MAX_TIMEOUT_SECS + 1),
            Err(ConfigError::InvalidTimeout("4000001".to_string()))
        );
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!("0".parse::<Threshold>().unwrap().as_millis(), 0);
        assert_eq!("30".parse::<Threshold>().unwrap().as_millis(), 30_000);
        assert_eq!(
            "4000000".parse::<Threshold>().unwrap().as_millis(),
            4_000_000_000
        );
    }

    #[test]
    fn test_parse_threshold_rejects_bad_input() {
        for input in ["-1", "4000001", "abc", "", "10s", "99999999999999999999"] {
            assert_eq!(
                input.parse::<Threshold>(),
                Err(ConfigError::InvalidTimeout(input.to_string())),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_threshold_is_exceeded_strictly() {
        let threshold = Threshold::from_secs(600).unwrap();
        assert!(!threshold.is_exceeded_by(Duration::from_millis(599_999)));
        assert!(!threshold.is_exceeded_by(Duration::from_millis(600_000)));
        assert!(threshold.is_exceeded_by(Duration::from_millis(600_001)));
    }

    #[test]
    fn test_backend_display_matches_cli_names() {
        assert_eq!(Backend::X11.to_string(), "x11");
        assert_eq!(Backend::Mutter.to_string(), "mutter");
        for backend in Backend::value_variants() {
            let name = backend.to_string();
            assert_eq!(<Backend as ValueEnum>::from_str(&name, false), Ok(*backend));
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ConfigError::InvalidTimeout("abc".into()).to_string(),
            "abc: invalid timeout"
        );
        assert_eq!(
            ConfigError::MissingCommand.to_string(),
            "must specify a command"
        );
    }
}
