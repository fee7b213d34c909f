//! Command resolution.
//!
//! Checks that the command given on the command line names an existing
//! regular file, either directly or through a `PATH`-style search list, and
//! pins it to an absolute path before the daemon changes directory to `/`.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[allow(clippy::cast_sign_loss)]
const PATH_MAX: usize = libc::PATH_MAX as usize;

/// Errors that can occur while resolving a command.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{0}: file name too long")]
    NameTooLong(String),

    #[error("{path}: cannot make path absolute")]
    Absolutize {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// How the resolved path is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Starts at the filesystem root.
    Absolute,
    /// Depends on the current working directory.
    Relative,
}

/// Result of looking a command token up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: PathBuf,
    pub kind: PathKind,
}

impl Resolution {
    fn new(path: PathBuf) -> Self {
        let kind = if path.is_absolute() {
            PathKind::Absolute
        } else {
            PathKind::Relative
        };
        Self { path, kind }
    }

    /// Whether the path must be converted before the working directory changes.
    pub fn needs_absolute(&self) -> bool {
        self.kind == PathKind::Relative
    }

    /// Anchor the path against the current working directory if needed.
    pub fn into_absolute(self) -> Result<PathBuf, ResolveError> {
        if !self.needs_absolute() {
            return Ok(self.path);
        }
        std::path::absolute(&self.path).map_err(|source| ResolveError::Absolutize {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Resolve a command token.
///
/// A token containing `/` is taken as a path and only checked in place.
/// Otherwise each `:`-separated entry of `search_path` is tried in order as
/// `<entry>/<token>`. Only existence as a regular file is checked; a file
/// without the execute bit resolves fine and fails later at launch.
pub fn resolve(token: &OsStr, search_path: Option<&OsStr>) -> Result<Resolution, ResolveError> {
    let not_found = || ResolveError::CommandNotFound(token.to_string_lossy().into_owned());

    if token.as_bytes().contains(&b'/') {
        let path = PathBuf::from(token);
        if is_regular_file(&path) {
            return Ok(Resolution::new(path));
        }
        return Err(not_found());
    }

    let Some(search_path) = search_path else {
        return Err(not_found());
    };

    for dir in search_path.as_bytes().split(|b| *b == b':') {
        let candidate = join_candidate(dir, token.as_bytes());
        if candidate.len() >= PATH_MAX {
            return Err(ResolveError::NameTooLong(
                token.to_string_lossy().into_owned(),
            ));
        }

        let candidate = PathBuf::from(OsString::from_vec(candidate));
        if is_regular_file(&candidate) {
            return Ok(Resolution::new(candidate));
        }
    }

    Err(not_found())
}

/// `<dir>/<token>`, joined textually so an empty entry yields `/<token>`.
fn join_candidate(dir: &[u8], token: &[u8]) -> Vec<u8> {
    let mut candidate = Vec::with_capacity(dir.len() + 1 + token.len());
    candidate.extend_from_slice(dir);
    candidate.push(b'/');
    candidate.extend_from_slice(token);
    candidate
}

fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file())
}

/// A command ready to launch: absolute program path plus the untouched
/// argument vector (`argv[0]` is the token as typed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub path: PathBuf,
    pub argv: Vec<OsString>,
}

impl ResolvedCommand {
    /// Resolve `argv[0]` and pin the result to an absolute path.
    pub fn prepare(argv: Vec<OsString>, search_path: Option<&OsStr>) -> Result<Self, ResolveError> {
        let Some(token) = argv.first() else {
            return Err(ResolveError::CommandNotFound(String::new()));
        };

        let path = resolve(token, search_path)?.into_absolute()?;

        Ok(Self { path, argv })
    }

    /// The command as typed, for log messages.
    pub fn name(&self) -> &OsStr {
        self.argv.first().map_or(self.path.as_os_str(), OsString::as_os_str)
    }

    /// Arguments after `argv[0]`.
    pub fn args(&self) -> &[OsString] {
        self.argv.get(1..).unwrap_or_default()
    }
}
