//! Error types for seekcheck
//!
//! Failures carry an ordered chain of causes, innermost first. Each layer
//! that cannot recover pushes its own cause on top before handing the error
//! back to its caller, so the chain reads like a backtrace when printed.

use std::fmt;
use std::io;

/// Result type for seekcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single record in an error chain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Cause {
    /// Invalid value passed to a step
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Unable to open a container or entry
    #[error("unable to open: {0}")]
    IoOpen(String),

    /// Operating system I/O failure, given meaning by the cause above it
    #[error("i/o error: {0}")]
    Io(String),

    /// Failed or short read
    #[error("unable to read: {0}")]
    IoRead(String),

    /// Failed seek
    #[error("unable to seek: {0}")]
    IoSeek(String),

    /// Unable to write report output
    #[error("unable to write output: {0}")]
    IoWrite(String),

    /// Unable to retrieve a value such as the current offset
    #[error("unable to retrieve: {0}")]
    Get(String),

    /// Malformed container
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Unsupported container feature
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Worker pool could not be created
    #[error("unable to initialize worker pool: {0}")]
    PoolInitialize(String),

    /// Worker pool could not be joined cleanly
    #[error("unable to finalize worker pool: {0}")]
    PoolFinalize(String),

    /// Work item could not be queued
    #[error("unable to append work item: {0}")]
    Append(String),
}

/// Error with an ordered chain of causes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    causes: Vec<Cause>,
}

impl Error {
    /// Starts a new chain with a single cause
    pub fn new(cause: Cause) -> Self {
        Self { causes: vec![cause] }
    }

    /// Pushes an outer cause on top of the chain
    pub fn context(mut self, cause: Cause) -> Self {
        self.causes.push(cause);
        self
    }

    /// Returns the outermost cause
    pub fn kind(&self) -> &Cause {
        // The chain is never empty: every constructor seeds one cause.
        &self.causes[self.causes.len() - 1]
    }

    /// Returns the innermost cause
    pub fn root(&self) -> &Cause {
        &self.causes[0]
    }

    /// Returns all causes, innermost first
    pub fn causes(&self) -> &[Cause] {
        &self.causes
    }

    /// Renders the chain as one line per cause, outermost first
    pub fn backtrace(&self) -> String {
        self.causes
            .iter()
            .rev()
            .map(|cause| cause.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

impl std::error::Error for Error {}

impl From<Cause> for Error {
    fn from(cause: Cause) -> Self {
        Error::new(cause)
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::new(Cause::Io(error.to_string()))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(error: zip::result::ZipError) -> Self {
        use zip::result::ZipError;

        let cause = match error {
            ZipError::Io(e) => Cause::Io(e.to_string()),
            ZipError::InvalidArchive(msg) => Cause::InvalidFormat(msg.to_string()),
            ZipError::UnsupportedArchive(msg) => Cause::Unsupported(msg.to_string()),
            ZipError::FileNotFound => Cause::IoOpen("entry not found in archive".to_string()),
            #[allow(unreachable_patterns)]
            other => Cause::InvalidFormat(other.to_string()),
        };
        Error::new(cause)
    }
}

/// Adds chain context to fallible results
pub trait ResultExt<T> {
    /// Pushes the cause built by `f` onto the error chain, if any
    fn context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> Cause;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> Cause,
    {
        self.map_err(|e| e.into().context(f()))
    }
}
