//! Error hierarchy shared by every component of the logging core.
//!
//! Mirrors the teacher's `utils::error::LoglyError`: a manual `Display` plus
//! `std::error::Error` impl rather than a derive-macro crate, since this is
//! the concern the teacher already owns end to end.

use std::fmt;

/// The five error classes every component reports under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller passed a malformed argument (bad level name, bad pattern, ...).
    InvalidInput,
    /// A handler, formatter, or DLP matcher failed while processing a record.
    Processing,
    /// A module's `Config` is missing a required key or has the wrong type.
    Configuration,
    /// A module failed during `build`/startup.
    Initialization,
    /// Anything that should not be reachable in correct code.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Processing => "processing error",
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Initialization => "initialization error",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// The crate's error type. Carries an optional set of child errors so
/// fan-out/routing dispatch can report every handler that failed rather than
/// only the first one.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    sources: Vec<Error>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error { kind, message: message.into(), sources: Vec::new() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Processing, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn initialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Initialization, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn sources(&self) -> &[Error] {
        &self.sources
    }

    /// Combine multiple errors from independent handlers into one, keeping
    /// each original for programmatic inspection via `sources()`.
    pub fn join(errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.into_iter().next(),
            n => {
                let summary = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                Some(Error {
                    kind: ErrorKind::Processing,
                    message: format!("{} handlers failed: {}", n, summary),
                    sources: errors,
                })
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_kind_and_message() {
        let e = Error::invalid_input("bad level");
        assert_eq!(e.to_string(), "invalid input: bad level");
    }

    #[test]
    fn join_of_one_is_passthrough() {
        let e = Error::join(vec![Error::processing("boom")]).unwrap();
        assert_eq!(e.kind(), ErrorKind::Processing);
        assert_eq!(e.sources().len(), 0);
    }

    #[test]
    fn join_of_many_collects_sources() {
        let errs = vec![Error::processing("a"), Error::processing("b")];
        let joined = Error::join(errs).unwrap();
        assert_eq!(joined.kind(), ErrorKind::Processing);
        assert_eq!(joined.sources().len(), 2);
        assert!(joined.to_string().contains("2 handlers failed"));
    }

    #[test]
    fn join_of_none_is_none() {
        assert!(Error::join(vec![]).is_none());
    }
}
