use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Convenience alias for a `Result` carrying this crate's `Error`.
///
/// This is the terminal value of every `Future`.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a `Future` did not produce a value.
///
/// Cancellation and timeouts are reported through the same failure channel as errors raised by
/// the producing operation or by a transform, so failure observers always receive an `Error`.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The `Future` was cancelled before it completed.
    #[error("future was cancelled")]
    Cancelled,

    /// A blocking `get` gave up waiting. The `Future` itself is unaffected.
    #[error("timed out waiting for future")]
    Timeout,

    /// The `Promise` was dropped without completing its `Future`.
    #[error("promise dropped without completing its future")]
    Abandoned,

    /// An operation or transform panicked; holds the panic message.
    #[error("operation panicked: {0}")]
    Panicked(String),

    /// An error raised by the producing operation or a user transform, forwarded verbatim.
    #[error("{0}")]
    Underlying(Arc<dyn StdError + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary error (or a message) as an `Underlying` error.
    ///
    /// ```
    /// # use composable_future::Error;
    /// let e = Error::new("connection reset");
    /// assert_eq!(e.to_string(), "connection reset");
    /// ```
    pub fn new<E>(err: E) -> Error
        where E: Into<Box<dyn StdError + Send + Sync>>
    {
        Error::Underlying(Arc::from(err.into()))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// Recover a reference to the original error wrapped by `Error::new`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
        where E: StdError + 'static
    {
        match self {
            Error::Underlying(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq)]
    struct Refused(u32);

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "refused {}", self.0)
        }
    }

    impl StdError for Refused {}

    #[test]
    fn downcast() {
        let e = Error::new(Refused(7));
        assert_eq!(e.downcast_ref::<Refused>(), Some(&Refused(7)));
        assert_eq!(e.to_string(), "refused 7");

        let cloned = e.clone();
        assert_eq!(cloned.downcast_ref::<Refused>(), Some(&Refused(7)));

        assert!(Error::Cancelled.downcast_ref::<Refused>().is_none());
    }

    #[test]
    fn kinds() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Cancelled.is_timeout());
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::new("x").is_cancelled());
    }

    #[test]
    fn from_io() {
        let e: Error = io::Error::new(io::ErrorKind::Other, "disk on fire").into();
        assert_eq!(e.downcast_ref::<io::Error>().map(|e| e.kind()), Some(io::ErrorKind::Other));
    }
}
