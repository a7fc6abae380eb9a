//! Defines fundamental types used throughout the zmalarm codebase.

use std::fmt;
use tokio::sync::mpsc;

pub mod monitor;

/// Enumerates all the errors that can be reported in zmalarm.
///
/// The trigger logic never lets an error escape to the caller that
/// requested the trigger; errors are returned to the task running
/// the request, which logs them. The variants are split so the log
/// (and tests) can tell a misconfigured request apart from a server
/// that misbehaved. `is_remote()` groups the latter.

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// The request named a ZoneMinder host that isn't in the
    /// configuration.
    UnknownHost(String),

    /// Reported when the peer of a communication channel has closed
    /// its handle.
    MissingPeer(String),

    /// An invalid value was provided.
    InvArgument(&'static str),

    /// The server replied, but not in a way that follows its API. The
    /// string describes what was wrong with the reply.
    ProtocolError(String),

    /// The server rejected our credentials.
    AuthenticationError,

    /// A request to the server didn't complete in a timely fashion.
    TimeoutError,

    /// The requested operation couldn't complete. The description
    /// field will have more information for the user.
    OperationError(String),

    /// A bad parameter was given in a configuration or a
    /// configuration was missing a required parameter.
    ConfigError(String),

    /// There was a problem parsing a string. The associated string
    /// will describe how the parsing failed.
    ParseError(String),
}

impl Error {
    /// Returns `true` if the error was caused by talking to the
    /// remote server (as opposed to a bad request or a local
    /// problem.)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::ProtocolError(_)
                | Error::AuthenticationError
                | Error::TimeoutError
                | Error::OperationError(_)
        )
    }

    /// A short, stable name for the kind of error. Used as a field in
    /// log records so failures can be filtered by kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownHost(_) => "unknown-host",
            Error::MissingPeer(_) => "missing-peer",
            Error::InvArgument(_) => "invalid-argument",
            Error::ProtocolError(_) => "protocol",
            Error::AuthenticationError => "authentication",
            Error::TimeoutError => "timeout",
            Error::OperationError(_) => "operation",
            Error::ConfigError(_) => "config",
            Error::ParseError(_) => "parse",
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownHost(name) => {
                write!(f, "invalid ZoneMinder host provided: {}", &name)
            }
            Error::MissingPeer(detail) => {
                write!(f, "{} is missing peer", detail)
            }
            Error::InvArgument(v) => write!(f, "{}", &v),
            Error::ProtocolError(v) => write!(f, "protocol error: {}", &v),
            Error::AuthenticationError => write!(f, "permission error"),
            Error::TimeoutError => write!(f, "timeout"),
            Error::OperationError(v) => {
                write!(f, "couldn't complete operation: {}", &v)
            }
            Error::ConfigError(v) => write!(f, "config error: {}", &v),
            Error::ParseError(v) => write!(f, "parse error: {}", &v),
        }
    }
}

// Allows code that sends requests over an `mpsc` channel to
// translate the channel error into a zmalarm error with `?`.

impl<T> From<mpsc::error::SendError<T>> for Error {
    fn from(_error: mpsc::error::SendError<T>) -> Self {
        Error::MissingPeer(String::from("request channel is closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(!Error::UnknownHost("zm".into()).is_remote());
        assert!(!Error::ConfigError("bad".into()).is_remote());
        assert!(!Error::MissingPeer("core".into()).is_remote());

        assert!(Error::AuthenticationError.is_remote());
        assert!(Error::TimeoutError.is_remote());
        assert!(Error::ProtocolError("no status".into()).is_remote());
        assert!(Error::OperationError("refused".into()).is_remote());

        assert_eq!(Error::UnknownHost("zm".into()).kind(), "unknown-host");
        assert_eq!(Error::TimeoutError.kind(), "timeout");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", Error::UnknownHost(String::from("garage"))),
            "invalid ZoneMinder host provided: garage"
        );
        assert_eq!(
            format!("{}", Error::ProtocolError(String::from("bad json"))),
            "protocol error: bad json"
        );
    }
}
