/// Errors returned from core operations.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("I/O error: {0:?}")]
    Io(::std::io::ErrorKind),

    /// A command was not acknowledged by the modem (NAK epilogue byte).
    #[error("command was not acknowledged")]
    NotAcknowledged,

    /// Failure to parse a frame or an `InsteonMessage`.
    #[error("parse error")]
    Parse,

    /// An operation took too long to complete.
    #[error("operation timed out")]
    Timeout,

    /// An unexpected response was received for a pending request.
    #[error("unexpected response received")]
    UnexpectedResponse,

    /// An invalid `Identity` string was passed (expected `xx.xx.xx`).
    #[error("invalid identity format, expected 'xx.xx.xx'")]
    InvalidIdentity,

    /// The modem was disconnected (reader task exited).
    #[error("modem was disconnected")]
    Disconnected,

    /// A decoded frame violated a protocol invariant, e.g. a standard
    /// message body advertising the extended flag bit.
    #[error("protocol invariant violated: {0}")]
    ProtocolViolation(&'static str),
}

impl From<::std::io::Error> for Error {
    fn from(e: ::std::io::Error) -> Error {
        Error::Io(e.kind())
    }
}

impl From<futures::channel::mpsc::SendError> for Error {
    fn from(_: futures::channel::mpsc::SendError) -> Error {
        Error::Disconnected
    }
}
