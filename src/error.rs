//! Error taxonomy for the codec, reader, writer and view layers.
//!
//! Errors are partitioned into three tiers (see module docs in `reader`/`writer`):
//! programmer errors, stream-level errors, and recoverable packet-level errors.
//! All three tiers share this one enum so callers have a single `Result` type
//! to match on; recoverability is a property of the variant, documented below.

use std::fmt;
use std::io;

/// Errors produced anywhere in the codec.
#[derive(Debug)]
pub enum NetflowError {
    /// A required input reference was absent (e.g. a `None` passed where a
    /// value was required).
    ArgumentNull(&'static str),
    /// An argument was outside its legal range: a template or dataset id
    /// below 256, a negative offset, a length that does not fit in `u16`.
    ArgumentRange(String),
    /// An argument's shape did not match what was expected: an IPv6 address
    /// where only IPv4 is legal (v5), a value whose serialized length
    /// differs from the template field's declared length.
    ArgumentMismatch(String),
    /// A reader/writer operation was attempted in a state that does not
    /// permit it (e.g. writing a set before a header).
    StateViolation(String),
    /// The underlying stream ended before a full packet/set/record could be
    /// read.
    EndOfStream,
    /// A template header, options-template header, or other structural
    /// element was malformed. Recoverable: the reader skips the offending
    /// set and continues.
    FormatError(String),
    /// A data set referenced a template id with no matching entry in the
    /// registry for the current observation domain. Recoverable.
    MissingTemplate { observation_domain_id: u32, template_id: u16 },
    /// An operation was attempted on a reader/writer after it was disposed.
    UseAfterClose,
    /// An I/O error from the underlying stream. Stream-level; propagated
    /// verbatim, never retried.
    Io(io::Error),
}

impl fmt::Display for NetflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetflowError::ArgumentNull(what) => write!(f, "required argument missing: {what}"),
            NetflowError::ArgumentRange(msg) => write!(f, "argument out of range: {msg}"),
            NetflowError::ArgumentMismatch(msg) => write!(f, "argument mismatch: {msg}"),
            NetflowError::StateViolation(msg) => write!(f, "invalid state transition: {msg}"),
            NetflowError::EndOfStream => write!(f, "stream ended mid-packet"),
            NetflowError::FormatError(msg) => write!(f, "malformed wire data: {msg}"),
            NetflowError::MissingTemplate { observation_domain_id, template_id } => write!(
                f,
                "no template {template_id} registered for observation domain {observation_domain_id}"
            ),
            NetflowError::UseAfterClose => write!(f, "operation on a closed reader/writer"),
            NetflowError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for NetflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetflowError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for NetflowError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            NetflowError::EndOfStream
        } else {
            NetflowError::Io(e)
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetflowError>;

impl NetflowError {
    /// True for the packet-level tier (§7): the reader has already consumed
    /// the set's `{id, length}` framing and can safely skip to the next set.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NetflowError::FormatError(_) | NetflowError::MissingTemplate { .. })
    }
}
