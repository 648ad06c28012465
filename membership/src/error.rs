use std::fmt;
use std::net::AddrParseError;

/// Error type for the membership crate, modeled after the teacher's
/// `SendError`: a small enum implementing `std::error::Error` rather than a
/// generic boxed error, so callers can match on the failure mode.
#[derive(Debug)]
pub enum MembershipError {
    Transport(std::io::Error),
    Codec(serde_json::Error),
    AddrParse(AddrParseError),
}

impl fmt::Display for MembershipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipError::Transport(e) => write!(f, "transport error: {e}"),
            MembershipError::Codec(e) => write!(f, "codec error: {e}"),
            MembershipError::AddrParse(e) => write!(f, "address parse error: {e}"),
        }
    }
}

impl std::error::Error for MembershipError {}

impl From<std::io::Error> for MembershipError {
    fn from(e: std::io::Error) -> Self {
        MembershipError::Transport(e)
    }
}

impl From<serde_json::Error> for MembershipError {
    fn from(e: serde_json::Error) -> Self {
        MembershipError::Codec(e)
    }
}

impl From<AddrParseError> for MembershipError {
    fn from(e: AddrParseError) -> Self {
        MembershipError::AddrParse(e)
    }
}

pub type Result<T> = std::result::Result<T, MembershipError>;
