use std::fmt;
use std::fmt::Debug;

/// Failure taxonomy of the crate. Callers branch on this rather than on
/// message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    PermissionDenied,
    Geocode,
    Route,
    Fetch,
    Parse,
    InvalidInput,
    InvalidState,
}

#[derive(Clone, Debug)]
pub struct Error {
    pub kind: Kind,
    pub message: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        fetch_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        parse_error(err)
    }
}

pub fn permission_denied_error() -> Error {
    Error {
        kind: Kind::PermissionDenied,
        message: "location permission denied".into(),
    }
}

pub fn geocode_error(status: &str) -> Error {
    Error {
        kind: Kind::Geocode,
        message: format!("geocode failed: {}", status),
    }
}

pub fn route_error(status: &str) -> Error {
    Error {
        kind: Kind::Route,
        message: format!("failed to get directions: {}", status),
    }
}

pub fn fetch_error<T: Debug>(err: T) -> Error {
    Error {
        kind: Kind::Fetch,
        message: format!("backend fetch failed: {:?}", err),
    }
}

pub fn parse_error<T: Debug>(err: T) -> Error {
    Error {
        kind: Kind::Parse,
        message: format!("malformed payload: {:?}", err),
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        kind: Kind::InvalidInput,
        message: "invalid input".into(),
    }
}

pub fn invalid_state_error() -> Error {
    Error {
        kind: Kind::InvalidState,
        message: "invalid state".into(),
    }
}
