use luna_settings::SettingsError;
use thiserror::Error;

/// Shown when no response arrives at all
pub const CONNECTIVITY_MESSAGE: &str = "Can't reach the server... check your connection?";

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response received (connect failure or the body stream broke)
    #[error("Can't reach the server... check your connection?")]
    Network(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Something went wrong... (Status: {0})")]
    Status(u16),

    /// The server reported an error inside the event stream
    #[error("{0}")]
    Server(String),

    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ApiError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err)
        } else if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else {
            ApiError::Network(err)
        }
    }

    /// Status code for `Status` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status(code) => Some(*code),
            _ => None,
        }
    }
}
