use thiserror::Error;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const NETWORK_ERROR: &str = "Network error. Please try again.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{0}")]
    InvalidInput(String),
    #[error("{}", .message.as_deref().unwrap_or(INVALID_CREDENTIALS))]
    Rejected { status: u16, message: Option<String> },
    #[error("Network error. Please try again.")]
    Network(String),
    #[error("{0}")]
    Provider(String),
    #[error("Session error: {0}")]
    Session(String),
}

impl Error {
    /// Detected locally, the request never left the machine.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::PasswordMismatch | Error::InvalidInput(_))
    }

    pub fn title(&self) -> &'static str {
        match self {
            Error::PasswordMismatch => "Password Mismatch",
            Error::InvalidInput(_) => "Missing Information",
            Error::Rejected { .. } | Error::Network(_) => "Login Failed",
            Error::Provider(_) => "Signup Failed",
            Error::Session(_) => "Session Error",
        }
    }
}
