use thiserror::Error;

/// Errors produced by the navigation state machine and its collaborators.
#[derive(Error, Debug)]
pub enum NavigationError {
    /// The automated or manual login sequence did not complete.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// The login wait exceeded the configured ceiling.
    #[error("login wait exceeded the configured ceiling")]
    LoginTimedOut,

    /// The target service's navigation link was absent or never became
    /// visible on the portal home page.
    #[error("service link not found: {0}")]
    LinkNotFound(String),

    /// The browser or a page handle reported closed or unresponsive.
    #[error("browser connection lost: {0}")]
    ConnectionLost(String),

    /// Navigation completed but landed on a domain that does not belong to
    /// the requested service.
    #[error("session mismatch: expected a page on '{expected}', landed on '{landed}'")]
    SessionMismatch { expected: String, landed: String },

    /// The current URL matched no known pattern twice in a row.
    #[error("unrecognized page: {0}")]
    UnrecognizedPage(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Error reported by the underlying page driver.
    #[error("page error: {0}")]
    PageError(String),

    #[error("credential source error: {0}")]
    CredentialError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl NavigationError {
    /// A short manual remedy suitable for the single operator notification
    /// emitted when a navigation fails for good.
    pub fn suggested_remedy(&self) -> &'static str {
        match self {
            NavigationError::LoginFailed(_) | NavigationError::LoginTimedOut => {
                "Complete the login in the browser window, then retry the request."
            }
            NavigationError::LinkNotFound(_) => {
                "Click the service link directly in the portal page, or reload the portal and retry."
            }
            NavigationError::ConnectionLost(_) => {
                "The browser was restarted; retry the request to rebuild the session."
            }
            NavigationError::SessionMismatch { .. } => {
                "Log out of the portal, log back in, and retry the request."
            }
            NavigationError::UnrecognizedPage(_) => {
                "Navigate the browser back to the portal home page and retry."
            }
            NavigationError::CredentialError(_) => {
                "Check that the credential file exists and is readable."
            }
            NavigationError::Cancelled => "The operation was cancelled; no action needed.",
            _ => "Retry the request; if it keeps failing, restart the browser session.",
        }
    }
}
