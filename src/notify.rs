//! Notification events queued by the engines for the owning view.
//!
//! Sessions never control the UI directly; they push [`Notification`]
//! values which the view drains and renders as dismissible banners. This
//! keeps every error state escapable from the view layer.

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notification {
            severity: Severity::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notification {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Generic server-failure notification for an unexpected status code.
    /// Status 0 means the request never reached the server.
    pub fn invalid_response(status: u16) -> Self {
        let message = match status {
            0 => "The server could not be reached".to_string(),
            401 | 403 => "You do not have permission to perform this action".to_string(),
            404 => "The requested resource could not be found".to_string(),
            405 => "This operation is not supported by the server".to_string(),
            500..=599 => format!("The server reported an internal error ({})", status),
            _ => format!("The server returned an unexpected response ({})", status),
        };
        Notification::error("Server error", message)
    }
}
