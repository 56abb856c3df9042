use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Validation,
    Authentication,
    Authorization,
    NotFound,
    ServerError,
    ClientError,
    Unknown,
}

impl ErrorKind {
    /// Classify a raw failure: status first, then message heuristics.
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        if let Some(status) = status {
            match status {
                401 => return Self::Authentication,
                403 => return Self::Authorization,
                404 => return Self::NotFound,
                s if s >= 500 => return Self::ServerError,
                s if s >= 400 => return Self::ClientError,
                _ => {}
            }
        }

        let lowered = message.to_lowercase();
        if lowered.contains("network")
            || lowered.contains("connection")
            || lowered.contains("timed out")
            || lowered.contains("timeout")
        {
            return Self::Network;
        }
        if lowered.contains("validation") || lowered.contains("invalid") {
            return Self::Validation;
        }

        Self::Unknown
    }

    /// Whether the user should be offered a retry affordance.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::ServerError | Self::Unknown)
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::Network => {
                "Unable to connect to the server. Please check your internet connection."
            }
            Self::Validation => {
                "The information you provided is invalid. Please check your input and try again."
            }
            Self::Authentication => "Your session has expired. Please log in again.",
            Self::Authorization => "You don't have permission to perform this action.",
            Self::NotFound => "The requested resource was not found.",
            Self::ServerError => "Something went wrong on our end. Please try again later.",
            Self::ClientError => {
                "There was an issue with your request. Please check your input."
            }
            Self::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    pub fn recovery_suggestion(self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again.",
            Self::Validation => "Review the highlighted fields and correct any errors.",
            Self::Authentication => "Sign in again to continue.",
            Self::Authorization => {
                "Contact your administrator if you believe this is an error."
            }
            Self::NotFound => "The resource may have been moved or deleted.",
            Self::ServerError => {
                "Try again in a few minutes. If the problem persists, contact support."
            }
            Self::ClientError => "Refresh the view and try again.",
            Self::Unknown => "Refresh the view or contact support if the problem continues.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not found",
            Self::ServerError => "server error",
            Self::ClientError => "client error",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A classified failure of a remote call.
#[derive(Debug, Clone, Error)]
#[error("{message} ({kind})")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::classify(status, &message),
            status,
            message,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            status: None,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            status: None,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Text suitable for a notification body: server message when there is
    /// one, otherwise the generic message for the kind.
    pub fn detail(&self) -> String {
        let message = sanitize_message(self.message.trim());
        if message.is_empty() {
            self.kind.user_message().to_string()
        } else {
            format!("{} {}", message, self.kind.recovery_suggestion())
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        if status.is_none() && (err.is_connect() || err.is_timeout() || err.is_request()) {
            return Self::network(err.to_string());
        }
        Self::new(status, err.to_string())
    }
}

/// Mask credential-looking values before they reach the user.
pub fn sanitize_message(message: &str) -> String {
    static PATTERNS: OnceLock<[(Regex, &'static str); 3]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            (
                Regex::new(r"(?i)password[^a-zA-Z0-9]*[a-zA-Z0-9]+").expect("valid regex"),
                "[PASSWORD]",
            ),
            (
                Regex::new(r"(?i)token[^a-zA-Z0-9]*[a-zA-Z0-9]+").expect("valid regex"),
                "[TOKEN]",
            ),
            (
                Regex::new(r"(?i)key[^a-zA-Z0-9]*[a-zA-Z0-9]+").expect("valid regex"),
                "[KEY]",
            ),
        ]
    });

    patterns
        .iter()
        .fold(message.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}
