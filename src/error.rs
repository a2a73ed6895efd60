//! Error types and handling for the sunshine service

use thiserror::Error;

/// Main error type for the sunshine service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SunnyError {
    /// Missing or malformed request parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The forecast provider could not be reached or answered with a failure status
    #[error("Upstream unavailable: {cause}")]
    UpstreamUnavailable {
        cause: String,
        /// HTTP status if the provider responded at all
        status: Option<u16>,
    },

    /// The provider answered but the payload is not a forecast document
    #[error("Invalid upstream response: {message}")]
    UpstreamInvalidResponse { message: String },

    /// No time series could be extracted from a forecast document
    #[error("Malformed forecast document: {message}")]
    MalformedDocument { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SunnyError {
    /// Create a new invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a new upstream unavailable error without a response status
    pub fn unreachable<S: Into<String>>(cause: S) -> Self {
        Self::UpstreamUnavailable {
            cause: cause.into(),
            status: None,
        }
    }

    /// Create a new upstream unavailable error for a non-success response
    #[must_use]
    pub fn upstream_status(status: u16) -> Self {
        Self::UpstreamUnavailable {
            cause: format!("HTTP {status}"),
            status: Some(status),
        }
    }

    /// Create a new invalid upstream response error
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::UpstreamInvalidResponse {
            message: message.into(),
        }
    }

    /// Create a new malformed document error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a later attempt could succeed without the caller changing anything
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SunnyError::UpstreamUnavailable { .. } | SunnyError::UpstreamInvalidResponse { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SunnyError::InvalidRequest { message } => format!("Invalid request: {message}"),
            SunnyError::UpstreamUnavailable { status: Some(_), .. } => {
                "The Met Éireann API returned an error. Please try again later.".to_string()
            }
            SunnyError::UpstreamUnavailable { status: None, .. } => {
                "Unable to connect to the Met Éireann API. Please try again later.".to_string()
            }
            SunnyError::UpstreamInvalidResponse { .. } => {
                "The API did not return valid weather data.".to_string()
            }
            SunnyError::MalformedDocument { .. } => {
                "No forecast is available for this location.".to_string()
            }
            SunnyError::Config { .. } => {
                "Configuration error. Please check your config file and environment.".to_string()
            }
        }
    }
}
