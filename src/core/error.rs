use thiserror::Error;

/// Centralized error types for the application
///
/// Every fallible operation in the library returns this enum. Only the
/// configuration variants are allowed to end the process; everything else is
/// logged and turned into a user-visible message by the session dispatcher.
///
/// # Example
///
/// ```no_run
/// use sheetbot::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     if err.is_fatal() {
///         eprintln!("Fatal: {}", err);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// The configuration document does not exist
    #[error("Configuration file not found: {0}")]
    ConfigMissing(String),

    /// The configuration document exists but cannot be used
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// No profile row for this user id
    #[error("Profile not found for user {0}")]
    NotFound(i64),

    /// Unknown profile attribute or a value it cannot hold
    #[error("Invalid profile field: {0}")]
    InvalidField(String),

    /// The profile store could not be reached or refused the write
    #[error("Profile store unavailable: {0}")]
    StoreUnavailable(String),

    /// Neither the requested nor the fallback language has this text
    #[error("No localization for key '{key}' in language '{language}'")]
    LocalizationMissing { language: String, key: String },

    /// The messaging transport could not be reached
    #[error("Transport connectivity error: {0}")]
    TransportConnectivity(String),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP errors from external collaborators
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Spreadsheet service rejected or failed the request
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Payment gateway rejected or failed the request
    #[error("Payment error: {0}")]
    Payment(String),

    /// Media fetch or storage failure
    #[error("Media error: {0}")]
    Media(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Errors that must stop the process at start-up.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::ConfigMissing(_) | AppError::ConfigInvalid(_))
    }

    /// Errors raised by the profile store.
    pub fn is_store(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }

    /// Transport failures that go away on their own (network drop, flood control).
    pub fn is_connectivity(&self) -> bool {
        match self {
            AppError::TransportConnectivity(_) => true,
            AppError::Telegram(err) => matches!(
                err,
                teloxide::RequestError::Network(_)
                    | teloxide::RequestError::Io(_)
                    | teloxide::RequestError::RetryAfter(_)
            ),
            _ => false,
        }
    }
}

/// Maps any persistence-layer error to [`AppError::StoreUnavailable`].
pub(crate) fn store_unavailable<E: std::fmt::Display>(err: E) -> AppError {
    AppError::StoreUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_config_errors_are_fatal() {
        assert!(AppError::ConfigMissing("config.json".into()).is_fatal());
        assert!(AppError::ConfigInvalid("token".into()).is_fatal());
        assert!(!AppError::StoreUnavailable("locked".into()).is_fatal());
        assert!(!AppError::NotFound(42).is_fatal());
        assert!(!AppError::LocalizationMissing {
            language: "de".into(),
            key: "hello_message".into(),
        }
        .is_fatal());
    }

    #[test]
    fn store_and_transport_errors_are_classified() {
        assert!(AppError::StoreUnavailable("busy".into()).is_store());
        assert!(AppError::TransportConnectivity("reset".into()).is_connectivity());
        assert!(!AppError::InvalidField("email".into()).is_store());
        assert!(!AppError::Spreadsheet("403".into()).is_connectivity());
    }

    #[test]
    fn display_includes_context() {
        let err = AppError::LocalizationMissing {
            language: "de".into(),
            key: "headers[2]".into(),
        };
        assert_eq!(err.to_string(), "No localization for key 'headers[2]' in language 'de'");
        assert_eq!(AppError::NotFound(7).to_string(), "Profile not found for user 7");
    }
}
