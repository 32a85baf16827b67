use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for mapping, query and storage operations.
///
/// The kinds raised by this crate itself (`UnsupportedOperation`,
/// `IncorrectResultSize`, `InvalidQuery`, `ObjectMapping`, ...) are produced
/// before any client call. The storage kinds (`Conflict`, `NotFound`,
/// `PreconditionFailed`, `ClientError`) are produced by the [`DocumentClient`]
/// and surfaced unchanged.
///
/// [`DocumentClient`]: crate::client::DocumentClient
///
/// # Examples
///
/// ```rust,ignore
/// use cosmos_odm::errors::{CosmosError, ErrorKind, CosmosResult};
///
/// fn example() -> CosmosResult<()> {
///     Err(CosmosError::new("Operator NEAR is not supported", ErrorKind::UnsupportedOperation))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Query Errors
    /// The criteria operator or derived keyword has no native counterpart
    UnsupportedOperation,
    /// A single-entity query matched more documents than expected
    IncorrectResultSize { expected: usize, actual: usize },
    /// The query or derived method name is malformed
    InvalidQuery,

    // Mapping Errors
    /// Error mapping an entity to/from a document
    ObjectMapping,
    /// The id value of an entity cannot be used as a document id
    InvalidId,

    // Configuration Errors
    /// Missing or invalid configuration value
    InvalidConfiguration,

    // Storage Errors - produced by the document client
    /// A document or container with the same key already exists (409)
    Conflict,
    /// The addressed database, container or document does not exist (404)
    NotFound,
    /// An optimistic concurrency check failed (412)
    PreconditionFailed,
    /// Any other failure reported by the client
    ClientError,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnsupportedOperation => write!(f, "Unsupported operation"),
            ErrorKind::IncorrectResultSize { expected, actual } => write!(
                f,
                "Incorrect result size: expected {}, actual {}",
                expected, actual
            ),
            ErrorKind::InvalidQuery => write!(f, "Invalid query"),
            ErrorKind::ObjectMapping => write!(f, "Object mapping error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::PreconditionFailed => write!(f, "Precondition failed"),
            ErrorKind::ClientError => write!(f, "Client error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of every fallible operation in this crate.
///
/// `CosmosError` carries a message, an [`ErrorKind`], an optional cause and the
/// backtrace captured where it was created.
///
/// # Examples
///
/// ```rust,ignore
/// use cosmos_odm::errors::{CosmosError, ErrorKind};
///
/// let cause = CosmosError::new("Entity with id p1 already exists", ErrorKind::Conflict);
/// let err = CosmosError::new_with_cause("Insert failed", ErrorKind::Conflict, cause);
/// ```
#[derive(Clone)]
pub struct CosmosError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<CosmosError>>,
    backtrace: Arc<Backtrace>,
}

impl CosmosError {
    /// Creates a new `CosmosError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        CosmosError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `CosmosError` wrapping the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: CosmosError) -> Self {
        CosmosError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&CosmosError> {
        self.cause.as_deref()
    }

    /// Returns `true` for the 404 family of client errors.
    pub fn is_not_found(&self) -> bool {
        self.error_kind == ErrorKind::NotFound
    }
}

impl Display for CosmosError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for CosmosError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // message with stack trace, or message followed by the cause chain
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => write!(f, "{} ({})\n{:?}", self.message, self.error_kind, self.backtrace),
        }
    }
}

impl Error for CosmosError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for operations of this crate.
pub type CosmosResult<T> = Result<T, CosmosError>;

impl de::Error for CosmosError {
    fn custom<T: Display>(msg: T) -> Self {
        CosmosError::new(&msg.to_string(), ErrorKind::ObjectMapping)
    }
}

impl ser::Error for CosmosError {
    fn custom<T: Display>(msg: T) -> Self {
        CosmosError::new(&msg.to_string(), ErrorKind::ObjectMapping)
    }
}

impl From<serde_json::Error> for CosmosError {
    fn from(err: serde_json::Error) -> Self {
        CosmosError::new(
            &format!("JSON mapping error: {}", err),
            ErrorKind::ObjectMapping,
        )
    }
}

impl From<std::num::ParseIntError> for CosmosError {
    fn from(err: std::num::ParseIntError) -> Self {
        CosmosError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidQuery,
        )
    }
}

impl From<std::fmt::Error> for CosmosError {
    fn from(err: std::fmt::Error) -> Self {
        CosmosError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<String> for CosmosError {
    fn from(msg: String) -> Self {
        CosmosError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for CosmosError {
    fn from(msg: &str) -> Self {
        CosmosError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosmos_error_new_creates_error() {
        let error = CosmosError::new("An error occurred", ErrorKind::Conflict);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::Conflict);
        assert!(error.cause().is_none());
    }

    #[test]
    fn cosmos_error_new_with_cause_creates_error() {
        let cause = CosmosError::new("document exists", ErrorKind::Conflict);
        let error = CosmosError::new_with_cause("insert failed", ErrorKind::Conflict, cause);
        assert_eq!(error.cause().map(|c| c.message()), Some("document exists"));
        assert!(error.source().is_some());
    }

    #[test]
    fn cosmos_error_display_is_message_only() {
        let error = CosmosError::new("Operator NEAR is not supported", ErrorKind::UnsupportedOperation);
        assert_eq!(format!("{}", error), "Operator NEAR is not supported");
    }

    #[test]
    fn cosmos_error_debug_contains_cause_chain() {
        let cause = CosmosError::new("inner", ErrorKind::ClientError);
        let error = CosmosError::new_with_cause("outer", ErrorKind::ClientError, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("outer"));
        assert!(formatted.contains("Caused by:"));
        assert!(formatted.contains("inner"));
    }

    #[test]
    fn incorrect_result_size_kind_reports_sizes() {
        let kind = ErrorKind::IncorrectResultSize { expected: 1, actual: 3 };
        assert_eq!(kind.to_string(), "Incorrect result size: expected 1, actual 3");
    }

    #[test]
    fn serde_json_error_maps_to_object_mapping() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: CosmosError = err.into();
        assert_eq!(error.kind(), &ErrorKind::ObjectMapping);
    }

    #[test]
    fn is_not_found_only_for_not_found_kind() {
        assert!(CosmosError::new("missing", ErrorKind::NotFound).is_not_found());
        assert!(!CosmosError::new("dup", ErrorKind::Conflict).is_not_found());
    }
}
