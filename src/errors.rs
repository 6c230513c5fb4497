//! Error taxonomy shared by every layer of the engine.
//!
//! Every failure carries a machine-checkable [`ErrorKind`], a human-readable
//! message and, for validation failures, the tag of the offending property or
//! argument. Validation and ACL errors are deterministic rejections; only
//! [`ErrorKind::Conflict`] is worth retrying, and only by re-running the whole
//! transaction.

use std::fmt;

use thiserror::Error;

/// Result type used throughout the crate
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Machine-checkable error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Data type tag not registered
    UnknownType,
    /// Asset type tag not registered
    UnknownAssetType,
    /// Raw encoding not accepted by the data type
    InvalidFormat,
    /// Decoded value violates a semantic rule
    InvalidValue,
    /// Numeric value outside the representable range
    OutOfRange,
    /// Required property or argument absent
    MissingRequired,
    /// Caller organization may not write the property
    Forbidden,
    /// Reference points to an asset that does not exist
    DanglingReference,
    /// Key already present in the ledger
    AlreadyExists,
    /// Key absent from the ledger
    NotFound,
    /// Patch attempts to change a key property
    ImmutableKey,
    /// Caller identity not allowed to invoke the transaction
    Unauthorized,
    /// Transaction argument failed validation
    InvalidArgument,
    /// Transaction routine failed for a domain reason
    RoutineFailure,
    /// Ledger rejected the commit because observed state changed
    Conflict,
    /// Ledger or event log I/O failure
    Storage,
    /// Asset type definition is structurally invalid
    MalformedSchema,
}

impl ErrorKind {
    /// Stable string code for responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnknownType => "UNKNOWN_TYPE",
            ErrorKind::UnknownAssetType => "UNKNOWN_ASSET_TYPE",
            ErrorKind::InvalidFormat => "INVALID_FORMAT",
            ErrorKind::InvalidValue => "INVALID_VALUE",
            ErrorKind::OutOfRange => "OUT_OF_RANGE",
            ErrorKind::MissingRequired => "MISSING_REQUIRED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::DanglingReference => "DANGLING_REFERENCE",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ImmutableKey => "IMMUTABLE_KEY",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::RoutineFailure => "ROUTINE_FAILURE",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::MalformedSchema => "MALFORMED_SCHEMA",
        }
    }

    /// Whether the caller may retry the whole transaction
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Conflict)
    }

    /// Whether this kind is produced by a data type parser
    pub fn is_parse_kind(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidFormat | ErrorKind::InvalidValue | ErrorKind::OutOfRange
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with kind, message, optional tag and optional root cause
#[derive(Debug, Clone, Error)]
pub struct LedgerError {
    kind: ErrorKind,
    message: String,
    tag: Option<String>,
    #[source]
    cause: Option<Box<LedgerError>>,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind.code())?;
        if let Some(ref tag) = self.tag {
            write!(f, "'{}': ", tag)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(ref cause) = self.cause {
            write!(f, " (caused by: {})", cause)?;
        }
        Ok(())
    }
}

impl LedgerError {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tag: None,
            cause: None,
        }
    }

    /// Attach the offending property or argument tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Attach a root cause
    pub fn with_cause(mut self, cause: LedgerError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn unknown_type(tag: &str) -> Self {
        Self::new(ErrorKind::UnknownType, format!("data type '{}' is not registered", tag))
    }

    pub fn unknown_asset_type(tag: &str) -> Self {
        Self::new(
            ErrorKind::UnknownAssetType,
            format!("asset type '{}' is not registered", tag),
        )
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFormat, message)
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, message)
    }

    pub fn missing_required(tag: &str) -> Self {
        Self::new(ErrorKind::MissingRequired, "value is required").with_tag(tag)
    }

    pub fn forbidden(tag: &str, org: &str) -> Self {
        Self::new(
            ErrorKind::Forbidden,
            format!("organization '{}' may not write this property", org),
        )
        .with_tag(tag)
    }

    pub fn dangling_reference(key: &str) -> Self {
        Self::new(
            ErrorKind::DanglingReference,
            format!("referenced asset '{}' does not exist", key),
        )
    }

    pub fn already_exists(key: &str) -> Self {
        Self::new(ErrorKind::AlreadyExists, format!("'{}' already exists", key))
    }

    pub fn not_found(key: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("'{}' not found", key))
    }

    pub fn immutable_key(tag: &str) -> Self {
        Self::new(
            ErrorKind::ImmutableKey,
            "key properties cannot change after creation",
        )
        .with_tag(tag)
    }

    pub fn unauthorized(org: &str, role: &str, tx: &str) -> Self {
        Self::new(
            ErrorKind::Unauthorized,
            format!("caller {}/{} may not invoke '{}'", org, role, tx),
        )
    }

    /// Wrap an argument failure, keeping the root cause
    pub fn invalid_argument(tag: &str, cause: LedgerError) -> Self {
        Self::new(ErrorKind::InvalidArgument, "argument rejected")
            .with_tag(tag)
            .with_cause(cause)
    }

    pub fn routine(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RoutineFailure, message)
    }

    pub fn conflict(key: &str) -> Self {
        Self::new(
            ErrorKind::Conflict,
            format!("'{}' changed since it was read; retry the transaction", key),
        )
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn malformed_schema(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedSchema, reason).with_tag(source)
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending property or argument tag, if any
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns the root cause, if any
    pub fn cause(&self) -> Option<&LedgerError> {
        self.cause.as_deref()
    }

    /// Innermost cause, or self when there is none
    pub fn root_cause(&self) -> &LedgerError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::storage(format!("JSON error: {}", e))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        Self::storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ErrorKind::InvalidFormat.code(), "INVALID_FORMAT");
        assert_eq!(ErrorKind::DanglingReference.code(), "DANGLING_REFERENCE");
        assert_eq!(ErrorKind::ImmutableKey.code(), "IMMUTABLE_KEY");
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(ErrorKind::Conflict.is_retryable());
        assert!(!ErrorKind::Forbidden.is_retryable());
        assert!(!ErrorKind::InvalidArgument.is_retryable());
    }

    #[test]
    fn test_invalid_argument_keeps_root_cause() {
        let err = LedgerError::invalid_argument(
            "quantity",
            LedgerError::invalid_value("must be positive"),
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.tag(), Some("quantity"));
        assert_eq!(err.root_cause().kind(), ErrorKind::InvalidValue);
        assert!(err.source().is_some());

        let display = err.to_string();
        assert!(display.contains("INVALID_ARGUMENT"));
        assert!(display.contains("quantity"));
        assert!(display.contains("must be positive"));
    }
}
