//! # Errors
//!
//! Quill carries a single structured error type through every service call.
//! Core goals:
//! - consistent status codes + names for each failure class
//! - can be carried through anyhow::Error (services return `anyhow::Result`)
//! - transport-agnostic (the HTTP crate decides how to render it)

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::Value;

/// A convenience result type for Quill core APIs.
pub type QuillResult<T> = std::result::Result<T, AnyError>;

/// Failure classes and their HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,   // 400
    NotFound,     // 404
    Conflict,     // 409
    Upload,       // 500
    AccessDenied, // 500
    General,      // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Upload => 500,
            ErrorKind::AccessDenied => 500,
            ErrorKind::General => 500,
        }
    }

    /// Error `name` (e.g. "NotFoundError")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::Upload => "UploadError",
            ErrorKind::AccessDenied => "AccessDeniedError",
            ErrorKind::General => "UnclassifiedError",
        }
    }

    /// Kebab-cased class name
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Upload => "upload",
            ErrorKind::AccessDenied => "access-denied",
            ErrorKind::General => "unclassified",
        }
    }

    /// Whether a caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Upload | ErrorKind::General)
    }
}

/// A structured Quill error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct QuillError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl QuillError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    /// Attach field-level details, e.g. `{"title": ["must not be empty"]}`.
    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through service results.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `QuillError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&QuillError> {
        err.chain().find_map(|e| e.downcast_ref::<QuillError>())
    }

    /// Turn any error into a QuillError:
    /// - if it's already a QuillError, keep it (lossless)
    /// - otherwise wrap as General, passing the message through
    pub fn normalize(err: AnyError) -> QuillError {
        match err.downcast::<QuillError>() {
            Ok(quill) => quill,
            Err(other) => QuillError::new(ErrorKind::General, other.to_string()).with_source(other),
        }
    }

    /// A copy suitable for returning to clients: the `source` chain is dropped.
    pub fn sanitize_for_client(&self) -> QuillError {
        QuillError {
            kind: self.kind,
            message: self.message.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    /// Failure envelope: `{success: false, error, errors?}`.
    pub fn to_json(&self) -> Value {
        let mut base = serde_json::json!({
            "success": false,
            "error": self.message,
        });

        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn upload(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upload, msg)
    }
    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessDenied, msg)
    }
    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::General, msg)
    }
}

impl fmt::Display for QuillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for QuillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with QuillError".
#[macro_export]
macro_rules! bail_quill {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::QuillError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::QuillError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}
