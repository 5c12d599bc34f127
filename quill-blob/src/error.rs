use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("{message}")]
    Invalid { message: String },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },
}

impl BlobError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn access_denied<S: Into<String>>(message: S) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    pub fn upload_failed<S: Into<String>>(reason: S) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    /// Permission and validation failures will fail again; transport
    /// failures may not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UploadFailed { .. })
    }
}

/// Store error codes that mean the credentials or bucket policy forbid the call.
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "AccountProblem",
];

/// Maps an object-store error code and message onto a [`BlobError`].
pub fn classify_store_error(code: Option<&str>, message: &str) -> BlobError {
    match code {
        Some(code) if ACCESS_DENIED_CODES.contains(&code) => BlobError::access_denied(message),
        Some(code) => BlobError::upload_failed(format!("{code}: {message}")),
        None => BlobError::upload_failed(message),
    }
}
