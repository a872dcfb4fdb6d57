use thiserror::Error;

/// Convenient result alias for the tfstate library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Every failure from the object store is classified into one of these
/// variants at the backend boundary; callers never see raw SDK errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the requested bucket does not exist.
    #[error("bucket '{bucket}' not found")]
    BucketNotFound { bucket: String },

    /// Raised when the requested object key does not exist in the bucket.
    #[error("file '{key}' not found in bucket '{bucket}'")]
    ObjectNotFound { bucket: String, key: String },

    /// Raised when the store refuses a list or read due to missing permissions.
    #[error("access denied to {subject}")]
    AccessDenied { subject: String },

    /// Raised when no usable AWS credentials could be resolved.
    #[error(
        "AWS credentials not found; provide a profile name, set \
         AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, or configure a default profile"
    )]
    CredentialsMissing,

    /// Raised when a fetched state file is not valid UTF-8/JSON.
    #[error("file '{key}' is not a valid state file: {message}")]
    MalformedState { key: String, message: String },

    /// Residual object-store failures that fit no other variant.
    #[error("object store error: {0}")]
    Store(String),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable kind string, used in tool error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BucketNotFound { .. } => "bucket_not_found",
            Error::ObjectNotFound { .. } => "object_not_found",
            Error::AccessDenied { .. } => "access_denied",
            Error::CredentialsMissing => "credentials_missing",
            Error::MalformedState { .. } => "malformed_state",
            Error::Store(_) => "store_error",
            Error::Io(_) => "io_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_not_found_names_the_bucket() {
        let err = Error::BucketNotFound {
            bucket: "tf-bucket".to_string(),
        };
        assert_eq!(err.to_string(), "bucket 'tf-bucket' not found");
        assert_eq!(err.kind(), "bucket_not_found");
    }

    #[test]
    fn object_not_found_names_bucket_and_key() {
        let err = Error::ObjectNotFound {
            bucket: "tf-bucket".to_string(),
            key: "prod/terraform.tfstate".to_string(),
        };
        assert!(err.to_string().contains("prod/terraform.tfstate"));
        assert!(err.to_string().contains("tf-bucket"));
        assert_eq!(err.kind(), "object_not_found");
    }

    #[test]
    fn malformed_state_carries_detail() {
        let err = Error::MalformedState {
            key: "broken.tfstate".to_string(),
            message: "not valid JSON".to_string(),
        };
        assert!(err.to_string().contains("broken.tfstate"));
        assert_eq!(err.kind(), "malformed_state");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), "io_error");
    }
}
