//! S3 implementation of the state backend.
//!
//! Listing follows ListObjectsV2 continuation tokens to exhaustion and
//! preserves the store's key order. Reads fetch the whole object body before
//! parsing; state files are small enough that streaming decode buys nothing.

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::backend::StateBackend;
use crate::error::{Error, Result};
use crate::state::{is_state_file, StateFile};

/// State backend reading from one S3 bucket.
pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Create a backend over an already-authenticated client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// The bucket this backend reads from.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StateBackend for S3Backend {
    async fn list_states(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self.client.list_objects_v2().bucket(&self.bucket);

            if !prefix.is_empty() {
                req = req.prefix(prefix);
            }

            if let Some(token) = &continuation_token {
                req = req.continuation_token(token);
            }

            let resp = req
                .send()
                .await
                .map_err(|err| classify_list_error(err, &self.bucket))?;

            for obj in resp.contents() {
                if let Some(key) = obj.key() {
                    if is_state_file(key) {
                        keys.push(key.to_string());
                    }
                }
            }

            if resp.is_truncated() == Some(true) {
                match resp.next_continuation_token() {
                    Some(token) => continuation_token = Some(token.to_string()),
                    None => break,
                }
            } else {
                break;
            }
        }

        debug!(bucket = %self.bucket, prefix, count = keys.len(), "listed state files");
        Ok(keys)
    }

    async fn get_state(&self, path: &str) -> Result<StateFile> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|err| classify_get_error(err, &self.bucket, path))?;

        let bytes = resp
            .body
            .collect()
            .await
            .map_err(|e| Error::Store(format!("failed to read body of '{path}': {e}")))?
            .into_bytes();

        StateFile::parse(path, &bytes)
    }
}

/// Classify a ListObjectsV2 failure into the library taxonomy.
fn classify_list_error(err: SdkError<ListObjectsV2Error>, bucket: &str) -> Error {
    match err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.into_err();
            if service_err.is_no_such_bucket() {
                Error::BucketNotFound {
                    bucket: bucket.to_string(),
                }
            } else if is_access_denied(service_err.code()) {
                Error::AccessDenied {
                    subject: format!("bucket '{bucket}'"),
                }
            } else {
                Error::Store(format!("list failed: {service_err}"))
            }
        }
        other => Error::Store(format!("list failed: {other}")),
    }
}

/// Classify a GetObject failure into the library taxonomy.
///
/// A missing bucket is not a modeled GetObject variant, so it is matched by
/// error code alongside AccessDenied.
fn classify_get_error(err: SdkError<GetObjectError>, bucket: &str, key: &str) -> Error {
    match err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.into_err();
            if service_err.is_no_such_key() {
                Error::ObjectNotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
            } else if service_err.code() == Some("NoSuchBucket") {
                Error::BucketNotFound {
                    bucket: bucket.to_string(),
                }
            } else if is_access_denied(service_err.code()) {
                Error::AccessDenied {
                    subject: format!("file '{key}'"),
                }
            } else {
                Error::Store(format!("read failed: {service_err}"))
            }
        }
        other => Error::Store(format!("read failed: {other}")),
    }
}

fn is_access_denied(code: Option<&str>) -> bool {
    matches!(code, Some("AccessDenied") | Some("AccessDeniedException"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_codes() {
        assert!(is_access_denied(Some("AccessDenied")));
        assert!(is_access_denied(Some("AccessDeniedException")));
        assert!(!is_access_denied(Some("NoSuchBucket")));
        assert!(!is_access_denied(None));
    }
}
