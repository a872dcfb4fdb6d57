//! MCP server state and tool implementations
//!
//! The server holds the process-wide S3 client factory and the optional
//! startup defaults (bucket, profile). Each tool call resolves its bucket,
//! borrows an authenticated client from the factory, and runs one of the two
//! read-only operations against a [`StateBackend`].

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;
use tracing::info;

use tfstate_lib::{ClientFactory, S3Backend, StateBackend, StoreConfig};

use crate::types::{
    ErrorPayload, FileListing, ListTfstateFilesParams, ParsedState, ReadTfstateParams,
};

/// Startup configuration for the MCP server.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Default bucket used when a tool call omits `bucket_name`.
    pub default_bucket: Option<String>,

    /// Store configuration: default profile, region and endpoint overrides.
    pub store: StoreConfig,
}

/// Terraform state MCP server.
#[derive(Clone)]
pub struct TfstateServer {
    default_bucket: Option<String>,
    factory: Arc<ClientFactory>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TfstateServer {
    pub fn new(options: ServerOptions) -> Self {
        Self {
            default_bucket: options.default_bucket,
            factory: Arc::new(ClientFactory::new(options.store)),
            tool_router: Self::tool_router(),
        }
    }

    /// Per-call bucket wins over the server default.
    fn resolve_bucket(&self, bucket_name: Option<String>) -> Option<String> {
        bucket_name
            .filter(|b| !b.is_empty())
            .or_else(|| self.default_bucket.clone())
    }

    async fn backend(
        &self,
        bucket: &str,
        profile: Option<&str>,
    ) -> tfstate_lib::Result<S3Backend> {
        let client = self.factory.client(profile).await?;
        Ok(S3Backend::new(client, bucket))
    }

    /// List every .tfstate key in a bucket
    #[tool(
        description = "List all Terraform state file (.tfstate) keys in an S3 bucket, \
                       optionally scoped by a key prefix. AWS credentials come from the \
                       profile_name parameter, the AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY \
                       environment variables, or the default credential chain."
    )]
    async fn list_tfstate_files(
        &self,
        params: Parameters<ListTfstateFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        let ListTfstateFilesParams {
            bucket_name,
            prefix,
            profile_name,
        } = params.0;

        let Some(bucket) = self.resolve_bucket(bucket_name) else {
            return missing_bucket_result();
        };
        let prefix = prefix.unwrap_or_default();

        info!(bucket, prefix, "listing tfstate files");

        let backend = match self.backend(&bucket, profile_name.as_deref()).await {
            Ok(backend) => backend,
            Err(err) => return error_result(&err),
        };

        match list_state_files(&backend, &bucket, &prefix).await {
            Ok(listing) => success_result(&listing),
            Err(err) => error_result(&err),
        }
    }

    /// Read one state file, optionally filtering its resources
    #[tool(
        description = "Read a Terraform state file from S3 and return its metadata and \
                       resources. An optional search_query filters resources by a \
                       case-insensitive substring match against resource type or name. \
                       AWS credentials come from the profile_name parameter, the \
                       AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY environment variables, or \
                       the default credential chain."
    )]
    async fn read_tfstate(
        &self,
        params: Parameters<ReadTfstateParams>,
    ) -> Result<CallToolResult, McpError> {
        let ReadTfstateParams {
            bucket_name,
            tfstate_path,
            search_query,
            profile_name,
        } = params.0;

        let Some(bucket) = self.resolve_bucket(bucket_name) else {
            return missing_bucket_result();
        };
        if tfstate_path.is_empty() {
            return invalid_params_result("tfstate_path must not be empty");
        }

        info!(bucket, path = %tfstate_path, "reading tfstate file");

        let backend = match self.backend(&bucket, profile_name.as_deref()).await {
            Ok(backend) => backend,
            Err(err) => return error_result(&err),
        };

        match read_state_file(&backend, &tfstate_path, search_query.as_deref()).await {
            Ok(parsed) => success_result(&parsed),
            Err(err) => error_result(&err),
        }
    }
}

#[tool_handler]
impl ServerHandler for TfstateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "tfstate-analyzer".to_string(),
                title: Some("Terraform State Analyzer".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only access to Terraform state files stored in S3. \
                 Use list_tfstate_files to enumerate .tfstate keys in a bucket and \
                 read_tfstate to fetch one file's metadata and resources, optionally \
                 filtered by resource type or name."
                    .to_string(),
            ),
        }
    }
}

/// Enumerate state files under `prefix` and wrap the keys into the listing
/// output.
pub(crate) async fn list_state_files(
    backend: &dyn StateBackend,
    bucket: &str,
    prefix: &str,
) -> tfstate_lib::Result<FileListing> {
    let keys = backend.list_states(prefix).await?;
    Ok(FileListing {
        bucket: bucket.to_string(),
        prefix: prefix.to_string(),
        total_files: keys.len(),
        tfstate_files: keys,
    })
}

/// Fetch one state file and apply the optional resource filter.
///
/// An empty query string means "no filter", matching the behavior callers
/// expect from an omitted parameter.
pub(crate) async fn read_state_file(
    backend: &dyn StateBackend,
    path: &str,
    search_query: Option<&str>,
) -> tfstate_lib::Result<ParsedState> {
    let mut state = backend.get_state(path).await?;
    state.retain_matching(search_query.filter(|q| !q.is_empty()));
    Ok(ParsedState::from_state(state))
}

fn success_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let content = serde_json::to_string_pretty(output)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(content)]))
}

fn error_result(err: &tfstate_lib::Error) -> Result<CallToolResult, McpError> {
    let payload = ErrorPayload::from(err);
    let content = serde_json::to_string_pretty(&payload)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::error(vec![Content::text(content)]))
}

fn invalid_params_result(message: &str) -> Result<CallToolResult, McpError> {
    let payload = ErrorPayload::invalid_params(message);
    let content = serde_json::to_string_pretty(&payload)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::error(vec![Content::text(content)]))
}

fn missing_bucket_result() -> Result<CallToolResult, McpError> {
    invalid_params_result("bucket_name is required (no default bucket configured)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use tfstate_lib::{is_state_file, Error, StateFile};

    /// In-memory backend mirroring the S3 backend's listing semantics:
    /// prefix scoping, exact suffix filter, insertion order preserved.
    struct FakeBackend {
        objects: Vec<(String, Vec<u8>)>,
    }

    impl FakeBackend {
        fn new(objects: &[(&str, &str)]) -> Self {
            Self {
                objects: objects
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl StateBackend for FakeBackend {
        async fn list_states(&self, prefix: &str) -> tfstate_lib::Result<Vec<String>> {
            Ok(self
                .objects
                .iter()
                .filter(|(k, _)| k.starts_with(prefix) && is_state_file(k))
                .map(|(k, _)| k.clone())
                .collect())
        }

        async fn get_state(&self, path: &str) -> tfstate_lib::Result<StateFile> {
            let body = self
                .objects
                .iter()
                .find(|(k, _)| k == path)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Error::ObjectNotFound {
                    bucket: "fake".to_string(),
                    key: path.to_string(),
                })?;
            StateFile::parse(path, &body)
        }
    }

    const SCENARIO_STATE: &str =
        r#"{"version":4,"resources":[{"type":"aws_instance","name":"x","instances":[]}]}"#;

    fn scenario_backend() -> FakeBackend {
        FakeBackend::new(&[
            ("a.tfstate", SCENARIO_STATE),
            ("a.txt", "not a state file"),
            ("dir/b.tfstate", r#"{"version":4,"resources":[]}"#),
        ])
    }

    #[tokio::test]
    async fn listing_keeps_only_tfstate_keys_in_store_order() {
        let backend = scenario_backend();
        let listing = list_state_files(&backend, "tf-bucket", "").await.unwrap();

        assert_eq!(listing.bucket, "tf-bucket");
        assert_eq!(listing.prefix, "");
        assert_eq!(listing.total_files, 2);
        assert_eq!(listing.tfstate_files, vec!["a.tfstate", "dir/b.tfstate"]);
    }

    #[tokio::test]
    async fn listing_respects_prefix() {
        let backend = scenario_backend();
        let listing = list_state_files(&backend, "tf-bucket", "dir/").await.unwrap();

        assert_eq!(listing.total_files, 1);
        assert_eq!(listing.tfstate_files, vec!["dir/b.tfstate"]);
    }

    #[tokio::test]
    async fn read_without_query_returns_all_resources() {
        let backend = scenario_backend();
        let parsed = read_state_file(&backend, "a.tfstate", None).await.unwrap();

        assert_eq!(parsed.version, Some(4));
        assert_eq!(parsed.total_resources, 1);
        assert_eq!(parsed.resources[0].r#type, "aws_instance");
    }

    #[tokio::test]
    async fn read_with_exact_type_query_filters() {
        let backend = scenario_backend();
        let parsed = read_state_file(&backend, "a.tfstate", Some("aws_instance"))
            .await
            .unwrap();

        assert_eq!(parsed.total_resources, 1);
        assert_eq!(parsed.resources[0].name, "x");
    }

    #[tokio::test]
    async fn read_with_unmatched_query_is_empty_success() {
        let backend = scenario_backend();
        let parsed = read_state_file(&backend, "a.tfstate", Some("azurerm"))
            .await
            .unwrap();

        assert_eq!(parsed.total_resources, 0);
        assert!(parsed.resources.is_empty());
    }

    #[tokio::test]
    async fn read_with_empty_query_is_no_filter() {
        let backend = scenario_backend();
        let parsed = read_state_file(&backend, "a.tfstate", Some("")).await.unwrap();

        assert_eq!(parsed.total_resources, 1);
    }

    #[tokio::test]
    async fn read_missing_key_is_object_not_found() {
        let backend = scenario_backend();
        let err = read_state_file(&backend, "nope.tfstate", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ObjectNotFound { .. }));
        assert_eq!(err.kind(), "object_not_found");
    }

    #[tokio::test]
    async fn read_non_json_body_is_malformed_state() {
        let backend = FakeBackend::new(&[("bad.tfstate", "{{{{")]);
        let err = read_state_file(&backend, "bad.tfstate", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedState { .. }));
    }

    #[test]
    fn bucket_resolution_prefers_call_argument() {
        let server = TfstateServer::new(ServerOptions {
            default_bucket: Some("default-bucket".to_string()),
            store: StoreConfig::default(),
        });

        assert_eq!(
            server.resolve_bucket(Some("call-bucket".to_string())),
            Some("call-bucket".to_string())
        );
        assert_eq!(
            server.resolve_bucket(None),
            Some("default-bucket".to_string())
        );
        // An empty bucket_name is treated as absent.
        assert_eq!(
            server.resolve_bucket(Some(String::new())),
            Some("default-bucket".to_string())
        );

        let bare = TfstateServer::new(ServerOptions::default());
        assert_eq!(bare.resolve_bucket(None), None);
    }

    #[test]
    fn error_results_carry_structured_payload() {
        let err = Error::BucketNotFound {
            bucket: "tf-bucket".to_string(),
        };
        let result = serde_json::to_value(error_result(&err).unwrap()).unwrap();

        assert_eq!(result["isError"], true);
        let payload: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(payload["error"], "bucket_not_found");
        assert!(payload["message"].as_str().unwrap().contains("tf-bucket"));
    }

    #[test]
    fn missing_bucket_is_invalid_params() {
        let result = serde_json::to_value(missing_bucket_result().unwrap()).unwrap();

        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("invalid_params"));
        assert!(text.contains("bucket_name"));
    }
}
