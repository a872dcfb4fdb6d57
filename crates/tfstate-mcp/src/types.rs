//! Type definitions for MCP tool inputs and outputs
//!
//! Input structs derive `JsonSchema` so the tool router can publish their
//! JSON Schemas; output structs are plain serde and serialized into the tool
//! result text.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tfstate_lib::{Resource, StateFile};

// ============================================================================
// TOOL INPUTS
// ============================================================================

/// Input for the list_tfstate_files tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTfstateFilesParams {
    /// S3 bucket name; falls back to the server's default bucket when omitted
    pub bucket_name: Option<String>,

    /// Key prefix to scope the listing (optional, e.g. 'terraform/prod/')
    pub prefix: Option<String>,

    /// AWS credential profile name (optional)
    pub profile_name: Option<String>,
}

/// Input for the read_tfstate tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadTfstateParams {
    /// S3 bucket name; falls back to the server's default bucket when omitted
    pub bucket_name: Option<String>,

    /// S3 key of the state file (e.g. 'terraform/prod/terraform.tfstate')
    pub tfstate_path: String,

    /// Resource type or name to filter by, case-insensitive substring
    /// (optional, e.g. 'aws_instance', 'my-server')
    pub search_query: Option<String>,

    /// AWS credential profile name (optional)
    pub profile_name: Option<String>,
}

// ============================================================================
// TOOL OUTPUTS
// ============================================================================

/// Output from the list_tfstate_files tool
#[derive(Debug, Clone, Serialize)]
pub struct FileListing {
    /// Bucket that was listed
    pub bucket: String,

    /// Prefix the listing was scoped to (empty for the whole bucket)
    pub prefix: String,

    /// Number of state files found
    pub total_files: usize,

    /// State file keys, in the store's listing order
    pub tfstate_files: Vec<String>,
}

/// Output from the read_tfstate tool
#[derive(Debug, Clone, Serialize)]
pub struct ParsedState {
    /// State format version
    pub version: Option<i64>,

    /// Terraform binary version that wrote the file
    pub terraform_version: Option<String>,

    /// Monotonic version counter within the lineage
    pub serial: Option<i64>,

    /// Stable identifier for this state history
    pub lineage: Option<String>,

    /// Resource count after filtering
    pub total_resources: usize,

    /// Resources (filtered when a search query was given), in source order
    pub resources: Vec<Resource>,
}

impl ParsedState {
    /// Build the tool output from an (already filtered) state file.
    pub fn from_state(state: StateFile) -> Self {
        Self {
            version: state.version,
            terraform_version: state.terraform_version,
            serial: state.serial,
            lineage: state.lineage,
            total_resources: state.resources.len(),
            resources: state.resources,
        }
    }
}

/// Structured error payload returned in MCP error results.
///
/// Success and error responses are mutually exclusive shapes: a tool call
/// either yields its output object or this payload with `is_error` set on
/// the result.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    /// Stable machine-readable error kind
    pub error: &'static str,

    /// Human-readable message
    pub message: String,
}

impl ErrorPayload {
    /// Payload for a request that fails validation before reaching the store.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            error: "invalid_params",
            message: message.into(),
        }
    }
}

impl From<&tfstate_lib::Error> for ErrorPayload {
    fn from(err: &tfstate_lib::Error) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
        }
    }
}
