//! Terraform state file data model and resource filtering.
//!
//! The model is deliberately tolerant: real-world state files span several
//! Terraform versions, and partial or legacy files may omit any of the
//! top-level metadata fields. A missing `resources` array deserializes to an
//! empty list rather than an error. The `mode` and `status` fields are open
//! string enums in the source data, so they are carried verbatim instead of
//! being constrained to the values current providers emit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Recognized suffix for Terraform state objects.
pub const STATE_FILE_SUFFIX: &str = ".tfstate";

/// Returns true when `key` names a state file (exact `.tfstate` suffix,
/// so `terraform.tfstate.backup` does not match).
pub fn is_state_file(key: &str) -> bool {
    key.ends_with(STATE_FILE_SUFFIX)
}

/// A parsed Terraform state file.
///
/// Resource order matches the source file's array order; no sorting is
/// applied anywhere in this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State format version (4 for current Terraform).
    pub version: Option<i64>,

    /// Terraform binary version that wrote the file.
    pub terraform_version: Option<String>,

    /// Monotonic version counter within a lineage.
    pub serial: Option<i64>,

    /// Stable identifier for this state history.
    pub lineage: Option<String>,

    /// Resources recorded in the file, in source order.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// A single resource entry from the state's `resources` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// "managed" or "data" today; open-ended for future provider modes.
    pub mode: Option<String>,

    /// Resource type, e.g. "aws_instance".
    pub r#type: String,

    /// Resource name as written in configuration.
    pub name: String,

    /// Fully-qualified provider address.
    pub provider: Option<String>,

    /// Instances of this resource, in source order.
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// One instance of a resource (count/for_each expansions yield several).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Last-known attribute values, passed through verbatim.
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// "tainted" when marked for replacement; absent for healthy instances.
    pub status: Option<String>,

    /// Provider schema version the attributes were written under.
    pub schema_version: Option<i64>,
}

impl StateFile {
    /// Parse raw object bytes as a UTF-8 encoded JSON state file.
    ///
    /// `key` is only used to label errors; invalid UTF-8, invalid JSON and
    /// a top-level shape that is not a state object all map to
    /// [`Error::MalformedState`].
    pub fn parse(key: &str, bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::MalformedState {
            key: key.to_string(),
            message: format!("not valid UTF-8: {e}"),
        })?;
        serde_json::from_str(text).map_err(|e| Error::MalformedState {
            key: key.to_string(),
            message: format!("not valid JSON: {e}"),
        })
    }

    /// Drop every resource that does not match `query`, preserving order.
    ///
    /// `None` keeps all resources.
    pub fn retain_matching(&mut self, query: Option<&str>) {
        if let Some(query) = query {
            self.resources.retain(|r| r.matches(query));
        }
    }
}

impl Resource {
    /// Case-insensitive substring match of `query` against the resource
    /// type or name. An exact type or name therefore also matches.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.r#type.to_lowercase().contains(&query) || self.name.to_lowercase().contains(&query)
    }
}
