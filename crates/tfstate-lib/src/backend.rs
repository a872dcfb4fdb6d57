//! State backend trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::state::StateFile;

/// Read-only access to Terraform state files in one bucket.
///
/// Implementations are scoped to a single bucket; the caller decides which
/// bucket a request targets and constructs the backend accordingly. Both
/// operations are single-attempt: transient store failures surface to the
/// caller, who may simply re-invoke.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// List state file keys under `prefix`, in the store's listing order.
    ///
    /// An empty prefix matches the whole bucket. Only keys with the exact
    /// `.tfstate` suffix are returned.
    async fn list_states(&self, prefix: &str) -> Result<Vec<String>>;

    /// Fetch and parse a single state file by key.
    async fn get_state(&self, path: &str) -> Result<StateFile>;
}
