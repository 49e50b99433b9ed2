//! Error types for provisioning and job operations

use thiserror::Error;

use cloudcrack_state::StoreError;

/// Errors from provisioning, teardown, and job operations
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A provider control-plane call failed
    #[error("provider call failed for '{key}': {message}")]
    Provider { key: String, message: String },

    /// A polled provider-side transition did not complete in time
    #[error("timed out waiting for {condition} after {attempts} attempts")]
    Timeout { condition: String, attempts: u32 },

    /// An operation was invoked before the resources it needs were provisioned
    #[error("not provisioned: {0}; run `setup create` first")]
    NotProvisioned(String),

    /// A referenced object does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A handler sequence lists a dependency after its dependent
    #[error("handler '{key}' depends on '{dependency}' which does not appear earlier in the sequence")]
    Ordering { key: String, dependency: String },

    /// Checkpoint or job-history store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProvisionError {
    /// Build a provider failure for a resource key
    pub fn provider(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for provisioning and job operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;
