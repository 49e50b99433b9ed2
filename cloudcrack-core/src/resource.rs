//! Resource handler - trait abstracting one provisionable unit
//!
//! A handler describes a single cloud resource: its unique key, the
//! checkpoint fields its creation produces, the keys of handlers whose
//! outputs it reads, and the create/delete operations themselves. The
//! convergence loop in [`crate::provision`] drives handlers strictly in
//! sequence and resolves inputs through the checkpoint, so handlers never
//! call each other directly.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::ProvisionResult;
use cloudcrack_state::Checkpoint;

/// Output fields produced by a successful create, merged into the checkpoint
pub type Outputs = BTreeMap<String, String>;

/// One provisionable resource
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Unique key for this resource (e.g. "bucket", "job_queue")
    fn key(&self) -> &'static str;

    /// Checkpoint fields whose presence means this resource exists
    fn output_fields(&self) -> &'static [&'static str];

    /// Keys of handlers whose outputs this resource's create reads
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    /// Create the resource, resolving inputs from dependency fields in the
    /// checkpoint. Returns the output fields to record.
    async fn create(&self, checkpoint: &Checkpoint) -> ProvisionResult<Outputs>;

    /// Destroy the resource identified by its recorded checkpoint fields
    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()>;
}
