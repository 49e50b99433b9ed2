//! Cloudcrack State Management
//!
//! Persistence for the two pieces of local state the tool keeps between
//! invocations:
//!
//! - **Checkpoint**: a flat mapping from resource fields (e.g. `bucket_name`,
//!   `role_arn`) to provider-assigned identifiers, written after every
//!   provisioning attempt so a repeated run resumes instead of re-creating.
//! - **Job history**: an append-only list of submitted jobs and the input
//!   files they were started from.
//!
//! Both are single JSON files on local disk with no locking. The tool is
//! built for a single operator running one invocation at a time; concurrent
//! runs against the same files are last-writer-wins and unsupported.

pub mod checkpoint;
pub mod history;
pub mod store;

pub use checkpoint::Checkpoint;
pub use history::JobRecord;
pub use store::{CheckpointStore, JobHistoryStore, StoreError, StoreResult};
