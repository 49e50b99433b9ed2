//! Cloudcrack Core
//!
//! Engine for provisioning a cloud password-cracking pipeline and running
//! jobs against it. The provisioning side is a convergence loop over an
//! ordered set of resource handlers backed by a persisted checkpoint; the
//! job side uploads inputs, submits to the compute backend, and joins
//! tracked job ids against backend status reports.

pub mod config;
pub mod error;
pub mod fields;
pub mod job;
pub mod provision;
pub mod resource;
pub mod waiter;

pub use config::ToolConfig;
pub use error::{ProvisionError, ProvisionResult};
pub use job::{JobBackend, JobDetail, StatusRow, SubmitSpec};
pub use resource::{Outputs, ResourceHandler};
pub use waiter::WaitConfig;
