//! Checkpoint field names shared between the provisioner and job operations

pub const BUCKET_NAME: &str = "bucket_name";
pub const ROLE_NAME: &str = "role_name";
pub const ROLE_ARN: &str = "role_arn";
pub const REPOSITORY_NAME: &str = "repository_name";
pub const REPOSITORY_URI: &str = "repository_uri";
pub const JOB_DEFINITION_ARN: &str = "job_definition_arn";
pub const SUBNET_ID: &str = "subnet_id";
pub const SECURITY_GROUP_ID: &str = "security_group_id";
pub const COMPUTE_ENVIRONMENT_ARN: &str = "compute_environment_arn";
pub const JOB_QUEUE_ARN: &str = "job_queue_arn";
