//! Cloudcrack AWS Provider
//!
//! AWS implementation of the provisioning handlers and the job backend:
//! S3 for artifact storage, IAM for the task role, ECR for the container
//! image, EC2 for networking in the default VPC, and Batch for the
//! Fargate compute environment, queue, definition, and jobs.

pub mod image;
pub mod jobs;
pub mod resources;

use aws_config::Region;
use aws_sdk_batch::Client as BatchClient;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ecr::Client as EcrClient;
use aws_sdk_iam::Client as IamClient;
use aws_sdk_s3::Client as S3Client;

use cloudcrack_core::{ResourceHandler, ToolConfig, WaitConfig};

pub use image::ImagePublisher;

/// Shared AWS clients for all provider operations
#[derive(Clone)]
pub struct AwsCloud {
    pub(crate) s3: S3Client,
    pub(crate) iam: IamClient,
    pub(crate) ecr: EcrClient,
    pub(crate) ec2: Ec2Client,
    pub(crate) batch: BatchClient,
    pub(crate) region: String,
    pub(crate) wait: WaitConfig,
}

impl AwsCloud {
    /// Create clients from the default credential chain for the configured region
    pub async fn new(config: &ToolConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        Self {
            s3: S3Client::new(&sdk_config),
            iam: IamClient::new(&sdk_config),
            ecr: EcrClient::new(&sdk_config),
            ec2: Ec2Client::new(&sdk_config),
            batch: BatchClient::new(&sdk_config),
            region: config.region.clone(),
            wait: WaitConfig::default(),
        }
    }

    /// Override the backoff settings used for provider-side waits
    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// The full resource pipeline in creation dependency order
    pub fn handlers(&self, config: &ToolConfig) -> Vec<Box<dyn ResourceHandler>> {
        resources::handlers(self.clone(), &config.unique_suffix)
    }
}
