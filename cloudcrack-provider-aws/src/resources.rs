//! Resource handlers for the cracking pipeline
//!
//! One handler per provisionable unit, in creation dependency order:
//! bucket, role, repository, job definition, subnet, security group,
//! compute environment, job queue. Each create resolves its inputs from
//! dependency fields already recorded in the checkpoint.

use async_trait::async_trait;

use cloudcrack_core::error::{ProvisionError, ProvisionResult};
use cloudcrack_core::fields;
use cloudcrack_core::resource::{Outputs, ResourceHandler};
use cloudcrack_core::waiter::wait_until;
use cloudcrack_state::Checkpoint;

use crate::AwsCloud;

/// Managed policies attached to the task role
const ROLE_POLICY_ARNS: [&str; 3] = [
    "arn:aws:iam::aws:policy/AmazonS3FullAccess",
    "arn:aws:iam::aws:policy/CloudWatchLogsFullAccess",
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy",
];

/// Service-linked role Batch uses for managed compute environments
const BATCH_SERVICE_ROLE: &str = "AWSServiceRoleForBatch";

/// Container user the job image runs as
const CONTAINER_USER: &str = "hashcat";

/// Build the full handler pipeline in creation dependency order
pub fn handlers(cloud: AwsCloud, suffix: &str) -> Vec<Box<dyn ResourceHandler>> {
    vec![
        Box::new(BucketHandler {
            cloud: cloud.clone(),
            name: bucket_name(suffix),
        }),
        Box::new(RoleHandler {
            cloud: cloud.clone(),
            name: format!("iam{}", suffix),
        }),
        Box::new(RepositoryHandler {
            cloud: cloud.clone(),
            name: sanitize_lower(&format!("repo{}", suffix)),
        }),
        Box::new(JobDefinitionHandler {
            cloud: cloud.clone(),
            name: format!("batch-job{}", suffix),
        }),
        Box::new(SubnetHandler {
            cloud: cloud.clone(),
        }),
        Box::new(SecurityGroupHandler {
            cloud: cloud.clone(),
            name: format!("sg{}", suffix),
        }),
        Box::new(ComputeEnvironmentHandler {
            cloud: cloud.clone(),
            name: format!("compute-env{}", suffix),
        }),
        Box::new(JobQueueHandler {
            cloud,
            name: format!("job-q{}", suffix),
        }),
    ]
}

/// Lowercase and squash characters S3 and ECR names reject
fn sanitize_lower(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}

fn bucket_name(suffix: &str) -> String {
    sanitize_lower(&format!("bucket{}", suffix))
}

/// Derive a /24 inside the VPC CIDR at the .100.0 offset
/// (e.g. "172.31.0.0/16" -> "172.31.100.0/24")
fn derive_subnet_cidr(vpc_cidr: &str) -> ProvisionResult<String> {
    let base = vpc_cidr
        .split('/')
        .next()
        .unwrap_or_default();
    let octets: Vec<&str> = base.split('.').collect();
    if octets.len() != 4 {
        return Err(ProvisionError::provider(
            "subnet",
            format!("unexpected VPC CIDR block '{}'", vpc_cidr),
        ));
    }
    Ok(format!("{}.{}.100.0/24", octets[0], octets[1]))
}

fn require<'a>(checkpoint: &'a Checkpoint, field: &str, key: &str) -> ProvisionResult<&'a str> {
    checkpoint
        .get(field)
        .ok_or_else(|| ProvisionError::provider(key, format!("missing dependency field '{}'", field)))
}

impl AwsCloud {
    /// Find the default VPC's id and CIDR block
    async fn default_vpc(&self, key: &str) -> ProvisionResult<(String, String)> {
        use aws_sdk_ec2::types::Filter;

        let filter = Filter::builder().name("isDefault").values("true").build();

        let result = self
            .ec2
            .describe_vpcs()
            .filters(filter)
            .send()
            .await
            .map_err(|e| ProvisionError::provider(key, format!("Failed to describe VPCs: {:?}", e)))?;

        let vpc = result
            .vpcs()
            .first()
            .ok_or_else(|| ProvisionError::provider(key, "no default VPC found"))?;

        let vpc_id = vpc
            .vpc_id()
            .ok_or_else(|| ProvisionError::provider(key, "default VPC has no id"))?;
        let cidr = vpc
            .cidr_block()
            .ok_or_else(|| ProvisionError::provider(key, "default VPC has no CIDR block"))?;

        Ok((vpc_id.to_string(), cidr.to_string()))
    }

    /// Poll a compute environment until its status settles on VALID
    async fn wait_compute_environment_valid(&self, arn: &str, key: &str) -> ProvisionResult<()> {
        let arn = arn.to_string();
        let key = key.to_string();
        wait_until(
            "compute environment to become VALID",
            &self.wait,
            move || {
                let batch = self.batch.clone();
                let arn = arn.clone();
                let key = key.clone();
                async move {
                    let result = batch
                        .describe_compute_environments()
                        .compute_environments(&arn)
                        .send()
                        .await
                        .map_err(|e| {
                            ProvisionError::provider(
                                &key,
                                format!("Failed to describe compute environment: {:?}", e),
                            )
                        })?;

                    Ok(result
                        .compute_environments()
                        .first()
                        .and_then(|ce| ce.status())
                        .is_some_and(|s| s.as_str() == "VALID"))
                }
            },
        )
        .await
    }

    /// Poll a job queue until its status settles on VALID
    async fn wait_job_queue_valid(&self, arn: &str, key: &str) -> ProvisionResult<()> {
        let arn = arn.to_string();
        let key = key.to_string();
        wait_until("job queue to become VALID", &self.wait, move || {
            let batch = self.batch.clone();
            let arn = arn.clone();
            let key = key.clone();
            async move {
                let result = batch
                    .describe_job_queues()
                    .job_queues(&arn)
                    .send()
                    .await
                    .map_err(|e| {
                        ProvisionError::provider(
                            &key,
                            format!("Failed to describe job queue: {:?}", e),
                        )
                    })?;

                Ok(result
                    .job_queues()
                    .first()
                    .and_then(|q| q.status())
                    .is_some_and(|s| s.as_str() == "VALID"))
            }
        })
        .await
    }
}

/// Private S3 bucket for wordlists, inputs, and cracked output
struct BucketHandler {
    cloud: AwsCloud,
    name: String,
}

#[async_trait]
impl ResourceHandler for BucketHandler {
    fn key(&self) -> &'static str {
        "bucket"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::BUCKET_NAME]
    }

    async fn create(&self, _checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        use aws_sdk_s3::types::{BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration};

        let mut req = self
            .cloud
            .s3
            .create_bucket()
            .bucket(&self.name)
            .acl(BucketCannedAcl::Private);

        // us-east-1 rejects an explicit LocationConstraint
        if self.cloud.region != "us-east-1" {
            let constraint = BucketLocationConstraint::from(self.cloud.region.as_str());
            let config = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            req = req.create_bucket_configuration(config);
        }

        req.send().await.map_err(|e| {
            ProvisionError::provider(self.key(), format!("Failed to create bucket: {:?}", e))
        })?;

        let mut outputs = Outputs::new();
        outputs.insert(fields::BUCKET_NAME.to_string(), self.name.clone());
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        let bucket = require(checkpoint, fields::BUCKET_NAME, self.key())?;

        // The bucket must be empty before it can be deleted
        let mut pages = self
            .cloud
            .s3
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to list objects: {:?}", e))
            })?;

            for object in page.contents() {
                if let Some(key) = object.key() {
                    self.cloud
                        .s3
                        .delete_object()
                        .bucket(bucket)
                        .key(key)
                        .send()
                        .await
                        .map_err(|e| {
                            ProvisionError::provider(
                                self.key(),
                                format!("Failed to delete object '{}': {:?}", key, e),
                            )
                        })?;
                }
            }
        }

        self.cloud
            .s3
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to delete bucket: {:?}", e))
            })?;

        Ok(())
    }
}

/// IAM task role assumed by the job containers
struct RoleHandler {
    cloud: AwsCloud,
    name: String,
}

#[async_trait]
impl ResourceHandler for RoleHandler {
    fn key(&self) -> &'static str {
        "role"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::ROLE_NAME, fields::ROLE_ARN]
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["bucket"]
    }

    async fn create(&self, _checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        let trust_policy = serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "",
                "Effect": "Allow",
                "Principal": { "Service": "ecs-tasks.amazonaws.com" },
                "Action": "sts:AssumeRole"
            }]
        });

        let result = self
            .cloud
            .iam
            .create_role()
            .role_name(&self.name)
            .assume_role_policy_document(trust_policy.to_string())
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to create role: {:?}", e))
            })?;

        let role_arn = result
            .role()
            .map(|r| r.arn().to_string())
            .ok_or_else(|| ProvisionError::provider(self.key(), "role created but not returned"))?;

        for policy_arn in ROLE_POLICY_ARNS {
            self.cloud
                .iam
                .attach_role_policy()
                .role_name(&self.name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map_err(|e| {
                    ProvisionError::provider(
                        self.key(),
                        format!("Failed to attach policy '{}': {:?}", policy_arn, e),
                    )
                })?;
        }

        let mut outputs = Outputs::new();
        outputs.insert(fields::ROLE_NAME.to_string(), self.name.clone());
        outputs.insert(fields::ROLE_ARN.to_string(), role_arn);
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        let role_name = require(checkpoint, fields::ROLE_NAME, self.key())?;

        for policy_arn in ROLE_POLICY_ARNS {
            self.cloud
                .iam
                .detach_role_policy()
                .role_name(role_name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map_err(|e| {
                    ProvisionError::provider(
                        self.key(),
                        format!("Failed to detach policy '{}': {:?}", policy_arn, e),
                    )
                })?;
        }

        self.cloud
            .iam
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to delete role: {:?}", e))
            })?;

        Ok(())
    }
}

/// ECR repository holding the cracking container image
struct RepositoryHandler {
    cloud: AwsCloud,
    name: String,
}

#[async_trait]
impl ResourceHandler for RepositoryHandler {
    fn key(&self) -> &'static str {
        "repository"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::REPOSITORY_NAME, fields::REPOSITORY_URI]
    }

    async fn create(&self, _checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        let result = self
            .cloud
            .ecr
            .create_repository()
            .repository_name(&self.name)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to create repository: {:?}", e))
            })?;

        let uri = result
            .repository()
            .and_then(|r| r.repository_uri())
            .ok_or_else(|| {
                ProvisionError::provider(self.key(), "repository created but no URI returned")
            })?;

        let mut outputs = Outputs::new();
        outputs.insert(fields::REPOSITORY_NAME.to_string(), self.name.clone());
        outputs.insert(fields::REPOSITORY_URI.to_string(), uri.to_string());
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        let name = require(checkpoint, fields::REPOSITORY_NAME, self.key())?;

        self.cloud
            .ecr
            .delete_repository()
            .repository_name(name)
            .force(true)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to delete repository: {:?}", e))
            })?;

        Ok(())
    }
}

/// Batch job definition running the container image on Fargate
struct JobDefinitionHandler {
    cloud: AwsCloud,
    name: String,
}

#[async_trait]
impl ResourceHandler for JobDefinitionHandler {
    fn key(&self) -> &'static str {
        "job_definition"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::JOB_DEFINITION_ARN]
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["role", "repository"]
    }

    async fn create(&self, checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        use aws_sdk_batch::types::{
            AssignPublicIp, ContainerProperties, JobDefinitionType, NetworkConfiguration,
            PlatformCapability, ResourceRequirement, ResourceType,
        };

        let role_arn = require(checkpoint, fields::ROLE_ARN, self.key())?;
        let repository_uri = require(checkpoint, fields::REPOSITORY_URI, self.key())?;
        let image = format!("{}:latest", repository_uri);

        let vcpu = ResourceRequirement::builder()
            .value("1")
            .r#type(ResourceType::Vcpu)
            .build()
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to build vCPU requirement: {}", e))
            })?;
        let memory = ResourceRequirement::builder()
            .value("2048")
            .r#type(ResourceType::Memory)
            .build()
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to build memory requirement: {}", e))
            })?;

        let network = NetworkConfiguration::builder()
            .assign_public_ip(AssignPublicIp::Enabled)
            .build();

        // Jobs run with the task role as both job role and execution role
        let container = ContainerProperties::builder()
            .image(image)
            .job_role_arn(role_arn)
            .execution_role_arn(role_arn)
            .user(CONTAINER_USER)
            .network_configuration(network)
            .resource_requirements(vcpu)
            .resource_requirements(memory)
            .build();

        let result = self
            .cloud
            .batch
            .register_job_definition()
            .job_definition_name(&self.name)
            .r#type(JobDefinitionType::Container)
            .platform_capabilities(PlatformCapability::Fargate)
            .container_properties(container)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to register job definition: {:?}", e),
                )
            })?;

        let arn = result.job_definition_arn().ok_or_else(|| {
            ProvisionError::provider(self.key(), "job definition registered but no ARN returned")
        })?;

        let mut outputs = Outputs::new();
        outputs.insert(fields::JOB_DEFINITION_ARN.to_string(), arn.to_string());
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        let arn = require(checkpoint, fields::JOB_DEFINITION_ARN, self.key())?;

        self.cloud
            .batch
            .deregister_job_definition()
            .job_definition(arn)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to deregister job definition: {:?}", e),
                )
            })?;

        Ok(())
    }
}

/// Dedicated subnet in the default VPC
struct SubnetHandler {
    cloud: AwsCloud,
}

#[async_trait]
impl ResourceHandler for SubnetHandler {
    fn key(&self) -> &'static str {
        "subnet"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::SUBNET_ID]
    }

    async fn create(&self, _checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        let (vpc_id, vpc_cidr) = self.cloud.default_vpc(self.key()).await?;
        let subnet_cidr = derive_subnet_cidr(&vpc_cidr)?;

        let result = self
            .cloud
            .ec2
            .create_subnet()
            .vpc_id(&vpc_id)
            .cidr_block(&subnet_cidr)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to create subnet: {:?}", e))
            })?;

        let subnet_id = result.subnet().and_then(|s| s.subnet_id()).ok_or_else(|| {
            ProvisionError::provider(self.key(), "subnet created but no ID returned")
        })?;

        let mut outputs = Outputs::new();
        outputs.insert(fields::SUBNET_ID.to_string(), subnet_id.to_string());
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        let subnet_id = require(checkpoint, fields::SUBNET_ID, self.key())?;

        self.cloud
            .ec2
            .delete_subnet()
            .subnet_id(subnet_id)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to delete subnet: {:?}", e))
            })?;

        Ok(())
    }
}

/// Security group for the Fargate tasks, default egress only
struct SecurityGroupHandler {
    cloud: AwsCloud,
    name: String,
}

#[async_trait]
impl ResourceHandler for SecurityGroupHandler {
    fn key(&self) -> &'static str {
        "security_group"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::SECURITY_GROUP_ID]
    }

    async fn create(&self, _checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        let (vpc_id, _) = self.cloud.default_vpc(self.key()).await?;

        let result = self
            .cloud
            .ec2
            .create_security_group()
            .group_name(&self.name)
            .description(format!("Security group for {}", self.name))
            .vpc_id(&vpc_id)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to create security group: {:?}", e),
                )
            })?;

        let group_id = result.group_id().ok_or_else(|| {
            ProvisionError::provider(self.key(), "security group created but no ID returned")
        })?;

        let mut outputs = Outputs::new();
        outputs.insert(fields::SECURITY_GROUP_ID.to_string(), group_id.to_string());
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        let group_id = require(checkpoint, fields::SECURITY_GROUP_ID, self.key())?;

        self.cloud
            .ec2
            .delete_security_group()
            .group_id(group_id)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to delete security group: {:?}", e),
                )
            })?;

        Ok(())
    }
}

/// Managed Fargate Spot compute environment
struct ComputeEnvironmentHandler {
    cloud: AwsCloud,
    name: String,
}

#[async_trait]
impl ResourceHandler for ComputeEnvironmentHandler {
    fn key(&self) -> &'static str {
        "compute_environment"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::COMPUTE_ENVIRONMENT_ARN]
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["subnet", "security_group"]
    }

    async fn create(&self, checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        use aws_sdk_batch::types::{CeState, CeType, ComputeResource, CrType};

        let subnet_id = require(checkpoint, fields::SUBNET_ID, self.key())?;
        let security_group_id = require(checkpoint, fields::SECURITY_GROUP_ID, self.key())?;

        let service_role = self
            .cloud
            .iam
            .get_role()
            .role_name(BATCH_SERVICE_ROLE)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to look up '{}': {:?}", BATCH_SERVICE_ROLE, e),
                )
            })?
            .role()
            .map(|r| r.arn().to_string())
            .ok_or_else(|| {
                ProvisionError::provider(self.key(), "Batch service role not returned")
            })?;

        let compute_resources = ComputeResource::builder()
            .r#type(CrType::FargateSpot)
            .maxv_cpus(256)
            .subnets(subnet_id)
            .security_group_ids(security_group_id)
            .build()
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to build compute resources: {}", e),
                )
            })?;

        let result = self
            .cloud
            .batch
            .create_compute_environment()
            .compute_environment_name(&self.name)
            .r#type(CeType::Managed)
            .state(CeState::Enabled)
            .compute_resources(compute_resources)
            .service_role(service_role)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to create compute environment: {:?}", e),
                )
            })?;

        let arn = result.compute_environment_arn().ok_or_else(|| {
            ProvisionError::provider(self.key(), "compute environment created but no ARN returned")
        })?;

        let mut outputs = Outputs::new();
        outputs.insert(fields::COMPUTE_ENVIRONMENT_ARN.to_string(), arn.to_string());
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        use aws_sdk_batch::types::CeState;

        let arn = require(checkpoint, fields::COMPUTE_ENVIRONMENT_ARN, self.key())?;

        self.cloud
            .batch
            .update_compute_environment()
            .compute_environment(arn)
            .state(CeState::Disabled)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to disable compute environment: {:?}", e),
                )
            })?;

        self.cloud.wait_compute_environment_valid(arn, self.key()).await?;

        self.cloud
            .batch
            .delete_compute_environment()
            .compute_environment(arn)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to delete compute environment: {:?}", e),
                )
            })?;

        Ok(())
    }
}

/// Enabled job queue feeding the compute environment
struct JobQueueHandler {
    cloud: AwsCloud,
    name: String,
}

#[async_trait]
impl ResourceHandler for JobQueueHandler {
    fn key(&self) -> &'static str {
        "job_queue"
    }

    fn output_fields(&self) -> &'static [&'static str] {
        &[fields::JOB_QUEUE_ARN]
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["compute_environment"]
    }

    async fn create(&self, checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
        use aws_sdk_batch::types::{ComputeEnvironmentOrder, JqState};

        let environment_arn = require(checkpoint, fields::COMPUTE_ENVIRONMENT_ARN, self.key())?;

        // A queue can only reference an environment that has settled
        self.cloud
            .wait_compute_environment_valid(environment_arn, self.key())
            .await?;

        let order = ComputeEnvironmentOrder::builder()
            .order(1)
            .compute_environment(environment_arn)
            .build()
            .map_err(|e| {
                ProvisionError::provider(
                    self.key(),
                    format!("Failed to build environment order: {}", e),
                )
            })?;

        let result = self
            .cloud
            .batch
            .create_job_queue()
            .job_queue_name(&self.name)
            .state(JqState::Enabled)
            .priority(1)
            .compute_environment_order(order)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to create job queue: {:?}", e))
            })?;

        let arn = result.job_queue_arn().ok_or_else(|| {
            ProvisionError::provider(self.key(), "job queue created but no ARN returned")
        })?;

        let mut outputs = Outputs::new();
        outputs.insert(fields::JOB_QUEUE_ARN.to_string(), arn.to_string());
        Ok(outputs)
    }

    async fn delete(&self, checkpoint: &Checkpoint) -> ProvisionResult<()> {
        use aws_sdk_batch::types::JqState;

        let arn = require(checkpoint, fields::JOB_QUEUE_ARN, self.key())?;

        self.cloud
            .batch
            .update_job_queue()
            .job_queue(arn)
            .state(JqState::Disabled)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to disable job queue: {:?}", e))
            })?;

        self.cloud.wait_job_queue_valid(arn, self.key()).await?;

        self.cloud
            .batch
            .delete_job_queue()
            .job_queue(arn)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(self.key(), format!("Failed to delete job queue: {:?}", e))
            })?;

        Ok(())
    }
}
