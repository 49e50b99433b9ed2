//! S3 and Batch implementation of the job backend

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;

use cloudcrack_core::error::{ProvisionError, ProvisionResult};
use cloudcrack_core::job::{JobBackend, JobDetail, SubmitSpec};

use crate::AwsCloud;

const BACKEND_KEY: &str = "job_backend";

#[async_trait]
impl JobBackend for AwsCloud {
    async fn upload_object(&self, bucket: &str, key: &str, path: &Path) -> ProvisionResult<()> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            ProvisionError::provider(
                BACKEND_KEY,
                format!("Failed to read '{}': {:?}", path.display(), e),
            )
        })?;

        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    BACKEND_KEY,
                    format!("Failed to upload '{}': {:?}", key, e),
                )
            })?;

        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> ProvisionResult<bool> {
        use aws_sdk_s3::error::SdkError;

        match self.s3.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let is_not_found = match &err {
                    SdkError::ServiceError(service_err) => {
                        let status = service_err.raw().status().as_u16();
                        service_err.err().is_not_found() || status == 404
                    }
                    _ => false,
                };

                if is_not_found {
                    Ok(false)
                } else {
                    Err(ProvisionError::provider(
                        BACKEND_KEY,
                        format!("Failed to check '{}': {:?}", key, err),
                    ))
                }
            }
        }
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> ProvisionResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .s3
            .list_objects_v2()
            .bucket(bucket)
            .prefix(format!("{}/", prefix.trim_end_matches('/')))
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                ProvisionError::provider(BACKEND_KEY, format!("Failed to list objects: {:?}", e))
            })?;

            for object in page.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }
        }

        Ok(keys)
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> ProvisionResult<Option<String>> {
        use aws_sdk_s3::error::SdkError;

        let result = self.s3.get_object().bucket(bucket).key(key).send().await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let is_not_found = match &err {
                    SdkError::ServiceError(service_err) => service_err.err().is_no_such_key(),
                    _ => false,
                };

                if is_not_found {
                    return Ok(None);
                }
                return Err(ProvisionError::provider(
                    BACKEND_KEY,
                    format!("Failed to fetch '{}': {:?}", key, err),
                ));
            }
        };

        let bytes = output.body.collect().await.map_err(|e| {
            ProvisionError::provider(BACKEND_KEY, format!("Failed to read '{}': {:?}", key, e))
        })?;

        let content = String::from_utf8_lossy(&bytes.into_bytes()).into_owned();
        Ok(Some(content))
    }

    async fn submit(&self, spec: &SubmitSpec) -> ProvisionResult<String> {
        use aws_sdk_batch::types::{ContainerOverrides, ResourceRequirement, ResourceType};

        let vcpu = ResourceRequirement::builder()
            .value(&spec.vcpu)
            .r#type(ResourceType::Vcpu)
            .build()
            .map_err(|e| {
                ProvisionError::provider(
                    BACKEND_KEY,
                    format!("Failed to build vCPU requirement: {}", e),
                )
            })?;
        let memory = ResourceRequirement::builder()
            .value(&spec.memory)
            .r#type(ResourceType::Memory)
            .build()
            .map_err(|e| {
                ProvisionError::provider(
                    BACKEND_KEY,
                    format!("Failed to build memory requirement: {}", e),
                )
            })?;

        let overrides = ContainerOverrides::builder()
            .set_command(Some(spec.command.clone()))
            .resource_requirements(vcpu)
            .resource_requirements(memory)
            .build();

        let result = self
            .batch
            .submit_job()
            .job_name(&spec.job_name)
            .job_queue(&spec.job_queue_arn)
            .job_definition(&spec.job_definition_arn)
            .container_overrides(overrides)
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(BACKEND_KEY, format!("Failed to submit job: {:?}", e))
            })?;

        result
            .job_id()
            .map(str::to_string)
            .ok_or_else(|| ProvisionError::provider(BACKEND_KEY, "job submitted but no id returned"))
    }

    async fn describe_jobs(&self, ids: &[String]) -> ProvisionResult<Vec<JobDetail>> {
        let result = self
            .batch
            .describe_jobs()
            .set_jobs(Some(ids.to_vec()))
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(BACKEND_KEY, format!("Failed to describe jobs: {:?}", e))
            })?;

        let details = result
            .jobs()
            .iter()
            .filter_map(|job| {
                let id = job.job_id()?.to_string();
                let status = job.status()?.as_str().to_string();
                Some(JobDetail {
                    id,
                    status,
                    started_at: job.started_at(),
                    stopped_at: job.stopped_at(),
                })
            })
            .collect();

        Ok(details)
    }
}
