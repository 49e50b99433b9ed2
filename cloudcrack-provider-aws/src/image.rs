//! Container image build and push to ECR
//!
//! The cracking image is built from a local Docker context directory and
//! pushed to the provisioned repository tagged `latest`. Unlike the
//! checkpointed resources this runs on every setup, so an updated context
//! is always published.

use std::path::Path;

use base64::Engine;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::image::{BuildImageOptions, PushImageOptions};
use bytes::Bytes;
use colored::Colorize;
use flate2::Compression;
use flate2::write::GzEncoder;
use futures_util::StreamExt;
use http_body_util::{Either, Full};
use tar::Builder as TarBuilder;

use cloudcrack_core::error::{ProvisionError, ProvisionResult};

use crate::AwsCloud;

const IMAGE_KEY: &str = "image";
const IMAGE_TAG: &str = "latest";

/// Builds the local image and pushes it to the ECR repository
pub struct ImagePublisher {
    cloud: AwsCloud,
    docker: Docker,
}

impl ImagePublisher {
    /// Connect to the local Docker daemon
    pub fn new(cloud: AwsCloud) -> ProvisionResult<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| {
            ProvisionError::provider(IMAGE_KEY, format!("Failed to connect to Docker: {}", e))
        })?;
        Ok(Self { cloud, docker })
    }

    /// Build the context directory and push `<repository_uri>:latest`
    pub async fn publish(&self, context_dir: &Path, repository_uri: &str) -> ProvisionResult<String> {
        let full_image = format!("{}:{}", repository_uri, IMAGE_TAG);

        let context = build_context(context_dir)?;
        self.build(context, &full_image).await?;

        let credentials = self.registry_credentials().await?;
        self.push(repository_uri, credentials).await?;

        Ok(full_image)
    }

    async fn build(&self, context: Vec<u8>, tag: &str) -> ProvisionResult<()> {
        let options = BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag,
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        let body = Full::new(Bytes::from(context));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            let info = msg.map_err(|e| {
                ProvisionError::provider(IMAGE_KEY, format!("Image build failed: {}", e))
            })?;

            if let Some(output) = info.stream {
                print!("{}", output);
            }
            if let Some(error) = info.error {
                return Err(ProvisionError::provider(
                    IMAGE_KEY,
                    format!("Image build failed: {}", error),
                ));
            }
            if let Some(detail) = info.error_detail {
                let message = detail
                    .message
                    .unwrap_or_else(|| "unknown build error".to_string());
                return Err(ProvisionError::provider(
                    IMAGE_KEY,
                    format!("Image build failed: {}", message),
                ));
            }
        }

        Ok(())
    }

    /// Exchange an ECR authorization token for Docker credentials
    async fn registry_credentials(&self) -> ProvisionResult<DockerCredentials> {
        let result = self
            .cloud
            .ecr
            .get_authorization_token()
            .send()
            .await
            .map_err(|e| {
                ProvisionError::provider(
                    IMAGE_KEY,
                    format!("Failed to get registry token: {:?}", e),
                )
            })?;

        let data = result
            .authorization_data()
            .first()
            .ok_or_else(|| ProvisionError::provider(IMAGE_KEY, "no registry authorization data"))?;

        let token = data
            .authorization_token()
            .ok_or_else(|| ProvisionError::provider(IMAGE_KEY, "registry token missing"))?;
        let endpoint = data
            .proxy_endpoint()
            .ok_or_else(|| ProvisionError::provider(IMAGE_KEY, "registry endpoint missing"))?;

        let (username, password) = decode_registry_token(token)?;

        Ok(DockerCredentials {
            username: Some(username),
            password: Some(password),
            serveraddress: Some(registry_host(endpoint).to_string()),
            ..Default::default()
        })
    }

    async fn push(
        &self,
        repository_uri: &str,
        credentials: DockerCredentials,
    ) -> ProvisionResult<()> {
        #[allow(deprecated)]
        let options = PushImageOptions::<String> {
            tag: IMAGE_TAG.to_string(),
        };

        println!("  → {}", format!("{}:{}", repository_uri, IMAGE_TAG).cyan());

        #[allow(deprecated)]
        let mut stream = self
            .docker
            .push_image(repository_uri, Some(options), Some(credentials));

        while let Some(msg) = stream.next().await {
            let info = msg.map_err(|e| {
                ProvisionError::provider(IMAGE_KEY, format!("Image push failed: {}", e))
            })?;

            if let Some(error) = info.error {
                return Err(ProvisionError::provider(
                    IMAGE_KEY,
                    format!("Image push failed: {}", error),
                ));
            }
            if let Some(status) = info.status
                && status == "Pushed"
            {
                println!("  {} Pushed", "✓".green());
            }
        }

        Ok(())
    }

}

/// Archive the Docker context directory as tar.gz for the daemon
fn build_context(context_dir: &Path) -> ProvisionResult<Vec<u8>> {
    let mut archive = Vec::new();
    {
        let encoder = GzEncoder::new(&mut archive, Compression::default());
        let mut tar = TarBuilder::new(encoder);

        tar.append_dir_all(".", context_dir).map_err(|e| {
            ProvisionError::provider(
                IMAGE_KEY,
                format!("Failed to archive '{}': {}", context_dir.display(), e),
            )
        })?;

        tar.finish().map_err(|e| {
            ProvisionError::provider(IMAGE_KEY, format!("Failed to finish archive: {}", e))
        })?;
    }

    Ok(archive)
}

/// Decode an ECR authorization token into a username/password pair
fn decode_registry_token(token: &str) -> ProvisionResult<(String, String)> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(token)
        .map_err(|e| ProvisionError::provider(IMAGE_KEY, format!("Invalid registry token: {}", e)))?;

    let text = String::from_utf8(decoded)
        .map_err(|e| ProvisionError::provider(IMAGE_KEY, format!("Invalid registry token: {}", e)))?;

    let (username, password) = text.split_once(':').ok_or_else(|| {
        ProvisionError::provider(IMAGE_KEY, "registry token is not 'user:password'")
    })?;

    Ok((username.to_string(), password.to_string()))
}

/// Strip the scheme from a registry proxy endpoint
fn registry_host(endpoint: &str) -> &str {
    endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_registry_token() {
        let token = base64::engine::general_purpose::STANDARD.encode("AWS:secret-password");
        let (user, pass) = decode_registry_token(&token).unwrap();
        assert_eq!(user, "AWS");
        assert_eq!(pass, "secret-password");
    }

    #[test]
    fn test_decode_registry_token_rejects_bad_shape() {
        let token = base64::engine::general_purpose::STANDARD.encode("no-separator");
        assert!(decode_registry_token(&token).is_err());
        assert!(decode_registry_token("not base64 !!!").is_err());
    }

    #[test]
    fn test_registry_host_strips_scheme() {
        assert_eq!(
            registry_host("https://123456789012.dkr.ecr.us-east-1.amazonaws.com"),
            "123456789012.dkr.ecr.us-east-1.amazonaws.com"
        );
        assert_eq!(registry_host("plain.example.com"), "plain.example.com");
    }

    #[test]
    fn test_build_context_contains_dockerfile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine:latest\n").unwrap();
        std::fs::write(dir.path().join("run.sh"), "#!/bin/sh\n").unwrap();

        let archive = build_context(dir.path()).unwrap();

        let decoder = flate2::read::GzDecoder::new(&archive[..]);
        let mut tar = tar::Archive::new(decoder);
        let mut names = Vec::new();
        for entry in tar.entries().unwrap() {
            let entry = entry.unwrap();
            names.push(entry.path().unwrap().display().to_string());
        }
        assert!(names.iter().any(|n| n.contains("Dockerfile")));
        assert!(names.iter().any(|n| n.contains("run.sh")));
    }
}
