//! Job submission, status tracking, and result retrieval
//!
//! The compute backend is an opaque collaborator behind [`JobBackend`]; the
//! logic here only decides what to upload, what command to run, and how to
//! join the local job history against the backend's status reports.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::ToolConfig;
use crate::error::{ProvisionError, ProvisionResult};
use crate::fields;
use cloudcrack_state::{Checkpoint, JobHistoryStore, JobRecord};

/// Bucket folder holding uploaded wordlists
pub const WORDLIST_PREFIX: &str = "passlists";
/// Bucket folder holding uploaded hash files
pub const TO_CRACK_PREFIX: &str = "to_crack";
/// Bucket folder where completed jobs write their output
pub const CRACKED_PREFIX: &str = "cracked";

/// Name given to every submitted job
const JOB_NAME: &str = "crack_job";

/// Request to start one job on the compute backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSpec {
    pub job_name: String,
    pub job_queue_arn: String,
    pub job_definition_arn: String,
    pub command: Vec<String>,
    pub vcpu: String,
    pub memory: String,
}

/// Status of one job as reported by the compute backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetail {
    pub id: String,
    pub status: String,
    /// Start timestamp in epoch milliseconds, if the job has started
    pub started_at: Option<i64>,
    /// Stop timestamp in epoch milliseconds, if the job has stopped
    pub stopped_at: Option<i64>,
}

/// One row of the status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub file: String,
    pub status: String,
    pub runtime: String,
}

/// Object storage and compute operations the job workflow depends on
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Upload a local file to `bucket` under `key`
    async fn upload_object(&self, bucket: &str, key: &str, path: &Path) -> ProvisionResult<()>;

    /// True if an object exists at exactly `key`
    async fn object_exists(&self, bucket: &str, key: &str) -> ProvisionResult<bool>;

    /// List object keys under a prefix
    async fn list_objects(&self, bucket: &str, prefix: &str) -> ProvisionResult<Vec<String>>;

    /// Fetch an object's content as text, or `None` if it does not exist
    async fn fetch_object(&self, bucket: &str, key: &str) -> ProvisionResult<Option<String>>;

    /// Submit a job, returning the backend-assigned job id
    async fn submit(&self, spec: &SubmitSpec) -> ProvisionResult<String>;

    /// Describe the given job ids; unknown ids are simply absent from the result
    async fn describe_jobs(&self, ids: &[String]) -> ProvisionResult<Vec<JobDetail>>;
}

fn require<'a>(checkpoint: &'a Checkpoint, field: &str) -> ProvisionResult<&'a str> {
    checkpoint
        .get(field)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProvisionError::NotProvisioned(field.to_string()))
}

fn file_name_of(path: &Path) -> ProvisionResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ProvisionError::NotFound(format!("file name in '{}'", path.display())))
}

/// Upload the hash file, resolve the wordlist, and submit one cracking job.
///
/// Requires the bucket, job definition, and job queue to be provisioned.
/// The job id is appended to the history only after a successful
/// submission; a missing wordlist leaves the history untouched.
pub async fn submit_crack_job(
    backend: &dyn JobBackend,
    checkpoint: &Checkpoint,
    config: &ToolConfig,
    history: &JobHistoryStore,
    input: &Path,
    wordlist: &str,
    options: &str,
) -> ProvisionResult<String> {
    let bucket = require(checkpoint, fields::BUCKET_NAME)?;
    let job_definition_arn = require(checkpoint, fields::JOB_DEFINITION_ARN)?;
    let job_queue_arn = require(checkpoint, fields::JOB_QUEUE_ARN)?;

    let wordlist_key = format!("{}/{}", WORDLIST_PREFIX, wordlist);
    if !backend.object_exists(bucket, &wordlist_key).await? {
        return Err(ProvisionError::NotFound(format!(
            "wordlist '{}' in bucket '{}'",
            wordlist, bucket
        )));
    }

    let input_name = file_name_of(input)?;
    let input_key = format!("{}/{}", TO_CRACK_PREFIX, input_name);
    backend.upload_object(bucket, &input_key, input).await?;

    let mut command = vec!["/tmp/run.sh".to_string()];
    command.extend(options.split_whitespace().map(str::to_string));
    command.push("-w".to_string());
    command.push("4".to_string());
    command.push(format!("s3://{}/{}", bucket, input_key));
    command.push(format!("s3://{}/{}", bucket, wordlist_key));

    let spec = SubmitSpec {
        job_name: JOB_NAME.to_string(),
        job_queue_arn: job_queue_arn.to_string(),
        job_definition_arn: job_definition_arn.to_string(),
        command,
        vcpu: config.vcpu.clone(),
        memory: config.memory.clone(),
    };

    let job_id = backend.submit(&spec).await?;
    history.append(JobRecord::new(&job_id, input.display().to_string()))?;

    Ok(job_id)
}

/// Format a duration in milliseconds as `{h}h:{m}m:{s}s`
fn format_runtime(millis: i64) -> String {
    let total_secs = millis.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{}h:{}m:{}s", hours, minutes, seconds)
}

/// Join tracked jobs against backend details; one row per tracked job the
/// backend still knows about. Unknown ids are dropped, not errors.
fn join_status(records: &[JobRecord], details: &[JobDetail], now_millis: i64) -> Vec<StatusRow> {
    let mut rows = Vec::new();

    for record in records {
        let Some(detail) = details.iter().find(|d| d.id == record.id) else {
            continue;
        };

        let runtime = match (detail.status.as_str(), detail.started_at, detail.stopped_at) {
            ("SUCCEEDED" | "FAILED", Some(started), Some(stopped)) => {
                format_runtime(stopped - started)
            }
            ("RUNNING", Some(started), _) => format_runtime(now_millis - started),
            _ => "-".to_string(),
        };

        rows.push(StatusRow {
            file: record.file.clone(),
            status: detail.status.clone(),
            runtime,
        });
    }

    rows
}

/// Report the status of every tracked job
pub async fn job_status(
    backend: &dyn JobBackend,
    history: &JobHistoryStore,
) -> ProvisionResult<Vec<StatusRow>> {
    let records = history.load()?;
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    let details = backend.describe_jobs(&ids).await?;

    Ok(join_status(&records, &details, Utc::now().timestamp_millis()))
}

/// Fetch the cracked output for an input file name, if available
pub async fn fetch_result(
    backend: &dyn JobBackend,
    checkpoint: &Checkpoint,
    file: &str,
) -> ProvisionResult<Option<String>> {
    let bucket = require(checkpoint, fields::BUCKET_NAME)?;
    let key = format!("{}/{}", CRACKED_PREFIX, file);
    backend.fetch_object(bucket, &key).await
}

/// List uploaded wordlists by bare file name
pub async fn list_wordlists(
    backend: &dyn JobBackend,
    checkpoint: &Checkpoint,
) -> ProvisionResult<Vec<String>> {
    let bucket = require(checkpoint, fields::BUCKET_NAME)?;
    let keys = backend.list_objects(bucket, WORDLIST_PREFIX).await?;

    Ok(keys
        .iter()
        .filter_map(|k| k.rsplit('/').next())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect())
}

/// Upload a wordlist file, returning its storage URL
pub async fn upload_wordlist(
    backend: &dyn JobBackend,
    checkpoint: &Checkpoint,
    path: &Path,
) -> ProvisionResult<String> {
    let bucket = require(checkpoint, fields::BUCKET_NAME)?;
    let name = file_name_of(path)?;
    let key = format!("{}/{}", WORDLIST_PREFIX, name);
    backend.upload_object(bucket, &key, path).await?;
    Ok(format!("s3://{}/{}", bucket, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct MockBackend {
        objects: Mutex<Vec<String>>,
        uploads: Mutex<Vec<(String, String)>>,
        submitted: Mutex<Vec<SubmitSpec>>,
        details: Vec<JobDetail>,
        next_job_id: String,
    }

    impl MockBackend {
        fn with_object(self, key: &str) -> Self {
            self.objects.lock().unwrap().push(key.to_string());
            self
        }

        fn with_job_id(mut self, id: &str) -> Self {
            self.next_job_id = id.to_string();
            self
        }
    }

    #[async_trait]
    impl JobBackend for MockBackend {
        async fn upload_object(&self, bucket: &str, key: &str, _path: &Path) -> ProvisionResult<()> {
            self.uploads
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string()));
            self.objects.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn object_exists(&self, _bucket: &str, key: &str) -> ProvisionResult<bool> {
            Ok(self.objects.lock().unwrap().iter().any(|k| k == key))
        }

        async fn list_objects(&self, _bucket: &str, prefix: &str) -> ProvisionResult<Vec<String>> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn fetch_object(&self, _bucket: &str, key: &str) -> ProvisionResult<Option<String>> {
            if self.objects.lock().unwrap().iter().any(|k| k == key) {
                Ok(Some(format!("content of {}", key)))
            } else {
                Ok(None)
            }
        }

        async fn submit(&self, spec: &SubmitSpec) -> ProvisionResult<String> {
            self.submitted.lock().unwrap().push(spec.clone());
            Ok(self.next_job_id.clone())
        }

        async fn describe_jobs(&self, ids: &[String]) -> ProvisionResult<Vec<JobDetail>> {
            Ok(self
                .details
                .iter()
                .filter(|d| ids.contains(&d.id))
                .cloned()
                .collect())
        }
    }

    fn provisioned_checkpoint() -> Checkpoint {
        let mut cp = Checkpoint::new();
        cp.set(fields::BUCKET_NAME, "bucket-cloudcrack");
        cp.set(fields::JOB_DEFINITION_ARN, "arn:jobdef");
        cp.set(fields::JOB_QUEUE_ARN, "arn:queue");
        cp
    }

    fn write_input(dir: &Path) -> PathBuf {
        let path = dir.join("hashes.txt");
        std::fs::write(&path, "5f4dcc3b5aa765d61d8327deb882cf99").unwrap();
        path
    }

    #[tokio::test]
    async fn test_submit_builds_command_and_records_history() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path());
        let history = JobHistoryStore::with_path(dir.path().join("jobs.json"));
        let backend = MockBackend::default()
            .with_object("passlists/rockyou.txt")
            .with_job_id("job-42");

        let job_id = submit_crack_job(
            &backend,
            &provisioned_checkpoint(),
            &ToolConfig::default(),
            &history,
            &input,
            "rockyou.txt",
            "-m 0 -a 0",
        )
        .await
        .unwrap();

        assert_eq!(job_id, "job-42");

        let submitted = backend.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let spec = &submitted[0];
        assert_eq!(spec.job_queue_arn, "arn:queue");
        assert_eq!(spec.job_definition_arn, "arn:jobdef");
        assert_eq!(
            spec.command,
            vec![
                "/tmp/run.sh",
                "-m",
                "0",
                "-a",
                "0",
                "-w",
                "4",
                "s3://bucket-cloudcrack/to_crack/hashes.txt",
                "s3://bucket-cloudcrack/passlists/rockyou.txt",
            ]
        );

        let records = history.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "job-42");
        assert_eq!(records[0].file, input.display().to_string());
    }

    #[tokio::test]
    async fn test_submit_missing_wordlist_leaves_history_untouched() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path());
        let history = JobHistoryStore::with_path(dir.path().join("jobs.json"));
        let backend = MockBackend::default();

        let err = submit_crack_job(
            &backend,
            &provisioned_checkpoint(),
            &ToolConfig::default(),
            &history,
            &input,
            "rockyou.txt",
            "-m 0",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProvisionError::NotFound(_)));
        assert!(backend.submitted.lock().unwrap().is_empty());
        assert!(history.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_requires_provisioned_resources() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path());
        let history = JobHistoryStore::with_path(dir.path().join("jobs.json"));
        let backend = MockBackend::default().with_object("passlists/rockyou.txt");

        let err = submit_crack_job(
            &backend,
            &Checkpoint::new(),
            &ToolConfig::default(),
            &history,
            &input,
            "rockyou.txt",
            "-m 0",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProvisionError::NotProvisioned(_)));
    }

    #[test]
    fn test_status_join_drops_unknown_ids() {
        let records = vec![
            JobRecord::new("j1", "a.txt"),
            JobRecord::new("j2", "b.txt"),
        ];
        let details = vec![JobDetail {
            id: "j1".to_string(),
            status: "SUCCEEDED".to_string(),
            started_at: Some(1_000),
            stopped_at: Some(75_000),
        }];

        let rows = join_status(&records, &details, 100_000);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].file, "a.txt");
        assert_eq!(rows[0].status, "SUCCEEDED");
        assert_eq!(rows[0].runtime, "0h:1m:14s");
    }

    #[test]
    fn test_status_running_uses_current_time() {
        let records = vec![JobRecord::new("j1", "a.txt")];
        let details = vec![JobDetail {
            id: "j1".to_string(),
            status: "RUNNING".to_string(),
            started_at: Some(0),
            stopped_at: None,
        }];

        // 1h 2m 3s elapsed
        let rows = join_status(&records, &details, 3_723_000);
        assert_eq!(rows[0].runtime, "1h:2m:3s");
    }

    #[test]
    fn test_status_pending_has_no_runtime() {
        let records = vec![JobRecord::new("j1", "a.txt")];
        let details = vec![JobDetail {
            id: "j1".to_string(),
            status: "RUNNABLE".to_string(),
            started_at: None,
            stopped_at: None,
        }];

        let rows = join_status(&records, &details, 1_000);
        assert_eq!(rows[0].runtime, "-");
    }

    #[tokio::test]
    async fn test_list_wordlists_returns_bare_names() {
        let backend = MockBackend::default()
            .with_object("passlists/rockyou.txt")
            .with_object("passlists/darkweb2017.txt")
            .with_object("to_crack/hashes.txt");

        let names = list_wordlists(&backend, &provisioned_checkpoint())
            .await
            .unwrap();
        assert_eq!(names, vec!["rockyou.txt", "darkweb2017.txt"]);
    }

    #[tokio::test]
    async fn test_fetch_result_not_available() {
        let backend = MockBackend::default();
        let result = fetch_result(&backend, &provisioned_checkpoint(), "hashes.txt")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fetch_result_returns_content() {
        let backend = MockBackend::default().with_object("cracked/hashes.txt");
        let result = fetch_result(&backend, &provisioned_checkpoint(), "hashes.txt")
            .await
            .unwrap();
        assert_eq!(result, Some("content of cracked/hashes.txt".to_string()));
    }

    #[tokio::test]
    async fn test_upload_wordlist_requires_bucket() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path());
        let backend = MockBackend::default();

        let err = upload_wordlist(&backend, &Checkpoint::new(), &input)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::NotProvisioned(_)));
    }
}
