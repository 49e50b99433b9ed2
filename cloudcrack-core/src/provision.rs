//! Convergence and teardown over an ordered set of resource handlers
//!
//! `converge` compares the desired resource set against the checkpoint and
//! creates whatever is missing, persisting the checkpoint after every
//! attempt. A failure part-way through leaves some resources created and
//! others not; the saved checkpoint makes a re-run pick up where the last
//! one stopped instead of re-creating what already exists. `teardown` is
//! the mirror: delete in reverse creation order, dependents before
//! dependencies, then drop both state files.

use std::collections::HashSet;

use crate::error::{ProvisionError, ProvisionResult};
use crate::resource::ResourceHandler;
use cloudcrack_state::{Checkpoint, CheckpointStore, JobHistoryStore};

/// Verify that every handler's dependencies appear earlier in the sequence
fn validate_order(handlers: &[Box<dyn ResourceHandler>]) -> ProvisionResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for handler in handlers {
        for dependency in handler.depends_on() {
            if !seen.contains(dependency) {
                return Err(ProvisionError::Ordering {
                    key: handler.key().to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }
        seen.insert(handler.key());
    }
    Ok(())
}

/// Ensure every resource exists, recording identifiers into the checkpoint.
///
/// Handlers whose output fields are already present are skipped, so calling
/// this twice with no external state change issues no additional create
/// calls. The checkpoint is saved after each attempt, success or failure.
pub async fn converge(
    handlers: &[Box<dyn ResourceHandler>],
    checkpoint: &mut Checkpoint,
    store: &CheckpointStore,
) -> ProvisionResult<()> {
    validate_order(handlers)?;

    for handler in handlers {
        if checkpoint.contains_all(handler.output_fields()) {
            continue;
        }

        match handler.create(checkpoint).await {
            Ok(outputs) => {
                checkpoint.merge(outputs);
                store.save(checkpoint)?;
            }
            Err(e) => {
                // Persist partial progress before failing fast
                store.save(checkpoint)?;
                return Err(e);
            }
        }
    }

    store.save(checkpoint)?;
    Ok(())
}

/// Destroy every resource present in the checkpoint, in reverse creation
/// order, then remove the checkpoint and job-history files.
pub async fn teardown(
    handlers: &[Box<dyn ResourceHandler>],
    checkpoint: &mut Checkpoint,
    store: &CheckpointStore,
    history: &JobHistoryStore,
) -> ProvisionResult<()> {
    validate_order(handlers)?;

    for handler in handlers.iter().rev() {
        if !checkpoint.contains_any(handler.output_fields()) {
            continue;
        }

        match handler.delete(checkpoint).await {
            Ok(()) => {
                for field in handler.output_fields() {
                    checkpoint.remove(field);
                }
                store.save(checkpoint)?;
            }
            Err(e) => {
                store.save(checkpoint)?;
                return Err(e);
            }
        }
    }

    store.remove()?;
    history.remove()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Outputs;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Handler that records its calls and can be told to fail
    struct MockHandler {
        key: &'static str,
        outputs: &'static [&'static str],
        deps: &'static [&'static str],
        creates: Arc<AtomicUsize>,
        fail: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl MockHandler {
        fn new(
            key: &'static str,
            outputs: &'static [&'static str],
            deps: &'static [&'static str],
            log: Arc<Mutex<Vec<String>>>,
        ) -> Self {
            Self {
                key,
                outputs,
                deps,
                creates: Arc::new(AtomicUsize::new(0)),
                fail: false,
                log,
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    #[async_trait]
    impl ResourceHandler for MockHandler {
        fn key(&self) -> &'static str {
            self.key
        }

        fn output_fields(&self) -> &'static [&'static str] {
            self.outputs
        }

        fn depends_on(&self) -> &'static [&'static str] {
            self.deps
        }

        async fn create(&self, _checkpoint: &Checkpoint) -> ProvisionResult<Outputs> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(format!("create {}", self.key));
            if self.fail {
                return Err(ProvisionError::provider(self.key, "simulated failure"));
            }
            let mut outputs = Outputs::new();
            for field in self.outputs {
                outputs.insert(field.to_string(), format!("{}-id", self.key));
            }
            Ok(outputs)
        }

        async fn delete(&self, _checkpoint: &Checkpoint) -> ProvisionResult<()> {
            self.log.lock().unwrap().push(format!("delete {}", self.key));
            Ok(())
        }
    }

    fn pipeline(log: &Arc<Mutex<Vec<String>>>) -> (Vec<Box<dyn ResourceHandler>>, Vec<Arc<AtomicUsize>>) {
        let specs: [(&'static str, &'static [&'static str], &'static [&'static str]); 8] = [
            ("bucket", &["bucket_name"], &[]),
            ("role", &["role_name", "role_arn"], &["bucket"]),
            ("repository", &["repository_name", "repository_uri"], &[]),
            ("job_definition", &["job_definition_arn"], &["role", "repository"]),
            ("subnet", &["subnet_id"], &[]),
            ("security_group", &["security_group_id"], &[]),
            (
                "compute_environment",
                &["compute_environment_arn"],
                &["subnet", "security_group"],
            ),
            ("job_queue", &["job_queue_arn"], &["compute_environment"]),
        ];

        let mut handlers: Vec<Box<dyn ResourceHandler>> = Vec::new();
        let mut counters = Vec::new();
        for (key, outputs, deps) in specs {
            let handler = MockHandler::new(key, outputs, deps, Arc::clone(log));
            counters.push(Arc::clone(&handler.creates));
            handlers.push(Box::new(handler));
        }
        (handlers, counters)
    }

    #[tokio::test]
    async fn test_fresh_provisioning_creates_each_resource_once() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::with_path(dir.path().join("resources.json"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let (handlers, counters) = pipeline(&log);

        let mut checkpoint = Checkpoint::new();
        converge(&handlers, &mut checkpoint, &store).await.unwrap();

        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
        for handler in &handlers {
            assert!(checkpoint.contains_all(handler.output_fields()));
        }

        // Checkpoint was persisted
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved, checkpoint);
    }

    #[tokio::test]
    async fn test_converge_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::with_path(dir.path().join("resources.json"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let (handlers, counters) = pipeline(&log);

        let mut checkpoint = Checkpoint::new();
        converge(&handlers, &mut checkpoint, &store).await.unwrap();
        let after_first = checkpoint.clone();

        converge(&handlers, &mut checkpoint, &store).await.unwrap();

        assert_eq!(checkpoint, after_first);
        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_converge_resumes_after_failure() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::with_path(dir.path().join("resources.json"));
        let log = Arc::new(Mutex::new(Vec::new()));

        // First run: the third resource fails
        let a = MockHandler::new("a", &["a_id"], &[], Arc::clone(&log));
        let b = MockHandler::new("b", &["b_id"], &[], Arc::clone(&log));
        let c = MockHandler::new("c", &["c_id"], &[], Arc::clone(&log)).failing();
        let a_creates = Arc::clone(&a.creates);
        let b_creates = Arc::clone(&b.creates);
        let handlers: Vec<Box<dyn ResourceHandler>> = vec![Box::new(a), Box::new(b), Box::new(c)];

        let mut checkpoint = Checkpoint::new();
        let err = converge(&handlers, &mut checkpoint, &store).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Provider { .. }));

        // Partial progress was persisted
        let saved = store.load().unwrap().unwrap();
        assert!(saved.contains_all(&["a_id", "b_id"]));
        assert!(!saved.contains_all(&["c_id"]));

        // Second run with a working third handler: only c is created
        let a2 = MockHandler::new("a", &["a_id"], &[], Arc::clone(&log));
        let b2 = MockHandler::new("b", &["b_id"], &[], Arc::clone(&log));
        let c2 = MockHandler::new("c", &["c_id"], &[], Arc::clone(&log));
        let a2_creates = Arc::clone(&a2.creates);
        let b2_creates = Arc::clone(&b2.creates);
        let c2_creates = Arc::clone(&c2.creates);
        let handlers2: Vec<Box<dyn ResourceHandler>> =
            vec![Box::new(a2), Box::new(b2), Box::new(c2)];

        let mut resumed = store.load().unwrap().unwrap();
        converge(&handlers2, &mut resumed, &store).await.unwrap();

        assert_eq!(a_creates.load(Ordering::SeqCst), 1);
        assert_eq!(b_creates.load(Ordering::SeqCst), 1);
        assert_eq!(a2_creates.load(Ordering::SeqCst), 0);
        assert_eq!(b2_creates.load(Ordering::SeqCst), 0);
        assert_eq!(c2_creates.load(Ordering::SeqCst), 1);
        assert!(resumed.contains_all(&["a_id", "b_id", "c_id"]));
    }

    #[tokio::test]
    async fn test_teardown_reverses_creation_order_and_clears_state() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::with_path(dir.path().join("resources.json"));
        let history = JobHistoryStore::with_path(dir.path().join("jobs.json"));
        history
            .append(cloudcrack_state::JobRecord::new("j1", "a.txt"))
            .unwrap();

        let log = Arc::new(Mutex::new(Vec::new()));
        let (handlers, _) = pipeline(&log);

        let mut checkpoint = Checkpoint::new();
        converge(&handlers, &mut checkpoint, &store).await.unwrap();
        log.lock().unwrap().clear();

        teardown(&handlers, &mut checkpoint, &store, &history)
            .await
            .unwrap();

        let deletes: Vec<String> = log.lock().unwrap().clone();
        let expected: Vec<String> = [
            "job_queue",
            "compute_environment",
            "security_group",
            "subnet",
            "job_definition",
            "repository",
            "role",
            "bucket",
        ]
        .iter()
        .map(|k| format!("delete {}", k))
        .collect();
        assert_eq!(deletes, expected);

        assert!(checkpoint.is_empty());
        assert!(!store.path().exists());
        assert!(!history.path().exists());
    }

    #[tokio::test]
    async fn test_teardown_skips_absent_resources() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::with_path(dir.path().join("resources.json"));
        let history = JobHistoryStore::with_path(dir.path().join("jobs.json"));

        let log = Arc::new(Mutex::new(Vec::new()));
        let (handlers, _) = pipeline(&log);

        // Only the bucket was ever created
        let mut checkpoint = Checkpoint::new();
        checkpoint.set("bucket_name", "bucket-cloudcrack");

        teardown(&handlers, &mut checkpoint, &store, &history)
            .await
            .unwrap();

        let deletes: Vec<String> = log.lock().unwrap().clone();
        assert_eq!(deletes, vec!["delete bucket".to_string()]);
    }

    #[tokio::test]
    async fn test_dependency_listed_after_dependent_is_rejected() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::with_path(dir.path().join("resources.json"));
        let log = Arc::new(Mutex::new(Vec::new()));

        let queue = MockHandler::new("job_queue", &["job_queue_arn"], &["compute_environment"], Arc::clone(&log));
        let env = MockHandler::new(
            "compute_environment",
            &["compute_environment_arn"],
            &[],
            Arc::clone(&log),
        );
        let handlers: Vec<Box<dyn ResourceHandler>> = vec![Box::new(queue), Box::new(env)];

        let mut checkpoint = Checkpoint::new();
        let err = converge(&handlers, &mut checkpoint, &store).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Ordering { .. }));
        assert!(log.lock().unwrap().is_empty());
    }
}
