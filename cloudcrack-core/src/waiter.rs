//! Bounded waits for provider-side state transitions
//!
//! Several Batch operations are eventually consistent: a compute environment
//! must reach VALID before a queue can reference it, and queues and
//! environments must settle after being disabled before they can be deleted.
//! The wait is a bounded exponential-backoff poll that surfaces exhaustion
//! as a timeout error instead of blocking forever.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::{ProvisionError, ProvisionResult};

/// Backoff settings for polling a provider-side transition
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Maximum number of poll attempts before giving up
    pub max_attempts: u32,
    /// Delay after the first unsuccessful attempt
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt
    pub multiplier: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl WaitConfig {
    /// Delay before the next poll after the given zero-based attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Poll `check` until it reports true, sleeping between attempts.
///
/// `condition` names what is being awaited and appears in the timeout
/// error. Poll failures propagate immediately; only "not yet" results are
/// retried.
pub async fn wait_until<F, Fut>(
    condition: &str,
    config: &WaitConfig,
    mut check: F,
) -> ProvisionResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProvisionResult<bool>>,
{
    for attempt in 0..config.max_attempts {
        if check().await? {
            return Ok(());
        }

        if attempt + 1 < config.max_attempts {
            sleep(config.delay_for_attempt(attempt)).await;
        }
    }

    Err(ProvisionError::Timeout {
        condition: condition.to_string(),
        attempts: config.max_attempts,
    })
}
