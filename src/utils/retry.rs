// Retry logic with a fixed backoff
// Author: kelexine (https://github.com/kelexine)

use backoff::backoff::{Backoff, Constant};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Create the constant backoff used between connection attempts
pub fn create_backoff(delay: Duration) -> Constant {
    Constant::new(delay)
}

/// Execute `operation` up to `max_attempts` times, sleeping a fixed `delay`
/// between attempts. Returns the last error once attempts are exhausted.
pub async fn with_fixed_retry<F, Fut, T, E>(
    operation_name: &str,
    max_attempts: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut backoff = create_backoff(delay);
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= max_attempts {
                    return Err(e);
                }

                let wait = backoff.next_backoff().unwrap_or(delay);
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying after {}ms",
                    operation_name,
                    attempt,
                    max_attempts,
                    e,
                    wait.as_millis()
                );

                // Wait before retry
                tokio::time::sleep(wait).await;
            }
        }
    }
}
