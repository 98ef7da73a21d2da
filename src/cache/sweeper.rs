// Background expiry sweep for the cache tiers
// Author: kelexine (https://github.com/kelexine)

use super::tier::CacheTier;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodic task deleting expired entries from both tiers.
///
/// Started once at process init; `shutdown` cancels the token and waits for
/// the task to finish its current sweep.
pub struct CacheSweeper {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    pub fn start(cache: Arc<CacheTier>, interval: Duration, token: CancellationToken) -> Self {
        let interval = interval.max(Duration::from_millis(10));
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so startup stays quiet.
            ticker.tick().await;

            info!("Cache sweeper started (every {}s)", interval.as_secs_f64());
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.sweep_expired().await;
                        debug!("Cache sweep finished, {} entries removed", removed);
                    }
                }
            }
            info!("Cache sweeper stopped");
        });

        Self { token, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the sweep loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!("Cache sweeper task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{GzipCompressor, SetOptions};
    use crate::config::CacheConfig;

    #[tokio::test]
    async fn test_sweeper_purges_expired_entries_until_cancelled() {
        let config = CacheConfig {
            durable_enabled: false,
            ..CacheConfig::default()
        };
        let cache = Arc::new(CacheTier::memory_only(
            &config,
            Arc::new(GzipCompressor::default()),
        ));
        let options = SetOptions::new("test").ttl(Duration::from_millis(20));
        assert!(cache.set("short", &1, options).await);

        let token = CancellationToken::new();
        let sweeper = CacheSweeper::start(Arc::clone(&cache), Duration::from_millis(30), token.clone());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.stats().await.memory_entries, 0);
        assert!(sweeper.is_running());

        token.cancel();
        sweeper.shutdown().await;
    }
}
