use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::store::PronounCache;

/// Periodic maintenance task keeping the cache under its entry
/// ceiling. Eviction is FIFO; a handle's slot is only ever freed in
/// bulk here, never on access.
pub struct CacheSweeper {
    cache: PronounCache,
    max_entries: usize,
    interval: Duration,
}

impl CacheSweeper {
    pub fn new(cache: PronounCache, max_entries: usize) -> Self {
        Self {
            cache,
            max_entries,
            interval: Duration::from_secs(5 * 60),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run_loop(self: Arc<Self>, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            max_entries = self.max_entries,
            "CacheSweeper started"
        );

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.cache.sweep(self.max_entries) {
                        Ok(0) => {}
                        Ok(removed) => info!(removed, "cache sweep complete"),
                        Err(e) => error!(error = %e, "cache sweep failed"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("CacheSweeper shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweeper_evicts_on_tick() {
        let cache = PronounCache::open_in_memory().unwrap();
        for i in 0..10 {
            cache
                .set(&format!("user{}", i), &["they/them".to_string()])
                .unwrap();
        }

        let sweeper =
            Arc::new(CacheSweeper::new(cache.clone(), 4).with_interval(Duration::from_millis(10)));
        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
        let task = tokio::spawn(sweeper.run_loop(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = shutdown_tx.send(());
        task.await.unwrap();

        assert_eq!(cache.len().unwrap(), 4);
        let all = cache.get(None).unwrap();
        assert!(all.contains_key("user9"));
        assert!(!all.contains_key("user0"));
    }
}
