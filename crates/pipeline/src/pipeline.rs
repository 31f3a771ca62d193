use std::collections::HashSet;
use tracing::{debug, warn};

use pronord_cache::PronounCache;
use pronord_core::config::PipelineConfig;
use pronord_credentials::CredentialHandle;

use crate::api::BioLookup;
use crate::extract::PronounMatcher;
use crate::rate_limit::LookupLimiter;

/// Fetches bios for a batch of handles, extracts pronouns and writes
/// the hits to the cache.
///
/// One `request_bios` call is one bounded retry chain: the unresolved
/// handle set shrinks as attempts succeed, credentials are re-acquired
/// between attempts, and the chain gives up silently once the retry
/// budget is spent. Concurrent top-level calls are not deduplicated
/// against each other; overlapping DOM triggers can still produce
/// overlapping batches.
pub struct BioFetchPipeline<L: BioLookup> {
    lookup: L,
    broker: CredentialHandle,
    cache: PronounCache,
    matcher: PronounMatcher,
    limiter: LookupLimiter,
    max_retries: u32,
}

impl<L: BioLookup> BioFetchPipeline<L> {
    pub fn new(
        lookup: L,
        broker: CredentialHandle,
        cache: PronounCache,
        matcher: PronounMatcher,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            lookup,
            broker,
            cache,
            matcher,
            limiter: LookupLimiter::new(config.rate_capacity, config.rate_per_second),
            max_retries: config.max_retries,
        }
    }

    /// Run one fetch chain for the given handles. Returns how many
    /// users ended up cached. Never fails: transport and parse errors
    /// are retried, exhaustion drops the batch.
    pub async fn request_bios(&self, handles: &[String]) -> usize {
        let mut unresolved = dedup(handles);
        if unresolved.is_empty() {
            return 0;
        }

        let mut cached = 0;

        // max_retries retries on top of the initial attempt.
        for attempt in 0..=self.max_retries {
            self.limiter.acquire().await;

            // Re-acquired every attempt; tokens may have rotated since
            // the last failure.
            let creds = match self.broker.tokens().await {
                Ok(creds) => creds,
                Err(e) => {
                    debug!(error = %e, attempt, "credential broker unavailable");
                    continue;
                }
            };
            if !creds.is_ready() {
                // Issuing a request without both tokens is a
                // guaranteed 401; don't even send it.
                debug!(attempt, "credentials not ready, skipping attempt");
                continue;
            }

            match self.lookup.lookup(&unresolved, &creds).await {
                Ok(users) => {
                    let returned: HashSet<String> =
                        users.iter().map(|u| u.handle.to_lowercase()).collect();
                    unresolved.retain(|h| !returned.contains(&h.to_lowercase()));

                    for hit in self.matcher.have_pronouns(users) {
                        match self.cache.set(&hit.user.handle, &hit.pronouns) {
                            Ok(()) => cached += 1,
                            Err(e) => {
                                warn!(handle = %hit.user.handle, error = %e, "cache write failed")
                            }
                        }
                    }

                    if unresolved.is_empty() {
                        return cached;
                    }
                    debug!(
                        remaining = unresolved.len(),
                        attempt, "lookup left handles unresolved, retrying remainder"
                    );
                }
                Err(e) => {
                    debug!(error = %e, attempt, "bio lookup failed, will retry");
                }
            }
        }

        debug!(
            dropped = unresolved.len(),
            "retry budget exhausted, dropping batch remainder"
        );
        cached
    }
}

fn dedup(handles: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    handles
        .iter()
        .filter(|h| !h.is_empty())
        .filter(|h| seen.insert(h.to_lowercase()))
        .cloned()
        .collect()
}
