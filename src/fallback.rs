//! Per-segment provider fallback and retry policy
//!
//! Tracks retry counts per `(segment, provider)` pair and walks the ordered
//! provider list `[primary, ...fallbacks]` as providers are exhausted.
//! Bookkeeping (`segments_downloaded`, `fallback_usage_count`, `last_used`)
//! is recorded per provider for the lifetime of the owning downloader.

use crate::config::{Provider, ProviderStats};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Tracks attempts against one `(segment, provider)` pair.
#[derive(Debug, Clone, Default)]
struct RetryState {
    attempts: u32,
}

/// Fallback and retry policy for one downloader instance.
///
/// Owns the ordered provider chain and the per-segment bookkeeping. Not
/// `Sync`; a downloader that needs to share a policy across tasks should
/// wrap it (e.g. in a `tokio::sync::Mutex`), matching the "fallback table is
/// owned by one downloader instance" ownership rule.
pub struct FallbackPolicy {
    /// `[primary, ...fallbacks]`, in the order they should be tried.
    chain: Vec<Provider>,
    stats: HashMap<String, ProviderStats>,
    /// `(segment message-id, provider id) -> retry state`.
    retries: HashMap<(String, String), RetryState>,
    /// `segment message-id -> currently assigned provider index` into `chain`.
    current: HashMap<String, usize>,
}

impl FallbackPolicy {
    /// Build a policy from a primary provider and its fallback chain.
    ///
    /// `fallbacks` must already be resolved (in order) from
    /// `primary.fallback_provider_ids`; resolution against a provider
    /// registry is the caller's responsibility.
    pub fn new(primary: Provider, fallbacks: Vec<Provider>) -> Self {
        let mut chain = Vec::with_capacity(1 + fallbacks.len());
        chain.push(primary);
        chain.extend(fallbacks);

        let stats = chain
            .iter()
            .map(|p| (p.id.clone(), ProviderStats::default()))
            .collect();

        Self {
            chain,
            stats,
            retries: HashMap::new(),
            current: HashMap::new(),
        }
    }

    /// The provider currently assigned to `message_id`, initializing it to
    /// the primary (chain index 0) on first use.
    pub fn current_provider(&mut self, message_id: &str) -> &Provider {
        let idx = *self.current.entry(message_id.to_string()).or_insert(0);
        &self.chain[idx]
    }

    /// Whether the current provider for `message_id` still has retries left.
    pub fn should_retry(&self, message_id: &str, provider_id: &str) -> bool {
        let Some(provider) = self.chain.iter().find(|p| p.id == provider_id) else {
            return false;
        };
        let attempts = self
            .retries
            .get(&(message_id.to_string(), provider_id.to_string()))
            .map(|s| s.attempts)
            .unwrap_or(0);
        attempts < provider.retry_attempts
    }

    /// Record a failed attempt against the current provider for `message_id`.
    pub fn record_failure(&mut self, message_id: &str, provider_id: &str) {
        let state = self
            .retries
            .entry((message_id.to_string(), provider_id.to_string()))
            .or_default();
        state.attempts += 1;
        warn!(
            "segment {} failed on provider {} (attempt {})",
            message_id, provider_id, state.attempts
        );
    }

    /// Backoff to sleep before the next attempt on the same provider:
    /// `retry_backoff_ms * 2^(attempt-1)`.
    pub fn backoff(&self, message_id: &str, provider_id: &str) -> Duration {
        let provider = self
            .chain
            .iter()
            .find(|p| p.id == provider_id)
            .expect("provider must be in chain");
        let attempt = self
            .retries
            .get(&(message_id.to_string(), provider_id.to_string()))
            .map(|s| s.attempts)
            .unwrap_or(1)
            .max(1);
        let factor = 2u64.saturating_pow(attempt - 1);
        Duration::from_millis(provider.retry_backoff_ms.saturating_mul(factor))
    }

    /// Advance `message_id` to the next provider in the chain. Returns `None`
    /// (and leaves the segment's assignment unchanged) once the chain is
    /// exhausted.
    pub fn next_provider(&mut self, message_id: &str) -> Option<&Provider> {
        let idx = self.current.get(message_id).copied().unwrap_or(0);
        let next_idx = idx + 1;
        if next_idx >= self.chain.len() {
            return None;
        }
        self.current.insert(message_id.to_string(), next_idx);
        let provider = &self.chain[next_idx];
        debug!(
            "segment {} falling back to provider {}",
            message_id, provider.id
        );
        if let Some(stats) = self.stats.get_mut(&provider.id) {
            stats.fallback_usage_count += 1;
        }
        Some(provider)
    }

    /// Record a successful download and clear this segment's per-provider state.
    pub fn record_success(&mut self, message_id: &str, provider_id: &str, now: u64) {
        if let Some(stats) = self.stats.get_mut(provider_id) {
            stats.segments_downloaded += 1;
            stats.last_used = Some(now);
        }
        self.current.remove(message_id);
        self.retries
            .retain(|(seg, _), _| seg != message_id);
    }

    /// Snapshot of bookkeeping stats for one provider, if known to this policy.
    pub fn stats(&self, provider_id: &str) -> Option<&ProviderStats> {
        self.stats.get(provider_id)
    }

    /// The ordered `[primary, ...fallbacks]` chain this policy walks.
    pub fn chain(&self) -> &[Provider] {
        &self.chain
    }
}
