use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Observability snapshot of the blacklist.
#[derive(Debug, Clone)]
pub struct BlacklistStats {
    /// The number of entries currently held.
    pub size: usize,
    /// The earliest expiry among held entries, if any.
    pub oldest_expires_at: Option<DateTime<Utc>>,
}

/// A process-wide registry of revoked access tokens.
///
/// Entries are not persisted: losing them on restart is acceptable because
/// every request also re-validates against the user's password version.
/// Expiry is lazy on read, with a periodic sweep so entries that are never
/// checked again do not accumulate.
#[derive(Clone)]
pub struct TokenBlacklist {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    sweeper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TokenBlacklist {
    /// Creates a new, empty `TokenBlacklist`.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            sweeper: Arc::new(Mutex::new(None)),
        }
    }

    /// Blacklists a token until `now + ttl`.
    pub async fn blacklist(&self, token: &str, ttl: Duration) {
        let expires_at = Utc::now() + ttl;
        let mut entries = self.entries.write().await;
        entries.insert(token.to_string(), expires_at);
    }

    /// Returns whether a token is currently blacklisted.
    ///
    /// Expired entries are removed on read and never report as blacklisted.
    pub async fn is_blacklisted(&self, token: &str) -> bool {
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                None => return false,
                Some(expires_at) if Utc::now() <= *expires_at => return true,
                Some(_) => {}
            }
        }

        // Expired entry, drop it.
        let mut entries = self.entries.write().await;
        if let Some(expires_at) = entries.get(token) {
            if Utc::now() > *expires_at {
                entries.remove(token);
            } else {
                return true;
            }
        }
        false
    }

    /// Removes every expired entry, returning the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at >= now);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("Blacklist sweep removed {} expired tokens", removed);
        }
        removed
    }

    /// Returns the number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns an observability snapshot.
    pub async fn stats(&self) -> BlacklistStats {
        let entries = self.entries.read().await;
        BlacklistStats {
            size: entries.len(),
            oldest_expires_at: entries.values().min().copied(),
        }
    }

    /// Starts the periodic sweep task. Calling this twice is a no-op: only
    /// one sweeper runs at a time.
    pub async fn start_cleanup_interval(&self, period: std::time::Duration) {
        let mut sweeper = self.sweeper.lock().await;
        if sweeper.is_some() {
            return;
        }

        let entries = self.entries.clone();
        *sweeper = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let now = Utc::now();
                let mut entries = entries.write().await;
                let before = entries.len();
                entries.retain(|_, expires_at| *expires_at >= now);
                let removed = before - entries.len();
                drop(entries);
                if removed > 0 {
                    tracing::info!("Blacklist sweep removed {} expired tokens", removed);
                }
            }
        }));
    }

    /// Stops the periodic sweep task. Safe to call when not started.
    pub async fn stop_cleanup_interval(&self) {
        let mut sweeper = self.sweeper.lock().await;
        if let Some(handle) = sweeper.take() {
            handle.abort();
        }
    }
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_token_is_not_blacklisted() {
        let blacklist = TokenBlacklist::new();
        assert!(!blacklist.is_blacklisted("never-seen").await);
    }

    #[tokio::test]
    async fn blacklisted_token_reports_until_expiry() {
        let blacklist = TokenBlacklist::new();
        blacklist.blacklist("tok-a", Duration::seconds(60)).await;
        assert!(blacklist.is_blacklisted("tok-a").await);
        assert_eq!(blacklist.len().await, 1);
    }

    #[tokio::test]
    async fn expired_token_is_removed_lazily() {
        let blacklist = TokenBlacklist::new();
        blacklist.blacklist("tok-b", Duration::zero()).await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!blacklist.is_blacklisted("tok-b").await);
        // The lazy check dropped the entry.
        assert_eq!(blacklist.len().await, 0);
    }

    #[tokio::test]
    async fn cleanup_removes_exactly_the_expired_entries() {
        let blacklist = TokenBlacklist::new();
        blacklist.blacklist("dead-1", Duration::zero()).await;
        blacklist.blacklist("dead-2", Duration::zero()).await;
        blacklist.blacklist("live", Duration::seconds(60)).await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let removed = blacklist.cleanup_expired().await;
        assert_eq!(removed, 2);
        assert_eq!(blacklist.len().await, 1);
        assert!(blacklist.is_blacklisted("live").await);
    }

    #[tokio::test]
    async fn stats_report_size_and_oldest_expiry() {
        let blacklist = TokenBlacklist::new();
        blacklist.blacklist("soon", Duration::seconds(10)).await;
        blacklist.blacklist("later", Duration::seconds(1000)).await;

        let stats = blacklist.stats().await;
        assert_eq!(stats.size, 2);
        let oldest = stats.oldest_expires_at.unwrap();
        assert!(oldest < Utc::now() + Duration::seconds(60));
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let blacklist = TokenBlacklist::new();
        blacklist
            .start_cleanup_interval(std::time::Duration::from_secs(3600))
            .await;
        blacklist
            .start_cleanup_interval(std::time::Duration::from_secs(3600))
            .await;
        assert!(blacklist.sweeper.lock().await.is_some());

        blacklist.stop_cleanup_interval().await;
        assert!(blacklist.sweeper.lock().await.is_none());
        // Stopping again must not panic.
        blacklist.stop_cleanup_interval().await;
    }
}
