use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{http_client::ApiClient, DanmuStreamError};

// Any live page works for the ttwid probe, the cookie comes from Set-Cookie.
const TTWID_PROBE_URL: &str = "https://live.douyin.com/1-2-3-4-5-6-7-8-9-0";

/// Registry of named locks. The map itself is guarded by one top-level
/// mutex; lock handles are created on first use and kept for the registry's
/// lifetime.
#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a guard for the lock registered under `name`, released on
    /// drop. The registry mutex is held only while looking up the handle,
    /// never while waiting on the named lock.
    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let handle = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        handle.lock_owned().await
    }
}

/// Process-wide cache for the fetched `ttwid` session cookie.
///
/// Owned by the composition root and passed by reference into channel
/// resolution, so concurrent resolutions for different rooms share one
/// fetch instead of each issuing their own.
#[derive(Default)]
pub struct SessionCache {
    locks: LockRegistry,
    ttwid: RwLock<Option<String>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cache with an already-known ttwid, skipping the upstream
    /// fetch entirely.
    pub async fn prime(&self, ttwid: &str) {
        *self.ttwid.write().await = Some(ttwid.to_string());
    }

    /// Fetch-if-absent for the ttwid cookie. The named lock is held around
    /// the check-and-fetch only.
    pub async fn ttwid(&self, client: &ApiClient) -> Result<String, DanmuStreamError> {
        let _guard = self.locks.acquire("ttwid-fetch").await;

        if let Some(ttwid) = self.ttwid.read().await.clone() {
            return Ok(ttwid);
        }

        let resp = client.get(TTWID_PROBE_URL).await?;
        let ttwid = extract_ttwid(resp.headers()).ok_or_else(|| {
            DanmuStreamError::InvalidIdentifier {
                err: "no ttwid cookie in probe response".to_string(),
            }
        })?;

        *self.ttwid.write().await = Some(ttwid.clone());
        Ok(ttwid)
    }
}

fn extract_ttwid(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let re = Regex::new(r"ttwid=([^;]+)").unwrap();
    for value in headers.get_all(reqwest::header::SET_COOKIE) {
        if let Ok(text) = value.to_str() {
            if let Some(captures) = re.captures(text) {
                return Some(captures[1].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_name_is_exclusive() {
        let registry = LockRegistry::new();
        let guard = registry.acquire("session-fetch").await;

        let contended = tokio::time::timeout(Duration::from_millis(20), registry.acquire("session-fetch")).await;
        assert!(contended.is_err());

        drop(guard);
        let _guard = registry.acquire("session-fetch").await;
    }

    #[tokio::test]
    async fn test_different_names_are_independent() {
        let registry = LockRegistry::new();
        let _guard = registry.acquire("a").await;
        let other = tokio::time::timeout(Duration::from_millis(20), registry.acquire("b")).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_primed_cache_skips_fetch() {
        let cache = SessionCache::new();
        cache.prime("cached-ttwid").await;

        // points nowhere; a fetch attempt would fail, a cache hit will not
        let client = ApiClient::new("", "Mozilla/5.0");
        let ttwid = cache.ttwid(&client).await.unwrap();
        assert_eq!(ttwid, "cached-ttwid");
    }

    #[test]
    fn test_extract_ttwid_from_set_cookie() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.append(
            reqwest::header::SET_COOKIE,
            "passport_csrf_token=x; Path=/".parse().unwrap(),
        );
        headers.append(
            reqwest::header::SET_COOKIE,
            "ttwid=1%7Cabc123; Path=/; Domain=douyin.com; Max-Age=31536000".parse().unwrap(),
        );
        assert_eq!(extract_ttwid(&headers).as_deref(), Some("1%7Cabc123"));
    }

    #[test]
    fn test_extract_ttwid_missing() {
        let headers = reqwest::header::HeaderMap::new();
        assert!(extract_ttwid(&headers).is_none());
    }
}
