use std::time::Duration;

use reqwest::header::HeaderMap;
use url::Url;

use crate::DanmuStreamError;

pub struct ApiClient {
    client: reqwest::Client,
    header: HeaderMap,
}

impl ApiClient {
    pub fn new(cookies: &str, user_agent: &str) -> Self {
        let mut header = HeaderMap::new();
        header.insert("cookie", cookies.parse().unwrap());
        header.insert("user-agent", user_agent.parse().unwrap());
        header.insert("referer", "https://live.douyin.com/".parse().unwrap());

        Self {
            client: reqwest::Client::new(),
            header,
        }
    }

    pub async fn get(&self, url: &str) -> Result<reqwest::Response, DanmuStreamError> {
        let resp = self
            .client
            .get(url)
            .headers(self.header.clone())
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?;

        Ok(resp)
    }
}

/// Appends the shared platform query parameters to a douyin HTTP/WS URL.
///
/// Existing keys are overwritten, never duplicated, so decorating an
/// already-decorated URL is a no-op apart from value refresh.
pub fn build_request_url(url: &str, user_agent: &str) -> Result<String, DanmuStreamError> {
    let mut parsed = Url::parse(url)?;
    let (browser_name, browser_version) = split_user_agent(user_agent);

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let platform_params = [
        ("aid", "6383".to_string()),
        ("device_platform", "web".to_string()),
        ("browser_language", "zh-CN".to_string()),
        ("browser_platform", "Win32".to_string()),
        ("browser_name", browser_name.to_string()),
        ("browser_version", browser_version.to_string()),
    ];

    for (key, value) in platform_params {
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => pairs.push((key.to_string(), value)),
        }
    }

    parsed.query_pairs_mut().clear().extend_pairs(&pairs);

    Ok(parsed.to_string())
}

/// Splits a user-agent string into the browser identification fields the
/// platform expects: the product token and everything after its slash.
pub fn split_user_agent(user_agent: &str) -> (&str, &str) {
    match user_agent.split_once('/') {
        Some((name, version)) => (name, version),
        None => (user_agent, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    #[test]
    fn test_decorated_url_carries_platform_params() {
        let url = build_request_url("https://live.douyin.com/webcast/room/web/enter/?web_rid=123", UA)
            .unwrap();
        assert!(url.contains("web_rid=123"));
        assert!(url.contains("aid=6383"));
        assert!(url.contains("device_platform=web"));
        assert!(url.contains("browser_language=zh-CN"));
        assert!(url.contains("browser_platform=Win32"));
        assert!(url.contains("browser_name=Mozilla"));
    }

    #[test]
    fn test_decoration_is_idempotent() {
        let once = build_request_url("https://live.douyin.com/abc?x=1", UA).unwrap();
        let twice = build_request_url(&once, UA).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.matches("aid=").count(), 1);
    }

    #[test]
    fn test_decoration_overwrites_existing_keys() {
        let url = build_request_url("https://live.douyin.com/abc?aid=999", UA).unwrap();
        assert!(url.contains("aid=6383"));
        assert!(!url.contains("aid=999"));
        assert_eq!(url.matches("aid=").count(), 1);
    }

    #[test]
    fn test_split_user_agent() {
        let (name, version) = split_user_agent(UA);
        assert_eq!(name, "Mozilla");
        assert!(version.starts_with("5.0 (Windows NT 10.0"));
    }
}
