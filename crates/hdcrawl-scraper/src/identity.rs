//! Proxy and user-agent rotation for outbound page requests.

use std::time::Duration;

use rand::seq::IndexedRandom;
use serde_json::Value;

/// Desktop browser user agents drawn from on each attempt.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
];

/// Supplies the outbound identity (proxy and `User-Agent`) for one attempt.
pub trait IdentitySupplier {
    /// A proxy as `host:port`, or `None` when the pool is empty.
    fn next_proxy(&self) -> Option<String>;

    fn user_agent(&self) -> String;
}

/// Proxy pool and user-agent list, built once per run and shared read-only.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    proxies: Vec<String>,
    user_agents: Vec<String>,
    fallback_user_agent: String,
}

impl IdentityPool {
    #[must_use]
    pub fn new(proxies: Vec<String>, fallback_user_agent: impl Into<String>) -> Self {
        Self {
            proxies,
            user_agents: BROWSER_USER_AGENTS.iter().map(ToString::to_string).collect(),
            fallback_user_agent: fallback_user_agent.into(),
        }
    }

    /// A pool with no proxies: every request goes out directly.
    #[must_use]
    pub fn direct(fallback_user_agent: impl Into<String>) -> Self {
        Self::new(Vec::new(), fallback_user_agent)
    }

    #[must_use]
    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.user_agents = user_agents;
        self
    }

    #[must_use]
    pub fn proxies(&self) -> &[String] {
        &self.proxies
    }

    /// Builds the pool from a gatherproxy listing at `list_url`.
    ///
    /// A missing URL or any fetch failure yields a direct-only pool; the run
    /// proceeds without proxies.
    pub async fn load(
        list_url: Option<&str>,
        fallback_user_agent: &str,
        timeout_secs: u64,
    ) -> Self {
        let Some(list_url) = list_url else {
            return Self::direct(fallback_user_agent);
        };

        match fetch_proxy_list(list_url, fallback_user_agent, timeout_secs).await {
            Ok(body) => {
                let proxies = parse_gatherproxy(&body);
                tracing::info!(count = proxies.len(), url = list_url, "loaded proxy pool");
                Self::new(proxies, fallback_user_agent)
            }
            Err(e) => {
                tracing::warn!(url = list_url, error = %e, "proxy list unavailable; using direct requests");
                Self::direct(fallback_user_agent)
            }
        }
    }
}

impl IdentitySupplier for IdentityPool {
    fn next_proxy(&self) -> Option<String> {
        self.proxies.choose(&mut rand::rng()).cloned()
    }

    fn user_agent(&self) -> String {
        self.user_agents
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| self.fallback_user_agent.clone())
    }
}

async fn fetch_proxy_list(
    url: &str,
    user_agent: &str,
    timeout_secs: u64,
) -> Result<String, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()?;
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Parses a gatherproxy listing into `ip:port` strings.
///
/// Entries are embedded as `gp.insertPrx({...});` script lines carrying
/// `PROXY_IP` and `PROXY_PORT`. Lines that do not decode are skipped.
#[must_use]
pub fn parse_gatherproxy(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| line.to_lowercase().contains("proxy_ip"))
        .filter_map(|line| {
            let json = line
                .trim()
                .trim_start_matches("gp.insertPrx(")
                .trim_end_matches(';')
                .trim_end_matches(')');
            let entry: Value = match serde_json::from_str(json) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping undecodable proxy entry");
                    return None;
                }
            };
            let ip = scalar(entry.get("PROXY_IP")?)?;
            let port = scalar(entry.get("PROXY_PORT")?)?;
            Some(format!("{ip}:{port}"))
        })
        .collect()
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
