//! HTTP page fetcher for category listing pages.
//!
//! Each fetch spends a bounded budget of proxied attempts, drawing a fresh
//! proxy and `User-Agent` per attempt, then makes exactly one direct attempt.
//! Store-scoped fetches carry the store's session cookie and the
//! `browsestoreoption` query parameter.

use std::cell::Cell;
use std::future::Future;
use std::time::Duration;

use hdcrawl_core::{BrowseScope, StoreDirectory, StoreId, StoreLocation};
use reqwest::{Client, Proxy};
use url::Url;

use crate::error::{FetchError, ScraperError};
use crate::identity::{IdentityPool, IdentitySupplier};
use crate::retry::retry_with_backoff;
use crate::types::{set_query_param, RawPage};

/// Query parameter selecting store-only or all-store results.
pub const BROWSE_SCOPE_PARAM: &str = "browsestoreoption";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches raw pages for a store location.
pub trait PageFetcher {
    fn fetch(
        &self,
        url: &str,
        location: StoreId,
        scope: BrowseScope,
    ) -> impl Future<Output = Result<RawPage, FetchError>>;
}

/// [`PageFetcher`] over HTTP with proxy rotation and a direct fallback.
pub struct HttpPageFetcher<I = IdentityPool> {
    stores: StoreDirectory,
    identity: I,
    direct: Client,
    timeout: Duration,
    /// Proxied attempts before the single direct attempt.
    proxy_attempts: u32,
    /// Base delay between proxied attempts: `backoff_base_ms * 2^n`.
    backoff_base_ms: u64,
}

impl<I: IdentitySupplier> HttpPageFetcher<I> {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the direct `reqwest::Client` cannot
    /// be constructed.
    pub fn new(
        stores: StoreDirectory,
        identity: I,
        timeout_secs: u64,
        proxy_attempts: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let timeout = Duration::from_secs(timeout_secs);
        let direct = Self::client_builder(timeout).no_proxy().build()?;
        Ok(Self {
            stores,
            identity,
            direct,
            timeout,
            proxy_attempts,
            backoff_base_ms,
        })
    }

    /// Fetches a page with no store context (no session cookie, no browse
    /// scope). Used for site-wide pages such as the site map.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] when every attempt failed.
    pub async fn fetch_unscoped(&self, url: &str) -> Result<RawPage, FetchError> {
        let target = parse_target(url)?;
        self.fetch_target(target, None).await
    }

    async fn fetch_target(
        &self,
        target: Url,
        store: Option<&StoreLocation>,
    ) -> Result<RawPage, FetchError> {
        let sent = Cell::new(0u32);

        if self.proxy_attempts > 0 {
            let proxied = retry_with_backoff(self.proxy_attempts, self.backoff_base_ms, |attempt| {
                let target = &target;
                let sent = &sent;
                async move {
                    let proxy = self.identity.next_proxy().ok_or(ScraperError::NoProxy)?;
                    sent.set(sent.get() + 1);
                    tracing::debug!(url = %target, attempt, proxy = %proxy, "fetching via proxy");
                    let client = self.proxied_client(&proxy)?;
                    self.send(&client, target, store).await
                }
            })
            .await;

            match proxied {
                Ok(html) => return Ok(RawPage::new(target.as_str(), html)),
                Err(ScraperError::NoProxy) if sent.get() == 0 => {
                    tracing::debug!(url = %target, "no proxies available; fetching directly");
                }
                Err(e) => {
                    tracing::warn!(
                        url = %target,
                        attempts = sent.get(),
                        error = %e,
                        "proxied attempts failed; falling back to a direct request"
                    );
                }
            }
        }

        match self.send(&self.direct, &target, store).await {
            Ok(html) => Ok(RawPage::new(target.as_str(), html)),
            Err(source) => Err(FetchError::Exhausted {
                url: target.to_string(),
                attempts: sent.get() + 1,
                source,
            }),
        }
    }

    async fn send(
        &self,
        client: &Client,
        target: &Url,
        store: Option<&StoreLocation>,
    ) -> Result<String, ScraperError> {
        let mut request = client
            .get(target.clone())
            .header(reqwest::header::USER_AGENT, self.identity.user_agent())
            .header(reqwest::header::ACCEPT, ACCEPT_HTML)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        if let Some(store) = store {
            request = request.header(reqwest::header::COOKIE, store.cookie_header());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::RateLimited {
                url: target.to_string(),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: target.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: target.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    fn proxied_client(&self, proxy: &str) -> Result<Client, ScraperError> {
        let proxy_url = format!("http://{proxy}");
        let proxy_cfg = Proxy::all(&proxy_url).map_err(|e| ScraperError::InvalidProxy {
            proxy: proxy.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::client_builder(self.timeout).proxy(proxy_cfg).build()?)
    }

    fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
    }
}

impl<I: IdentitySupplier> PageFetcher for HttpPageFetcher<I> {
    async fn fetch(
        &self,
        url: &str,
        location: StoreId,
        scope: BrowseScope,
    ) -> Result<RawPage, FetchError> {
        let store = self
            .stores
            .get(location)
            .ok_or(FetchError::UnknownStore(location))?;
        let target = scoped_url(url, scope)?;
        self.fetch_target(target, Some(store)).await
    }
}

fn parse_target(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// `url` with `browsestoreoption` set to `scope`, replacing any prior value.
pub(crate) fn scoped_url(url: &str, scope: BrowseScope) -> Result<Url, FetchError> {
    let mut target = parse_target(url)?;
    set_query_param(&mut target, BROWSE_SCOPE_PARAM, scope.query_value());
    Ok(target)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
