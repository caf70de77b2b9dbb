//! Load-more expansion through a W3C WebDriver endpoint (chromedriver,
//! geckodriver, or a Selenium grid).

use std::time::Duration;

use hdcrawl_core::{BrowseScope, StoreDirectory, StoreId, StoreLocation};
use reqwest::{Client, Method};
use serde_json::{json, Value};

use crate::client::scoped_url;
use crate::error::{FetchError, RenderError};
use crate::render::PageRenderer;
use crate::types::RawPage;

/// Key under which W3C WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const LOAD_MORE_BUTTON: &str = ".js-load-more-btn";

/// [`PageRenderer`] that drives a browser session to click the load-more
/// button repeatedly.
pub struct WebDriverRenderer {
    client: Client,
    endpoint: String,
    stores: StoreDirectory,
    click_delay: Duration,
    page_size: u32,
    capabilities: Value,
}

impl WebDriverRenderer {
    /// # Errors
    ///
    /// Returns [`RenderError::Http`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        stores: StoreDirectory,
        timeout_secs: u64,
        click_delay_ms: u64,
        page_size: u32,
    ) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            stores,
            click_delay: Duration::from_millis(click_delay_ms),
            page_size: page_size.max(1),
            capabilities: json!({
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": ["--headless=new", "--disable-gpu"] }
                }
            }),
        })
    }

    /// Number of load-more clicks needed to show `target_count` products.
    fn click_budget(&self, target_count: u32) -> u32 {
        target_count / self.page_size + 1
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RenderError> {
        let url = format!("{}{path}", self.endpoint);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let mut payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let error = payload["value"]["error"].as_str().unwrap_or("unknown error");
            let message = payload["value"]["message"].as_str().unwrap_or_default();
            return Err(RenderError::WebDriver {
                command: format!("{method} {path}"),
                reason: format!("{} {error}: {message}", status.as_u16()),
            });
        }
        Ok(payload.get_mut("value").map_or(Value::Null, Value::take))
    }

    async fn new_session(&self) -> Result<String, RenderError> {
        let value = self
            .command(
                Method::POST,
                "/session",
                Some(json!({ "capabilities": self.capabilities })),
            )
            .await?;
        value["sessionId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RenderError::WebDriver {
                command: "POST /session".to_string(),
                reason: "response has no sessionId".to_string(),
            })
    }

    async fn drive(
        &self,
        session: &str,
        url: &str,
        store: &StoreLocation,
        target_count: u32,
    ) -> Result<String, RenderError> {
        let base = format!("/session/{session}");
        let navigate = json!({ "url": url });

        // Cookies can only be set for the current domain, so load once, set
        // the store session, then load again.
        self.command(Method::POST, &format!("{base}/url"), Some(navigate.clone()))
            .await?;
        self.command(
            Method::POST,
            &format!("{base}/cookie"),
            Some(json!({ "cookie": { "name": store.cookie.name, "value": store.cookie.value } })),
        )
        .await?;
        self.command(Method::POST, &format!("{base}/url"), Some(navigate))
            .await?;

        let budget = self.click_budget(target_count);
        let mut clicks = 0u32;
        while clicks < budget {
            let Ok(element) = self
                .command(
                    Method::POST,
                    &format!("{base}/element"),
                    Some(json!({ "using": "css selector", "value": LOAD_MORE_BUTTON })),
                )
                .await
            else {
                break;
            };
            let Some(element_id) = element[ELEMENT_KEY].as_str() else {
                break;
            };
            if let Err(e) = self
                .command(
                    Method::POST,
                    &format!("{base}/element/{element_id}/click"),
                    Some(json!({})),
                )
                .await
            {
                tracing::debug!(error = %e, clicks, "load-more click failed; stopping");
                break;
            }
            clicks += 1;
            tokio::time::sleep(self.click_delay).await;
        }
        tracing::debug!(url, clicks, budget, "load-more expansion finished");

        let source = self
            .command(Method::GET, &format!("{base}/source"), None)
            .await?;
        source
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RenderError::WebDriver {
                command: format!("GET {base}/source"),
                reason: "page source is not a string".to_string(),
            })
    }
}

impl PageRenderer for WebDriverRenderer {
    async fn render_fully(
        &self,
        url: &str,
        location: StoreId,
        target_count: u32,
    ) -> Result<RawPage, RenderError> {
        let store = self
            .stores
            .get(location)
            .ok_or(RenderError::UnknownStore(location))?;
        let target = scoped_url(url, BrowseScope::StoreOnly).map_err(|e| match e {
            FetchError::InvalidUrl { url, reason } => RenderError::InvalidUrl { url, reason },
            other => RenderError::InvalidUrl {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })?;

        let session = self.new_session().await?;
        let result = self.drive(&session, target.as_str(), store, target_count).await;

        if let Err(e) = self
            .command(Method::DELETE, &format!("/session/{session}"), None)
            .await
        {
            tracing::warn!(session, error = %e, "failed to close WebDriver session");
        }

        result.map(|html| RawPage::new(target.as_str(), html))
    }
}
