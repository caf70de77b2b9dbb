use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_SITE_BASE_URL: &str = "https://www.homedepot.com";
const DEFAULT_PROXY_LIST_URL: &str = "http://gatherproxy.com/proxylist/anonymity/?t=Elite";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/51.0.2704.103 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Unset and empty both mean "disabled".
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("HDCRAWL_LOG_LEVEL", "info");
    let site_base_url = or_default("HDCRAWL_SITE_BASE_URL", DEFAULT_SITE_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    let site_map_url = or_default(
        "HDCRAWL_SITE_MAP_URL",
        &format!("{site_base_url}/c/site_map"),
    );
    let stores_path = PathBuf::from(or_default("HDCRAWL_STORES_PATH", "./config/stores.yaml"));
    let requests_path = PathBuf::from(or_default(
        "HDCRAWL_REQUESTS_PATH",
        "./config/requests.yaml",
    ));
    let output_path = PathBuf::from(or_default("HDCRAWL_OUTPUT_PATH", "./result.csv"));
    let proxy_list_url = match lookup("HDCRAWL_PROXY_LIST_URL") {
        Ok(_) => optional("HDCRAWL_PROXY_LIST_URL"),
        Err(_) => Some(DEFAULT_PROXY_LIST_URL.to_string()),
    };
    let user_agent = or_default("HDCRAWL_USER_AGENT", DEFAULT_USER_AGENT);
    let webdriver_url = optional("HDCRAWL_WEBDRIVER_URL");

    let request_timeout_secs = parse_u64("HDCRAWL_REQUEST_TIMEOUT_SECS", "30")?;
    let proxy_attempts = parse_u32("HDCRAWL_PROXY_ATTEMPTS", "5")?;
    let retry_backoff_base_ms = parse_u64("HDCRAWL_RETRY_BACKOFF_BASE_MS", "0")?;
    let inter_page_delay_ms = parse_u64("HDCRAWL_INTER_PAGE_DELAY_MS", "250")?;
    let load_more_click_delay_ms = parse_u64("HDCRAWL_LOAD_MORE_CLICK_DELAY_MS", "5000")?;
    let load_more_page_size = parse_u32("HDCRAWL_LOAD_MORE_PAGE_SIZE", "24")?;
    let page_offset_start = parse_u32("HDCRAWL_PAGE_OFFSET_START", "24")?;
    let page_offset_step = parse_u32("HDCRAWL_PAGE_OFFSET_STEP", "12")?;

    if load_more_page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "HDCRAWL_LOAD_MORE_PAGE_SIZE".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if page_offset_step == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "HDCRAWL_PAGE_OFFSET_STEP".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        log_level,
        site_base_url,
        site_map_url,
        stores_path,
        requests_path,
        output_path,
        proxy_list_url,
        request_timeout_secs,
        user_agent,
        proxy_attempts,
        retry_backoff_base_ms,
        inter_page_delay_ms,
        webdriver_url,
        load_more_click_delay_ms,
        load_more_page_size,
        page_offset_start,
        page_offset_step,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
