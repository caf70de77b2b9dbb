use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub site_base_url: String,
    pub site_map_url: String,
    pub stores_path: PathBuf,
    pub requests_path: PathBuf,
    pub output_path: PathBuf,
    pub proxy_list_url: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub proxy_attempts: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_page_delay_ms: u64,
    pub webdriver_url: Option<String>,
    pub load_more_click_delay_ms: u64,
    pub load_more_page_size: u32,
    pub page_offset_start: u32,
    pub page_offset_step: u32,
}
