//! Batch definition: the scrape requests processed by one run.

use std::path::Path;

use serde::Deserialize;

use crate::products::ScrapeRequest;
use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct RequestsFile {
    pub requests: Vec<ScrapeRequest>,
}

/// Load and validate a batch of scrape requests from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or contains a
/// request with an empty department, sub-department, or brand.
pub fn load_requests(path: &Path) -> Result<RequestsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: RequestsFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_requests(&file)?;
    Ok(file)
}

fn validate_requests(file: &RequestsFile) -> Result<(), ConfigError> {
    for (idx, request) in file.requests.iter().enumerate() {
        let blank = [
            ("department", &request.department),
            ("sub_department", &request.sub_department),
            ("brand", &request.brand),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = blank {
            return Err(ConfigError::Validation(format!(
                "request #{} has an empty {field}",
                idx + 1
            )));
        }
    }
    Ok(())
}
