use std::collections::BTreeMap;

use crate::config::TutorApiConfig;
use crate::error::TutorApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_CACHE_CONTROL: &str = "cache-control";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const DEFAULT_USER_AGENT: &str = concat!("tutor/", env!("CARGO_PKG_VERSION"));

/// Build a deterministic header map for streamed chat-completion requests.
pub fn build_headers(
    config: &TutorApiConfig,
    user_agent: Option<&str>,
) -> Result<BTreeMap<String, String>, TutorApiError> {
    let api_key = config.api_key.trim();
    if api_key.is_empty() {
        return Err(TutorApiError::MissingApiKey);
    }

    let mut headers = BTreeMap::new();
    headers.insert(HEADER_AUTHORIZATION.to_owned(), format!("Bearer {api_key}"));
    headers.insert(HEADER_ACCEPT.to_owned(), "text/event-stream".to_owned());
    headers.insert(HEADER_CACHE_CONTROL.to_owned(), "no-cache".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    let ua = [user_agent, config.user_agent.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua.to_owned());

    for (key, value) in &config.extra_headers {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value.trim().to_owned());
    }

    Ok(headers)
}
