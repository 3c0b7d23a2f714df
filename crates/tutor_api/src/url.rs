/// Default base URL for chat-completion requests.
pub const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Normalize a base URL to a chat-completion endpoint.
///
/// Normalization rules:
/// 1) an empty base falls back to [`DEFAULT_BASE_URL`]
/// 2) keep `/chat/completions` unchanged
/// 3) append `/chat/completions` otherwise
pub fn normalize_chat_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(CHAT_COMPLETIONS_PATH) {
        return trimmed.to_string();
    }
    format!("{trimmed}{CHAT_COMPLETIONS_PATH}")
}
