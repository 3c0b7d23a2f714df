use tutor_api::normalize_chat_url;
use tutor_api::url::DEFAULT_BASE_URL;

#[test]
fn url_normalization_keeps_existing_completions_endpoint() {
    assert_eq!(
        normalize_chat_url("https://api.cerebras.ai/v1/chat/completions/"),
        "https://api.cerebras.ai/v1/chat/completions"
    );
}

#[test]
fn url_normalization_appends_completions_to_generic_base() {
    assert_eq!(
        normalize_chat_url("http://127.0.0.1:8080/v1/"),
        "http://127.0.0.1:8080/v1/chat/completions"
    );
}

#[test]
fn url_normalization_falls_back_to_default_base() {
    assert_eq!(
        normalize_chat_url("   "),
        format!("{DEFAULT_BASE_URL}/chat/completions")
    );
}
