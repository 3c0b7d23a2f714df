use serde_json::json;

use tutor_api::config::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use tutor_api::{
    normalize_chat_url, ChatCompletionRequest, ChatRole, RequestMessage, TutorApiClient,
    TutorApiConfig,
};

#[test]
fn smoke_client_constructs_from_config() {
    let config = TutorApiConfig::new("token").with_base_url("http://localhost:9000/v1");

    let client = TutorApiClient::new(config).expect("client creation should succeed");
    assert_eq!(
        client.normalized_endpoint(),
        normalize_chat_url("http://localhost:9000/v1")
    );
    assert_eq!(client.config().api_key, "token");
    assert_eq!(client.config().model, DEFAULT_MODEL);
}

#[test]
fn chat_request_uses_fixed_generation_parameters() {
    let client = TutorApiClient::new(TutorApiConfig::new("token")).expect("client");
    let request = client.chat_request(vec![RequestMessage::new(ChatRole::User, "hi")]);

    let value = serde_json::to_value(&request).expect("serialize request");
    assert_eq!(
        value,
        json!({
            "model": "llama3.1-8b",
            "stream": true,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "temperature": 0.2,
            "top_p": 1.0,
            "messages": [{"role": "user", "content": "hi"}],
        })
    );
}

#[test]
fn http_request_targets_completions_endpoint_with_auth() {
    let client = TutorApiClient::new(
        TutorApiConfig::new("token").with_base_url("https://api.cerebras.ai/v1"),
    )
    .expect("client");
    let mut request = ChatCompletionRequest::new(
        "model",
        vec![
            RequestMessage::new(ChatRole::System, "persona"),
            RequestMessage::new(ChatRole::User, "payload"),
        ],
    );
    request.stream = false;

    let http_request = client
        .build_request(&request)
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        http_request.url().as_str(),
        "https://api.cerebras.ai/v1/chat/completions"
    );
    assert_eq!(http_request.method(), "POST");
    assert_eq!(
        http_request
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok()),
        Some("Bearer token")
    );

    let body = http_request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("json body is buffered");
    let body: serde_json::Value = serde_json::from_slice(body).expect("json body");
    assert_eq!(body["stream"], true, "client always requests a stream");
    assert_eq!(body["messages"][0]["role"], "system");
}

#[test]
fn role_names_match_wire_format() {
    assert_eq!(ChatRole::System.as_str(), "system");
    assert_eq!(
        serde_json::to_value(ChatRole::Assistant).expect("serialize role"),
        json!("assistant")
    );
}
