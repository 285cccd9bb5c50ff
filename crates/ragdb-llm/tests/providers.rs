use ragdb_llm::http::client_with_timeout;
use ragdb_llm::ollama::Ollama;
use ragdb_llm::openai::OpenAiCompatible;
use ragdb_llm::{ChatModel, LlmError, Message};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai(server: &MockServer, key: Option<&str>) -> OpenAiCompatible {
    let client = client_with_timeout(5).unwrap();
    OpenAiCompatible::new(client, &format!("{}/v1/", server.uri()), "gpt-4o-mini", key.map(String::from), 256)
}

fn question() -> Vec<Message> {
    vec![Message::system("be brief"), Message::user("what is tinder?")]
}

#[tokio::test]
async fn openai_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.2,
            "stream": false,
            "messages": [{"role": "system", "content": "be brief"}, {"role": "user", "content": "what is tinder?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Dry material that catches a spark."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = openai(&server, Some("sk-test")).chat(&question(), 0.2).await.unwrap();
    assert_eq!(reply, "Dry material that catches a spark.");
}

#[tokio::test]
async fn openai_status_codes_map_to_errors() {
    for status in [429u16, 401, 403, 500] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;
        let err = openai(&server, None).chat(&question(), 0.2).await.unwrap_err();
        let expected = match status {
            429 => matches!(err, LlmError::RateLimited),
            401 | 403 => matches!(err, LlmError::Auth { status: s } if s == status),
            _ => matches!(err, LlmError::Status { provider: "openai", status: 500 }),
        };
        assert!(expected, "status {status} gave {err:?}");
    }
}

#[tokio::test]
async fn openai_without_choices_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;
    let err = openai(&server, None).chat(&question(), 0.2).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse { provider: "openai" }));
}

#[tokio::test]
async fn openai_malformed_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let err = openai(&server, None).chat(&question(), 0.2).await.unwrap_err();
    assert!(matches!(err, LlmError::Json(_)));
}

#[tokio::test]
async fn ollama_posts_non_streaming_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3", "stream": false, "options": {"temperature": 0.5}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "message": {"role": "assistant", "content": "Kindling goes on top."},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ollama = Ollama::new(client_with_timeout(5).unwrap(), &server.uri(), "llama3");
    let reply = ollama.chat(&question(), 0.5).await.unwrap();
    assert_eq!(reply, "Kindling goes on top.");
}

#[tokio::test]
async fn unreachable_server_is_http_error() {
    let server = MockServer::start().await;
    let base = server.uri();
    drop(server);
    let ollama = Ollama::new(client_with_timeout(2).unwrap(), &base, "llama3");
    let err = ollama.chat(&question(), 0.2).await.unwrap_err();
    assert!(matches!(err, LlmError::Http(_)));
}
