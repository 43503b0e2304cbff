use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use httpmock::prelude::HttpMockRequest;
use second_opinion::client::{CatalogSource, ChatBackend, ChatRequest, Message};
use second_opinion::models::OpenRouterError;
use second_opinion::{
    BackendTarget, DispatchSettings, Dispatcher, OpenRouterClient, QueryRequest,
    SecondOpinionError, format_results,
};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn client_for(server: &MockServer) -> OpenRouterClient {
    OpenRouterClient::new("sk-test".to_string(), Some(server.base_url())).unwrap()
}

fn request(model: &str) -> ChatRequest {
    ChatRequest {
        model: BackendTarget::from(model),
        messages: vec![Message::user("hello")],
        temperature: None,
        max_tokens: None,
    }
}

fn completion_body(content: &str) -> String {
    format!(
        r#"{{"model":"m","choices":[{{"message":{{"role":"assistant","content":"{content}"}}}}],"usage":{{"prompt_tokens":12,"completion_tokens":34}}}}"#
    )
}

#[tokio::test]
async fn complete_returns_content_and_usage() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer sk-test")
                .header("x-title", "second-opinion");
            then.status(200)
                .header("content-type", "application/json")
                .body(completion_body("a detailed answer"));
        })
        .await;

    let reply = client_for(&server)
        .complete(&request("openai/gpt-4o"), TIMEOUT)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(reply.content.as_deref(), Some("a detailed answer"));
    assert_eq!(reply.usage.prompt_tokens, Some(12));
    assert_eq!(reply.usage.completion_tokens, Some(34));
}

#[tokio::test]
async fn complete_tolerates_missing_content() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#);
        })
        .await;

    let reply = client_for(&server)
        .complete(&request("m"), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reply.content, None);
    assert_eq!(reply.usage.prompt_tokens, None);
}

#[tokio::test]
async fn complete_tolerates_empty_choices() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"choices":[]}"#);
        })
        .await;

    let reply = client_for(&server)
        .complete(&request("m"), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reply.content, None);
}

#[tokio::test]
async fn error_body_with_ok_status_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"error":{"message":"provider unavailable","code":502}}"#);
        })
        .await;

    let err = client_for(&server)
        .complete(&request("m"), TIMEOUT)
        .await
        .unwrap_err();
    match err {
        SecondOpinionError::OpenRouterApi(OpenRouterError::ApiError { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "provider unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401)
                .body(r#"{"error":{"message":"No auth credentials found"}}"#);
        })
        .await;

    let err = client_for(&server)
        .complete(&request("m"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SecondOpinionError::OpenRouterApi(OpenRouterError::AuthenticationFailed)
    ));
}

#[tokio::test]
async fn not_found_names_the_model() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(404).body("not here");
        })
        .await;

    let err = client_for(&server)
        .complete(&request("vendor/missing"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("vendor/missing"));
}

#[tokio::test]
async fn rate_limit_mentions_retry_after() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429)
                .header("retry-after", "7")
                .body(r#"{"error":{"message":"slow down"}}"#);
        })
        .await;

    let err = client_for(&server)
        .complete(&request("m"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        SecondOpinionError::OpenRouterApi(OpenRouterError::RateLimited(_))
    ));
    assert!(err.to_string().contains("slow down (retry after 7)"));
}

#[tokio::test]
async fn server_error_keeps_status_and_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500)
                .body(r#"{"error":{"message":"upstream exploded"}}"#);
        })
        .await;

    let err = client_for(&server)
        .complete(&request("m"), TIMEOUT)
        .await
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("500"));
    assert!(text.contains("upstream exploded"));
}

#[tokio::test]
async fn unset_sampling_options_are_omitted() {
    fn no_sampling_fields(req: &HttpMockRequest) -> bool {
        req.body
            .as_ref()
            .and_then(|b| serde_json::from_slice::<serde_json::Value>(b).ok())
            .map(|v| v.get("temperature").is_none() && v.get("max_tokens").is_none())
            .unwrap_or(false)
    }

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .matches(no_sampling_fields);
            then.status(200)
                .header("content-type", "application/json")
                .body(completion_body("plenty of text"));
        })
        .await;

    client_for(&server)
        .complete(&request("m"), TIMEOUT)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn set_sampling_options_are_sent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("\"temperature\":0.3")
                .body_contains("\"max_tokens\":256");
            then.status(200)
                .header("content-type", "application/json")
                .body(completion_body("plenty of text"));
        })
        .await;

    let mut req = request("m");
    req.temperature = Some(0.3);
    req.max_tokens = Some(256);
    client_for(&server).complete(&req, TIMEOUT).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .delay(Duration::from_millis(500))
                .body(completion_body("late"));
        })
        .await;

    let err = client_for(&server)
        .complete(&request("m"), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, SecondOpinionError::Timeout(_)));
}

#[tokio::test]
async fn catalog_is_parsed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/models")
                .header("authorization", "Bearer sk-test");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    r#"{"data":[{"id":"openai/gpt-4o","name":"GPT-4o","context_length":128000,
                    "pricing":{"prompt":"0.0000025","completion":"0.00001"},
                    "top_provider":{"max_completion_tokens":16384},
                    "architecture":{"modality":"text+image->text"}}]}"#,
                );
        })
        .await;

    let catalog = client_for(&server).fetch_catalog().await.unwrap();
    mock.assert_async().await;

    let info = catalog.get("openai/gpt-4o");
    assert_eq!(info.name, "GPT-4o");
    assert_eq!(info.context_length, 128_000);
    assert_eq!(info.max_completion_tokens, Some(16_384));
    assert_eq!(info.modality, "text+image->text");
    assert!((info.input_cost_per_token - 0.0000025).abs() < 1e-12);

    let unknown = catalog.get("nobody/knows");
    assert_eq!(unknown.context_length, 0);
}

#[tokio::test]
async fn catalog_failure_reports_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/models");
            then.status(503).body("down");
        })
        .await;

    let err = client_for(&server).fetch_catalog().await.unwrap_err();
    assert!(matches!(
        err,
        SecondOpinionError::OpenRouterApi(OpenRouterError::CatalogStatus(503))
    ));
}

fn settings(models: &[&str]) -> DispatchSettings {
    DispatchSettings {
        models: models.iter().map(|m| BackendTarget::from(*m)).collect(),
        timeout: TIMEOUT,
        default_temperature: None,
        default_max_tokens: None,
    }
}

#[tokio::test]
async fn dispatch_over_http_isolates_failures() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("\"model\":\"good/model\"");
            then.status(200)
                .header("content-type", "application/json")
                .body(completion_body("a thorough second opinion"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("\"model\":\"bad/model\"");
            then.status(500)
                .body(r#"{"error":{"message":"boom"}}"#);
        })
        .await;

    let dispatcher = Dispatcher::new(
        Arc::new(client_for(&server)),
        settings(&["good/model", "bad/model"]),
    );
    let outcomes = dispatcher.dispatch(&QueryRequest::new("question")).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].response(), Some("a thorough second opinion"));
    assert!(outcomes[1].error().unwrap().contains("boom"));
    assert!(outcomes.iter().all(|o| o.latency_ms.is_some()));

    let markdown = format_results(&outcomes);
    assert!(markdown.starts_with("### good/model\n\na thorough second opinion"));
    assert!(markdown.contains("### bad/model\n\n> Error: "));
}

#[tokio::test]
async fn dispatch_over_http_retries_short_answer_once() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .body(completion_body("ok"));
        })
        .await;

    let dispatcher = Dispatcher::new(Arc::new(client_for(&server)), settings(&["terse/model"]));
    let outcomes = dispatcher.dispatch(&QueryRequest::new("question")).await;

    assert_eq!(mock.hits_async().await, 2);
    assert_eq!(outcomes[0].response(), Some("ok"));
}
