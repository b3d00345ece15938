use pretty_assertions::assert_eq;
use serde_json::json;
use shelf_client::{ClientSettings, JobClient, ReqwestClient};
use shelf_core::{Flashcard, JobState, JobStatus, Payload, TrackedJob, TransportErrorKind};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestClient {
    shelf_logging::initialize_for_tests();
    ReqwestClient::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn summary_status_is_decoded_with_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/doc-1/summary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ready", "summary": "Line1\nLine2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let status = client_for(&server)
        .fetch_status(&TrackedJob::summary("doc-1"))
        .await
        .unwrap();

    assert_eq!(
        status,
        JobStatus::ready(Payload::Summary("Line1\nLine2".to_string()))
    );
}

#[tokio::test]
async fn flashcards_trigger_posts_and_reads_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files/doc-1/flashcards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "queued"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/doc-1/flashcards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ready",
            "flashcards": [{"question": "Q1", "answer": "A1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let job = TrackedJob::flashcards("doc-1");
    let triggered = client.trigger(&job).await.unwrap();
    assert_eq!(triggered, JobStatus::new(JobState::Queued));

    let status = client.fetch_status(&job).await.unwrap();
    assert_eq!(
        status.payload,
        Some(Payload::Flashcards(vec![Flashcard {
            question: "Q1".to_string(),
            answer: "A1".to_string(),
        }]))
    );
}

#[tokio::test]
async fn ask_sends_question_body_and_polls_by_exact_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files/doc-1/ask"))
        .and(body_json(json!({"question": "What is X? "})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/doc-1/ask"))
        .and(query_param("q", "What is X? "))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "not_found"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let job = TrackedJob::answer("doc-1", "What is X? ");
    assert_eq!(
        client.trigger(&job).await.unwrap().state,
        JobState::Processing
    );
    assert_eq!(
        client.fetch_status(&job).await.unwrap(),
        JobStatus::new(JobState::NotFound)
    );
}

#[tokio::test]
async fn server_error_becomes_http_status_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files/doc-1/summary"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "model offline"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .trigger(&TrackedJob::summary("doc-1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::HttpStatus(500));
    assert_eq!(err.message, "model offline");
}

#[tokio::test]
async fn not_found_on_summary_endpoint_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/doc-1/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "not_found"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_status(&TrackedJob::summary("doc-1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, TransportErrorKind::Decode);
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/files/doc-1/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "not_generated"})))
        .expect(1)
        .mount(&server)
        .await;

    shelf_logging::initialize_for_tests();
    let client = ReqwestClient::new(ClientSettings {
        base_url: format!("{}/api/", server.uri()),
        ..ClientSettings::default()
    })
    .unwrap();

    let status = client
        .fetch_status(&TrackedJob::summary("doc-1"))
        .await
        .unwrap();
    assert_eq!(status.state, JobState::NotGenerated);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestClient::new(ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
}
