// Tests for the form controller against a mock scraping service

use crawlpilot_client::{ExportFormat, ScrapeClient};
use crawlpilot_core::{Action, ActionState, ErrorKind, FormController, FormError, FormState};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn controller_for(server: &MockServer, download_dir: &std::path::Path) -> FormController {
    let client = ScrapeClient::with_timeout(&server.uri(), 10).unwrap();
    FormController::new(client, download_dir)
}

async fn mount_scrape_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": [{
                "url": "https://example.com",
                "title": "Example",
                "ai_extracted_content": { "summary": "S" }
            }]
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Submit
// ============================================================================

#[tokio::test]
async fn test_empty_url_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());

    let err = controller.submit_crawl(&FormState::default()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.to_string(), "URL is required.");
    assert!(matches!(
        controller.status().crawl,
        ActionState::Failed { kind: ErrorKind::Validation, .. }
    ));
    assert!(controller.last_result().is_none());
}

#[tokio::test]
async fn test_successful_crawl_is_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .and(body_partial_json(json!({
            "url": "https://example.com/",
            "depth": 2,
            "max_pages": 7,
            "follow_external_links": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url": "https://example.com", "title": "Example" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    let form = FormState::new("https://example.com")
        .with_depth(2)
        .with_max_pages(7)
        .with_follow_external_links(true);

    let session = controller.submit_crawl(&form).await.unwrap();

    assert_eq!(session.response.data.len(), 1);
    assert_eq!(session.request.max_pages, 7);
    assert_eq!(controller.status().crawl, ActionState::Succeeded);
    assert!(Arc::ptr_eq(&session, &controller.last_result().unwrap()));
    assert!(!controller.is_busy(Action::Crawl));
}

#[tokio::test]
async fn test_api_error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "bad url" })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());

    let err = controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.to_string(), "bad url");
    assert_eq!(
        controller.status().crawl,
        ActionState::Failed {
            kind: ErrorKind::Api,
            message: "bad url".to_string()
        }
    );
    assert!(!controller.is_busy(Action::Crawl));
}

#[tokio::test]
async fn test_failed_crawl_keeps_previous_result() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());

    mount_scrape_success(&server).await;
    controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap();

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "HTTP error! Status: 500");
    assert!(controller.last_result().is_some());
}

#[tokio::test]
async fn test_transport_error_kind() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScrapeClient::with_timeout("http://127.0.0.1:9", 2).unwrap();
    let controller = FormController::new(client, dir.path());

    let err = controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!controller.is_busy(Action::Crawl));
}

#[tokio::test]
async fn test_overlapping_submission_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [] }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    let form = FormState::new("https://example.com");

    let (first, second) = tokio::join!(controller.submit_crawl(&form), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.submit_crawl(&form).await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(FormError::Busy)));
    assert_eq!(controller.status().crawl, ActionState::Succeeded);
}

#[tokio::test]
async fn test_status_subscribers_see_busy_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [] }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = Arc::new(controller_for(&server, dir.path()));
    let mut rx = controller.subscribe();

    let task = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .submit_crawl(&FormState::new("https://example.com"))
                .await
        })
    };

    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().crawl.is_busy());

    task.await.unwrap().unwrap();
    assert_eq!(rx.borrow().crawl, ActionState::Succeeded);
}

// ============================================================================
// Download
// ============================================================================

#[tokio::test]
async fn test_download_without_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());

    let err = controller.request_download(ExportFormat::Json).await.unwrap_err();

    assert!(matches!(err, FormError::NoResults));
    assert!(matches!(controller.status().download, ActionState::Failed { .. }));
}

#[tokio::test]
async fn test_markdown_download_without_disposition_gets_md_extension() {
    let server = MockServer::start().await;
    mount_scrape_success(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .and(body_partial_json(json!({
            "format": "markdown",
            "url": "https://example.com/",
            "max_pages": 20
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"# Example\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap();

    let path = controller.request_download(ExportFormat::Markdown).await.unwrap();

    assert!(path.to_string_lossy().ends_with(".md"));
    assert_eq!(path.parent().unwrap(), dir.path());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Example\n");
    assert_eq!(controller.status().download, ActionState::Succeeded);
}

#[tokio::test]
async fn test_download_uses_suggested_filename() {
    let server = MockServer::start().await;
    mount_scrape_success(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    r#"attachment; filename="example_com_results.json""#,
                )
                .set_body_bytes(b"{}".to_vec()),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap();

    let first = controller.request_download(ExportFormat::Json).await.unwrap();
    let second = controller.request_download(ExportFormat::Json).await.unwrap();

    assert_eq!(first, dir.path().join("example_com_results.json"));
    assert_eq!(second, dir.path().join("example_com_results (1).json"));
}

#[tokio::test]
async fn test_download_error_body_is_message() {
    let server = MockServer::start().await;
    mount_scrape_success(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Unsupported format"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap();

    let err = controller.request_download(ExportFormat::Json).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.to_string(), "Unsupported format");
    assert!(!controller.is_busy(Action::Download));
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn test_reset_clears_form_and_results() {
    let server = MockServer::start().await;
    mount_scrape_success(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let controller = controller_for(&server, dir.path());
    let mut form = FormState::new("https://example.com")
        .with_instructions("pricing")
        .with_depth(3);
    controller.submit_crawl(&form).await.unwrap();

    controller.reset_form(&mut form);

    assert_eq!(form, FormState::default());
    assert!(controller.last_result().is_none());
    assert_eq!(controller.status().crawl, ActionState::Idle);
    assert_eq!(controller.status().download, ActionState::Idle);

    let err = controller.request_download(ExportFormat::Json).await.unwrap_err();
    assert!(matches!(err, FormError::NoResults));
}

#[tokio::test]
async fn test_reset_discards_crawl_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [{ "title": "Late" }] }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let controller = Arc::new(controller_for(&server, dir.path()));

    let task = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller
                .submit_crawl(&FormState::new("https://example.com"))
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut form = FormState::new("https://example.com");
    controller.reset_form(&mut form);

    let result = task.await.unwrap();
    assert!(matches!(result, Err(FormError::Superseded)));
    assert!(controller.last_result().is_none());
    assert_eq!(controller.status().crawl, ActionState::Idle);
    assert!(!controller.is_busy(Action::Crawl));

    // Crawls submitted after the reset are stored as usual
    controller
        .submit_crawl(&FormState::new("https://example.com"))
        .await
        .unwrap();
    assert!(controller.last_result().is_some());
}
