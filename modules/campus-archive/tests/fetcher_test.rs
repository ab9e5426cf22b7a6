//! HTTP fetcher behaviour against a local mock server: bounded retries,
//! non-retried client errors and the forced text encoding.

use std::time::Duration;

use campus_archive::{extract, Document, FetchError, HttpFetcher, PageFetcher, PageKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_attempts: u32) -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(5), max_attempts, "utf-8")
        .unwrap()
        .with_retry_base(Duration::ZERO)
}

#[tokio::test]
async fn transient_failures_are_retried_then_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event/a.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/event/a.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>ok</h1>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher(3)
        .fetch(&format!("{}/event/a.html", server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<h1>ok</h1>");
}

#[tokio::test]
async fn retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = fetcher(3)
        .fetch(&format!("{}/down", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, .. }));
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher(3)
        .fetch(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn declared_charset_is_ignored() {
    let server = MockServer::start().await;
    let page = "<main><h1>Decision \u{2013} Theory</h1><p>M\u{fc}nchen</p></main>";
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page.as_bytes().to_vec(), "text/html; charset=iso-8859-1"))
        .mount(&server)
        .await;

    let body = fetcher(1).fetch(&server.uri()).await.unwrap();
    assert_eq!(body, page);
}

#[tokio::test]
async fn non_http_urls_are_rejected() {
    let err = fetcher(1).fetch("ftp://example.edu/x").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

#[tokio::test]
async fn fetched_detail_page_extracts_into_a_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event/talk.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div id="r-main"><h1>Colloquium</h1><h3>Date:</h3><p>4 February 2026</p>
               <address>Ludwigstr. 31<a href="/rf">Room finder</a></address></div>"#,
        ))
        .mount(&server)
        .await;

    let url = format!("{}/event/talk.html", server.uri());
    let html = fetcher(1).fetch(&url).await.unwrap();
    let record = extract(&Document::new(url.clone(), html), PageKind::EventDetail)
        .unwrap()
        .into_record()
        .unwrap();

    assert_eq!(record.url, url);
    assert_eq!(record.title, "Colloquium");
    assert_eq!(record.field("date"), Some("4 February 2026"));
    assert_eq!(record.field("location"), Some("Ludwigstr. 31"));
}
