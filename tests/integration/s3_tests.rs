//! S3 store tests against a mock S3 endpoint.
//!
//! Tests verify:
//! - PutObject key layout and the public URL handed back
//! - Mapping of S3 error statuses
//! - The HeadBucket connectivity ping

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use bytes::Bytes;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use donation_server::{ImageStore, S3ImageStore, UploadError};

const BUCKET: &str = "proofs";
const PUBLIC_URL: &str = "https://cdn.example.com";

/// Path-style client for the mock endpoint with fixed credentials.
fn client_for(server: &MockServer) -> Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version_latest()
        .region(Region::new("us-east-1"))
        .endpoint_url(server.uri())
        .force_path_style(true)
        .credentials_provider(Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "static",
        ))
        .build();
    Client::from_conf(config)
}

fn store_for(server: &MockServer) -> S3ImageStore {
    S3ImageStore::new(client_for(server), BUCKET, PUBLIC_URL)
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_puts_object_and_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/proofs/donation-proofs/[0-9a-f-]{36}\.jpg$"))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"abc\""))
        .expect(1)
        .mount(&server)
        .await;

    let url = store_for(&server)
        .upload(
            Bytes::from_static(b"\xff\xd8\xff proof"),
            "image/jpeg",
            "donation-proofs",
        )
        .await
        .unwrap();

    assert!(url.starts_with("https://cdn.example.com/donation-proofs/"));
    assert!(url.ends_with(".jpg"));

    // The public URL points at the key that was written
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let key = requests[0].url.path().trim_start_matches("/proofs/");
    assert_eq!(url, format!("{}/{}", PUBLIC_URL, key));
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "image/jpeg"
    );
}

#[tokio::test]
async fn test_upload_png_extension() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/proofs/donation-proofs/[0-9a-f-]{36}\.png$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = store_for(&server)
        .upload(Bytes::from_static(b"\x89PNG"), "image/png", "donation-proofs")
        .await
        .unwrap();
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn test_upload_access_denied_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/proofs/"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("content-type", "application/xml")
                .set_body_string(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                     <Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
                ),
        )
        .mount(&server)
        .await;

    let err = store_for(&server)
        .upload(Bytes::from_static(b"proof"), "image/jpeg", "donation-proofs")
        .await
        .unwrap_err();

    assert!(
        matches!(err, UploadError::Rejected { status: 403, .. }),
        "expected Rejected, got {:?}",
        err
    );
}

// =============================================================================
// Ping
// =============================================================================

#[tokio::test]
async fn test_ping_heads_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path_regex(r"^/proofs/?$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(store_for(&server).ping().await.is_ok());
}

#[tokio::test]
async fn test_ping_missing_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path_regex(r"^/proofs/?$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(store_for(&server).ping().await.is_err());
}
