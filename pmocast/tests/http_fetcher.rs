use std::time::Duration;

use pmocast::{DocumentFetcher, FetchError, HttpFetcher, validate_device, ValidationError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

const CHROMECAST_XML: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <URLBase>http://192.168.1.20:8008</URLBase>
  <device>
    <deviceType>urn:dial-multiscreen-org:device:dial:1</deviceType>
    <friendlyName>Salon</friendlyName>
    <manufacturer>Google Inc.</manufacturer>
    <modelName>Chromecast</modelName>
    <UDN>uuid:5b8d2a1f-0c4e-4f11-9b2c-7d3e6f0a1b2c</UDN>
  </device>
</root>"#;

/// Petit serveur HTTP qui répond une fois avec `status` et `body`.
async fn serve_once(status: &'static str, body: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        let _ = stream.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    });

    Url::parse(&format!("http://{addr}/ssdp/device-desc.xml")).unwrap()
}

#[tokio::test]
async fn test_fetch_description_body() {
    let uri = serve_once("200 OK", CHROMECAST_XML).await;
    let body = HttpFetcher::new()
        .fetch_text(&uri, Duration::from_secs(2))
        .await
        .unwrap();
    assert!(body.contains("<friendlyName>Salon</friendlyName>"));
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let uri = serve_once("404 Not Found", "missing").await;
    let err = HttpFetcher::new()
        .fetch_text(&uri, Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status(404)));
}

#[tokio::test]
async fn test_empty_body_is_an_error() {
    let uri = serve_once("200 OK", "").await;
    let err = HttpFetcher::new()
        .fetch_text(&uri, Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::EmptyBody));
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        // Accepte sans jamais répondre
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let uri = Url::parse(&format!("http://{addr}/ssdp/device-desc.xml")).unwrap();
    let err = HttpFetcher::new()
        .fetch_text(&uri, Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout));
    server.abort();
}

#[tokio::test]
async fn test_validate_device_over_http() {
    let uri = serve_once("200 OK", CHROMECAST_XML).await;
    let device = validate_device(&HttpFetcher::new(), &uri, Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(device.device_uri, uri);
    assert_eq!(device.friendly_name, "Salon");
    assert_eq!(device.model_name.as_deref(), Some("Chromecast"));
    assert_eq!(device.manufacturer.as_deref(), Some("Google Inc."));
    assert!(device.is_validated());
}

#[tokio::test]
async fn test_validate_device_connection_refused() {
    // Port libéré juste après l'allocation : plus personne n'écoute
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let uri = Url::parse(&format!("http://{addr}/ssdp/device-desc.xml")).unwrap();
    let err = validate_device(&HttpFetcher::new(), &uri, Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::Fetch(_)));
}
