use serde::Deserialize;
use trawl_http::{HttpClient, HttpError, USER_AGENT};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Item {
    name: String,
    count: i64,
}

#[tokio::test]
async fn sends_identity_header_and_decodes_ok_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/"))
        .and(query_param("q", "a b"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"name":"x","count":3,"extra":true}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let got: Item = client
        .get_json(&format!("{}/items/?q=a%20b", server.uri()))
        .await
        .unwrap();

    assert_eq!(got.name, "x");
    assert_eq!(got.count, 3);
}

#[tokio::test]
async fn non_200_status_is_an_error_with_code_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"response":{"error":"slow down"}}"#),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get_json::<Item>(&format!("{}/items/", server.uri()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("429"));
    match err {
        HttpError::Status { status, body } => {
            assert_eq!(status.as_u16(), 429);
            assert!(body.contains("slow down"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn other_2xx_codes_are_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get_json::<Item>(&server.uri())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(204));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get_json::<Item>(&server.uri())
        .await
        .unwrap_err();
    match err {
        HttpError::Decode(_, snippet) => assert!(snippet.contains("oops")),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_url_is_rejected_before_sending() {
    let client = HttpClient::new().unwrap();
    let err = client.get_json::<Item>("not a url").await.unwrap_err();
    assert!(matches!(err, HttpError::Url(_)));
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}/items/");

    let client = HttpClient::new().unwrap();
    let err = client.get_json::<Item>(&uri).await.unwrap_err();
    assert!(matches!(err, HttpError::Network(_)), "got {err:?}");
}

/// Serves one response whose body is cut short of its declared length.
async fn truncated_response_server(status_line: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = sock.read(&mut buf).await;
        let head = format!("{status_line}\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort");
        let _ = sock.write_all(head.as_bytes()).await;
        let _ = sock.shutdown().await;
    });
    format!("http://{addr}/posts_full/")
}

#[tokio::test]
async fn unreadable_error_body_keeps_status_code() {
    let uri = truncated_response_server("HTTP/1.1 503 Service Unavailable").await;

    let client = HttpClient::new().unwrap();
    let err = client.get_json::<Item>(&uri).await.unwrap_err();
    assert_eq!(err.status_code(), Some(503), "got {err:?}");
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn unreadable_ok_body_is_a_network_error() {
    let uri = truncated_response_server("HTTP/1.1 200 OK").await;

    let client = HttpClient::new().unwrap();
    let err = client.get_json::<Item>(&uri).await.unwrap_err();
    assert!(matches!(err, HttpError::Network(_)), "got {err:?}");
}
