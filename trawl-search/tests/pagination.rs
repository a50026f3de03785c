use futures::StreamExt;
use serde_json::json;
use trawl_http::USER_AGENT;
use trawl_search::{SearchError, SearchParameters, TrawlingApi};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> TrawlingApi {
    TrawlingApi::new()
        .unwrap()
        .with_endpoint(format!("{}/posts_full/", server.uri()))
}

fn post(id: &str, text: &str) -> serde_json::Value {
    json!({
        "id": id,
        "text": text,
        "lang": "en",
        "user_screen_name": "trawler",
        "user_follower_count": 7
    })
}

/// Page 1 answers the search, page 2 answers its `next` cursor and ends the sequence.
async fn mount_two_pages(server: &MockServer) {
    let next = format!("{}/posts_full/?token=tok&cursor=c2", server.uri());

    Mock::given(method("GET"))
        .and(path("/posts_full/"))
        .and(query_param("token", "tok"))
        .and(query_param("q", "climate change"))
        .and(query_param("sort", "date"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "data": [post("1", "first"), post("2", "second")],
                "requestLeft": 10,
                "totalResults": 3,
                "restResults": 1,
                "next": next
            }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/posts_full/"))
        .and(query_param("cursor", "c2"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "data": [post("3", "third")],
                "requestLeft": 9,
                "totalResults": 3,
                "restResults": 0,
                "next": ""
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn params() -> SearchParameters {
    SearchParameters::new("climate change")
        .with_token("tok")
        .with_sort("date")
}

#[tokio::test]
async fn follows_next_until_terminal_page() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let api = api_for(&server);

    let first = api.search(&params()).await.unwrap();
    assert_eq!(first.data.len(), 2);
    assert_eq!(first.request_left, 10);
    assert_eq!(first.rest_results, 1);
    assert!(first.has_next());
    assert_eq!(first.data[0].author.screen_name, "trawler");

    let second = api.next_page(&first).await.unwrap();
    assert_eq!(second.data.len(), 1);
    assert_eq!(second.data[0].id, "3");
    assert!(!second.has_next());

    let err = api.next_page(&second).await.unwrap_err();
    assert!(matches!(err, SearchError::NoMorePages));
}

#[tokio::test]
async fn pages_stream_collects_whole_sequence() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let api = api_for(&server);
    let params = params();

    let ids: Vec<String> = api
        .pages(&params, None)
        .map(|page| page.unwrap())
        .flat_map(|page| futures::stream::iter(page.data))
        .map(|post| post.id)
        .collect()
        .await;

    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn resumes_from_stored_cursor() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let api = api_for(&server);

    // Fetch the first page elsewhere, keep only its cursor, resume with a fresh client.
    let cursor = api.search(&params()).await.unwrap().next;
    let resumed = api_for(&server).fetch(&cursor).await.unwrap();
    assert_eq!(resumed.data[0].text, "third");
}

#[tokio::test]
async fn rate_limited_search_reports_status_and_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts_full/"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "response": { "error": "Request limit exceeded" } })),
        )
        .mount(&server)
        .await;

    let err = api_for(&server)
        .search(&SearchParameters::new("rust"))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("429"), "{text}");
    assert!(text.contains("Request limit exceeded"), "{text}");
}

#[tokio::test]
async fn server_error_without_json_body_still_reports_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    match api_for(&server).search(&SearchParameters::new("rust")).await {
        Err(SearchError::Status { code, message }) => {
            assert_eq!(code, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_shaped_body_with_200_decodes_as_empty_page() {
    // Only the status separates success from failure on the wire.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "response": { "error": "odd" } })),
        )
        .mount(&server)
        .await;

    let page = api_for(&server)
        .search(&SearchParameters::new("rust"))
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert!(!page.has_next());
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"response": {"data": 5}}"#))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .search(&SearchParameters::new("rust"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SearchError::Http(trawl_http::HttpError::Decode(..))),
        "{err:?}"
    );
}

#[tokio::test]
async fn empty_parameters_hit_bare_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts_full/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "response": { "error": "Query required" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(
        api.build_url(&SearchParameters::default()),
        format!("{}/posts_full/?", server.uri())
    );
    let err = api.search(&SearchParameters::default()).await.unwrap_err();
    assert!(err.to_string().contains("400"));
}
