use constant_contact_mcp::{ApiClient, ApiError, Config};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::io::{Read, Write};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Sleeps = Arc<Mutex<Vec<Duration>>>;

// Client rooted at `<mock>/v3` whose waits are recorded instead of slept.
fn client_for(server: &MockServer, now_ms: i64) -> (ApiClient, Sleeps) {
    let cfg = Config::new("tok", Some(&format!("{}/v3", server.uri())));
    let sleeps: Sleeps = Arc::new(Mutex::new(Vec::new()));
    let rec = sleeps.clone();
    let client = ApiClient::new(&cfg)
        .unwrap()
        .with_clock(move || now_ms)
        .with_sleeper(move |d| {
            rec.lock().unwrap().push(d);
            async {}
        });
    (client, sleeps)
}

fn contacts_page(range: std::ops::Range<u32>, next: Option<&str>) -> serde_json::Value {
    let contacts: Vec<_> = range.map(|i| json!({ "contact_id": format!("c{}", i) })).collect();
    match next {
        Some(n) => json!({ "contacts": contacts, "_links": { "next": { "href": n } } }),
        None => json!({ "contacts": contacts }),
    }
}

#[tokio::test]
async fn sends_bearer_token_and_json_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/account/summary"))
        .and(header("authorization", "Bearer tok"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let out = client.get("account/summary", None).await.unwrap();
    assert_eq!(out, json!({"ok": true}));
}

#[tokio::test]
async fn rate_headers_are_reflected_in_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "4321")
                .insert_header("x-ratelimit-reset", "1700000000")
                .set_body_json(json!({"contact_id": "1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contact_id": "2"})))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    client.get("/contacts/1", None).await.unwrap();
    let status = client.rate_limit_status();
    assert_eq!(status.remaining, 4321);
    assert_eq!(status.reset_at.timestamp(), 1_700_000_000);

    // A response without the headers leaves the previous observation alone.
    client.get("/contacts/2", None).await.unwrap();
    assert_eq!(client.rate_limit_status().remaining, 4321);
}

#[tokio::test]
async fn low_budget_waits_until_reset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contact_lists"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "5")
                .insert_header("x-ratelimit-reset", "2000")
                .set_body_json(json!({"lists": []})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (client, sleeps) = client_for(&server, 1_000_000);
    client.get("/contact_lists", None).await.unwrap();
    assert!(sleeps.lock().unwrap().is_empty());

    client.get("/contact_lists", None).await.unwrap();
    assert_eq!(*sleeps.lock().unwrap(), vec![Duration::from_millis(1_000_000)]);
}

#[tokio::test]
async fn single_429_is_absorbed_after_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contacts": []})))
        .mount(&server)
        .await;

    let (client, sleeps) = client_for(&server, 0);
    let out = client.get("/contacts", None).await.unwrap();
    assert_eq!(out, json!({"contacts": []}));
    assert_eq!(*sleeps.lock().unwrap(), vec![Duration::from_secs(2)]);
}

#[tokio::test]
async fn retry_after_429_resends_same_body() {
    let server = MockServer::start().await;
    let body = json!({"email_address": {"address": "a@b.c"}, "list_memberships": ["L1"]});
    Mock::given(method("POST"))
        .and(path("/v3/contacts"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/contacts"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"contact_id": "new"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, sleeps) = client_for(&server, 0);
    let out = client.post("/contacts", Some(&body)).await.unwrap();
    assert_eq!(out["contact_id"], "new");
    assert_eq!(*sleeps.lock().unwrap(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn retry_after_429_resends_same_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("status", "active"))
        .and(query_param("list_ids", "a,b"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("status", "active"))
        .and(query_param("list_ids", "a,b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contacts": []})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, sleeps) = client_for(&server, 0);
    let params = json!({"status": "active", "list_ids": ["a", "b"]});
    client.get("/contacts", Some(&params)).await.unwrap();
    assert_eq!(*sleeps.lock().unwrap(), vec![Duration::from_secs(3)]);
}

#[tokio::test]
async fn second_429_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!([{"error_key": "throttled", "error_message": "Too many requests"}])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (client, sleeps) = client_for(&server, 0);
    let err = client.get("/contacts", None).await.unwrap_err();
    match &err {
        ApiError::Upstream { status, message } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(message.as_deref(), Some("Too many requests"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.retriable());
    // No Retry-After header: the default backoff applies.
    assert_eq!(*sleeps.lock().unwrap(), vec![Duration::from_secs(60)]);
}

#[tokio::test]
async fn pagination_follows_next_links_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("cursor", "p2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(contacts_page(50..100, Some("/v3/contacts?cursor=p3"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("cursor", "p3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts_page(100..110, None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("limit", "50"))
        .and(query_param("status", "all"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(contacts_page(0..50, Some("/v3/contacts?cursor=p2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let items = client
        .get_paginated("/contacts", Some(&json!({"status": "all"})), None)
        .await
        .unwrap();
    assert_eq!(items.len(), 110);
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item["contact_id"], format!("c{}", i));
    }
}

#[tokio::test]
async fn pagination_throttles_between_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts_page(50..60, None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("limit", "50"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "5")
                .insert_header("x-ratelimit-reset", "2000")
                .set_body_json(contacts_page(0..50, Some("/v3/contacts?cursor=p2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, sleeps) = client_for(&server, 1_000_000);
    let items = client.get_paginated("/contacts", None, None).await.unwrap();
    assert_eq!(items.len(), 60);
    assert_eq!(*sleeps.lock().unwrap(), vec![Duration::from_millis(1_000_000)]);
}

#[tokio::test]
async fn zero_limit_falls_back_to_default_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contact_tags"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tags": [{"tag_id": "t"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let tags = client
        .get_paginated("/contact_tags", Some(&json!({"limit": 0})), None)
        .await
        .unwrap();
    assert_eq!(tags.len(), 1);
}

#[tokio::test]
async fn pagination_stops_at_max_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("cursor", "p2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(contacts_page(50..100, Some("/v3/contacts?cursor=p3"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("cursor", "p3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(contacts_page(100..110, None)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("limit", "50"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(contacts_page(0..50, Some("/v3/contacts?cursor=p2"))),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let items = client.get_paginated("/contacts", None, Some(75)).await.unwrap();
    assert_eq!(items.len(), 75);
    assert_eq!(items[74]["contact_id"], "c74");
}

#[tokio::test]
async fn pagination_reads_resource_envelopes_and_failure_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contact_lists"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lists": [{"list_id": "a"}, {"list_id": "b"}],
            "lists_count": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/segments"))
        .and(query_param("cursor", "broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/segments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "segments": [{"segment_id": 1}],
            "_links": {"next": "/v3/segments?cursor=broken"}
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    let lists = client
        .get_paginated("/contact_lists", Some(&json!({"limit": 10})), None)
        .await
        .unwrap();
    assert_eq!(lists, vec![json!({"list_id": "a"}), json!({"list_id": "b"})]);

    let err = client.get_paginated("/segments", None, None).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(
        err.to_string(),
        "Constant Contact API Error (500): upstream exploded"
    );
}

#[tokio::test]
async fn array_params_are_comma_joined() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/contacts"))
        .and(query_param("list_ids", "a,b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contacts": []})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    client
        .get("/contacts", Some(&json!({"list_ids": ["a", "b"], "status": null})))
        .await
        .unwrap();
}

#[tokio::test]
async fn no_content_and_plain_text_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v3/contact_tags/t1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/contacts/sign_up_form"))
        .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, 0);
    assert_eq!(
        client.delete("/contact_tags/t1").await.unwrap(),
        json!({"success": true})
    );
    assert_eq!(
        client
            .post("/contacts/sign_up_form", Some(&json!({"email_address": "a@b.c"})))
            .await
            .unwrap(),
        json!("accepted")
    );
}

#[tokio::test]
async fn unreachable_host_is_no_response() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let cfg = Config::new("tok", Some(&format!("http://{}/v3", addr)));
    let client = ApiClient::new(&cfg).unwrap();
    let err = client.get("/contacts", None).await.unwrap_err();
    assert!(matches!(err, ApiError::NoResponse(_)), "{:?}", err);
    assert_eq!(err.code(), "no_response");
}

// Serve one connection: answer with `head` plus a body shorter than its
// declared length, then hang up.
fn truncated_body_server(head: &'static str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut sock, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf);
            let _ = sock.write_all(head.as_bytes());
            let _ = sock.write_all(b"\r\ncontent-length: 100\r\n\r\npartial");
            let _ = sock.flush();
        }
    });
    format!("http://{}/v3", addr)
}

#[tokio::test]
async fn truncated_error_body_keeps_status() {
    let base = truncated_body_server("HTTP/1.1 503 Service Unavailable");
    let client = ApiClient::new(&Config::new("tok", Some(&base))).unwrap();
    let err = client.get("/contacts", None).await.unwrap_err();
    assert!(!matches!(err, ApiError::NoResponse(_)), "{:?}", err);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
    assert_eq!(err.code(), "upstream_error");
}

#[tokio::test]
async fn truncated_success_body_is_not_no_response() {
    let base = truncated_body_server("HTTP/1.1 200 OK");
    let client = ApiClient::new(&Config::new("tok", Some(&base))).unwrap();
    let err = client.get("/contacts", None).await.unwrap_err();
    assert!(matches!(err, ApiError::Other(_)), "{:?}", err);
    assert!(!err.retriable());
}
