use std::time::Duration;

use bizfly_core::{
    Client, Context, Error, IssuedToken, ListOptions, RequestSpec, RetryPolicy, ServiceCatalog,
    ServiceEntry, ServiceName,
};
use chrono::Utc;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retries() -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(40))
}

fn api_root(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

fn basic_client(server: &MockServer) -> Client {
    Client::builder()
        .with_base_url(api_root(server))
        .with_basic_auth("user", "pass")
        .with_project_id("project-1")
        .with_retry_policy(fast_retries())
        .build()
        .unwrap()
}

fn future_token(value: &str) -> IssuedToken {
    IssuedToken::new(value, Utc::now() + chrono::Duration::hours(1), "project-1").unwrap()
}

#[tokio::test]
async fn test_standard_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(header("x-project-id", "project-1"))
        .and(header("x-auth-type", "token"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"volumes": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let body: Value = client
        .call(&Context::new(), RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap();
    assert_eq!(body, json!({"volumes": []}));
}

#[tokio::test]
async fn test_password_mode_obtains_token_and_catalog() {
    let server = MockServer::start().await;
    let root = api_root(&server);
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("x-auth-type", "password"))
        .and(body_partial_json(json!({
            "auth_method": "password",
            "username": "ops@example.com",
            "password": "secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "issued",
            "expires_at": "2099-01-01T00:00:00Z",
            "project_id": "project-7",
            "services": [
                {"canonical_name": "cloud_server", "region": "HN", "service_url": format!("{root}/iaas-cloud/api")}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/iaas-cloud/api/volumes"))
        .and(header("x-auth-token", "issued"))
        .and(header("x-project-id", "project-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(root)
        .with_password("ops@example.com", "secret")
        .build()
        .unwrap();
    let ctx = Context::new();
    for _ in 0..2 {
        let volumes: Vec<Value> = client
            .call(&ctx, RequestSpec::get(ServiceName::CloudServer, "/volumes"))
            .await
            .unwrap();
        assert!(volumes.is_empty());
    }
    assert_eq!(client.project_id(), "project-7");
    assert_eq!(client.catalog().entries().len(), 1);
}

#[tokio::test]
async fn test_unauthorized_triggers_single_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(header("x-auth-token", "old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "xxx",
            "expires_at": "2019-11-22T15:39:54Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(header("x-auth-token", "xxx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "v1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_password("ops@example.com", "secret")
        .with_token(future_token("old"))
        .build()
        .unwrap();

    let volumes: Vec<Value> = client
        .call(&Context::new(), RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap();
    assert_eq!(volumes[0]["id"], "v1");
    assert_eq!(client.token().unwrap().secret(), "xxx");
}

#[tokio::test]
async fn test_second_unauthorized_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "new",
            "expires_at": "2099-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_application_credential("cred-1", "s3cret")
        .with_token(future_token("old"))
        .build()
        .unwrap();

    let err = client
        .call_empty(&Context::new(), RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[tokio::test]
async fn test_rejected_credentials_are_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad password"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_password("ops@example.com", "wrong")
        .build()
        .unwrap();

    let err = client
        .call_empty(&Context::new(), RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap_err();
    match err {
        Error::Unauthorized(message) => assert!(message.contains("bad password")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_token_mode_does_not_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_token(future_token("static"))
        .build()
        .unwrap();

    let err = client
        .call_empty(&Context::new(), RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
}

#[tokio::test]
async fn test_concurrent_calls_share_one_token_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "shared", "expires_at": "2099-01-01T00:00:00Z"}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(header("x-auth-token", "shared"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(10)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_password("ops@example.com", "secret")
        .build()
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .call::<Vec<Value>>(
                    &Context::new(),
                    RequestSpec::get(ServiceName::CloudServer, "/volumes"),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_gateway_errors_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"attempt": 3})))
        .with_priority(3)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let body: Value = client
        .call(&Context::new(), RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap();
    assert_eq!(body["attempt"], 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_transient_exhaustion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let err = client
        .call_empty(&Context::new(), RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transient(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_not_found_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pools/unknown"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "pool not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let err = client
        .call_empty(
            &Context::new(),
            RequestSpec::get(ServiceName::LoadBalancer, "/pools/unknown"),
        )
        .await
        .unwrap_err();
    match err {
        Error::NotFound(message) => assert!(message.contains("pool not found")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let ctx = Context::new();
    ctx.cancel();
    let err = client
        .call_empty(&ctx, RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled(_)));
}

#[tokio::test]
async fn test_deadline_interrupts_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_basic_auth("user", "pass")
        .with_retry_policy(RetryPolicy::new().with_initial_delay(Duration::from_secs(30)))
        .build()
        .unwrap();

    let ctx = Context::new().with_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let err = client
        .call_empty(&ctx, RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled(_)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_list_options_become_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "50"))
        .and(query_param("status", "available"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let options = ListOptions::new()
        .with_page(2)
        .with_limit(50)
        .with_filter("status", "available");
    let ctx = Context::new();
    for _ in 0..2 {
        client
            .call_empty(
                &ctx,
                RequestSpec::get(ServiceName::CloudServer, "/volumes").list_options(&options),
            )
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url, requests[1].url);
}

#[tokio::test]
async fn test_refresh_catalog_installs_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "services": [
                {"canonical_name": "load_balancer", "region": "HN", "service_url": "https://hn-lb.example.com/api/"},
                {"canonical_name": "load_balancer", "region": "HCM", "service_url": "https://hcm-lb.example.com/api"},
                {"canonical_name": "load_balancer", "region": "HN", "service_url": "https://duplicate.example.com"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let catalog = client.refresh_catalog(&Context::new()).await.unwrap();
    assert_eq!(catalog.entries().len(), 2);
    assert_eq!(
        client.url_for(ServiceName::LoadBalancer),
        "https://hn-lb.example.com/api"
    );
    client.set_region("HCM");
    assert_eq!(
        client.url_for(ServiceName::LoadBalancer),
        "https://hcm-lb.example.com/api"
    );
    client.set_region("SG");
    assert_eq!(client.url_for(ServiceName::LoadBalancer), api_root(&server));
}

#[tokio::test]
async fn test_set_catalog_routes_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dns/api/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zones": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = basic_client(&server);
    client.set_catalog(ServiceCatalog::new([ServiceEntry::new(
        "dns",
        "HN",
        format!("{}/dns/api", server.uri()),
    )]));

    client
        .call_empty(&Context::new(), RequestSpec::get(ServiceName::Dns, "/zones"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_deadline_aborts_in_flight_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let client = basic_client(&server);
    let ctx = Context::new().with_timeout(Duration::from_millis(100));
    let started = std::time::Instant::now();
    let err = client
        .call_empty(&ctx, RequestSpec::get(ServiceName::CloudServer, "/volumes"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled(_)));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_token_inside_refresh_margin_is_replaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "renewed",
            "expires_at": "2099-01-01T00:00:00Z",
            "project_id": "project-1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(header("x-auth-token", "renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let expiring =
        IssuedToken::new("expiring", Utc::now() + chrono::Duration::seconds(10), "project-1")
            .unwrap();
    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_password("ops@example.com", "secret")
        .with_token(expiring)
        .build()
        .unwrap();

    let ctx = Context::new();
    for _ in 0..2 {
        client
            .call_empty(&ctx, RequestSpec::get(ServiceName::CloudServer, "/volumes"))
            .await
            .unwrap();
    }
    assert_eq!(client.token().unwrap().secret(), "renewed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rejections_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(header("x-auth-token", "old"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "new",
            "expires_at": "2099-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/volumes"))
        .and(header("x-auth-token", "new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = Client::builder()
        .with_base_url(api_root(&server))
        .with_password("ops@example.com", "secret")
        .with_token(future_token("old"))
        .build()
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .call_empty(
                    &Context::new(),
                    RequestSpec::get(ServiceName::CloudServer, "/volumes"),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(client.token().unwrap().secret(), "new");
}
