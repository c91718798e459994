//! Dispatch, re-authentication and pagination through `BunqClient`

mod support;

use std::sync::Arc;
use std::time::Duration;

use bunq_common::storage::MemoryStore;
use bunq_core::{BunqClient, SessionSettings, ThrottledTransport};
use bunq_domain::{
    ApiObject, ApiRequest, ApiResponse, BunqError, HttpMethod, RateLimit, RateLimits,
    ReauthPolicy, RequestOptions, UserType,
};
use futures::StreamExt;
use serde_json::json;
use support::{client, manager, page, FakeKeys, MockTransport, Reply, API_KEY};
use tokio::time::Instant;

const ACCOUNTS: &str = "user/42/monetary-account";

fn accounts_reply() -> Reply {
    Reply::Ok(ApiResponse::new(vec![ApiObject::new(
        "MonetaryAccountBank",
        json!({ "id": 9, "description": "Main" }),
    )]))
}

fn setup(policy: ReauthPolicy) -> (Arc<MockTransport>, BunqClient) {
    let transport = Arc::new(MockTransport::new());
    let keys = Arc::new(FakeKeys::default());
    let session =
        manager(&transport, Arc::new(MemoryStore::new()), &keys, SessionSettings::new(API_KEY));
    let client = client(&transport, session, policy);
    (transport, client)
}

fn ids(objects: &[ApiObject]) -> Vec<u64> {
    objects.iter().filter_map(|object| object.u64_field("id")).collect()
}

#[tokio::test]
async fn request_authenticates_first_and_carries_session_token() {
    let (transport, client) = setup(ReauthPolicy::default());
    transport.route(ACCOUNTS, accounts_reply());

    let response = client.get(ACCOUNTS).await.unwrap();
    assert_eq!(response.objects[0].str_field("description"), Some("Main"));

    let calls = transport.calls();
    let last = calls.last().unwrap();
    assert_eq!(last.resource, ACCOUNTS);
    assert_eq!(last.method, HttpMethod::Get);
    assert_eq!(last.token.as_deref(), Some("session-token-1"));
    assert!(last.signed);
    assert!(last.verified);
}

#[tokio::test]
async fn verb_wrappers_use_their_method_and_body() {
    let (transport, client) = setup(ReauthPolicy::default());
    let resource = "user/42/monetary-account/9/payment";
    transport.route(resource, Reply::Ok(ApiResponse::new(vec![])));

    client.post(resource, json!({ "amount": { "value": "1.00" } })).await.unwrap();
    client.put(resource, json!({ "description": "rent" })).await.unwrap();
    client.delete(resource).await.unwrap();
    client
        .request(
            ApiRequest::get(resource)
                .with_options(RequestOptions::new().query("count", "10").unsigned()),
        )
        .await
        .unwrap();

    let calls: Vec<_> =
        transport.calls().into_iter().filter(|call| call.resource == resource).collect();
    let methods: Vec<_> = calls.iter().map(|call| call.method).collect();
    assert_eq!(
        methods,
        [HttpMethod::Post, HttpMethod::Put, HttpMethod::Delete, HttpMethod::Get]
    );
    assert_eq!(calls[0].body, Some(json!({ "amount": { "value": "1.00" } })));
    assert_eq!(calls[2].body, None);
    assert!(!calls[3].signed);
}

#[tokio::test]
async fn expired_session_is_renewed_once_and_request_retried() {
    let (transport, client) = setup(ReauthPolicy::default());
    transport.route(ACCOUNTS, accounts_reply());

    client.get(ACCOUNTS).await.unwrap();
    transport.revoke("session-token-1");

    let response = client.get(ACCOUNTS).await.unwrap();
    assert_eq!(response.objects.len(), 1);
    assert_eq!(transport.sessions_created(), 2);
    assert_eq!(transport.calls_to(ACCOUNTS), 3);
    assert_eq!(client.session().session().unwrap().token, "session-token-2");

    let calls = transport.calls();
    let last = calls.last().unwrap();
    assert_eq!(last.token.as_deref(), Some("session-token-2"));
}

#[tokio::test]
async fn second_rejection_becomes_auth_expired() {
    let (transport, client) = setup(ReauthPolicy::default());
    transport.script(ACCOUNTS, Reply::status(401, "Insufficient authorisation."));
    transport.script(ACCOUNTS, Reply::status(401, "Still not authorised."));

    let err = client.get(ACCOUNTS).await.unwrap_err();
    match err {
        BunqError::AuthExpired { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Still not authorised.");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(transport.calls_to(ACCOUNTS), 2);
    assert_eq!(transport.sessions_created(), 2);
}

#[tokio::test]
async fn forbidden_passes_through_by_default() {
    let (transport, client) = setup(ReauthPolicy::Unauthorized);
    assert_eq!(client.reauth_policy(), ReauthPolicy::Unauthorized);
    transport.script(ACCOUNTS, Reply::status(403, "Forbidden."));

    let err = client.get(ACCOUNTS).await.unwrap_err();
    assert_eq!(err.http_status(), Some(403));
    assert!(matches!(err, BunqError::Status { .. }));
    assert_eq!(transport.sessions_created(), 1);
    assert_eq!(transport.calls_to(ACCOUNTS), 1);
}

#[tokio::test]
async fn forbidden_triggers_renewal_when_configured() {
    let (transport, client) = setup(ReauthPolicy::UnauthorizedOrForbidden);
    assert_eq!(client.reauth_policy(), ReauthPolicy::UnauthorizedOrForbidden);
    transport.script(ACCOUNTS, Reply::status(403, "Forbidden."));
    transport.route(ACCOUNTS, accounts_reply());

    client.get(ACCOUNTS).await.unwrap();
    assert_eq!(transport.sessions_created(), 2);
    assert_eq!(transport.calls_to(ACCOUNTS), 2);
}

#[tokio::test]
async fn other_failures_are_not_retried() {
    let (transport, client) = setup(ReauthPolicy::default());
    transport.script(ACCOUNTS, Reply::status(500, "Internal error."));
    transport.script(ACCOUNTS, Reply::Network("connection refused".into()));

    let server = client.get(ACCOUNTS).await.unwrap_err();
    assert_eq!(server.http_status(), Some(500));
    let network = client.get(ACCOUNTS).await.unwrap_err();
    assert!(matches!(network, BunqError::Transport(_)));

    assert_eq!(transport.calls_to(ACCOUNTS), 2);
    assert_eq!(transport.sessions_created(), 1);
}

#[tokio::test]
async fn missing_route_is_a_plain_status_error() {
    let (_transport, client) = setup(ReauthPolicy::default());
    let err = client.get("user/42/nothing-here").await.unwrap_err();
    assert_eq!(err.http_status(), Some(404));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rejections_renew_the_session_once() {
    let transport = Arc::new(MockTransport::with_latency(Duration::from_millis(10)));
    let keys = Arc::new(FakeKeys::default());
    let session =
        manager(&transport, Arc::new(MemoryStore::new()), &keys, SessionSettings::new(API_KEY));
    let client = Arc::new(client(&transport, session, ReauthPolicy::default()));
    transport.route(ACCOUNTS, accounts_reply());

    client.get(ACCOUNTS).await.unwrap();
    transport.revoke("session-token-1");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.get(ACCOUNTS).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(transport.sessions_created(), 2);
}

#[tokio::test]
async fn user_accessors_authenticate_lazily() {
    let (transport, client) = setup(ReauthPolicy::default());
    transport.set_user(UserType::Company, 77);

    assert_eq!(client.user_type().await.unwrap(), UserType::Company);
    assert_eq!(client.user_id().await.unwrap(), 77);
    assert_eq!(transport.sessions_created(), 1);
}

#[tokio::test]
async fn list_follows_older_cursor_until_exhausted() {
    let (transport, client) = setup(ReauthPolicy::default());
    let resource = "user/42/monetary-account/9/payment";
    let second = "/v1/user/42/monetary-account/9/payment?count=3&older_id=4";
    let third = "/v1/user/42/monetary-account/9/payment?count=3&older_id=1";
    transport.route(resource, page(&[6, 5, 4], Some(second)));
    transport.route(second, page(&[3, 2, 1], Some(third)));
    transport.route(third, page(&[], None));

    let objects: Vec<ApiObject> =
        client.list(resource).map(|item| item.unwrap()).collect().await;

    assert_eq!(ids(&objects), [6, 5, 4, 3, 2, 1]);
    assert_eq!(transport.calls_to(resource), 1);
    assert_eq!(transport.calls_to(second), 1);
    assert_eq!(transport.calls_to(third), 1);
}

#[tokio::test]
async fn list_with_applies_options_to_every_page() {
    let (transport, client) = setup(ReauthPolicy::default());
    let resource = "user/42/monetary-account";
    let second = "/v1/user/42/monetary-account?older_id=2";
    transport.route(resource, page(&[3, 2], Some(second)));
    transport.route(second, page(&[1], None));

    let options = RequestOptions::new().query("count", "200");
    let objects: Vec<_> = client.list_with(resource, options).collect().await;
    assert_eq!(objects.len(), 3);

    let pages: Vec<_> = transport
        .calls()
        .into_iter()
        .filter(|call| call.resource == resource || call.resource == second)
        .collect();
    assert_eq!(pages.len(), 2);
    for call in pages {
        assert_eq!(call.query, [("count".to_string(), "200".to_string())], "{}", call.resource);
    }
}

#[tokio::test]
async fn list_yields_error_then_ends() {
    let (transport, client) = setup(ReauthPolicy::default());
    let resource = "user/42/monetary-account/9/payment";
    let second = "/v1/user/42/monetary-account/9/payment?older_id=2";
    transport.route(resource, page(&[4, 3], Some(second)));
    transport.script(second, Reply::status(500, "Internal error."));

    let items: Vec<_> = client.list(resource).collect().await;

    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok() && items[1].is_ok());
    assert_eq!(items[2].as_ref().unwrap_err().http_status(), Some(500));
}

#[tokio::test]
async fn list_can_stop_early() {
    let (transport, client) = setup(ReauthPolicy::default());
    let resource = "user/42/monetary-account/9/payment";
    let second = "/v1/user/42/monetary-account/9/payment?older_id=2";
    transport.route(resource, page(&[4, 3], Some(second)));
    transport.route(second, page(&[2, 1], None));

    let first_two: Vec<_> = client.list(resource).take(2).collect().await;

    assert_eq!(first_two.len(), 2);
    assert_eq!(transport.calls_to(second), 0);
}

#[tokio::test(start_paused = true)]
async fn throttled_transport_paces_requests_per_verb() {
    let mock = Arc::new(MockTransport::new());
    mock.route(ACCOUNTS, accounts_reply());
    let limits = RateLimits {
        get: Some(RateLimit::new(2, 3000)),
        post: None,
        put: None,
        delete: None,
    };
    let transport = Arc::new(ThrottledTransport::new(mock.clone(), &limits));
    let keys = Arc::new(FakeKeys::default());
    let session = Arc::new(bunq_core::SessionManager::new(
        transport.clone(),
        Arc::new(MemoryStore::new()),
        keys,
        SessionSettings::new(API_KEY),
    ));
    let client = BunqClient::new(transport, session, ReauthPolicy::default());

    let start = Instant::now();
    client.get(ACCOUNTS).await.unwrap();
    client.get(ACCOUNTS).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(10));

    client.get(ACCOUNTS).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(3000));
    assert_eq!(mock.calls_to(ACCOUNTS), 3);
}
