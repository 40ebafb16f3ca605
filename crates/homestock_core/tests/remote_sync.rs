use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use homestock_core::{
    AlwaysMerge, InventoryStore, RemoteConfig, RemoteSession, RemoteSnapshotStore, SyncError,
    VersionToken,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENTS_PATH: &str = "/repos/casa/inventario/contents/db/inventory.json";

fn config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        api_base_url: server.uri(),
        owner: "casa".to_string(),
        repo: "inventario".to_string(),
        path: "db/inventory.json".to_string(),
        token: "secret".to_string(),
        ..RemoteConfig::default()
    }
}

fn store(server: &MockServer) -> RemoteSnapshotStore {
    RemoteSnapshotStore::new(config(server)).unwrap()
}

fn remote_file_body(sha: &str, payload: &str) -> serde_json::Value {
    // The API line-breaks long base64 bodies; reproduce that here.
    let mut content = BASE64.encode(payload);
    content.insert(content.len() / 2, '\n');
    serde_json::json!({
        "sha": sha,
        "content": content,
        "encoding": "base64",
    })
}

#[tokio::test]
async fn load_decodes_content_and_adopts_the_version_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(query_param("ref", "main"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_file_body(
            "token-1",
            r#"{"items": [{"id": 1, "name": "Zaino", "quantity": 10}],
                "lastUpdated": "2026-08-04T10:00:00Z"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = RemoteSession::new(store(&server));
    assert!(!session.is_synced());

    let snapshot = session.load().await.unwrap();
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].name, "Zaino");
    assert!(session.is_synced());
    assert_eq!(session.version_token().unwrap().as_str(), "token-1");

    // The caller adopts the fetched state wholesale.
    let mut local = InventoryStore::new();
    local.hydrate(snapshot);
    assert_eq!(local.items().len(), 1);
}

#[tokio::test]
async fn save_is_conditioned_on_the_held_token_and_rolls_it_forward() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(remote_file_body("token-1", r#"{"items": []}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(
            serde_json::json!({"sha": "token-1", "branch": "main"}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"sha": "token-2"}
            })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(serde_json::json!({"sha": "token-2"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"sha": "token-3"}
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut session = RemoteSession::new(store(&server));
    session.load().await.unwrap();

    let mut local = InventoryStore::new();
    local.add("Zaino", 10, &AlwaysMerge).unwrap();

    session.save(local.snapshot()).await.unwrap();
    assert_eq!(session.version_token().unwrap().as_str(), "token-2");

    local.adjust_quantity(1, 1).unwrap();
    session.save(local.snapshot()).await.unwrap();
    assert_eq!(session.version_token().unwrap().as_str(), "token-3");
}

#[tokio::test]
async fn save_sends_a_commit_message() {
    let server = MockServer::start().await;
    let mut local = InventoryStore::new();
    local.add("Zaino", 1, &AlwaysMerge).unwrap();
    let expected_message = format!(
        "inventory update: {}",
        local.snapshot().last_updated.to_rfc3339()
    );

    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(
            serde_json::json!({"message": expected_message}),
        ))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "content": {"sha": "token-2"}
            })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let remote = store(&server);
    let token = remote
        .save(local.snapshot(), &VersionToken::new("token-1"), &expected_message)
        .await
        .unwrap();
    assert_eq!(token.as_str(), "token-2");
}

#[tokio::test]
async fn stale_token_save_fails_with_conflict_and_leaves_the_remote_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(remote_file_body(
                "token-9",
                r#"{"items": [{"id": 1, "name": "Borsa", "quantity": 1}]}"#,
            )),
        )
        .mount(&server)
        .await;

    let remote = store(&server);
    let mut local = InventoryStore::new();
    local.add("Zaino", 10, &AlwaysMerge).unwrap();

    let err = remote
        .save(local.snapshot(), &VersionToken::new("stale"), "update")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Conflict { status: 409 }));

    // The remote file still serves its newer state.
    let (snapshot, token) = remote.load().await.unwrap();
    assert_eq!(token.as_str(), "token-9");
    assert_eq!(snapshot.items[0].name, "Borsa");
}

#[tokio::test]
async fn conflicting_session_save_keeps_the_held_token() {
    let server = MockServer::start().await;
    let guard = server
        .register_as_scoped(
            Mock::given(method("GET"))
                .and(path(CONTENTS_PATH))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(remote_file_body("token-1", r#"{"items": []}"#)),
                ),
        )
        .await;

    let mut session = RemoteSession::new(store(&server));
    session.load().await.unwrap();
    drop(guard);

    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let local = InventoryStore::new();
    let err = session.save(local.snapshot()).await.unwrap_err();
    assert!(matches!(err, SyncError::Conflict { .. }));
    assert_eq!(session.version_token().unwrap().as_str(), "token-1");
}

#[tokio::test]
async fn save_before_any_load_is_rejected() {
    let server = MockServer::start().await;
    let mut session = RemoteSession::new(store(&server));

    let local = InventoryStore::new();
    let err = session.save(local.snapshot()).await.unwrap_err();
    assert!(matches!(err, SyncError::NotSynced));
    // No request must have been issued.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn load_maps_auth_and_not_found_statuses() {
    let server = MockServer::start().await;
    let guard = server
        .register_as_scoped(
            Mock::given(method("GET"))
                .and(path(CONTENTS_PATH))
                .respond_with(ResponseTemplate::new(401)),
        )
        .await;

    let remote = store(&server);
    assert!(matches!(remote.load().await, Err(SyncError::Auth(_))));
    drop(guard);

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    assert!(matches!(remote.load().await, Err(SyncError::NotFound(_))));
}

#[tokio::test]
async fn load_rejects_undecodable_content() {
    let server = MockServer::start().await;
    let guard = server
        .register_as_scoped(
            Mock::given(method("GET"))
                .and(path(CONTENTS_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "sha": "token-1",
                    "content": "%%% not base64 %%%",
                    "encoding": "base64",
                }))),
        )
        .await;

    let remote = store(&server);
    assert!(matches!(remote.load().await, Err(SyncError::Encoding(_))));
    drop(guard);

    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_file_body(
            "token-1",
            r#"{"items": "definitely not a list"}"#,
        )))
        .mount(&server)
        .await;
    assert!(matches!(remote.load().await, Err(SyncError::Decode(_))));
}

#[tokio::test]
async fn failed_load_does_not_grant_a_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = RemoteSession::new(store(&server));
    let err = session.load().await.unwrap_err();
    assert!(matches!(err, SyncError::Api { status: 500, .. }));
    assert!(!session.is_synced());
}
