use semian_shared_scope::{SharedScopeClient, SharedScopeServer, WireState};
use std::time::Duration;

fn socket_path(test_name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "semian-shared-scope-test-{test_name}-{}.sock",
        std::process::id()
    ))
}

#[tokio::test(flavor = "multi_thread")]
async fn register_and_report_error_trips_the_shared_breaker() {
    let path = socket_path("trip");
    let server = SharedScopeServer::new(&path);
    tokio::spawn(server.serve());
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = SharedScopeClient::connect(&path);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = client
        .register_resource("orders-db", 2, Duration::from_secs(5), 1)
        .await
        .unwrap();
    assert_eq!(state, WireState::Closed);

    client.report_error("orders-db");
    client.report_error("orders-db");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = client.get_state("orders-db").await.unwrap();
    assert_eq!(state, WireState::Open);

    let open = client.get_open_states().await.unwrap();
    assert!(open.contains_key("orders-db"));
}

#[tokio::test(flavor = "multi_thread")]
async fn subscriber_observes_state_change_broadcast() {
    let path = socket_path("subscribe");
    let server = SharedScopeServer::new(&path);
    tokio::spawn(server.serve());
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = SharedScopeClient::connect(&path);
    tokio::time::sleep(Duration::from_millis(50)).await;
    client
        .register_resource("cache", 1, Duration::from_secs(5), 1)
        .await
        .unwrap();

    let mut watch = client.subscribe("cache").await.unwrap();
    assert_eq!(*watch.borrow(), WireState::Closed);

    client.report_error("cache");
    watch.changed().await.unwrap();
    assert_eq!(*watch.borrow(), WireState::Open);
}
