//! SEMP client integration tests against a mock management server.

mod support;

use pubsub_rust::semp::SempClient;
use pubsub_rust::{QueueAdmin, QueueSpec, SempConfig, SempError};

use support::{start_server, PASSWORD, USER};

fn client(base: &str) -> SempClient {
    let config = SempConfig {
        hostname: base.to_string(),
        username: USER.to_string(),
        password: PASSWORD.to_string(),
        verify_tls: true,
    };
    SempClient::new(&config, "default").unwrap()
}

#[test]
fn about_returns_broker_details() {
    let (base, _state) = start_server();
    let about = client(&base).about().unwrap();
    assert_eq!(about["platform"], "mock");
}

#[test]
fn wrong_credentials_are_an_api_error() {
    let (base, _state) = start_server();
    let config = SempConfig {
        hostname: base,
        username: USER.to_string(),
        password: "wrong".to_string(),
        verify_tls: true,
    };
    let err = SempClient::new(&config, "default").unwrap().about().unwrap_err();
    match err {
        SempError::Api { status, error_status, .. } => {
            assert_eq!(status, 401);
            assert_eq!(error_status.as_deref(), Some("UNAUTHORIZED"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[test]
fn create_queue_posts_then_patches_full_config() {
    let (base, state) = start_server();
    let spec = QueueSpec::non_exclusive("Q/tickets");
    client(&base).create_queue(&spec).unwrap();

    let mock = state.lock().unwrap();
    assert_eq!(
        mock.requests,
        vec![
            ("POST".to_string(), "default/queues".to_string()),
            ("PATCH".to_string(), "default/queues/Q/tickets".to_string()),
        ]
    );
    let config = &mock.queues["Q/tickets"];
    assert_eq!(config["accessType"], "non-exclusive");
    assert_eq!(config["deadMsgQueue"], "#DEAD_MSG_QUEUE");
    assert_eq!(config["msgVpnName"], "default");
    assert_eq!(config["permission"], "consume");
}

#[test]
fn existing_queue_is_replaced_or_reported() {
    let (base, state) = start_server();
    let client = client(&base);
    client.create_queue(&QueueSpec::exclusive("Q/1")).unwrap();
    client.add_subscription("Q/1", "orders/>").unwrap();

    client.create_queue(&QueueSpec::exclusive("Q/1")).unwrap();
    {
        let mock = state.lock().unwrap();
        assert!(mock.subscriptions.get("Q/1").map_or(true, |s| s.is_empty()));
        let methods: Vec<_> = mock.requests[3..].iter().map(|(m, _)| m.as_str()).collect();
        assert_eq!(methods, vec!["POST", "DELETE", "POST", "PATCH"]);
    }

    let err = client
        .create_queue(&QueueSpec::exclusive("Q/1").keep_existing())
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn subscriptions_are_idempotent_and_removable() {
    let (base, state) = start_server();
    let client = client(&base);
    client.create_queue(&QueueSpec::exclusive("Q/orders")).unwrap();

    client.add_subscription("Q/orders", "orders/*/created").unwrap();
    client.add_subscription("Q/orders", "orders/*/created").unwrap();
    assert_eq!(
        state.lock().unwrap().subscriptions["Q/orders"],
        vec!["orders/*/created".to_string()]
    );

    client.remove_subscription("Q/orders", "orders/*/created").unwrap();
    assert!(state.lock().unwrap().subscriptions["Q/orders"].is_empty());

    let err = client.remove_subscription("Q/orders", "orders/*/created").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn shutdown_and_enable_toggle_ingress_and_egress() {
    let (base, state) = start_server();
    let client = client(&base);
    client.create_queue(&QueueSpec::exclusive("Q/1")).unwrap();

    client.shutdown_queue("Q/1").unwrap();
    {
        let mock = state.lock().unwrap();
        assert_eq!(mock.queues["Q/1"]["ingressEnabled"], false);
        assert_eq!(mock.queues["Q/1"]["egressEnabled"], false);
    }

    client.enable_queue("Q/1").unwrap();
    let mock = state.lock().unwrap();
    assert_eq!(mock.queues["Q/1"]["ingressEnabled"], true);
    assert_eq!(mock.queues["Q/1"]["egressEnabled"], true);
}

#[test]
fn deleting_missing_queue_fails() {
    let (base, _state) = start_server();
    let err = client(&base).delete_queue("Q/none").unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no such queue"));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let err = client("http://127.0.0.1:1").about().unwrap_err();
    assert!(matches!(err, SempError::Http(_)));
}
