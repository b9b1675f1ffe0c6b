//! Protocol dispatch behavior.

mod common;

use homelink_core::StateMap;
use homelink_sync::{
    CommandEntry, CommandTarget, GlobalErrorType, ProtocolRequest, ProtocolResponse,
};
use serde_json::json;

use common::harness;

async fn plain_token(h: &common::Harness, username: &str) -> String {
    let code = h
        .credentials
        .issue_authorization_code(username, 3600)
        .await
        .unwrap();
    h.credentials.redeem_code(&code).await.unwrap().access_token
}

#[tokio::test]
async fn discovery_lists_the_accounts_devices() {
    let h = harness();
    h.seed_account("alice").await;
    let token = plain_token(&h, "alice").await;

    h.devices
        .create("alice", "c2c-switch", "Lamp", StateMap::new())
        .await
        .unwrap();
    h.devices
        .create("alice", "c2c-dimmer", "Hall", StateMap::new())
        .await
        .unwrap();

    let response = h
        .connector
        .handle(ProtocolRequest::Discovery {
            access_token: token,
        })
        .await
        .unwrap();

    match response {
        ProtocolResponse::Discovery { devices } => assert_eq!(devices.len(), 2),
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn discovery_with_unknown_token_is_empty() {
    let h = harness();
    let response = h
        .connector
        .handle(ProtocolRequest::Discovery {
            access_token: "nope".to_string(),
        })
        .await
        .unwrap();

    match response {
        ProtocolResponse::Discovery { devices } => assert!(devices.is_empty()),
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn state_refresh_returns_only_requested_devices() {
    let h = harness();
    h.seed_account("alice").await;
    let token = plain_token(&h, "alice").await;

    let lamp = h
        .devices
        .create(
            "alice",
            "c2c-switch",
            "Lamp",
            StateMap::from([("switch".to_string(), json!("off"))]),
        )
        .await
        .unwrap();
    h.devices
        .create("alice", "c2c-dimmer", "Hall", StateMap::new())
        .await
        .unwrap();

    let response = h
        .connector
        .handle(ProtocolRequest::StateRefresh {
            access_token: token,
            device_ids: vec![lamp.external_id.clone()],
        })
        .await
        .unwrap();

    match response {
        ProtocolResponse::DeviceStates { devices } => {
            assert_eq!(devices.len(), 1);
            assert_eq!(devices[0].external_device_id, lamp.external_id);
            assert_eq!(devices[0].states.as_ref().unwrap()["switch"], "off");
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn command_merges_state_and_suppresses_self_notification() {
    let h = harness();
    h.seed_account("alice").await;
    let commander = h.subscriber("alice", "https://cmd.example/cb").await;
    h.subscriber("alice", "https://other.example/cb").await;

    let lamp = h
        .devices
        .create(
            "alice",
            "c2c-switch",
            "Lamp",
            StateMap::from([
                ("online".to_string(), json!(true)),
                ("switch".to_string(), json!("off")),
            ]),
        )
        .await
        .unwrap();

    let response = h
        .connector
        .handle(ProtocolRequest::Command {
            access_token: commander.clone(),
            devices: vec![CommandTarget {
                external_device_id: lamp.external_id.clone(),
                device_cookie: Some("cookie-1".to_string()),
                commands: vec![CommandEntry {
                    capability: "switch".to_string(),
                    command: "on".to_string(),
                    arguments: vec![],
                }],
            }],
        })
        .await
        .unwrap();

    // The response echoes the resulting states and the cookie.
    match response {
        ProtocolResponse::DeviceStates { devices } => {
            assert_eq!(devices.len(), 1);
            assert_eq!(devices[0].device_cookie.as_deref(), Some("cookie-1"));
            assert_eq!(devices[0].states.as_ref().unwrap()["switch"], "on");
        }
        other => panic!("unexpected response {other:?}"),
    }

    // The merge hit the store; untouched keys persist.
    let stored = h.devices.get("alice", &lamp.external_id).await.unwrap();
    assert_eq!(stored.states["switch"], json!("on"));
    assert_eq!(stored.states["online"], json!(true));

    // Fan-out skipped the commanding token.
    assert_eq!(h.gateway.urls_delivered(), vec!["https://other.example/cb"]);
}

#[tokio::test]
async fn command_on_missing_device_reports_deletion() {
    let h = harness();
    h.seed_account("alice").await;
    let token = plain_token(&h, "alice").await;

    let response = h
        .connector
        .handle(ProtocolRequest::Command {
            access_token: token,
            devices: vec![CommandTarget {
                external_device_id: "ghost".to_string(),
                device_cookie: Some("cookie-9".to_string()),
                commands: vec![],
            }],
        })
        .await
        .unwrap();

    match response {
        ProtocolResponse::DeviceStates { devices } => {
            assert_eq!(devices.len(), 1);
            assert!(devices[0].device_error.is_some());
            assert_eq!(devices[0].device_cookie.as_deref(), Some("cookie-9"));
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn command_with_unknown_token_is_a_global_error() {
    let h = harness();
    let response = h
        .connector
        .handle(ProtocolRequest::Command {
            access_token: "nope".to_string(),
            devices: vec![],
        })
        .await
        .unwrap();

    match response {
        ProtocolResponse::GlobalError { error, .. } => {
            assert_eq!(error, GlobalErrorType::IntegrationDeleted);
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn callback_access_registers_a_subscription() {
    let h = harness();
    h.seed_account("alice").await;
    let token = plain_token(&h, "alice").await;

    let response = h
        .connector
        .handle(ProtocolRequest::CallbackAccess {
            access_token: token.clone(),
            auth: homelink_storage::CallbackAuth {
                access_token: "cb-1".to_string(),
                refresh_token: None,
                token_type: None,
                expires_in: None,
                expires_at: None,
            },
            callback_urls: homelink_storage::CallbackUrls {
                state_callback: "https://hub.example/cb".to_string(),
                oauth_token: None,
            },
        })
        .await
        .unwrap();
    assert_eq!(response, ProtocolResponse::Acknowledged);

    let entries = h.directory.list_for_account("alice").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].access_token, token);
}

#[tokio::test]
async fn integration_deleted_revokes_the_pair() {
    let h = harness();
    h.seed_account("alice").await;
    let token = plain_token(&h, "alice").await;

    let response = h
        .connector
        .handle(ProtocolRequest::IntegrationDeleted {
            access_token: token.clone(),
        })
        .await
        .unwrap();
    assert_eq!(response, ProtocolResponse::Acknowledged);

    assert!(
        h.credentials
            .lookup_by_access_token(&token)
            .await
            .unwrap_err()
            .is_not_found()
    );

    // Deleting twice stays an acknowledgement.
    let response = h
        .connector
        .handle(ProtocolRequest::IntegrationDeleted {
            access_token: token,
        })
        .await
        .unwrap();
    assert_eq!(response, ProtocolResponse::Acknowledged);
}
