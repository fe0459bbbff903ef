#![allow(clippy::unwrap_used)]
// Integration tests for `IntentClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sdnsync_api::{Error, IntentClient, PAGE_SIZE, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, IntentClient) {
    let server = MockServer::start().await;
    let token: secrecy::SecretString = "test-token".to_string().into();
    let client =
        IntentClient::from_token(&server.uri(), &token, &TransportConfig::default()).unwrap();
    (server, client)
}

fn device_json(id: &str, hostname: &str, serial: &str) -> serde_json::Value {
    json!({
        "id": id,
        "instanceUuid": id,
        "hostname": hostname,
        "managementIpAddress": "10.0.0.1",
        "serialNumber": serial,
        "platformId": "C9300-48P",
        "type": "Cisco Catalyst 9300 Switch",
        "family": "Switches and Hubs",
        "softwareVersion": "17.9.4",
        "role": "ACCESS",
        "reachabilityStatus": "Reachable"
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_issues_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": "abc.def.ghi" })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "test-password".to_string().into();
    let client = IntentClient::login(&server.uri(), "admin", &secret, &TransportConfig::default())
        .await
        .unwrap();

    assert!(client.base_url().path().ends_with("/dna/"));
}

#[tokio::test]
async fn test_login_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dna/system/api/v1/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong-password".to_string().into();
    let result =
        IntentClient::login(&server.uri(), "admin", &secret, &TransportConfig::default()).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rejected_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_devices(&[]).await;

    match result {
        Err(ref e @ Error::InvalidToken) => assert!(e.is_auth()),
        other => panic!("expected InvalidToken error, got: {other:?}"),
    }
}

// ── Device listing tests ────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_single_page() {
    let (server, client) = setup().await;

    let envelope = json!({
        "response": [device_json("uuid-1", "core-sw-01.corp.example", "FCW1111AAAA")],
        "version": "1.0"
    });

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device"))
        .and(query_param("family", "Switches and Hubs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let devices = client
        .list_devices(&["Switches and Hubs".to_string()])
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "uuid-1");
    assert_eq!(devices[0].hostname.as_deref(), Some("core-sw-01.corp.example"));
    assert_eq!(devices[0].serial_number.as_deref(), Some("FCW1111AAAA"));
    assert_eq!(
        devices[0].type_name.as_deref(),
        Some("Cisco Catalyst 9300 Switch")
    );
}

#[tokio::test]
async fn test_list_devices_paginates_until_short_page() {
    let (server, client) = setup().await;

    let full_page: Vec<serde_json::Value> = (0..PAGE_SIZE)
        .map(|i| device_json(&format!("uuid-{i}"), &format!("sw-{i}"), &format!("SER{i:05}")))
        .collect();
    let short_page = vec![device_json("uuid-last", "sw-last", "SERLAST")];

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": full_page })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device"))
        .and(query_param("offset", "501"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": short_page })))
        .mount(&server)
        .await;

    let devices = client.list_devices(&[]).await.unwrap();

    assert_eq!(devices.len(), PAGE_SIZE + 1);
    assert_eq!(devices[PAGE_SIZE].id, "uuid-last");
}

#[tokio::test]
async fn test_list_devices_stops_on_empty_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": [] })))
        .mount(&server)
        .await;

    let devices = client.list_devices(&[]).await.unwrap();
    assert!(devices.is_empty());
}

// ── Scoped query tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_list_vlans_not_found_maps_to_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device/uuid-1/vlan"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "response": { "errorCode": "1009", "detail": "No data found" }
        })))
        .mount(&server)
        .await;

    let vlans = client.list_vlans("uuid-1").await.unwrap();
    assert!(vlans.is_empty());
}

#[tokio::test]
async fn test_null_response_maps_to_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device/uuid-1/chassis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": null })))
        .mount(&server)
        .await;

    let slots = client.list_chassis_slots("uuid-1").await.unwrap();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_stack_detail_absent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device/uuid-1/stack"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let detail = client.get_stack_detail("uuid-1").await.unwrap();
    assert!(detail.is_none());
}

#[tokio::test]
async fn test_stack_detail_members() {
    let (server, client) = setup().await;

    let envelope = json!({
        "response": {
            "deviceId": "uuid-1",
            "stackSwitchInfo": [
                { "serialNumber": "AAA", "stackMemberNumber": 1, "role": "MASTER" },
                { "serialNumber": "BBB", "stackMemberNumber": 2, "role": "MEMBER" }
            ]
        }
    });

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device/uuid-1/stack"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let detail = client.get_stack_detail("uuid-1").await.unwrap().unwrap();
    assert_eq!(detail.stack_switch_info.len(), 2);
    assert_eq!(detail.stack_switch_info[1].stack_member_number, Some(2));
    assert_eq!(detail.stack_switch_info[1].serial_number.as_deref(), Some("BBB"));
}

#[tokio::test]
async fn test_interfaces_paginated_and_typed() {
    let (server, client) = setup().await;

    let envelope = json!({
        "response": [{
            "portName": "GigabitEthernet1/0/1",
            "interfaceType": "Physical",
            "ipv4Address": "10.0.0.1",
            "ipv4Mask": "255.255.255.0",
            "macAddress": "00:11:22:33:44:55",
            "speed": "1000000",
            "duplex": "FullDuplex",
            "portMode": "access",
            "vlanId": "10"
        }]
    });

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/interface/network-device/uuid-1"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&envelope))
        .mount(&server)
        .await;

    let interfaces = client.list_interfaces("uuid-1").await.unwrap();

    assert_eq!(interfaces.len(), 1);
    assert_eq!(
        interfaces[0].port_name.as_deref(),
        Some("GigabitEthernet1/0/1")
    );
    assert_eq!(interfaces[0].ipv4_mask.as_deref(), Some("255.255.255.0"));
    assert_eq!(interfaces[0].duplex.as_deref(), Some("FullDuplex"));
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_error_body_parsed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "response": {
                "errorCode": "5000",
                "message": "Internal error",
                "detail": "Inventory service unavailable"
            }
        })))
        .mount(&server)
        .await;

    let result = client.list_devices(&[]).await;

    match result {
        Err(Error::Api {
            ref message,
            ref code,
            status,
        }) => {
            assert_eq!(status, 500);
            assert_eq!(code.as_deref(), Some("5000"));
            assert!(
                message.contains("Inventory service unavailable"),
                "expected detail in message, got: {message}"
            );
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_top_level_list_404_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dna/intent/api/v1/network-device"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client.list_devices(&[]).await;
    assert!(
        matches!(result, Err(ref e) if e.is_not_found()),
        "expected not-found error, got: {result:?}"
    );
}
