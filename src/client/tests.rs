// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;
use crate::api::gnmi::subscribe_response::Response;
use crate::api::gnmi::update_result::Operation;
use crate::resources::RequestMode;
use crate::testkit::{MockTarget, MOCK_VERSION};

async fn mock_client(os: DeviceOs) -> (MockTarget, GnmiClient) {
    let mock = MockTarget::spawn().await;
    let client = GnmiClient::builder(mock.target())
        .os(os)
        .insecure()
        .construct()
        .await
        .expect("client construction against mock");
    (mock, client)
}

#[tokio::test]
async fn test_secure_and_insecure_conflict_rejected() {
    let result = GnmiClient::builder("127.0.0.1:9")
        .secure(None, None, None)
        .insecure()
        .construct()
        .await;
    assert!(matches!(result, Err(GnmiError::Config(_))));
}

#[tokio::test]
async fn test_ssl_override_requires_secure_channel() {
    let result = GnmiClient::builder("127.0.0.1:9")
        .insecure()
        .ssl_target_override("ems.example.com")
        .construct()
        .await;
    assert!(matches!(result, Err(GnmiError::Config(_))));
}

#[tokio::test]
async fn test_auto_override_requires_root_certificate() {
    let result = GnmiClient::builder("127.0.0.1:9")
        .secure(None, None, None)
        .ssl_target_override_from_certificate()
        .construct()
        .await;
    match result {
        Err(GnmiError::Config(msg)) => assert!(msg.contains("root certificate")),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_key_without_chain_rejected() {
    let result = GnmiClient::builder("127.0.0.1:9")
        .secure(None, Some(b"key".to_vec()), None)
        .construct()
        .await;
    assert!(matches!(result, Err(GnmiError::Config(_))));
}

#[tokio::test]
async fn test_missing_cert_file_rejected() {
    let result = GnmiClient::builder("127.0.0.1:9")
        .secure_from_files(
            Some("/nonexistent/path_12345.pem"),
            None::<&str>,
            None::<&str>,
        )
        .construct()
        .await;
    match result {
        Err(GnmiError::Config(msg)) => assert!(msg.contains("unable to read")),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_channel_option_rejected() {
    let result = GnmiClient::builder("127.0.0.1:9")
        .insecure()
        .channel_option("grpc.max_receive_message_length", "1048576")
        .construct()
        .await;
    match result {
        Err(GnmiError::Config(msg)) => assert!(msg.contains("unsupported channel option")),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_channel_option_bad_millis_rejected() {
    let result = GnmiClient::builder("127.0.0.1:9")
        .insecure()
        .channel_option("grpc.http2.keepalive_time_ms", "soon")
        .construct()
        .await;
    assert!(matches!(result, Err(GnmiError::Config(_))));
}

#[test]
fn test_channel_option_overwrite_keeps_last() {
    let builder = GnmiClient::builder("127.0.0.1:9")
        .channel_option("grpc.http2.keepalive_time_ms", "10000")
        .channel_option("grpc.http2.keepalive_time_ms", "30000");
    let debug = format!("{builder:?}");
    assert!(debug.contains("30000"));
    assert!(!debug.contains("10000"));
}

#[tokio::test]
async fn test_capabilities() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let response = client.capabilities().await.unwrap();
    assert_eq!(response.g_nmi_version, MOCK_VERSION);
    assert_eq!(response.supported_models.len(), 2);
    assert!(!response.supported_encodings.is_empty());
}

#[tokio::test]
async fn test_call_authentication_metadata() {
    let mock = MockTarget::spawn().await;
    let client = GnmiClient::builder(mock.target())
        .insecure()
        .call_authentication("admin", "secret")
        .construct()
        .await
        .unwrap();
    client.capabilities().await.unwrap();
    assert_eq!(mock.seen_usernames(), vec!["admin".to_string()]);
}

#[tokio::test]
async fn test_get_echoes_paths() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let response = client
        .get_xpaths(
            &["/interfaces/interface[name=eth0]/state"],
            DataType::State,
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.notification.len(), 1);
    let update = &response.notification[0].update[0];
    let path = update.path.as_ref().unwrap();
    let names: Vec<_> = path.elem.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["interfaces", "interface", "state"]);
    assert_eq!(path.elem[1].key["name"], "eth0");
}

#[tokio::test]
async fn test_get_without_paths_rejected() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let result = client.get(Vec::new(), DataType::All, Encoding::JsonIetf).await;
    assert!(matches!(result, Err(GnmiError::Validation(_))));
}

#[tokio::test]
async fn test_get_encoding_validated_per_os() {
    let (_mock, client) = mock_client(DeviceOs::IosXe).await;
    let result = client
        .get_xpaths(&["/interfaces"], DataType::All, Some(Encoding::Proto))
        .await;
    assert!(matches!(result, Err(GnmiError::Validation(_))));
}

#[tokio::test]
async fn test_nx_get_and_set_unsupported() {
    let (_mock, client) = mock_client(DeviceOs::NxOs).await;

    let result = client
        .get_xpaths(&["/interfaces"], DataType::All, None)
        .await;
    assert!(matches!(result, Err(GnmiError::Unsupported(_))));

    let result = client.delete_xpaths(&["/interfaces"], None).await;
    assert!(matches!(result, Err(GnmiError::Unsupported(_))));
}

#[tokio::test]
async fn test_get_cli() {
    let (_mock, client) = mock_client(DeviceOs::IosXr).await;
    let response = client.get_cli(&["show version"]).await.unwrap();
    let update = &response.notification[0].update[0];
    assert_eq!(
        update.path.as_ref().unwrap().elem[0].name,
        "show version"
    );
    let val = update.val.as_ref().unwrap();
    assert!(matches!(
        val.value,
        Some(typed_value::Value::AsciiVal(_))
    ));
}

#[tokio::test]
async fn test_get_cli_unsupported_outside_xr() {
    let (_mock, client) = mock_client(DeviceOs::IosXe).await;
    let result = client.get_cli(&["show version"]).await;
    assert!(matches!(result, Err(GnmiError::Unsupported(_))));
}

#[tokio::test]
async fn test_empty_set_rejected() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let result = client.set(SetOperations::builder().build()).await;
    assert!(matches!(result, Err(GnmiError::Validation(_))));
}

#[tokio::test]
async fn test_delete_xpaths() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let response = client
        .delete_xpaths(&["/system/config/hostname"], None)
        .await
        .unwrap();
    assert_eq!(response.response.len(), 1);
    assert_eq!(response.response[0].op, Operation::Delete as i32);
    let path = response.response[0].path.as_ref().unwrap();
    assert_eq!(path.elem.len(), 3);
}

#[tokio::test]
async fn test_delete_xpaths_with_prefix() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let response = client
        .delete_xpaths(&["config/hostname"], Some("/system"))
        .await
        .unwrap();
    assert_eq!(response.response.len(), 1);
    let path = response.response[0].path.as_ref().unwrap();
    assert_eq!(path.elem.len(), 2);
}

#[tokio::test]
async fn test_set_json_requires_module_prefix_on_xr() {
    let (_mock, client) = mock_client(DeviceOs::IosXr).await;
    let result = client.set_json(&[r#"{"host-names": {}}"#], &[]).await;
    match result {
        Err(GnmiError::Validation(msg)) => assert!(msg.contains("module-prefixed")),
        other => panic!("expected Validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_set_json_xr_origin_split() {
    let (_mock, client) = mock_client(DeviceOs::IosXr).await;
    let response = client
        .set_json(
            &[r#"{"Cisco-IOS-XR-shellutil-cfg:host-names": {"host-name": "r1"}}"#],
            &[],
        )
        .await
        .unwrap();
    assert_eq!(response.response.len(), 1);
    assert_eq!(response.response[0].op, Operation::Update as i32);
    let path = response.response[0].path.as_ref().unwrap();
    assert_eq!(path.origin, "Cisco-IOS-XR-shellutil-cfg");
    assert_eq!(path.elem[0].name, "host-names");
}

#[tokio::test]
async fn test_set_json_single_key_enforced() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let result = client.set_json(&[r#"{"a": 1, "b": 2}"#], &[]).await;
    assert!(matches!(result, Err(GnmiError::Validation(_))));
}

#[tokio::test]
async fn test_subscribe_sync_stop_terminates() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let spec = client
        .subscription_for(&["/interfaces/interface/state/counters"])
        .unwrap()
        .sync_stop(true)
        .build()
        .unwrap();
    let mut stream = client.subscribe(spec).await.unwrap();

    let mut responses = Vec::new();
    while let Some(response) = stream.message().await.unwrap() {
        responses.push(response);
    }
    // One update, then the sync marker; later updates are cut off.
    assert_eq!(responses.len(), 2);
    assert!(matches!(
        responses[1].response,
        Some(Response::SyncResponse(true))
    ));
}

#[tokio::test]
async fn test_subscribe_runs_past_sync_by_default() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let mut stream = client
        .subscribe_xpaths(&["/interfaces/interface/state/counters"])
        .await
        .unwrap();

    let mut count = 0;
    while let Some(_response) = stream.message().await.unwrap() {
        count += 1;
    }
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_subscribe_encoding_validated_per_os() {
    let (_mock, client) = mock_client(DeviceOs::IosXr).await;
    let spec = client
        .subscription_for(&["/interfaces"])
        .unwrap()
        .encoding(Encoding::JsonIetf)
        .build()
        .unwrap();
    let result = client.subscribe(spec).await;
    assert!(matches!(result, Err(GnmiError::Validation(_))));
}

#[tokio::test]
async fn test_subscribe_once_mode() {
    let (_mock, client) = mock_client(DeviceOs::Generic).await;
    let spec = client
        .subscription_for(&["/system/state"])
        .unwrap()
        .mode(RequestMode::Once)
        .build()
        .unwrap();
    let mut stream = client.subscribe(spec).await.unwrap();
    let first = stream.message().await.unwrap().unwrap();
    assert!(matches!(first.response, Some(Response::Update(_))));
}
