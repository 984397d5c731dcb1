// SPDX-License-Identifier: MIT OR Apache-2.0

use gnmi_rs::flatten::{flatten_get_response, flatten_subscribe_response};
use gnmi_rs::testkit::{MockTarget, MOCK_TIMESTAMP, MOCK_VERSION};
use gnmi_rs::{ClientBuilder, DataType, DeviceOs, GnmiClient};

async fn connect(mock: &MockTarget, os: DeviceOs) -> GnmiClient {
    ClientBuilder::new(mock.target())
        .os(os)
        .insecure()
        .call_authentication("admin", "admin")
        .construct()
        .await
        .expect("connect to mock target")
}

#[tokio::test]
async fn test_full_session_against_mock_target() {
    let mock = MockTarget::spawn().await;
    let client = connect(&mock, DeviceOs::Generic).await;

    // Capabilities
    let capabilities = client.capabilities().await.unwrap();
    assert_eq!(capabilities.g_nmi_version, MOCK_VERSION);
    assert!(capabilities
        .supported_models
        .iter()
        .any(|m| m.name == "openconfig-interfaces"));

    // Get, flattened to xpath/value pairs
    let response = client
        .get_xpaths(
            &["/interfaces/interface[name=eth0]/state/mtu"],
            DataType::State,
            None,
        )
        .await
        .unwrap();
    let flat = flatten_get_response(&response);
    assert_eq!(flat.len(), 1);
    assert_eq!(
        flat[0].xpath,
        "/interfaces/interface[name=eth0]/state/mtu"
    );
    assert_eq!(flat[0].timestamp, MOCK_TIMESTAMP);

    // Set via JSON documents
    let set_response = client
        .set_json(&[r#"{"system": {"config": {"hostname": "r1"}}}"#], &[])
        .await
        .unwrap();
    assert_eq!(set_response.response.len(), 1);

    // Delete
    let delete_response = client
        .delete_xpaths(&["/system/config/hostname"], None)
        .await
        .unwrap();
    assert_eq!(delete_response.response.len(), 1);

    // Subscribe with sync_stop: exactly the pre-sync updates and the
    // marker come through.
    let spec = client
        .subscription_for(&["/interfaces/interface/state/counters"])
        .unwrap()
        .sync_stop(true)
        .build()
        .unwrap();
    let mut stream = client.subscribe(spec).await.unwrap();
    let mut updates = 0;
    let mut syncs = 0;
    while let Some(response) = stream.message().await.unwrap() {
        let flat = flatten_subscribe_response(&response);
        if flat.is_empty() {
            syncs += 1;
        } else {
            updates += flat.len();
        }
    }
    assert_eq!(updates, 1);
    assert_eq!(syncs, 1);

    // Credentials traveled as metadata on every RPC.
    assert!(mock.seen_usernames().iter().all(|u| u == "admin"));
    assert!(mock.seen_usernames().len() >= 4);
}

#[tokio::test]
async fn test_os_validation_happens_before_the_wire() {
    let mock = MockTarget::spawn().await;
    let client = connect(&mock, DeviceOs::NxOs).await;

    // NX-OS rejects Get locally; the mock never sees the request.
    let before = mock.seen_usernames().len();
    let result = client
        .get_xpaths(&["/interfaces"], DataType::All, None)
        .await;
    assert!(result.is_err());
    assert_eq!(mock.seen_usernames().len(), before);

    // Subscribe still goes through.
    let mut stream = client
        .subscribe_xpaths(&["/interfaces/interface/state/counters"])
        .await
        .unwrap();
    assert!(stream.message().await.unwrap().is_some());
}

/// End-to-end against a real device. Skipped unless `GNMI_DEV_TARGET`
/// (plus `GNMI_DEV_USERNAME`/`GNMI_DEV_PASSWORD`) is set.
#[tokio::test]
async fn test_live_device_capabilities() {
    let Ok(target) = std::env::var("GNMI_DEV_TARGET") else {
        println!("Skipping live test: GNMI_DEV_TARGET not set");
        return;
    };
    let username = std::env::var("GNMI_DEV_USERNAME").unwrap_or_default();
    let password = std::env::var("GNMI_DEV_PASSWORD").unwrap_or_default();

    let client = ClientBuilder::new(target)
        .secure_from_target()
        .ssl_target_override_from_certificate()
        .call_authentication(username, password)
        .construct()
        .await
        .expect("connect to live device");

    let capabilities = client.capabilities().await.expect("capabilities RPC");
    println!("gNMI version: {}", capabilities.g_nmi_version);
    assert!(!capabilities.g_nmi_version.is_empty());
}
