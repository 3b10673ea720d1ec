//! Integration tests for the REST backend.
//!
//! These tests run the backend against a scripted in-process connection
//! that replays canned responses and records every request it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use limiquantix_engine::params::{
    CreateNicParams, CreateVmParams, CreateVnicProfileParams, UpdateNicParams,
};
use limiquantix_engine::rest::{Connection, ConnectionError, EngineRequest, EngineResponse, Method, Resource};
use limiquantix_engine::retry::RecordingSink;
use limiquantix_engine::{
    EngineClient, ErrorKind, MockBackend, NetworkId, NicId, RestBackend, RetryConfig, RetryStrategy,
    TemplateId, VmId, VnicProfileId, BLANK_TEMPLATE_ID,
};

type Reply = Result<EngineResponse, ConnectionError>;

/// Connection double that answers from a script.
#[derive(Default)]
struct ScriptedConnection {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<EngineRequest>>,
}

impl ScriptedConnection {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn send(&self, request: EngineRequest) -> Result<EngineResponse, ConnectionError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ConnectionError::Transport("script exhausted".into())))
    }
}

fn ok(body: Value) -> Reply {
    Ok(EngineResponse::new(Some(body)))
}

fn status(code: u16) -> Reply {
    Err(ConnectionError::Status {
        code,
        message: format!("HTTP status {}", code),
    })
}

fn backend(connection: &Arc<ScriptedConnection>) -> RestBackend {
    RestBackend::with_connection(connection.clone(), &RetryConfig::default())
}

fn nic_body(vm: &str, mac: &str) -> Value {
    json!({
        "id": "nic-1",
        "name": "eth0",
        "vm": {"id": vm},
        "vnic_profile": {"id": "profile-1"},
        "mac": {"address": mac},
        "interface": "virtio"
    })
}

const FAST: [RetryStrategy; 1] = [RetryStrategy::MaxTries(5)];

/// Test that a NIC update carries only the supplied fields.
#[tokio::test]
async fn test_update_nic_sends_partial_body() {
    let connection = ScriptedConnection::new(vec![ok(nic_body("vm-1", "00:1a:4a:16:01:51"))]);
    let client = backend(&connection);

    let nic = client
        .update_nic(
            &VmId::new("vm-1"),
            &NicId::new("nic-1"),
            UpdateNicParams::new().with_mac("00-1A-4A-16-01-51"),
            &FAST,
        )
        .await
        .unwrap();
    assert_eq!(nic.mac(), "00:1a:4a:16:01:51");
    assert_eq!(nic.vm_id().as_str(), "vm-1");

    let requests = connection.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Put);
    assert_eq!(
        requests[0].resource,
        Resource::Nic(VmId::new("vm-1"), NicId::new("nic-1"))
    );
    assert_eq!(
        requests[0].body,
        Some(json!({"id": "nic-1", "mac": {"address": "00:1a:4a:16:01:51"}}))
    );
}

/// Test that a malformed MAC never reaches the engine.
#[tokio::test]
async fn test_update_nic_bad_mac_sends_nothing() {
    let connection = ScriptedConnection::new(vec![]);
    let client = backend(&connection);

    let err = client
        .update_nic(
            &VmId::new("vm-1"),
            &NicId::new("nic-1"),
            UpdateNicParams::new().with_name("eth1").with_mac("00:1a:4a"),
            &FAST,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(connection.requests().is_empty());
}

/// Test that a response without the NIC is a terminal protocol violation.
#[tokio::test]
async fn test_update_nic_missing_entity() {
    let connection = ScriptedConnection::new(vec![Ok(EngineResponse::empty()), ok(nic_body("vm-1", ""))]);
    let client = backend(&connection);

    let err = client
        .update_nic(
            &VmId::new("vm-1"),
            &NicId::new("nic-1"),
            UpdateNicParams::new().with_name("eth1"),
            &FAST,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    assert_eq!(err.attempts(), None);
    assert!(err.to_string().contains("NIC update response does not contain the NIC field"));
    assert_eq!(connection.requests().len(), 1);
}

/// Test that remote failures are retried until the engine answers.
#[tokio::test]
async fn test_retries_unidentified_failures() {
    let connection = ScriptedConnection::new(vec![
        status(503),
        Err(ConnectionError::Transport("connection reset".into())),
        ok(json!({"network": [{"id": "net-1", "name": "ovirtmgmt"}]})),
    ]);
    let client = backend(&connection);

    let networks = client.list_networks(&FAST).await.unwrap();
    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].name(), "ovirtmgmt");
    assert_eq!(connection.requests().len(), 3);
}

/// Test that running out of attempts reports the attempt count.
#[tokio::test]
async fn test_exhaustion_reports_attempts() {
    let connection = ScriptedConnection::new(vec![status(502), status(502), status(502), status(502)]);
    let client = backend(&connection);

    let err = client
        .get_vm(&VmId::new("vm-1"), &[RetryStrategy::MaxTries(3)])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unidentified);
    assert_eq!(err.attempts(), Some(3));
    assert_eq!(connection.requests().len(), 3);
}

/// Test that terminal statuses are not retried.
#[tokio::test]
async fn test_terminal_statuses_short_circuit() {
    for (code, kind) in [
        (404, ErrorKind::NotFound),
        (400, ErrorKind::ValidationFailed),
        (409, ErrorKind::Conflict),
        (401, ErrorKind::Unauthorized),
    ] {
        let connection = ScriptedConnection::new(vec![status(code), ok(json!({}))]);
        let client = backend(&connection);

        let err = client
            .remove_network(&NetworkId::new("net-1"), &FAST)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind, "HTTP {}", code);
        assert_eq!(connection.requests().len(), 1);
    }
}

/// Test that an empty retry list falls back to the configured defaults.
#[tokio::test(start_paused = true)]
async fn test_empty_retry_list_uses_defaults() {
    let connection = ScriptedConnection::new(vec![status(503), status(503), status(503)]);
    let config = RetryConfig {
        max_tries: Some(2),
        ..RetryConfig::default()
    };
    let client = RestBackend::with_connection(connection.clone(), &config);

    let err = client.list_templates(&[]).await.unwrap_err();
    assert_eq!(err.attempts(), Some(2));
    assert_eq!(connection.requests().len(), 2);
}

/// Test blank template selection over the REST list.
#[tokio::test]
async fn test_blank_template_lookup() {
    let connection = ScriptedConnection::new(vec![
        ok(json!({"template": [
            {"id": "tpl-1", "name": "centos-9"},
            {"id": BLANK_TEMPLATE_ID, "name": "Blank"}
        ]})),
        ok(json!({"template": [
            {"id": "tpl-1", "name": "centos-9"},
            {"id": "tpl-7", "name": "Blank"}
        ]})),
        ok(json!({"template": [{"id": "tpl-1", "name": "centos-9"}]})),
    ]);
    let client = backend(&connection);

    let blank = client.get_blank_template(&FAST).await.unwrap();
    assert_eq!(blank.id(), &TemplateId::new(BLANK_TEMPLATE_ID));

    let flagged = client.get_blank_template(&FAST).await.unwrap();
    assert_eq!(flagged.id().as_str(), "tpl-7");

    let err = client.get_blank_template(&FAST).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Test that the blank template is protected without asking the engine.
#[tokio::test]
async fn test_remove_blank_template_rejected_locally() {
    let connection = ScriptedConnection::new(vec![]);
    let client = backend(&connection);

    let err = client
        .remove_template(&TemplateId::new(BLANK_TEMPLATE_ID), &FAST)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(connection.requests().is_empty());
}

/// Test that a NIC reported under another VM is not returned.
#[tokio::test]
async fn test_get_nic_checks_owner() {
    let connection = ScriptedConnection::new(vec![ok(nic_body("vm-2", "00:1a:4a:16:01:51"))]);
    let client = backend(&connection);

    let err = client
        .get_nic(&VmId::new("vm-1"), &NicId::new("nic-1"), &FAST)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Test that NIC writes and listings reject NICs reported under another VM.
#[tokio::test]
async fn test_nic_writes_and_listing_check_owner() {
    let foreign = nic_body("vm-2", "00:1a:4a:16:01:51");
    let connection = ScriptedConnection::new(vec![
        ok(foreign.clone()),
        ok(foreign.clone()),
        ok(json!({"nic": [nic_body("vm-1", "00:1a:4a:16:01:52"), foreign]})),
    ]);
    let client = backend(&connection);
    let vm_id = VmId::new("vm-1");

    let err = client
        .update_nic(&vm_id, &NicId::new("nic-1"), UpdateNicParams::new().with_name("eth1"), &FAST)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = client
        .create_nic(
            &vm_id,
            "eth0",
            &VnicProfileId::new("profile-1"),
            CreateNicParams::new(),
            &FAST,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = client.list_nics(&vm_id, &FAST).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Ownership failures are terminal: one request per call
    assert_eq!(connection.requests().len(), 3);
}

/// Test that both backends reject the same NIC update the same way.
#[tokio::test]
async fn test_update_nic_errors_agree_with_mock() {
    let mock = MockBackend::new();
    let blank = mock.get_blank_template(&[]).await.unwrap();
    let vm = mock
        .create_vm(blank.id(), "web-1", CreateVmParams::new(), &[])
        .await
        .unwrap();
    let profile = mock.list_vnic_profiles(&[]).await.unwrap().remove(0);
    let nic = mock
        .create_nic(vm.id(), "eth0", profile.id(), CreateNicParams::new(), &[])
        .await
        .unwrap();

    let cases = [
        UpdateNicParams::new().with_vnic_profile_id("missing").with_mac("zz"),
        UpdateNicParams::new().with_name("eth0").with_mac("00:1a:4a"),
        UpdateNicParams::new().with_name(" ").with_vnic_profile_id("missing"),
    ];
    for params in cases {
        let connection = ScriptedConnection::new(vec![ok(nic_body(vm.id().as_str(), "00:1a:4a:16:01:51"))]);
        let rest = backend(&connection);

        let mock_err = mock
            .update_nic(vm.id(), nic.id(), params.clone(), &[])
            .await
            .unwrap_err();
        let rest_err = rest
            .update_nic(vm.id(), nic.id(), params.clone(), &FAST)
            .await
            .unwrap_err();

        assert_eq!(mock_err.kind(), ErrorKind::ValidationFailed, "{:?}", params);
        assert_eq!(rest_err.kind(), mock_err.kind(), "{:?}", params);
        assert!(connection.requests().is_empty());
        assert_eq!(mock.get_nic(vm.id(), nic.id(), &[]).await.unwrap(), nic);
    }
}

/// Test the create requests for NICs and VNIC profiles.
#[tokio::test]
async fn test_create_request_bodies() {
    let connection = ScriptedConnection::new(vec![
        ok(json!({"id": "profile-2", "name": "vlan10", "network": {"id": "net-1"}})),
        ok(nic_body("vm-1", "56:6f:00:00:00:01")),
    ]);
    let client = backend(&connection);

    let profile = client
        .create_vnic_profile("vlan10", &NetworkId::new("net-1"), CreateVnicProfileParams::new(), &FAST)
        .await
        .unwrap();
    assert_eq!(profile.network_id().as_str(), "net-1");

    client
        .create_nic(
            &VmId::new("vm-1"),
            "eth0",
            &VnicProfileId::new("profile-1"),
            CreateNicParams::new(),
            &FAST,
        )
        .await
        .unwrap();

    let requests = connection.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].resource, Resource::VnicProfiles);
    assert_eq!(
        requests[0].body,
        Some(json!({"name": "vlan10", "network": {"id": "net-1"}}))
    );
    assert_eq!(requests[1].resource, Resource::Nics(VmId::new("vm-1")));
    assert_eq!(
        requests[1].body,
        Some(json!({"name": "eth0", "vnic_profile": {"id": "profile-1"}}))
    );
}

/// Test that an empty NIC list comes back without the list field.
#[tokio::test]
async fn test_list_nics_empty_envelope() {
    let connection = ScriptedConnection::new(vec![ok(json!({}))]);
    let client = backend(&connection);

    let nics = client.list_nics(&VmId::new("vm-1"), &FAST).await.unwrap();
    assert!(nics.is_empty());
}

/// Test that every attempt is reported to the diagnostic sink.
#[tokio::test]
async fn test_diagnostics_per_attempt() {
    let connection = ScriptedConnection::new(vec![status(500), ok(json!({"vm": []}))]);
    let sink = Arc::new(RecordingSink::new());
    let client = backend(&connection).with_sink(sink.clone());

    client.list_vms(&FAST).await.unwrap();

    let entries = sink.entries();
    assert!(entries.iter().any(|(_, msg)| msg == "listing VMs: attempt 1"));
    assert!(entries.iter().any(|(_, msg)| msg == "listing VMs: attempt 2"));
}
