use crate::helpers::*;
use axum::http::StatusCode;
use serde_json::{Value, json};
use vcloud_server::model::types::{SubscriptionStatus, VmExecution};
use vcloud_server::vcloud::types::{VmOperation, VmRecord, VmStatus, undeploy_payload};
use vcloud_server::web::types::{ClearedPayload, VersionPayload};
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, ResponseTemplate};

const TASK: &str = r#"<Task status="running"/>"#;

#[tokio::test]
async fn missing_bearer_is_unauthorized() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/vm", &app.url);
    let response = app.client.get(&endpoint).send().await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn subscription_vm_should_works() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm(QUERY_POWERED_ON).await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/vm", &app.url);
    let vm: VmRecord = requests::get_result(&app, &endpoint, &app.bearer(LOGIN)).await;

    // Assert
    assert_eq!(vm.id, VM);
    assert_eq!(vm.name, "sca");
    assert_eq!(vm.status, Some(VmStatus::PoweredOn));
    assert_eq!(vm.cpu, 6);
    assert_eq!(vm.ram, 28672);
    assert_eq!(vm.v_app.as_deref(), Some("vApp_BPR"));
}

#[tokio::test]
async fn subscription_vm_unknown_vm() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm("<QueryResultRecords/>").await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/vm", &app.url);
    let response = requests::get_response(&app, &endpoint, &app.bearer(LOGIN)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = response.json::<Value>().await.unwrap();
    assert_eq!(error["parameter"], "service:vm:vcloud:id");
    assert_eq!(error["code"], "vcloud-vm");
    assert_eq!(error["value"], VM);
}

#[tokio::test]
async fn subscription_not_visible() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm(QUERY_POWERED_ON).await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/vm", &app.url);
    let response = requests::get_response(&app, &endpoint, &app.bearer("other")).await;

    // Assert
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscription_status_should_works() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm(QUERY_POWERED_OFF).await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/status", &app.url);
    let status: SubscriptionStatus = requests::get_result(&app, &endpoint, &app.bearer(LOGIN)).await;

    // Assert
    assert_eq!(status.vm.status, Some(VmStatus::PoweredOff));
    assert!(status.vm.deployed);
    assert_eq!(status.schedules, 3);
}

#[tokio::test]
async fn execute_reset_on_powered_off_should_power_on() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm(QUERY_POWERED_OFF).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/vApp/vm-{VM}/power/action/powerOn")))
        .respond_with(ResponseTemplate::new(202).set_body_string(TASK))
        .expect(1)
        .mount(&app.vcloud)
        .await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/executions", &app.url);
    let payload = json!({"operation": "reset"});
    let response = requests::post_response(&app, &endpoint, &app.bearer(LOGIN), &payload).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let execution = response
        .json::<vcloud_server::web::types::Response<VmExecution>>()
        .await
        .unwrap()
        .result;
    assert_eq!(execution.requested, VmOperation::Reset);
    assert_eq!(execution.operation, Some(VmOperation::On));
    assert_eq!(execution.previous_state, Some(VmStatus::PoweredOff));
    assert_eq!(execution.vm.as_deref(), Some("sca"));
}

#[tokio::test]
async fn execute_shutdown_rejected_by_vcloud() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm(QUERY_POWERED_ON).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/vApp/vm-{VM}/action/undeploy")))
        .and(body_string(undeploy_payload(VmOperation::Shutdown)))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.vcloud)
        .await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/executions", &app.url);
    let payload = json!({"operation": "shutdown"});
    let response = requests::post_response(&app, &endpoint, &app.bearer(LOGIN), &payload).await;

    // Assert
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error = response.json::<Value>().await.unwrap();
    assert_eq!(error["code"], "vm-operation-execute");
}

#[tokio::test]
async fn execute_useless_operation_does_nothing() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm(QUERY_POWERED_ON).await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/executions", &app.url);
    let payload = json!({"operation": "on"});
    let response = requests::post_response(&app, &endpoint, &app.bearer(LOGIN), &payload).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let execution = response
        .json::<vcloud_server::web::types::Response<VmExecution>>()
        .await
        .unwrap()
        .result;
    assert_eq!(execution.operation, None);
}

#[tokio::test]
async fn search_by_name_should_works() {
    // Arrange
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(QUERY_SEARCH))
        .mount(&app.vcloud)
        .await;

    // Act
    let endpoint = format!("{}/vcloud/nodes/{NODE}/vms/sc", &app.url);
    let vms: Vec<VmRecord> = requests::get_result(&app, &endpoint, &app.bearer(LOGIN)).await;
    let hidden: Vec<VmRecord> = requests::get_result(&app, &endpoint, &app.bearer("other")).await;

    // Assert
    assert_eq!(vms.len(), 3);
    assert_eq!(vms[1].name, "scb");
    assert!(hidden.is_empty());
}

#[tokio::test]
async fn node_status_and_version() {
    // Arrange
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/api/admin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ADMIN))
        .mount(&app.vcloud)
        .await;
    let bearer = app.bearer(LOGIN);

    // Act
    let status: bool =
        requests::get_result(&app, &format!("{}/vcloud/nodes/{NODE}/status", &app.url), &bearer)
            .await;
    let version: VersionPayload =
        requests::get_result(&app, &format!("{}/vcloud/nodes/{NODE}/version", &app.url), &bearer)
            .await;

    // Assert
    assert!(status);
    assert_eq!(
        version.version.as_deref(),
        Some("5.5.4.2831206 Fri Jun 19 15:07:32 CEST 2015")
    );
}

#[tokio::test]
async fn node_status_not_admin() {
    // Arrange
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/api/admin"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&app.vcloud)
        .await;

    // Act
    let endpoint = format!("{}/vcloud/nodes/{NODE}/status", &app.url);
    let response = requests::get_response(&app, &endpoint, &app.bearer(LOGIN)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = response.json::<Value>().await.unwrap();
    assert_eq!(error["parameter"], "service:vm:vcloud:api");
    assert_eq!(error["code"], "vcloud-admin");
}

#[tokio::test]
async fn console_should_return_png() {
    // Arrange
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/vApp/vm-{VM}/screen")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
        .mount(&app.vcloud)
        .await;

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/console.png", &app.url);
    let response = requests::get_response(&app, &endpoint, &app.bearer(LOGIN)).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.bytes().await.unwrap().as_ref(), &[0x89, 0x50, 0x4e, 0x47]);
}

#[tokio::test]
async fn link_then_clear_cache() {
    // Arrange
    let app = TestApp::new().await;
    app.mock_vm(QUERY_POWERED_ON).await;
    let bearer = app.bearer(LOGIN);
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/link", &app.url);
    let response = requests::post_response(&app, &endpoint, &bearer, &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Act
    let endpoint = format!("{}/vcloud/cache", &app.url);
    let response = requests::delete_response(&app, &endpoint, &bearer).await;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .json::<vcloud_server::web::types::Response<ClearedPayload>>()
        .await
        .unwrap()
        .result;
    assert_eq!(cleared.cleared, 1);
}

#[tokio::test]
async fn last_version_should_works() {
    // Arrange
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/downloads"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="./info/slug/datacenter_cloud_infrastructure/vmware_vcloud_suite/6_0">"#,
        ))
        .mount(&app.vcloud)
        .await;

    // Act
    let endpoint = format!("{}/vcloud/version", &app.url);
    let version: VersionPayload = requests::get_result(&app, &endpoint, &app.bearer(LOGIN)).await;

    // Assert
    assert_eq!(version.version.as_deref(), Some("6_0"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    // Arrange
    let app = TestApp::new().await;

    // Act
    let endpoint = format!("{}/api-docs/openapi.json", &app.url);
    let document = app.client.get(&endpoint).send().await.unwrap();

    // Assert
    assert_eq!(document.status(), StatusCode::OK);
    let document = document.json::<Value>().await.unwrap();
    assert!(document["paths"]["/vcloud/subscriptions/{id}/executions"].is_object());
}

#[tokio::test]
async fn hidden_subscription_is_not_executed() {
    // Arrange
    let app = TestApp::new().await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(QUERY_POWERED_OFF))
        .expect(0)
        .mount(&app.vcloud)
        .await;
    let bearer = app.bearer("other");

    // Act
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/executions", &app.url);
    let execution =
        requests::post_response(&app, &endpoint, &bearer, &json!({"operation": "on"})).await;
    let endpoint = format!("{}/vcloud/subscriptions/{SUBSCRIPTION}/status", &app.url);
    let status = requests::get_response(&app, &endpoint, &bearer).await;

    // Assert
    assert_eq!(execution.status(), StatusCode::NOT_FOUND);
    assert_eq!(status.status(), StatusCode::NOT_FOUND);
}
