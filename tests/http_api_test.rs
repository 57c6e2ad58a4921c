use async_trait::async_trait;
use bouquet_export::domain::ports::SceneExporter;
use bouquet_export::{
    router, BouquetTemplate, ExportError, ExportOptions, ExportedModel, GlbExporter, MemoryConfigurationStore,
    ModelService, PreparedScene,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

/// 永遠失敗的 exporter
struct FailingExporter;

#[async_trait]
impl SceneExporter for FailingExporter {
    async fn export(&self, _prepared: PreparedScene, _options: ExportOptions) -> Result<ExportedModel, ExportError> {
        Err(ExportError::Encode("mesh 'balloon' index 99 out of range".into()))
    }
}

async fn spawn_server() -> String {
    spawn_server_with(GlbExporter::new()).await
}

/// 在隨機埠啟動伺服器，回傳 base url
async fn spawn_server_with<E: SceneExporter + 'static>(exporter: E) -> String {
    let base = BouquetTemplate::new().with_segments(8).build().unwrap();
    let service = Arc::new(ModelService::new(MemoryConfigurationStore::new(), exporter, base));
    let app = router(service, &[]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", address)
}

fn valid_configuration() -> Value {
    json!({
        "balloonShapes": {"top": "A", "middle1": "B"},
        "balloonColors": {"top": "#FF0000", "middle1": "#00FF00"},
        "balloonFinishes": {"top": "standard", "middle1": "metallic"}
    })
}

#[tokio::test]
async fn test_save_then_download_glb() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/save-configuration", base))
        .json(&valid_configuration())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let saved: Value = response.json().await.unwrap();
    let id = saved["id"].as_str().unwrap().to_string();

    let response = client
        .get(format!("{}/api/get-model/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "model/gltf-binary");
    let bytes = response.bytes().await.unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(&bytes[0..4], b"glTF");
}

#[tokio::test]
async fn test_text_format_and_stored_configuration() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let saved: Value = client
        .post(format!("{}/api/save-configuration", base))
        .json(&valid_configuration())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = saved["id"].as_str().unwrap();

    let response = client
        .get(format!("{}/api/get-model/{}?format=gltf", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "model/gltf+json");
    let document: Value = response.json().await.unwrap();
    assert_eq!(document["asset"]["version"], "2.0");

    let stored: Value = client
        .get(format!("{}/api/configuration/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["id"], id);
    assert_eq!(stored["balloonShapes"]["middle1"], "B");
    assert_eq!(stored["balloonFinishes"]["middle1"], "metallic");
    assert!(stored["savedAt"].is_string());

    let bad_format = client
        .get(format!("{}/api/get-model/{}?format=obj", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_format.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_id_is_404() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/get-model/1700000000000-999", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    let response = client
        .get(format!("{}/api/configuration/nope", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_colors_is_400_with_error_field() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/save-configuration", base))
        .json(&json!({"balloonShapes": {"top": "A"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("balloonColors"));

    let response = client
        .post(format!("{}/api/save-configuration", base))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_failure_is_500_with_error_field() {
    let base = spawn_server_with(FailingExporter).await;
    let client = reqwest::Client::new();

    let saved: Value = client
        .post(format!("{}/api/save-configuration", base))
        .json(&valid_configuration())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = saved["id"].as_str().unwrap();

    let response = client
        .get(format!("{}/api/get-model/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn test_health_reports_base_scene() {
    let base = spawn_server().await;
    let health: Value = reqwest::get(format!("{}/api/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok", "nodes": 37}));
}
