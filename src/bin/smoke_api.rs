use anyhow::{bail, Context};
use clap::Parser;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// 對執行中的伺服器跑一輪 save → get-model
#[derive(Debug, Parser)]
#[command(name = "smoke_api")]
struct Args {
    #[arg(long, default_value = "http://localhost:3001")]
    base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let base = args.base_url.trim_end_matches('/');
    let client = reqwest::Client::new();

    println!("🚀 Smoke testing {}", base);

    let health: Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .context("server unreachable")?
        .json()
        .await?;
    println!("✅ health: {}", health);

    let configuration = json!({
        "balloonShapes": {"top": "A", "middle1": "B", "middle2": "C"},
        "balloonColors": {"top": "#FF0000", "middle1": "#00FF00", "middle2": "#0000FF"},
        "balloonFinishes": {"top": "standard", "middle1": "metallic", "middle2": "matte"}
    });
    let saved: Value = client
        .post(format!("{}/api/save-configuration", base))
        .json(&configuration)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let id = saved["id"].as_str().context("save response has no id")?;
    println!("✅ saved configuration {}", id);

    for format in ["glb", "gltf"] {
        let response = client
            .get(format!("{}/api/get-model/{}?format={}", base, id, format))
            .send()
            .await?
            .error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let bytes = response.bytes().await?;
        println!("✅ {}: {} bytes ({})", format, bytes.len(), content_type);
    }

    let missing = client
        .get(format!("{}/api/get-model/does-not-exist", base))
        .send()
        .await?;
    if missing.status() != StatusCode::NOT_FOUND {
        bail!("expected 404 for an unknown id, got {}", missing.status());
    }
    println!("✅ unknown id → 404");

    let invalid = client
        .post(format!("{}/api/save-configuration", base))
        .json(&json!({"balloonShapes": {"top": "A"}}))
        .send()
        .await?;
    if invalid.status() != StatusCode::BAD_REQUEST {
        bail!("expected 400 without balloonColors, got {}", invalid.status());
    }
    let body: Value = invalid.json().await?;
    println!("✅ missing balloonColors → 400 ({})", body["error"]);

    println!("🎉 All checks passed");
    Ok(())
}
