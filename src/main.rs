use bouquet_export::core::ConfigProvider;
use bouquet_export::utils::error::{BouquetError, ErrorSeverity};
use bouquet_export::utils::{logger, validation::Validate};
use bouquet_export::{
    router, scene, serve, BouquetTemplate, CliConfig, GlbExporter, MemoryConfigurationStore, ModelService,
    SceneGraph, ServerSettings,
};
use clap::Parser;
use std::sync::Arc;

fn load_scene(settings: &ServerSettings) -> bouquet_export::Result<SceneGraph> {
    match settings.model_path() {
        Some(path) => {
            tracing::info!("📁 Loading base model from {}", path);
            scene::load_base_scene(path)
        }
        None => {
            tracing::info!("💡 No base model configured, using the procedural bouquet");
            BouquetTemplate::new().build()
        }
    }
}

async fn run(settings: ServerSettings) -> bouquet_export::Result<()> {
    let base_scene = load_scene(&settings)?;
    tracing::info!("✅ Base scene ready ({} nodes)", base_scene.len());

    if settings.monitor_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let service = Arc::new(ModelService::with_monitoring(
        MemoryConfigurationStore::new(),
        GlbExporter::new(),
        base_scene,
        settings.monitor_enabled(),
    ));
    let app = router(service, settings.allowed_origins());

    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    serve(listener, app).await
}

fn exit_code(e: &BouquetError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            // 日誌尚未初始化
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    logger::init_logger(settings.json_logs, settings.verbose);
    tracing::info!("Starting bouquet-export server");
    tracing::debug!("Settings: {:?}", settings);

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(settings).await {
        tracing::error!(
            "❌ Server stopped: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }

    tracing::info!("👋 Server shut down");
    Ok(())
}
