use anyhow::Context;
use bouquet_export::scene::load_base_scene;
use bouquet_export::utils::logger;
use bouquet_export::{render_model, BouquetTemplate, Configuration, ExportOptions, GlbExporter};
use clap::Parser;
use std::path::PathBuf;

/// Offline export: configuration JSON → .glb / .gltf file
#[derive(Debug, Parser)]
#[command(name = "export_glb")]
struct Args {
    /// Configuration in the same JSON shape as POST /api/save-configuration
    configuration: PathBuf,

    #[arg(short, long, help = "Output file; extension follows --format when omitted")]
    output: Option<PathBuf>,

    #[arg(long, help = "Base model (.glb/.gltf); procedural bouquet when omitted")]
    model: Option<String>,

    #[arg(long, default_value = "glb", value_parser = ["glb", "gltf"])]
    format: String,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let body = std::fs::read(&args.configuration)
        .with_context(|| format!("reading {}", args.configuration.display()))?;
    let configuration = Configuration::from_json_slice(&body)?;
    println!("📋 {} slot(s) configured", configuration.slots.len());

    let base = match &args.model {
        Some(path) => load_base_scene(path)?,
        None => BouquetTemplate::new().build()?,
    };

    let options = if args.format == "gltf" {
        ExportOptions::gltf()
    } else {
        ExportOptions::default()
    };

    let model = render_model(&base, &configuration, &GlbExporter::new(), options).await?;

    let output = args
        .output
        .unwrap_or_else(|| args.configuration.with_extension(model.file_extension));
    tokio::fs::write(&output, &model.bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    println!("✅ Wrote {} ({} bytes, {})", output.display(), model.len(), model.content_type);
    Ok(())
}
