//! Scene Exporter: prepared scene → glTF 2.0 bytes (GLB by default)

pub mod document;
pub mod glb;

use crate::domain::ports::SceneExporter;
use crate::scene::{PreparedScene, SceneGraph};
use async_trait::async_trait;
use document::DocumentBuilder;
use thiserror::Error;

pub const GLB_CONTENT_TYPE: &str = "model/gltf-binary";
pub const GLTF_CONTENT_TYPE: &str = "model/gltf+json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export serialization failed: {0}")]
    Serialize(String),

    #[error("Export encoding failed: {0}")]
    Encode(String),

    #[error("Export worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// GLB container when true, text glTF with an embedded buffer otherwise
    pub binary: bool,
    /// Skip hidden nodes and their subtrees
    pub only_visible: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            binary: true,
            only_visible: true,
        }
    }
}

impl ExportOptions {
    pub fn gltf() -> Self {
        Self {
            binary: false,
            ..Self::default()
        }
    }

    pub fn content_type(&self) -> &'static str {
        if self.binary {
            GLB_CONTENT_TYPE
        } else {
            GLTF_CONTENT_TYPE
        }
    }

    pub fn file_extension(&self) -> &'static str {
        if self.binary {
            "glb"
        } else {
            "gltf"
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedModel {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_extension: &'static str,
}

impl ExportedModel {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Synchronous encode, used directly by the offline tool and inside the blocking worker
pub fn encode_scene(scene: &SceneGraph, options: ExportOptions) -> Result<ExportedModel, ExportError> {
    let (document, bin) = DocumentBuilder::new(options.only_visible).build(scene)?;
    tracing::debug!(
        "Encoded scene '{}': {} nodes, {} meshes, {} materials, {} byte buffer",
        scene.name,
        document.nodes.len(),
        document.meshes.len(),
        document.materials.len(),
        bin.len()
    );

    let bytes = if options.binary {
        glb::write_binary(document, bin)?
    } else {
        glb::write_text(document, bin)?
    };

    Ok(ExportedModel {
        bytes,
        content_type: options.content_type(),
        file_extension: options.file_extension(),
    })
}

/// Runs [`encode_scene`] on tokio's blocking pool so large scenes do not stall the runtime
#[derive(Debug, Clone, Default)]
pub struct GlbExporter;

impl GlbExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SceneExporter for GlbExporter {
    async fn export(&self, prepared: PreparedScene, options: ExportOptions) -> Result<ExportedModel, ExportError> {
        tokio::task::spawn_blocking(move || encode_scene(&prepared.scene, options))
            .await
            .map_err(|e| ExportError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{customize, BouquetTemplate, MaterialResolver};
    use crate::domain::model::Configuration;

    fn prepared() -> PreparedScene {
        let base = BouquetTemplate::new().with_segments(8).build().unwrap();
        customize(&base, &Configuration::new(), &mut MaterialResolver::new()).unwrap()
    }

    #[tokio::test]
    async fn test_exporter_produces_glb() {
        let model = GlbExporter::new()
            .export(prepared(), ExportOptions::default())
            .await
            .unwrap();
        assert_eq!(model.content_type, "model/gltf-binary");
        assert_eq!(model.file_extension, "glb");
        assert_eq!(&model.bytes[0..4], b"glTF");
    }

    #[test]
    fn test_text_export_embeds_buffer() {
        let model = encode_scene(&prepared().scene, ExportOptions::gltf()).unwrap();
        assert_eq!(model.content_type, GLTF_CONTENT_TYPE);

        let json: serde_json::Value = serde_json::from_slice(&model.bytes).unwrap();
        let uri = json["buffers"][0]["uri"].as_str().unwrap();
        assert!(uri.starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn test_export_error_messages_carry_cause() {
        let err = ExportError::Encode("index 9 out of range".into());
        assert!(err.to_string().contains("index 9 out of range"));
    }
}
