//! glTF 2.0 base model loader (`.glb` and `.gltf`)

use super::graph::{Mesh, NodeId, SceneGraph, SceneNode, Transform};
use super::material::{Color, MaterialDescriptor, Side};
use crate::utils::error::{BouquetError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// 載入時共用的網格與材質，確保同一來源只建立一個實例
#[derive(Default)]
struct LoadContext {
    meshes: HashMap<(usize, usize), Option<Arc<Mesh>>>,
    materials: HashMap<usize, Arc<MaterialDescriptor>>,
}

pub fn load_base_scene(path: impl AsRef<Path>) -> Result<SceneGraph> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path).map_err(|e| BouquetError::ModelLoadError {
        message: format!("{}: {}", path.display(), e),
    })?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene")
        .to_string();

    let scene = build_scene(&document, &buffers, name)?;
    tracing::info!("Loaded base model {} ({} nodes)", path.display(), scene.len());
    Ok(scene)
}

/// Loads a self-contained model (GLB, or glTF with embedded data URIs) from memory
pub fn load_base_scene_from_slice(bytes: &[u8], name: &str) -> Result<SceneGraph> {
    let (document, buffers, _images) = gltf::import_slice(bytes).map_err(|e| BouquetError::ModelLoadError {
        message: e.to_string(),
    })?;
    build_scene(&document, &buffers, name.to_string())
}

fn build_scene(document: &gltf::Document, buffers: &[gltf::buffer::Data], name: String) -> Result<SceneGraph> {
    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| BouquetError::ModelLoadError {
            message: "model contains no scene".to_string(),
        })?;

    let mut graph = SceneGraph::new(name);
    let mut context = LoadContext::default();

    for node in gltf_scene.nodes() {
        load_node(&mut graph, None, &node, buffers, &mut context)?;
    }

    if graph.is_empty() {
        return Err(BouquetError::ModelLoadError {
            message: "model scene has no nodes".to_string(),
        });
    }

    Ok(graph)
}

fn load_node(
    graph: &mut SceneGraph,
    parent: Option<NodeId>,
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    context: &mut LoadContext,
) -> Result<()> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut scene_node = SceneNode::new(name.clone()).with_transform(Transform {
        translation,
        rotation,
        scale,
    });

    // 第一個 primitive 掛在節點本身，其餘成為同名子節點，讓名稱比對依然適用
    let mut extra_primitives = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let Some(geometry) = load_primitive(&mesh, &primitive, buffers, context) else {
                continue;
            };
            let material = load_material(&primitive.material(), context);
            if scene_node.mesh.is_none() {
                scene_node = scene_node.with_mesh(geometry, material);
            } else {
                extra_primitives.push((geometry, material));
            }
        }
    }

    let id = match parent {
        Some(parent) => graph.add_child(parent, scene_node)?,
        None => graph.add_root(scene_node),
    };

    for (geometry, material) in extra_primitives {
        graph.add_child(id, SceneNode::new(name.clone()).with_mesh(geometry, material))?;
    }

    for child in node.children() {
        load_node(graph, Some(id), &child, buffers, context)?;
    }

    Ok(())
}

fn load_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    context: &mut LoadContext,
) -> Option<Arc<Mesh>> {
    let key = (mesh.index(), primitive.index());
    if let Some(cached) = context.meshes.get(&key) {
        return cached.clone();
    }

    let loaded = read_primitive(mesh, primitive, buffers).map(Arc::new);
    context.meshes.insert(key, loaded.clone());
    loaded
}

fn read_primitive(mesh: &gltf::Mesh, primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<Mesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        tracing::warn!(
            "Skipping non-triangle primitive {} of mesh {:?}",
            primitive.index(),
            mesh.name()
        );
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_default();

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    Some(Mesh {
        name: mesh.name().unwrap_or("mesh").to_string(),
        positions,
        normals,
        indices,
    })
}

fn load_material(material: &gltf::Material, context: &mut LoadContext) -> Option<Arc<MaterialDescriptor>> {
    // 預設材質 (index 為 None) 不帶入
    let index = material.index()?;
    let descriptor = context.materials.entry(index).or_insert_with(|| {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, a] = pbr.base_color_factor();
        Arc::new(
            MaterialDescriptor::new(material.name().unwrap_or("material"))
                .color(Color::rgba(r, g, b, a))
                .metalness(pbr.metallic_factor())
                .roughness(pbr.roughness_factor())
                .side(if material.double_sided() {
                    Side::Double
                } else {
                    Side::Front
                }),
        )
    });
    Some(Arc::clone(descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_model_load_error() {
        let err = load_base_scene("does/not/exist.glb").unwrap_err();
        assert!(matches!(err, BouquetError::ModelLoadError { .. }));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = load_base_scene_from_slice(b"definitely not a model", "junk").unwrap_err();
        assert!(matches!(err, BouquetError::ModelLoadError { .. }));
    }
}
