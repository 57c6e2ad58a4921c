//! glTF 2.0 JSON document built from a prepared scene graph

use super::ExportError;
use crate::scene::graph::{Mesh, NodeId, SceneGraph, SceneNode};
use crate::scene::material::MaterialDescriptor;
use gltf::json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct GeometryAccessors {
    position: json::Index<json::Accessor>,
    normal: Option<json::Index<json::Accessor>>,
    indices: json::Index<json::Accessor>,
}

/// Walks a scene graph and fills a [`json::Root`] plus one binary buffer.
///
/// Meshes, materials and geometry are deduplicated by `Arc` identity, so the resolver's shared
/// materials end up as a single glTF material each.
pub struct DocumentBuilder {
    only_visible: bool,
    root: json::Root,
    bin: Vec<u8>,
    geometry_index: HashMap<*const Mesh, GeometryAccessors>,
    mesh_index: HashMap<(*const Mesh, *const MaterialDescriptor), json::Index<json::Mesh>>,
    material_index: HashMap<*const MaterialDescriptor, json::Index<json::Material>>,
}

impl DocumentBuilder {
    pub fn new(only_visible: bool) -> Self {
        Self {
            only_visible,
            root: json::Root::default(),
            bin: Vec::new(),
            geometry_index: HashMap::new(),
            mesh_index: HashMap::new(),
            material_index: HashMap::new(),
        }
    }

    /// Returns the document (without buffer entries) and the raw binary payload
    pub fn build(mut self, scene: &SceneGraph) -> Result<(json::Root, Vec<u8>), ExportError> {
        let mut root_nodes = Vec::new();
        for &id in scene.roots() {
            if let Some(index) = self.visit(scene, id)? {
                root_nodes.push(index);
            }
        }

        self.root.asset = json::Asset {
            generator: Some(format!("bouquet-export {}", env!("CARGO_PKG_VERSION"))),
            ..Default::default()
        };
        let scene_index = self.root.push(json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(scene.name.clone()),
            nodes: root_nodes,
        });
        self.root.scene = Some(scene_index);

        Ok((self.root, self.bin))
    }

    fn visit(&mut self, scene: &SceneGraph, id: NodeId) -> Result<Option<json::Index<json::Node>>, ExportError> {
        let node = scene
            .node(id)
            .ok_or_else(|| ExportError::Encode("scene references a missing node".to_string()))?;

        // 隱藏節點連同子樹一起略過
        if self.only_visible && !node.visible {
            return Ok(None);
        }

        let mesh = match &node.mesh {
            Some(mesh) => self.mesh(&node.name, mesh, node.material.as_ref())?,
            None => None,
        };
        let index = self.root.push(json::Node {
            mesh,
            ..node_def(node)
        });

        let mut children = Vec::new();
        for &child in node.children() {
            if let Some(child_index) = self.visit(scene, child)? {
                children.push(child_index);
            }
        }
        if !children.is_empty() {
            self.root.nodes[index.value()].children = Some(children);
        }

        Ok(Some(index))
    }

    fn mesh(
        &mut self,
        node_name: &str,
        mesh: &Arc<Mesh>,
        material: Option<&Arc<MaterialDescriptor>>,
    ) -> Result<Option<json::Index<json::Mesh>>, ExportError> {
        if mesh.positions.is_empty() {
            tracing::warn!("Node '{}' has an empty mesh, exporting it without geometry", node_name);
            return Ok(None);
        }

        let material_ptr = material.map_or(std::ptr::null(), Arc::as_ptr);
        let key = (Arc::as_ptr(mesh), material_ptr);
        if let Some(&existing) = self.mesh_index.get(&key) {
            return Ok(Some(existing));
        }

        let geometry = self.geometry(mesh)?;
        let material_index = material.map(|material| self.material(material));

        let mut attributes = BTreeMap::new();
        attributes.insert(Valid(json::mesh::Semantic::Positions), geometry.position);
        if let Some(normal) = geometry.normal {
            attributes.insert(Valid(json::mesh::Semantic::Normals), normal);
        }

        let index = self.root.push(json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(mesh.name.clone()),
            primitives: vec![json::mesh::Primitive {
                attributes,
                extensions: Default::default(),
                extras: Default::default(),
                indices: Some(geometry.indices),
                material: material_index,
                mode: Valid(json::mesh::Mode::Triangles),
                targets: None,
            }],
            weights: None,
        });
        self.mesh_index.insert(key, index);
        Ok(Some(index))
    }

    fn geometry(&mut self, mesh: &Arc<Mesh>) -> Result<GeometryAccessors, ExportError> {
        if let Some(existing) = self.geometry_index.get(&Arc::as_ptr(mesh)) {
            return Ok(*existing);
        }

        let vertex_count = mesh.positions.len();
        if let Some(bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ExportError::Encode(format!(
                "mesh '{}' index {} out of range ({} vertices)",
                mesh.name, bad, vertex_count
            )));
        }
        if mesh.indices.is_empty() {
            return Err(ExportError::Encode(format!("mesh '{}' has no indices", mesh.name)));
        }

        let (min, max) = mesh
            .bounds()
            .ok_or_else(|| ExportError::Encode(format!("mesh '{}' has no positions", mesh.name)))?;

        let position_view = self.push_view(bytemuck::cast_slice(&mesh.positions), json::buffer::Target::ArrayBuffer);
        let position = self.push_accessor(
            position_view,
            vertex_count,
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec3,
            Some((min, max)),
        );

        let normal = if mesh.has_normals() {
            let view = self.push_view(bytemuck::cast_slice(&mesh.normals), json::buffer::Target::ArrayBuffer);
            Some(self.push_accessor(
                view,
                vertex_count,
                json::accessor::ComponentType::F32,
                json::accessor::Type::Vec3,
                None,
            ))
        } else {
            if !mesh.normals.is_empty() {
                tracing::warn!("Mesh '{}' normal count does not match positions, dropping normals", mesh.name);
            }
            None
        };

        let index_view = self.push_view(
            bytemuck::cast_slice(&mesh.indices),
            json::buffer::Target::ElementArrayBuffer,
        );
        let indices = self.push_accessor(
            index_view,
            mesh.indices.len(),
            json::accessor::ComponentType::U32,
            json::accessor::Type::Scalar,
            None,
        );

        let accessors = GeometryAccessors {
            position,
            normal,
            indices,
        };
        self.geometry_index.insert(Arc::as_ptr(mesh), accessors);
        Ok(accessors)
    }

    fn material(&mut self, material: &Arc<MaterialDescriptor>) -> json::Index<json::Material> {
        if let Some(&existing) = self.material_index.get(&Arc::as_ptr(material)) {
            return existing;
        }

        let index = self.root.push(json::Material {
            name: Some(material.name.clone()),
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor(material.color.to_array()),
                metallic_factor: json::material::StrengthFactor(material.metalness),
                roughness_factor: json::material::StrengthFactor(material.roughness),
                ..Default::default()
            },
            double_sided: material.is_double_sided(),
            ..Default::default()
        });
        self.material_index.insert(Arc::as_ptr(material), index);
        index
    }

    /// glTF 為 little-endian；bytemuck 直接複製記憶體，僅支援 little-endian 主機
    fn push_view(&mut self, bytes: &[u8], target: json::buffer::Target) -> json::Index<json::buffer::View> {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let byte_offset = self.bin.len();
        self.bin.extend_from_slice(bytes);

        // buffer 0 由輸出端 (GLB BIN chunk 或 data URI) 補上
        self.root.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: USize64::from(bytes.len()),
            byte_offset: Some(USize64::from(byte_offset)),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(target)),
        })
    }

    fn push_accessor(
        &mut self,
        view: json::Index<json::buffer::View>,
        count: usize,
        component_type: json::accessor::ComponentType,
        type_: json::accessor::Type,
        bounds: Option<([f32; 3], [f32; 3])>,
    ) -> json::Index<json::Accessor> {
        self.root.push(json::Accessor {
            buffer_view: Some(view),
            byte_offset: None,
            count: USize64::from(count),
            component_type: Valid(json::accessor::GenericComponentType(component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min: bounds.map(|(min, _)| json::Value::from(min.to_vec())),
            max: bounds.map(|(_, max)| json::Value::from(max.to_vec())),
            name: None,
            normalized: false,
            sparse: None,
        })
    }
}

fn node_def(node: &SceneNode) -> json::Node {
    let transform = node.transform;
    json::Node {
        name: Some(node.name.clone()),
        translation: (transform.translation != [0.0; 3]).then_some(transform.translation),
        rotation: (transform.rotation != [0.0, 0.0, 0.0, 1.0]).then_some(json::scene::UnitQuaternion(transform.rotation)),
        scale: (transform.scale != [1.0; 3]).then_some(transform.scale),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::graph::Transform;

    fn quad() -> Arc<Mesh> {
        Arc::new(Mesh {
            name: "quad".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        })
    }

    #[test]
    fn test_shared_geometry_and_materials_are_deduplicated() {
        let mesh = quad();
        let red = Arc::new(MaterialDescriptor::new("red"));
        let blue = Arc::new(MaterialDescriptor::new("blue"));

        let mut scene = SceneGraph::new("dedup");
        let root = scene.add_root(SceneNode::new("root"));
        for (name, material) in [("a", &red), ("b", &red), ("c", &blue)] {
            scene
                .add_child(
                    root,
                    SceneNode::new(name).with_mesh(Arc::clone(&mesh), Some(Arc::clone(material))),
                )
                .unwrap();
        }

        let (document, bin) = DocumentBuilder::new(true).build(&scene).unwrap();

        assert_eq!(document.nodes.len(), 4);
        assert_eq!(document.materials.len(), 2);
        // 同一幾何、兩種材質 → 兩個 mesh 共用 accessor
        assert_eq!(document.meshes.len(), 2);
        assert_eq!(document.accessors.len(), 3);
        assert_eq!(bin.len(), 4 * 12 + 4 * 12 + 6 * 4);

        let positions = Valid(json::mesh::Semantic::Positions);
        assert_eq!(
            document.meshes[0].primitives[0].attributes[&positions],
            document.meshes[1].primitives[0].attributes[&positions]
        );
    }

    #[test]
    fn test_hidden_subtrees_are_skipped() {
        let mut scene = SceneGraph::new("hidden");
        let root = scene.add_root(SceneNode::new("root"));
        let group = scene.add_child(root, SceneNode::new("group")).unwrap();
        scene
            .add_child(group, SceneNode::new("leaf").with_mesh(quad(), None))
            .unwrap();
        scene.node_mut(group).unwrap().visible = false;

        let (document, bin) = DocumentBuilder::new(true).build(&scene).unwrap();
        assert_eq!(document.nodes.len(), 1);
        assert!(document.nodes[0].children.is_none());
        assert!(bin.is_empty());

        let (everything, _) = DocumentBuilder::new(false).build(&scene).unwrap();
        assert_eq!(everything.nodes.len(), 3);
    }

    #[test]
    fn test_out_of_range_index_is_an_encode_error() {
        let broken = Arc::new(Mesh {
            name: "broken".into(),
            positions: vec![[0.0; 3]; 3],
            normals: vec![],
            indices: vec![0, 1, 7],
        });
        let mut scene = SceneGraph::new("broken");
        scene.add_root(SceneNode::new("n").with_mesh(broken, None));

        let err = DocumentBuilder::new(true).build(&scene).unwrap_err();
        assert!(matches!(err, ExportError::Encode(message) if message.contains("out of range")));
    }

    #[test]
    fn test_identity_transforms_are_omitted() {
        let mut scene = SceneGraph::new("trs");
        scene.add_root(SceneNode::new("plain"));
        scene.add_root(
            SceneNode::new("moved").with_transform(Transform::from_translation([0.0, 2.0, 0.0])),
        );

        let (document, _) = DocumentBuilder::new(true).build(&scene).unwrap();
        let value = document.to_value().unwrap();
        assert!(value["nodes"][0].get("translation").is_none());
        assert_eq!(value["nodes"][1]["translation"][1], 2.0);
        assert_eq!(value["scenes"][0]["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["scene"], 0);
        assert_eq!(value["asset"]["version"], "2.0");
    }
}
