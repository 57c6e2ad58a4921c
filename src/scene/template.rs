//! Procedural bouquet used when no base model file is configured.
//!
//! Layout: `Bouquet` root → `anchor_weight`, one `slot_<slot>` group per slot holding the three
//! `balloon_<slot>_<A|B|C>` shape nodes, and one `string_<slot>` node per slot.

use super::geometry::{cylinder, extrude_outline, heart_outline, star_outline, uv_sphere};
use super::graph::{Mesh, SceneGraph, SceneNode, Transform};
use super::material::{Color, MaterialDescriptor, Side};
use super::naming::{balloon_node_name, string_node_name};
use crate::domain::model::{Shape, SlotId};
use crate::utils::error::Result;
use std::sync::Arc;

const ANCHOR_HEIGHT: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct BouquetTemplate {
    pub balloon_radius: f32,
    pub string_radius: f32,
    /// Sphere/outline tessellation
    pub segments: u32,
}

impl Default for BouquetTemplate {
    fn default() -> Self {
        Self {
            balloon_radius: 0.45,
            string_radius: 0.008,
            segments: 24,
        }
    }
}

impl BouquetTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segments(mut self, segments: u32) -> Self {
        self.segments = segments.max(8);
        self
    }

    pub fn slot_position(slot: SlotId) -> [f32; 3] {
        match slot {
            SlotId::Top => [0.0, 3.4, 0.0],
            SlotId::Middle1 => [-0.9, 2.6, 0.2],
            SlotId::Middle2 => [0.0, 2.6, -0.5],
            SlotId::Middle3 => [0.9, 2.6, 0.2],
            SlotId::Bottom1 => [-1.1, 1.8, -0.2],
            SlotId::Bottom2 => [0.0, 1.8, 0.6],
            SlotId::Bottom3 => [1.1, 1.8, -0.2],
        }
    }

    fn shape_mesh(&self, shape: Shape) -> Mesh {
        let r = self.balloon_radius;
        match shape {
            Shape::A => uv_sphere("latex", r, 1.15, self.segments, self.segments * 3 / 4),
            Shape::B => extrude_outline(
                "heart",
                &heart_outline(r * 1.1, self.segments * 2),
                [0.0, -r * 1.1 / 17.0],
                r * 0.5,
            ),
            Shape::C => extrude_outline("star", &star_outline(r * 1.15, r * 0.5, 5), [0.0, 0.0], r * 0.4),
        }
    }

    pub fn build(&self) -> Result<SceneGraph> {
        let mut scene = SceneGraph::new("bouquet");

        let default_balloon = Arc::new(
            MaterialDescriptor::new("balloon_default")
                .color(Color::rgba(0.8, 0.8, 0.8, 1.0))
                .metalness(0.3)
                .roughness(0.3),
        );
        let default_string = Arc::new(
            MaterialDescriptor::new("string_default")
                .roughness(0.8)
                .side(Side::Double),
        );
        let anchor_material = Arc::new(
            MaterialDescriptor::new("anchor_weight")
                .color(Color::rgba(0.83, 0.69, 0.22, 1.0))
                .metalness(0.8)
                .roughness(0.35),
        );

        let shape_meshes: Vec<(Shape, Arc<Mesh>)> = Shape::ALL
            .into_iter()
            .map(|shape| (shape, Arc::new(self.shape_mesh(shape))))
            .collect();
        let string_mesh = Arc::new(cylinder("string", self.string_radius, 1.0, 6));

        let root = scene.add_root(SceneNode::new("Bouquet"));

        scene.add_child(
            root,
            SceneNode::new("anchor_weight")
                .with_transform(Transform::from_translation([0.0, ANCHOR_HEIGHT / 2.0, 0.0]))
                .with_mesh(
                    Arc::new(cylinder("anchor", 0.25, ANCHOR_HEIGHT, 16)),
                    Some(anchor_material),
                ),
        )?;

        for slot in SlotId::ALL {
            let position = Self::slot_position(slot);
            let group = scene.add_child(
                root,
                SceneNode::new(format!("slot_{}", slot)).with_transform(Transform::from_translation(position)),
            )?;

            for (shape, mesh) in &shape_meshes {
                scene.add_child(
                    group,
                    SceneNode::new(balloon_node_name(slot, *shape))
                        .with_mesh(Arc::clone(mesh), Some(Arc::clone(&default_balloon))),
                )?;
            }

            // 繩子從配重頂端拉到氣球底部
            let bottom = position[1] - self.balloon_radius;
            let length = (bottom - ANCHOR_HEIGHT).max(0.1);
            scene.add_child(
                root,
                SceneNode::new(string_node_name(slot))
                    .with_transform(
                        Transform::from_translation([
                            position[0],
                            ANCHOR_HEIGHT + length / 2.0,
                            position[2],
                        ])
                        .with_scale([1.0, length, 1.0]),
                    )
                    .with_mesh(Arc::clone(&string_mesh), Some(Arc::clone(&default_string))),
            )?;
        }

        tracing::debug!("Built procedural bouquet with {} nodes", scene.len());
        Ok(scene)
    }
}
