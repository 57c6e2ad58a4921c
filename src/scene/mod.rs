//! Scene graph, material resolution and bouquet customization

pub mod customizer;
pub mod geometry;
pub mod graph;
pub mod loader;
pub mod material;
pub mod naming;
pub mod template;

pub use customizer::{customize, CustomizeStats, PreparedScene};
pub use graph::{Mesh, NodeId, SceneGraph, SceneNode, Transform};
pub use loader::{load_base_scene, load_base_scene_from_slice};
pub use material::{MaterialDescriptor, MaterialResolver};
pub use template::BouquetTemplate;
