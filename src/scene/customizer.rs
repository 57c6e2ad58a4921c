//! Scene Customizer: base scene + configuration → prepared scene.

use super::graph::SceneGraph;
use super::material::{material_key, MaterialResolver, ResolverStats};
use super::naming::{classify, NodeRole};
use crate::domain::model::{Configuration, Shape};
use crate::utils::error::{BouquetError, Result};
use crate::utils::validation::Validate;

/// Per-call summary of what the traversal did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomizeStats {
    pub balloons_shown: usize,
    pub balloons_hidden: usize,
    pub strings_shown: usize,
    pub strings_hidden: usize,
    pub untouched: usize,
    /// Visible balloon nodes that kept their original material
    pub missing_materials: Vec<String>,
    /// Resolver cache counters after the traversal
    pub materials: ResolverStats,
}

/// 已套用設定、可直接輸出的場景複本
#[derive(Debug, Clone)]
pub struct PreparedScene {
    pub scene: SceneGraph,
    pub stats: CustomizeStats,
}

/// Clones `base` and applies per-slot visibility and materials to the clone.
///
/// Input is checked before the clone is made. `base` is never modified; the only shared state
/// touched is `resolver`'s cache, which is warmed with one material per configured slot.
pub fn customize(
    base: &SceneGraph,
    configuration: &Configuration,
    resolver: &mut MaterialResolver,
) -> Result<PreparedScene> {
    configuration
        .validate()
        .map_err(|e| BouquetError::transform(format!("invalid configuration: {}", e)))?;
    base.validate()?;

    resolver.warm(configuration);
    let string_material = resolver.string_material();

    let mut scene = base.clone();
    let mut stats = CustomizeStats::default();

    for (_, node) in scene.iter_mut() {
        match classify(&node.name) {
            NodeRole::Balloon { slot, shape } => {
                node.visible = shape == configuration.effective_shape(slot);
                if !node.visible {
                    stats.balloons_hidden += 1;
                    continue;
                }
                stats.balloons_shown += 1;

                let cached = configuration
                    .slot(slot)
                    .and_then(|spec| resolver.lookup(slot, &spec.color, spec.finish));
                match cached {
                    Some(material) => node.material = Some(material),
                    None => {
                        let expected = configuration
                            .slot(slot)
                            .map(|spec| material_key(slot, &spec.color, spec.finish))
                            .unwrap_or_else(|| format!("{}<unconfigured>", slot));
                        tracing::debug!(
                            "No cached material '{}' for node '{}', keeping the original material",
                            expected,
                            node.name
                        );
                        stats.missing_materials.push(node.name.clone());
                    }
                }
            }
            NodeRole::String { slot } => {
                // 只有乳膠氣球 (A) 有綁繩，與材質無關
                node.visible = configuration.effective_shape(slot) == Shape::A;
                if node.visible {
                    node.material = Some(string_material.clone());
                    stats.strings_shown += 1;
                } else {
                    stats.strings_hidden += 1;
                }
            }
            NodeRole::Other => stats.untouched += 1,
        }
    }

    stats.materials = resolver.stats();
    tracing::debug!(
        "Customized scene '{}': {} balloons shown, {} hidden, {} strings shown, {} degraded",
        scene.name,
        stats.balloons_shown,
        stats.balloons_hidden,
        stats.strings_shown,
        stats.missing_materials.len()
    );

    Ok(PreparedScene { scene, stats })
}
