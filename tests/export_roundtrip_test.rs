use bouquet_export::domain::ports::SceneExporter;
use bouquet_export::export::{encode_scene, GLB_CONTENT_TYPE};
use bouquet_export::scene::load_base_scene_from_slice;
use bouquet_export::{
    customize, BalloonSpec, BouquetTemplate, Configuration, ExportOptions, Finish, GlbExporter, MaterialResolver,
    SceneGraph, Shape, SlotId,
};

fn base() -> SceneGraph {
    BouquetTemplate::new().with_segments(12).build().unwrap()
}

fn scenario() -> Configuration {
    Configuration::new()
        .with_slot(SlotId::Top, BalloonSpec::new(Shape::A, "#FF0000", Finish::Standard))
        .with_slot(SlotId::Middle1, BalloonSpec::new(Shape::B, "#00FF00", Finish::Metallic))
}

#[tokio::test]
async fn test_export_produces_parseable_glb() {
    let prepared = customize(&base(), &scenario(), &mut MaterialResolver::new()).unwrap();
    let model = GlbExporter::new()
        .export(prepared, ExportOptions::default())
        .await
        .unwrap();

    assert!(!model.is_empty());
    assert_eq!(model.content_type, GLB_CONTENT_TYPE);

    let (document, buffers, _) = gltf::import_slice(&model.bytes).unwrap();
    assert_eq!(buffers.len(), 1);

    // root + anchor + 7 groups + 7 balloons + 6 strings (middle1 is a heart)
    assert_eq!(document.nodes().count(), 22);

    let names: Vec<String> = document.nodes().filter_map(|n| n.name().map(str::to_string)).collect();
    assert!(names.contains(&"balloon_top_A".to_string()));
    assert!(names.contains(&"balloon_middle1_B".to_string()));
    assert!(!names.contains(&"balloon_middle1_A".to_string()));
    assert!(!names.contains(&"string_middle1".to_string()));

    // red, green, untouched default, string, anchor
    assert_eq!(document.materials().count(), 5);
    let green = document
        .materials()
        .find(|m| m.name() == Some("middle1_metallic_00FF00"))
        .unwrap();
    assert!((green.pbr_metallic_roughness().metallic_factor() - 1.0).abs() < 1e-6);
    let string = document
        .materials()
        .find(|m| m.name() == Some("balloon_string"))
        .unwrap();
    assert!(!string.double_sided());
}

#[test]
fn test_shared_geometry_is_written_once() {
    let prepared = customize(&base(), &Configuration::new(), &mut MaterialResolver::new()).unwrap();
    let model = encode_scene(&prepared.scene, ExportOptions::default()).unwrap();
    let gltf = gltf::Gltf::from_slice(&model.bytes).unwrap();

    // anchor, latex balloon, string: one accessor triple each
    assert_eq!(gltf.accessors().count(), 9);
    assert_eq!(gltf.meshes().count(), 3);

    for accessor in gltf.accessors() {
        let offset = accessor.view().unwrap().offset();
        assert_eq!(offset % 4, 0);
    }
}

#[test]
fn test_text_gltf_round_trip() {
    let prepared = customize(&base(), &scenario(), &mut MaterialResolver::new()).unwrap();
    let model = encode_scene(&prepared.scene, ExportOptions::gltf()).unwrap();

    assert_eq!(model.content_type, "model/gltf+json");
    assert_eq!(model.file_extension, "gltf");
    let (document, buffers, _) = gltf::import_slice(&model.bytes).unwrap();
    assert_eq!(document.nodes().count(), 22);
    assert!(!buffers[0].is_empty());
}

#[test]
fn test_exported_model_can_be_customized_again() {
    let prepared = customize(&base(), &Configuration::new(), &mut MaterialResolver::new()).unwrap();
    let model = encode_scene(&prepared.scene, ExportOptions::default()).unwrap();

    let reloaded = load_base_scene_from_slice(&model.bytes, "reloaded").unwrap();
    assert_eq!(reloaded.len(), 23);

    let top_a = reloaded.node(reloaded.find_by_name("balloon_top_A").unwrap()).unwrap();
    let mesh = top_a.mesh.as_ref().unwrap();
    assert!(mesh.has_normals());
    assert!(mesh.triangle_count() > 0);

    let recolored = Configuration::new()
        .with_slot(SlotId::Top, BalloonSpec::new(Shape::A, "#112233", Finish::Matte));
    let again = customize(&reloaded, &recolored, &mut MaterialResolver::new()).unwrap();
    let top_a = again.scene.node(again.scene.find_by_name("balloon_top_A").unwrap()).unwrap();
    assert_eq!(top_a.material.as_ref().unwrap().name, "top_matte_112233");
    assert!(top_a.visible);
}
