//! Integration tests: scene → document → scene round-trip.
//!
//! Verifies that the persisted JSON document and the history snapshot both
//! reproduce every object kind, the background and the dimensions.

use pretty_assertions::assert_eq;
use px_core::filters::{AdjustKind, AdjustValues};
use px_core::id::ObjectId;
use px_core::model::*;
use px_core::snapshot::{Snapshot, from_document, to_document};
use px_core::Size;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn rich_scene() -> Scene {
    let mut scene = Scene::new(1200, 630);
    scene.background = Background::Image(BackgroundImage::cover(
        "https://images.test/beach.jpg",
        Size::new(3000.0, 2000.0),
        1200,
        630,
    ));

    let mut adjust = AdjustValues::default();
    adjust.set(AdjustKind::Brightness, 25.0);
    adjust.set(AdjustKind::Hue, -40.0);
    let mut photo = ImageObject::new("https://cdn.test/u/photo.png?tr=e-retouch", 2400.0, 1600.0);
    photo.crop = CropRegion {
        x: 120.0,
        y: 80.0,
        width: 1800.0,
        height: 1200.0,
    };
    photo.filters = adjust.to_filters();

    let mut geometry = Geometry::centered(600.0, 315.0).with_scale(0.35, 0.35);
    geometry.angle = 12.5;
    scene.objects.push(SceneObject::new(
        ObjectId::intern("photo_main"),
        ObjectKind::Image(photo),
        geometry,
    ));

    scene.objects.push(SceneObject::new(
        ObjectId::intern("headline"),
        ObjectKind::Text(TextObject {
            content: "Summer\nSale".into(),
            font_family: "Georgia".into(),
            font_size: 48.0,
            font_weight: FontWeight::Bold,
            font_style: FontStyle::Italic,
            underline: true,
            fill: Color::from_hex("#FF5722").unwrap(),
            text_align: TextAlign::Center,
        }),
        Geometry::centered(600.0, 100.0),
    ));

    let mut frame = SceneObject::new(
        ObjectId::intern("frame"),
        ObjectKind::Shape(ShapeObject {
            width: 300.0,
            height: 200.0,
            fill: Some(Color::rgba(0, 0, 0, 64)),
            stroke: None,
            role: ShapeRole::Decoration,
        }),
        Geometry::at(20.0, 20.0),
    );
    frame.selectable = false;
    scene.objects.push(frame);
    scene
}

// ─── Round-trips ─────────────────────────────────────────────────────────

#[test]
fn document_roundtrip_preserves_everything() {
    let scene = rich_scene();
    let doc = to_document(&scene).expect("encode");
    let text = serde_json::to_string(&doc).expect("to string");
    let reparsed: serde_json::Value = serde_json::from_str(&text).expect("from string");
    let load = from_document(&reparsed).expect("decode");

    assert_eq!(load.skipped, 0);
    assert_eq!(load.scene, scene);
}

#[test]
fn document_encoding_is_stable() {
    let scene = rich_scene();
    let first = to_document(&scene).unwrap().to_string();
    let again = to_document(&from_document(&to_document(&scene).unwrap()).unwrap().scene)
        .unwrap()
        .to_string();
    assert_eq!(first, again);
}

#[test]
fn history_snapshot_matches_document_content() {
    let scene = rich_scene();
    let restored = Snapshot::capture(&scene).unwrap().restore().unwrap();
    assert_eq!(restored, scene);
}

#[test]
fn document_shape_is_readable() {
    let doc = to_document(&rich_scene()).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["width"], 1200);
    assert_eq!(doc["background"]["type"], "image");
    assert_eq!(doc["objects"][0]["kind"]["type"], "image");
    assert_eq!(doc["objects"][1]["kind"]["fill"], "#FF5722");
    assert_eq!(doc["objects"][2]["selectable"], false);
}

#[test]
fn missing_optional_fields_take_defaults() {
    let doc = serde_json::json!({
        "width": 400,
        "height": 300,
        "objects": [{
            "id": "legacy",
            "geometry": { "left": 5.0, "top": 6.0 },
            "kind": { "type": "shape", "width": 10.0, "height": 10.0 }
        }]
    });
    let load = from_document(&doc).unwrap();
    let obj = load.scene.get(ObjectId::intern("legacy")).unwrap();
    assert!(obj.selectable && obj.evented);
    assert_eq!(obj.geometry.scale_x, 1.0);
    assert_eq!(load.scene.background, Background::default());
}
