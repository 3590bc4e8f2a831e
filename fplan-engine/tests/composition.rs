use fplan_core::document::Entity;
use fplan_engine::dimensions::{DimensionAxis, DimensionTier};
use fplan_engine::{DrawingComposer, DrawingOptions, layers};
use fplan_schema::validate_and_fill;
use serde_json::json;

fn validated(candidate: serde_json::Value) -> fplan_core::plan::FloorplanDocument {
    validate_and_fill(candidate).expect("候选描述应通过校验")
}

#[test]
fn validated_tiling_composes_with_dimension_chain() {
    let plan = validated(json!({
        "land_width": 10,
        "land_height": 10,
        "rooms": [
            { "name": "Living Room", "type": "living_room", "x": 0, "y": 0, "width": 5, "height": 5,
              "openings": [{ "type": "door", "wall": "south", "pos": 1 }] },
            { "name": "Bedroom", "type": "bedroom", "x": 5, "y": 0, "width": 5, "height": 5,
              "openings": [{ "type": "door", "wall": "west", "pos": 1 },
                           { "type": "window", "wall": "east", "pos": 1.5 }] },
            { "name": "Kitchen", "type": "kitchen", "x": 0, "y": 5, "width": 5, "height": 5,
              "openings": [{ "type": "door", "wall": "south", "pos": 2 }] }
        ]
    }));
    let drawing = DrawingComposer::default().compose(&plan).expect("compose");

    let chain: Vec<(f64, f64, &str)> = drawing
        .dimensions
        .iter()
        .filter(|a| a.axis == DimensionAxis::Horizontal && a.tier == DimensionTier::Chain)
        .map(|a| (a.start, a.end, a.label.as_str()))
        .collect();
    assert_eq!(chain, vec![(0.0, 5.0, "5"), (5.0, 10.0, "5")]);

    let windows = drawing
        .document
        .entities_on_layer(layers::WINDOWS)
        .filter(|entity| matches!(entity, Entity::Line(_)))
        .count();
    assert_eq!(windows, 2);
    assert_eq!(drawing.axes.vertical.len(), 3);
    assert_eq!(drawing.axes.horizontal.len(), 3);
}

#[test]
fn configured_opening_widths_are_used() {
    let plan = validated(json!({
        "land_width": 8,
        "land_height": 6,
        "rooms": [
            { "name": "Studio", "type": "office", "x": 0, "y": 0, "width": 8, "height": 6,
              "openings": [{ "type": "door", "wall": "south", "pos": 1 },
                           { "type": "door", "wall": "north", "pos": 1, "width": 1.2 }] }
        ]
    }));
    let composer = DrawingComposer::new(DrawingOptions {
        door_width: 0.8,
        window_width: 1.2,
        title: "STUDIO".to_string(),
    });
    let drawing = composer.compose(&plan).expect("compose");
    let radii: Vec<f64> = drawing
        .document
        .entities_on_layer(layers::DOORS)
        .filter_map(|entity| match entity {
            Entity::Arc(arc) => Some(arc.radius),
            _ => None,
        })
        .collect();
    assert_eq!(radii.len(), 2);
    assert!((radii[0] - 0.8).abs() < 1e-12);
    assert!((radii[1] - 1.2).abs() < 1e-12);
    assert!(drawing.title_block.info.iter().any(|(key, value)| key == "TITLE" && value == "STUDIO"));
}

#[test]
fn composition_is_deterministic() {
    let candidate = json!({
        "land_width": 12,
        "land_height": 9,
        "rooms": [
            { "type": "stairs", "x": 0, "y": 0, "width": 3, "height": 4,
              "openings": [{ "type": "door", "wall": "east", "pos": 0.5 }] },
            { "type": "bathroom", "x": 3, "y": 0, "width": 2, "height": 2,
              "openings": [{ "type": "door", "wall": "north", "pos": 0.5 }] }
        ]
    });
    let first = DrawingComposer::default().compose(&validated(candidate.clone())).expect("compose");
    let second = DrawingComposer::default().compose(&validated(candidate)).expect("compose");
    assert_eq!(first.sheet_id, second.sheet_id);
    assert_eq!(first.layout, second.layout);
    assert_eq!(first.rooms, second.rooms);
    let a: Vec<&Entity> = first.document.entities().map(|(_, entity)| entity).collect();
    let b: Vec<&Entity> = second.document.entities().map(|(_, entity)| entity).collect();
    assert_eq!(a, b);
    assert!(first.rooms[0].stairs.is_some());
}

#[test]
fn large_lands_stay_inside_the_sheet() {
    for side in [150.0, 3_000.0, 40_000.0] {
        let plan = validated(json!({
            "land_width": side,
            "land_height": side,
            "rooms": [
                { "name": "Hangar", "type": "other", "x": 0, "y": 0, "width": side, "height": side,
                  "openings": [{ "type": "door", "wall": "south", "pos": 1 }] }
            ]
        }));
        let drawing = DrawingComposer::default().compose(&plan).expect("compose");
        let sheet = drawing.layout.sheet_bounds();
        for room in &drawing.rooms {
            let on_sheet = drawing.layout.to_sheet_bounds(&room.outer);
            assert!(sheet.contains_bounds(&on_sheet), "{side} m 地块的房间超出图纸");
        }
        let extent = drawing.document.bounds().expect("bounds");
        assert!(sheet.contains_bounds(&extent), "{side} m 地块的图元超出图纸");
    }
}
