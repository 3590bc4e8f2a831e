use fplan_core::document::Entity;
use fplan_engine::layers;
use fplan_frontend::pipeline::{GenerationOptions, render_artifacts};
use fplan_frontend::MockParser;
use fplan_io::{DocumentLoader, DxfFacade};
use fplan_schema::validate_and_fill;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-5
}

/// 两个产物来自同一次组装：DXF 读回后的图纸范围与 PNG 尺寸一致，房间轮廓与几何一致。
#[test]
fn vector_and_raster_agree_on_sheet_and_rooms() {
    let document = validate_and_fill(MockParser::layout()).expect("valid layout");
    let options = GenerationOptions {
        preview_width_px: 420,
        ..GenerationOptions::default()
    };
    let artifacts = render_artifacts(&document, &options).expect("render");
    let layout = &artifacts.drawing.layout;

    let loaded = DxfFacade::new()
        .load(&mut artifacts.vector.as_slice())
        .expect("DXF 读回");
    let limits = loaded.limits().expect("limits");
    let sheet = layout.sheet_bounds();
    assert!(close(limits.width(), sheet.width()));
    assert!(close(limits.height(), sheet.height()));

    let png = image::load_from_memory(&artifacts.raster).expect("PNG 解码");
    assert_eq!(png.width(), 420);
    let expected_height = (sheet.height() * 420.0 / sheet.width()).round() as u32;
    assert_eq!(png.height(), expected_height);

    // DXF 中的房间外轮廓与共享几何逐一对应。
    let outlines: Vec<_> = loaded
        .entities()
        .filter_map(|(_, entity)| match entity {
            Entity::Polyline(polyline)
                if polyline.is_closed && polyline.layer == layers::WALL_EXTERIOR =>
            {
                entity.bounds()
            }
            _ => None,
        })
        .collect();
    assert_eq!(outlines.len(), artifacts.drawing.rooms.len());
    for room in &artifacts.drawing.rooms {
        let expected = layout.to_sheet_bounds(&room.outer);
        assert!(
            outlines.iter().any(|found| {
                close(found.min().x(), expected.min().x())
                    && close(found.min().y(), expected.min().y())
                    && close(found.max().x(), expected.max().x())
                    && close(found.max().y(), expected.max().y())
            }),
            "房间 {} 的外轮廓未出现在 DXF 中",
            room.index
        );
    }
}

#[test]
fn re_rendering_is_byte_identical() {
    let document = validate_and_fill(MockParser::layout()).expect("valid layout");
    let options = GenerationOptions {
        preview_width_px: 200,
        ..GenerationOptions::default()
    };
    let first = render_artifacts(&document, &options).expect("render");
    let second = render_artifacts(&document, &options).expect("render");
    assert_eq!(first.sheet_id(), second.sheet_id());
    assert_eq!(first.vector, second.vector);
    assert_eq!(first.raster, second.raster);
}

#[test]
fn non_ascii_room_names_survive_both_backends() {
    let mut layout = MockParser::layout();
    layout["rooms"][1]["name"] = serde_json::json!("Oʻgʻil xonasi №1");
    let document = validate_and_fill(layout).expect("valid layout");
    let options = GenerationOptions {
        preview_width_px: 300,
        ..GenerationOptions::default()
    };
    let artifacts = render_artifacts(&document, &options).expect("render");

    // R12 文件只含 ASCII，非 ASCII 字符以 \U+XXXX 写出。
    assert!(artifacts.vector.is_ascii());
    let text = String::from_utf8_lossy(&artifacts.vector);
    assert!(text.contains("O\\U+02BBG\\U+02BBIL XONASI \\U+21161"), "房间标签未转义");

    let loaded = DxfFacade::new()
        .load(&mut artifacts.vector.as_slice())
        .expect("DXF 读回");
    let contents: Vec<&str> = loaded
        .entities()
        .filter_map(|(_, entity)| match entity {
            Entity::Text(text) => Some(text.content.as_str()),
            _ => None,
        })
        .collect();
    assert!(contents.contains(&"OʻGʻIL XONASI №1"), "{contents:?}");
    assert!(contents.contains(&"Oʻgʻil xonasi №1"), "{contents:?}");

    let png = image::load_from_memory(&artifacts.raster).expect("PNG 解码");
    assert_eq!(png.width(), 300);
    assert_eq!(artifacts.summary[1], "• Oʻgʻil xonasi №1: 5m x 5m");
}
