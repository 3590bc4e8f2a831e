use std::f64::consts::FRAC_PI_2;

use fplan_core::document::{Document, Entity, LineType, TextAlign};
use fplan_core::geometry::{Bounds2D, Point2};
use fplan_io::{DocumentLoader, DocumentSaver, DxfFacade};

fn sample_document() -> Document {
    let mut doc = Document::new();
    doc.set_limits(Bounds2D::from_origin_size(0.0, 0.0, 21.0, 14.85));
    doc.define_layer("A-BOUNDARY", 9, LineType::Dashed);
    doc.define_layer("A-DOOR", 4, LineType::Continuous);
    doc.define_layer("S-GRID", 8, LineType::Center);
    doc.add_rectangle(&Bounds2D::from_origin_size(2.0, 2.0, 10.0, 8.0), "A-BOUNDARY");
    doc.add_line(Point2::new(3.0, 2.0), Point2::new(3.779423, 2.45), "A-DOOR");
    doc.add_arc(Point2::new(3.0, 2.0), 0.9, FRAC_PI_2 * 0.5, FRAC_PI_2, "A-DOOR");
    doc.add_circle(Point2::new(7.0, 11.1), 0.2, "S-GRID");
    doc.add_solid(
        [
            Point2::new(2.0, 2.0),
            Point2::new(12.0, 2.0),
            Point2::new(11.7, 2.3),
            Point2::new(2.3, 2.3),
        ],
        "0",
    );
    doc.add_text(Point2::new(7.0, 6.0), "LIVING ROOM", 0.175, TextAlign::Center, "0");
    doc.add_polyline([Point2::new(1.0, 1.0), Point2::new(1.5, 1.5)], false, "0");
    doc
}

fn round_trip(doc: &Document) -> Document {
    let facade = DxfFacade::new();
    let mut bytes = Vec::new();
    facade.save(doc, &mut bytes).expect("写出 DXF 失败");
    facade.load(&mut bytes.as_slice()).expect("读取 DXF 失败")
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn same_point(a: Point2, b: Point2) -> bool {
    close(a.x(), b.x()) && close(a.y(), b.y())
}

#[test]
fn written_entities_read_back_in_order() {
    let original = sample_document();
    let loaded = round_trip(&original);

    let kinds: Vec<&str> = loaded.entities().map(|(_, entity)| entity.kind()).collect();
    assert_eq!(kinds, vec!["POLYLINE", "LINE", "ARC", "CIRCLE", "SOLID", "TEXT", "POLYLINE"]);

    for ((_, expected), (_, actual)) in original.entities().zip(loaded.entities()) {
        assert_eq!(expected.layer_name(), actual.layer_name());
        match (expected, actual) {
            (Entity::Line(a), Entity::Line(b)) => {
                assert!(same_point(a.start, b.start) && same_point(a.end, b.end));
            }
            (Entity::Arc(a), Entity::Arc(b)) => {
                assert!(same_point(a.center, b.center));
                assert!(close(a.radius, b.radius));
                assert!(close(a.start_angle, b.start_angle));
                assert!(close(a.end_angle, b.end_angle));
            }
            (Entity::Circle(a), Entity::Circle(b)) => {
                assert!(same_point(a.center, b.center) && close(a.radius, b.radius));
            }
            (Entity::Solid(a), Entity::Solid(b)) => {
                for (p, q) in a.corners.iter().zip(b.corners.iter()) {
                    assert!(same_point(*p, *q), "SOLID 角点顺序应保持不变");
                }
            }
            (Entity::Text(a), Entity::Text(b)) => {
                assert_eq!(a.content, b.content);
                assert_eq!(b.align, TextAlign::Center);
                assert!(same_point(a.insert, b.insert));
                assert!(close(a.height, b.height));
            }
            (Entity::Polyline(a), Entity::Polyline(b)) => {
                assert_eq!(a.is_closed, b.is_closed);
                assert_eq!(a.vertices.len(), b.vertices.len());
            }
            (left, right) => panic!("实体类型不一致：{left:?} vs {right:?}"),
        }
    }
}

#[test]
fn layers_and_limits_survive_round_trip() {
    let loaded = round_trip(&sample_document());
    let boundary = loaded.layer("A-BOUNDARY").expect("A-BOUNDARY 图层");
    assert_eq!(boundary.color, 9);
    assert_eq!(boundary.line_type, LineType::Dashed);
    assert_eq!(loaded.layer("S-GRID").expect("S-GRID 图层").line_type, LineType::Center);
    assert_eq!(loaded.layer("A-DOOR").expect("A-DOOR 图层").color, 4);

    let limits = loaded.limits().expect("limits");
    assert!(close(limits.width(), 21.0) && close(limits.height(), 14.85));
}

#[test]
fn saved_stream_loads_back_from_a_file() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let path = dir.path().join("plan.dxf");
    let facade = DxfFacade::new();
    let mut file = std::fs::File::create(&path).expect("创建文件");
    facade.save(&sample_document(), &mut file).expect("写出文件");
    drop(file);
    let loaded = facade.load_path(&path).expect("读取文件");
    assert_eq!(loaded.entities().count(), 7);
}

#[test]
fn missing_file_reports_path() {
    let err = DxfFacade::new()
        .load_path(std::path::Path::new("/nonexistent/plan.dxf"))
        .unwrap_err();
    assert!(err.to_string().contains("plan.dxf"), "{err}");
}

#[test]
fn composed_drawing_round_trips_every_entity() {
    use fplan_core::plan::{FloorplanDocument, Opening, OpeningKind, Room, RoomType, Style, Wall};
    use fplan_engine::DrawingComposer;

    let plan = FloorplanDocument {
        total_area: 60.0,
        land_width: 8.0,
        land_height: 6.0,
        floor_count: 1,
        rooms: vec![Room {
            name: Some("Studio".into()),
            room_type: RoomType::Bedroom,
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 6.0,
            separate: false,
            openings: vec![
                Opening {
                    kind: OpeningKind::Door,
                    wall: Wall::South,
                    pos: 1.0,
                    width: None,
                },
                Opening {
                    kind: OpeningKind::Window,
                    wall: Wall::North,
                    pos: 2.0,
                    width: None,
                },
            ],
        }],
        entrance: Wall::South,
        style: Style::Modern,
        walls_thickness: 0.3,
        notes: None,
    };
    let drawing = DrawingComposer::default().compose(&plan).expect("compose");
    let loaded = round_trip(&drawing.document);
    assert_eq!(loaded.entities().count(), drawing.document.entities().count());
    for layer in drawing.document.layers() {
        let read = loaded.layer(&layer.name).expect("图层应写入 LAYER 表");
        assert_eq!(read.color, layer.color);
        assert_eq!(read.line_type, layer.line_type);
    }
}
