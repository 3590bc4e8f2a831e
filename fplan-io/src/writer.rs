use std::fmt::Write as _;

use fplan_core::document::{Document, Entity, Layer, LineType, TextAlign};
use fplan_core::geometry::{Bounds2D, Point2};

const ACAD_VERSION: &str = "AC1009";

/// 线型图案（图纸单位，米）：正值为实线段，负值为空白。
fn line_type_pattern(line_type: LineType) -> (&'static str, &'static [f64]) {
    match line_type {
        LineType::Continuous => ("Solid line", &[]),
        LineType::Dashed => ("Dashed __ __ __", &[0.5, -0.25]),
        LineType::Center => ("Center ____ _ ____", &[1.25, -0.25, 0.25, -0.25]),
    }
}

/// 输出 ASCII R12 DXF 的组码对。
pub(crate) struct DxfWriter {
    out: String,
}

impl DxfWriter {
    pub(crate) fn new() -> Self {
        Self { out: String::new() }
    }

    pub(crate) fn write(mut self, document: &Document) -> String {
        let limits = document
            .limits()
            .or_else(|| document.bounds())
            .unwrap_or_else(|| Bounds2D::from_origin_size(0.0, 0.0, 1.0, 1.0));
        let extents = document.bounds().unwrap_or(limits);

        self.header(&limits, &extents);
        self.tables(document);
        self.entities(document);
        self.pair(0, "EOF");
        self.out
    }

    fn pair(&mut self, code: i32, value: impl std::fmt::Display) {
        let _ = write!(self.out, "{code:>3}\n{value}\n");
    }

    fn number(&mut self, code: i32, value: f64) {
        let text = format_number(value);
        self.pair(code, text);
    }

    fn point(&mut self, base_code: i32, point: Point2) {
        self.number(base_code, point.x());
        self.number(base_code + 10, point.y());
        self.number(base_code + 20, 0.0);
    }

    fn header(&mut self, limits: &Bounds2D, extents: &Bounds2D) {
        self.pair(0, "SECTION");
        self.pair(2, "HEADER");
        self.pair(9, "$ACADVER");
        self.pair(1, ACAD_VERSION);
        for (name, point) in [
            ("$LIMMIN", limits.min()),
            ("$LIMMAX", limits.max()),
        ] {
            self.pair(9, name);
            self.number(10, point.x());
            self.number(20, point.y());
        }
        for (name, point) in [
            ("$EXTMIN", extents.min()),
            ("$EXTMAX", extents.max()),
        ] {
            self.pair(9, name);
            self.point(10, point);
        }
        self.pair(0, "ENDSEC");
    }

    fn tables(&mut self, document: &Document) {
        self.pair(0, "SECTION");
        self.pair(2, "TABLES");

        let line_types = [LineType::Continuous, LineType::Dashed, LineType::Center];
        self.pair(0, "TABLE");
        self.pair(2, "LTYPE");
        self.pair(70, line_types.len());
        for line_type in line_types {
            let (description, pattern) = line_type_pattern(line_type);
            self.pair(0, "LTYPE");
            self.pair(2, line_type.dxf_name());
            self.pair(70, 0);
            self.pair(3, description);
            self.pair(72, 65);
            self.pair(73, pattern.len());
            self.number(40, pattern.iter().map(|dash| dash.abs()).sum());
            for dash in pattern {
                self.number(49, *dash);
            }
        }
        self.pair(0, "ENDTAB");

        let layers: Vec<&Layer> = document.layers().collect();
        self.pair(0, "TABLE");
        self.pair(2, "LAYER");
        self.pair(70, layers.len());
        for layer in layers {
            self.pair(0, "LAYER");
            self.pair(2, &layer.name);
            self.pair(70, 0);
            // 负颜色号表示图层关闭
            let color = if layer.is_visible { layer.color } else { -layer.color.abs() };
            self.pair(62, color);
            self.pair(6, layer.line_type.dxf_name());
        }
        self.pair(0, "ENDTAB");

        self.pair(0, "TABLE");
        self.pair(2, "STYLE");
        self.pair(70, 1);
        self.pair(0, "STYLE");
        self.pair(2, "STANDARD");
        self.pair(70, 0);
        self.number(40, 0.0);
        self.number(41, 1.0);
        self.number(50, 0.0);
        self.pair(71, 0);
        self.number(42, 0.2);
        self.pair(3, "txt");
        self.pair(4, "");
        self.pair(0, "ENDTAB");

        self.pair(0, "ENDSEC");
    }

    fn entities(&mut self, document: &Document) {
        self.pair(0, "SECTION");
        self.pair(2, "ENTITIES");
        for (_, entity) in document.entities() {
            self.entity(entity);
        }
        self.pair(0, "ENDSEC");
    }

    fn entity(&mut self, entity: &Entity) {
        self.pair(0, entity.kind());
        self.pair(8, entity.layer_name());
        match entity {
            Entity::Line(line) => {
                self.point(10, line.start);
                self.point(11, line.end);
            }
            Entity::Circle(circle) => {
                self.point(10, circle.center);
                self.number(40, circle.radius);
            }
            Entity::Arc(arc) => {
                self.point(10, arc.center);
                self.number(40, arc.radius);
                self.number(50, normalize_degrees(arc.start_angle.to_degrees()));
                self.number(51, normalize_degrees(arc.end_angle.to_degrees()));
            }
            Entity::Polyline(polyline) => {
                self.pair(66, 1);
                self.point(10, Point2::new(0.0, 0.0));
                self.pair(70, if polyline.is_closed { 1 } else { 0 });
                for vertex in &polyline.vertices {
                    self.pair(0, "VERTEX");
                    self.pair(8, &polyline.layer);
                    self.point(10, *vertex);
                }
                self.pair(0, "SEQEND");
                self.pair(8, &polyline.layer);
            }
            Entity::Solid(solid) => {
                // DXF 的 SOLID 按 1-2-4-3 成面，第三、四角点需互换。
                let [a, b, c, d] = solid.corners;
                self.point(10, a);
                self.point(11, b);
                self.point(12, d);
                self.point(13, c);
            }
            Entity::Text(text) => {
                self.point(10, text.insert);
                self.number(40, text.height);
                self.pair(1, sanitize_text(&text.content));
                if text.rotation != 0.0 {
                    self.number(50, normalize_degrees(text.rotation.to_degrees()));
                }
                if text.align == TextAlign::Center {
                    self.pair(72, 1);
                    self.point(11, text.insert);
                }
            }
        }
    }
}

fn normalize_degrees(value: f64) -> f64 {
    let normalized = value.rem_euclid(360.0);
    if (normalized - 360.0).abs() < 1e-9 { 0.0 } else { normalized }
}

/// 组码值不能跨行；R12 文件只写 ASCII，其余字符按 UTF-16 码元转成 `\U+XXXX`。
/// 反斜杠本身也转义，读回时不会与转义序列混淆。
fn sanitize_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for ch in content.chars() {
        match ch {
            '\r' | '\n' => out.push(' '),
            '\\' => out.push_str("\\U+005C"),
            ch if ch.is_ascii() => out.push(ch),
            ch => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units).iter() {
                    out.push_str(&format!("\\U+{unit:04X}"));
                }
            }
        }
    }
    out
}

/// 固定六位小数后去掉尾随零，至少保留一位小数。
pub(crate) fn format_number(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let mut text = format!("{value:.6}");
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    if text == "-0.0" { "0.0".to_string() } else { text }
}

#[cfg(test)]
mod tests {
    use fplan_core::document::Document;
    use fplan_core::geometry::{Bounds2D, Point2};

    use super::*;

    #[test]
    fn numbers_are_compact() {
        assert_eq!(format_number(10.0), "10.0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0.0");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(-1e-9), "0.0");
    }

    #[test]
    fn header_carries_version_and_limits() {
        let mut doc = Document::new();
        doc.set_limits(Bounds2D::from_origin_size(0.0, 0.0, 42.0, 29.7));
        doc.add_line(Point2::new(1.0, 1.0), Point2::new(2.0, 3.0), "0");
        let text = DxfWriter::new().write(&doc);
        assert!(text.starts_with("  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC1009\n"));
        assert!(text.contains("  9\n$LIMMAX\n 10\n42.0\n 20\n29.7\n"));
        assert!(text.contains("  9\n$EXTMAX\n 10\n2.0\n 20\n3.0\n"));
        assert!(text.ends_with("  0\nEOF\n"));
    }

    #[test]
    fn solid_corners_use_dxf_order() {
        let mut doc = Document::new();
        doc.add_solid(
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
            "0",
        );
        let text = DxfWriter::new().write(&doc);
        let solid = text.split("SOLID\n").nth(1).expect("SOLID 实体");
        assert!(solid.contains(" 12\n0.0\n 22\n1.0\n"), "{solid}");
        assert!(solid.contains(" 13\n1.0\n 23\n1.0\n"), "{solid}");
    }

    #[test]
    fn text_and_angles_are_normalized() {
        assert_eq!(sanitize_text("A\nB"), "A B");
        assert_eq!(sanitize_text("Yotoqxona №1"), "Yotoqxona \\U+21161");
        assert_eq!(sanitize_text("Oʻgʻil"), "O\\U+02BBg\\U+02BBil");
        assert_eq!(sanitize_text("a\\b"), "a\\U+005Cb");
        assert_eq!(sanitize_text("😀"), "\\U+D83D\\U+DE00");
        assert!(sanitize_text("Ванная").is_ascii());
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
    }
}
