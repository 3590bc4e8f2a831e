use std::f64::consts::TAU;
use std::io::Write;

use fplan_core::document::{Document, Entity, LineType, Text, TextAlign};
use fplan_core::geometry::{Bounds2D, Point2};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use tracing::{debug, trace};

use crate::font::{ADVANCE, GLYPH_HEIGHT, lit_cells};
use crate::{DocumentSaver, IoError};

pub const DEFAULT_PREVIEW_WIDTH: u32 = 1600;
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// 点阵单元小于该像素尺寸时文字无法辨认，直接跳过。
const MIN_TEXT_CELL_PX: f64 = 0.35;

/// AutoCAD 颜色索引到 RGB。白底预览中 7 号色（白/黑）绘制为黑色。
pub fn aci_color(index: i16) -> Rgba<u8> {
    let rgb = match index.unsigned_abs() {
        1 => [255, 0, 0],
        2 => [255, 255, 0],
        3 => [0, 255, 0],
        4 => [0, 255, 255],
        5 => [0, 0, 255],
        6 => [255, 0, 255],
        8 => [128, 128, 128],
        9 => [192, 192, 192],
        30 => [255, 127, 0],
        250 => [51, 51, 51],
        251 => [80, 80, 80],
        252 => [105, 105, 105],
        253 => [130, 130, 130],
        254 => [190, 190, 190],
        255 => [255, 255, 255],
        _ => [0, 0, 0],
    };
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

/// 栅格预览：按图纸范围等比缩放到固定像素宽度。
#[derive(Debug, Clone, Copy)]
pub struct PngPreview {
    width_px: u32,
}

impl Default for PngPreview {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_WIDTH)
    }
}

impl PngPreview {
    pub fn new(width_px: u32) -> Self {
        Self {
            width_px: width_px.max(1),
        }
    }

    #[inline]
    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    /// 以图限（无则以实体范围）为画布，返回每米像素数与画布范围。
    pub fn viewport(&self, document: &Document) -> Result<(Bounds2D, f64), IoError> {
        let extent = document
            .limits()
            .or_else(|| document.bounds())
            .ok_or_else(|| IoError::InvalidDocument("文档没有可绘制的范围".to_string()))?;
        if !(extent.width() > 0.0 && extent.height() > 0.0) {
            return Err(IoError::InvalidDocument(format!(
                "绘制范围退化：{} x {}",
                extent.width(),
                extent.height()
            )));
        }
        Ok((extent, self.width_px as f64 / extent.width()))
    }

    pub fn render(&self, document: &Document) -> Result<RgbaImage, IoError> {
        let (extent, scale) = self.viewport(document)?;
        let height_px = ((extent.height() * scale).round() as u32).max(1);
        let mut canvas = Canvas {
            image: RgbaImage::from_pixel(self.width_px, height_px, BACKGROUND),
            origin: Point2::new(extent.min().x(), extent.max().y()),
            scale,
        };

        let mut skipped_text = 0usize;
        for (_, entity) in document.entities() {
            let Some(layer) = document.layer(entity.layer_name()) else {
                continue;
            };
            if !layer.is_visible {
                continue;
            }
            let color = aci_color(layer.color);
            match entity {
                Entity::Line(line) => canvas.line(line.start, line.end, color, layer.line_type),
                Entity::Circle(circle) => {
                    canvas.arc(circle.center, circle.radius, 0.0, TAU, color, layer.line_type)
                }
                Entity::Arc(arc) => canvas.arc(
                    arc.center,
                    arc.radius,
                    arc.start_angle,
                    arc.sweep(),
                    color,
                    layer.line_type,
                ),
                Entity::Polyline(polyline) => {
                    for pair in polyline.vertices.windows(2) {
                        canvas.line(pair[0], pair[1], color, layer.line_type);
                    }
                    if polyline.is_closed {
                        if let (Some(first), Some(last)) =
                            (polyline.vertices.first(), polyline.vertices.last())
                        {
                            canvas.line(*last, *first, color, layer.line_type);
                        }
                    }
                }
                Entity::Solid(solid) => {
                    let points = solid.corners.map(|corner| canvas.to_px(corner));
                    canvas.fill_polygon(&points, color);
                }
                Entity::Text(text) => {
                    if !canvas.text(text, color) {
                        skipped_text += 1;
                    }
                }
            }
        }
        if skipped_text > 0 {
            trace!(skipped_text, "文字过小，预览中省略");
        }
        debug!(width = self.width_px, height = height_px, scale, "预览图栅格化完成");
        Ok(canvas.image)
    }
}

impl DocumentSaver for PngPreview {
    fn save(&self, document: &Document, out: &mut dyn Write) -> Result<(), IoError> {
        let image = self.render(document)?;
        let encoder = PngEncoder::new(&mut *out);
        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )?;
        out.flush()?;
        Ok(())
    }
}

struct Canvas {
    image: RgbaImage,
    /// 画布左上角对应的图纸坐标。
    origin: Point2,
    scale: f64,
}

impl Canvas {
    #[inline]
    fn to_px(&self, point: Point2) -> (f64, f64) {
        (
            (point.x() - self.origin.x()) * self.scale,
            (self.origin.y() - point.y()) * self.scale,
        )
    }

    fn plot(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && (x as u64) < self.image.width() as u64 && (y as u64) < self.image.height() as u64 {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    fn line(&mut self, start: Point2, end: Point2, color: Rgba<u8>, line_type: LineType) {
        self.line_px(self.to_px(start), self.to_px(end), color, line_type);
    }

    /// Bresenham 直线，虚线与点划线按像素步数取样。
    fn line_px(&mut self, start: (f64, f64), end: (f64, f64), color: Rgba<u8>, line_type: LineType) {
        let (mut x, mut y) = (start.0.round() as i64, start.1.round() as i64);
        let (x1, y1) = (end.0.round() as i64, end.1.round() as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut step = 0usize;
        loop {
            if dash_visible(line_type, step) {
                self.plot(x, y, color);
            }
            if x == x1 && y == y1 {
                break;
            }
            let doubled = 2 * err;
            if doubled >= dy {
                err += dy;
                x += sx;
            }
            if doubled <= dx {
                err += dx;
                y += sy;
            }
            step += 1;
        }
    }

    fn arc(&mut self, center: Point2, radius: f64, start: f64, sweep: f64, color: Rgba<u8>, line_type: LineType) {
        let radius_px = radius.abs() * self.scale;
        let segments = ((radius_px * sweep / 2.0).ceil() as usize).clamp(8, 720);
        let point_at = |angle: f64| {
            Point2::new(
                center.x() + radius * angle.cos(),
                center.y() + radius * angle.sin(),
            )
        };
        let mut previous = self.to_px(point_at(start));
        for i in 1..=segments {
            let angle = start + sweep * i as f64 / segments as f64;
            let next = self.to_px(point_at(angle));
            self.line_px(previous, next, color, line_type);
            previous = next;
        }
    }

    /// 扫描线填充，按像素中心采样。
    fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgba<u8>) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        let first_row = (min_y - 0.5).ceil().max(0.0) as i64;
        let last_row = ((max_y - 0.5).floor() as i64).min(self.image.height() as i64 - 1);

        let mut crossings = Vec::with_capacity(points.len());
        for row in first_row..=last_row {
            let yc = row as f64 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (a, b) = (points[i], points[(i + 1) % points.len()]);
                if (a.1 <= yc && b.1 > yc) || (b.1 <= yc && a.1 > yc) {
                    let t = (yc - a.1) / (b.1 - a.1);
                    crossings.push(a.0 + t * (b.0 - a.0));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let from = (span[0] - 0.5).ceil() as i64;
                let to = (span[1] - 0.5).floor() as i64;
                for x in from..=to {
                    self.plot(x, row, color);
                }
            }
        }
    }

    /// 点阵文字，按文字高度缩放并绕插入点旋转。返回是否实际绘制。
    fn text(&mut self, text: &Text, color: Rgba<u8>) -> bool {
        let cell = text.height * self.scale / GLYPH_HEIGHT as f64;
        if cell < MIN_TEXT_CELL_PX || text.content.is_empty() {
            return false;
        }
        let columns = text.content.chars().count() * ADVANCE - 1;
        let start_u = match text.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => -(columns as f64) * cell * 0.5,
        };
        let (sin, cos) = text.rotation.sin_cos();
        let (ix, iy) = self.to_px(text.insert);
        // 局部坐标 (u 向右, v 向上) 旋转后转换为像素坐标（y 向下）。
        let place = |u: f64, v: f64| (ix + u * cos - v * sin, iy - (u * sin + v * cos));

        for (index, ch) in text.content.chars().enumerate() {
            for (col, row) in lit_cells(ch) {
                let u0 = start_u + ((index * ADVANCE + col) as f64) * cell;
                let v0 = ((GLYPH_HEIGHT - 1 - row) as f64) * cell;
                let quad = [
                    place(u0, v0),
                    place(u0 + cell, v0),
                    place(u0 + cell, v0 + cell),
                    place(u0, v0 + cell),
                ];
                if cell < 1.5 {
                    let (cx, cy) = place(u0 + cell * 0.5, v0 + cell * 0.5);
                    self.plot(cx.floor() as i64, cy.floor() as i64, color);
                } else {
                    self.fill_polygon(&quad, color);
                }
            }
        }
        true
    }
}

fn dash_visible(line_type: LineType, step: usize) -> bool {
    match line_type {
        LineType::Continuous => true,
        LineType::Dashed => step % 12 < 8,
        LineType::Center => {
            let phase = step % 24;
            phase < 14 || (17..20).contains(&phase)
        }
    }
}

#[cfg(test)]
mod tests {
    use fplan_core::document::{Document, LineType};
    use fplan_core::geometry::{Bounds2D, Point2};

    use super::*;

    fn sheet() -> Document {
        let mut doc = Document::new();
        doc.set_limits(Bounds2D::from_origin_size(0.0, 0.0, 10.0, 5.0));
        doc
    }

    #[test]
    fn canvas_follows_limits_aspect() {
        let image = PngPreview::new(200).render(&sheet()).expect("render");
        assert_eq!((image.width(), image.height()), (200, 100));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn solids_are_filled_with_layer_colour() {
        let mut doc = sheet();
        doc.define_layer("WALL", 1, LineType::Continuous);
        doc.add_solid(Bounds2D::from_origin_size(1.0, 1.0, 2.0, 2.0).corners(), "WALL");
        let image = PngPreview::new(200).render(&doc).expect("render");
        // (2,2) 米 → 像素 (40, 60)
        assert_eq!(*image.get_pixel(40, 60), aci_color(1));
        assert_eq!(*image.get_pixel(100, 60), BACKGROUND);
    }

    #[test]
    fn hidden_layers_are_not_drawn() {
        let mut doc = sheet();
        doc.define_layer("HIDDEN", 5, LineType::Continuous);
        if let Some(layer) = doc.layer_mut("HIDDEN") {
            layer.is_visible = false;
        }
        doc.add_line(Point2::new(0.0, 2.5), Point2::new(10.0, 2.5), "HIDDEN");
        let image = PngPreview::new(200).render(&doc).expect("render");
        assert!(image.pixels().all(|pixel| *pixel == BACKGROUND));
    }

    #[test]
    fn dashed_lines_leave_gaps() {
        let mut doc = sheet();
        doc.define_layer("EDGE", 7, LineType::Dashed);
        doc.add_line(Point2::new(0.0, 2.5), Point2::new(10.0, 2.5), "EDGE");
        let image = PngPreview::new(200).render(&doc).expect("render");
        let row = (0..200).filter(|x| *image.get_pixel(*x, 50) != BACKGROUND).count();
        assert!(row > 100 && row < 150, "{row}");
    }

    #[test]
    fn empty_document_without_limits_is_rejected() {
        let doc = Document::new();
        assert!(matches!(PngPreview::default().render(&doc), Err(IoError::InvalidDocument(_))));
    }

    #[test]
    fn aci_seven_is_black_on_white() {
        assert_eq!(aci_color(7), Rgba([0, 0, 0, 255]));
        assert_eq!(aci_color(-5), aci_color(5));
    }
}
