use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use fplan_core::document::{Document, Entity, Text, TextAlign};
use fplan_core::geometry::{Bounds2D, Point2, Vector2};
use fplan_core::plan::{FloorplanDocument, Wall};
use tracing::{debug, info};

use crate::axes::AxisGrid;
use crate::dimensions::{DimensionAnnotation, DimensionAxis, DimensionChainBuilder, DimensionTier};
use crate::errors::DrawingError;
use crate::geometry::{GeometryBuilder, OpeningSymbol, RoomGeometry, Shape};
use crate::layers;
use crate::layout::{LayoutPlanner, SheetLayout};
use crate::title_block::{TitleBlock, TitleBlockComposer, sheet_id};

// 纸面尺寸（毫米），按比例换算为图纸坐标。
const LABEL_HEIGHT_MM: f64 = 3.5;
const AREA_HEIGHT_MM: f64 = 2.5;
const DIM_TEXT_MM: f64 = 2.5;
const DIM_CHAIN_OFFSET_MM: f64 = 10.0;
const DIM_OVERALL_OFFSET_MM: f64 = 20.0;
const DIM_EXTENSION_GAP_MM: f64 = 2.0;
const DIM_TICK_MM: f64 = 1.5;
const AXIS_BUBBLE_OFFSET_MM: f64 = 22.0;
const AXIS_BUBBLE_RADIUS_MM: f64 = 4.0;
const AXIS_START_MM: f64 = 4.0;
const AXIS_TEXT_MM: f64 = 3.5;
const ENTRANCE_ARROW_MM: f64 = 8.0;

#[derive(Debug, Clone)]
pub struct DrawingOptions {
    pub door_width: f64,
    pub window_width: f64,
    pub title: String,
}

impl Default for DrawingOptions {
    fn default() -> Self {
        Self {
            door_width: 0.9,
            window_width: 1.5,
            title: "FLOOR PLAN".to_string(),
        }
    }
}

/// 一次生成的全部版面决策与分层图元，两个后端共同消费。
#[derive(Debug, Clone)]
pub struct Drawing {
    pub layout: SheetLayout,
    pub sheet_id: String,
    pub rooms: Vec<RoomGeometry>,
    pub dimensions: Vec<DimensionAnnotation>,
    pub axes: AxisGrid,
    pub title_block: TitleBlock,
    pub document: Document,
}

#[derive(Debug, Clone, Default)]
pub struct DrawingComposer {
    options: DrawingOptions,
}

impl DrawingComposer {
    pub fn new(options: DrawingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DrawingOptions {
        &self.options
    }

    pub fn compose(&self, plan: &FloorplanDocument) -> Result<Drawing, DrawingError> {
        let layout = LayoutPlanner::new().plan(plan.land_width, plan.land_height)?;
        let sheet_id = sheet_id(&layout, plan)?;
        let rooms = GeometryBuilder::new(self.options.door_width, self.options.window_width).build(plan);
        let dimensions = DimensionChainBuilder::new().build(plan);
        let axes = AxisGrid::from_document(plan);
        let title_block = TitleBlockComposer::new(self.options.title.clone()).compose(&layout, plan, &sheet_id);

        let mut emitter = Emitter::new(layout);
        emitter.sheet_frame();
        emitter.land(plan);
        for room in &rooms {
            emitter.room(room);
        }
        emitter.entrance(plan);
        for annotation in &dimensions {
            emitter.dimension(annotation);
        }
        emitter.axes(&axes, plan);
        emitter.title_block(&title_block);

        let document = emitter.finish();
        info!(
            sheet = %sheet_id,
            preset = layout.preset.name,
            scale = layout.scale,
            rooms = rooms.len(),
            entities = document.entities().count(),
            "图纸组装完成"
        );
        Ok(Drawing {
            layout,
            sheet_id,
            rooms,
            dimensions,
            axes,
            title_block,
            document,
        })
    }
}

/// 把地块坐标下的几何转换到图纸坐标并写入分层文档。
struct Emitter {
    layout: SheetLayout,
    document: Document,
}

impl Emitter {
    fn new(layout: SheetLayout) -> Self {
        let mut document = Document::new();
        layers::define_standard_layers(&mut document);
        document.set_limits(layout.sheet_bounds());
        Self { layout, document }
    }

    fn finish(self) -> Document {
        self.document
    }

    #[inline]
    fn at(&self, point: Point2) -> Point2 {
        self.layout.to_sheet(point)
    }

    #[inline]
    fn mm(&self, value: f64) -> f64 {
        self.layout.paper(value)
    }

    fn line(&mut self, start: Point2, end: Point2, layer: &str) {
        let (start, end) = (self.at(start), self.at(end));
        self.document.add_line(start, end, layer);
    }

    fn rect(&mut self, bounds: &Bounds2D, layer: &str) {
        let bounds = self.layout.to_sheet_bounds(bounds);
        self.document.add_rectangle(&bounds, layer);
    }

    fn solid(&mut self, corners: [Point2; 4], layer: &str) {
        let corners = corners.map(|corner| self.at(corner));
        self.document.add_solid(corners, layer);
    }

    fn text(&mut self, insert: Point2, content: impl Into<String>, height: f64, rotation: f64, layer: &str) {
        let insert = self.at(insert);
        self.document.add_entity(Entity::Text(Text {
            insert,
            content: content.into(),
            height,
            rotation,
            align: TextAlign::Center,
            layer: layer.to_string(),
        }));
    }

    fn sheet_frame(&mut self) {
        let frame = self.layout.frame_bounds();
        self.document.add_rectangle(&frame, layers::TITLE_BLOCK);
    }

    fn land(&mut self, plan: &FloorplanDocument) {
        self.rect(&plan.land_bounds(), layers::BOUNDARY);
    }

    fn room(&mut self, room: &RoomGeometry) {
        let wall_layer = if room.exterior.any() {
            layers::WALL_EXTERIOR
        } else {
            layers::WALL_INTERIOR
        };
        self.rect(&room.outer, wall_layer);
        if let Some(inner) = &room.inner {
            self.rect(inner, layers::WALL_INTERIOR);
        }
        if let Some(fill) = room.fill {
            for quad in fill {
                self.solid(quad, wall_layer);
            }
        }
        for column in &room.columns {
            self.solid(column.corners(), layers::COLUMNS);
        }

        for fixture in &room.fixtures {
            let layer = if fixture.is_furniture() {
                layers::FURNITURE
            } else {
                layers::FIXTURES
            };
            for shape in &fixture.shapes {
                self.shape(shape, layer);
            }
        }

        if let Some(stairs) = &room.stairs {
            for (start, end) in &stairs.treads {
                self.line(*start, *end, layers::STAIRS);
            }
            self.line(stairs.landing.0, stairs.landing.1, layers::STAIRS);
            let arrow: Vec<Point2> = stairs.arrow.iter().map(|point| self.at(*point)).collect();
            self.document.add_polyline(arrow, false, layers::STAIRS);
        }

        for opening in &room.openings {
            match opening {
                OpeningSymbol::Door(door) => {
                    self.line(door.hinge, door.leaf_end, layers::DOORS);
                    let center = self.at(door.hinge);
                    self.document
                        .add_arc(center, door.radius, door.start_angle, door.end_angle, layers::DOORS);
                }
                OpeningSymbol::Window(window) => {
                    self.line(window.outer.0, window.outer.1, layers::WINDOWS);
                    self.line(window.glazing.0, window.glazing.1, layers::WINDOWS);
                }
            }
        }

        let anchor = room.label.anchor;
        let label_height = self.mm(LABEL_HEIGHT_MM);
        let area_height = self.mm(AREA_HEIGHT_MM);
        self.text(
            Point2::new(anchor.x(), anchor.y() + label_height * 0.3),
            room.label.name.clone(),
            label_height,
            0.0,
            layers::LABELS,
        );
        self.text(
            Point2::new(anchor.x(), anchor.y() - area_height * 1.5),
            room.label.area.clone(),
            area_height,
            0.0,
            layers::LABELS,
        );
    }

    fn shape(&mut self, shape: &Shape, layer: &str) {
        match shape {
            Shape::Rect(bounds) => self.rect(bounds, layer),
            Shape::Circle { center, radius } => {
                let center = self.at(*center);
                self.document.add_circle(center, *radius, layer);
            }
            Shape::Line(start, end) => self.line(*start, *end, layer),
        }
    }

    /// 入口方向标记：自地块外侧指向入口边中点的箭头加文字。
    fn entrance(&mut self, plan: &FloorplanDocument) {
        let (w, h) = (plan.land_width, plan.land_height);
        let (tip, outward) = match plan.entrance {
            Wall::North => (Point2::new(w * 0.5, h), Vector2::new(0.0, 1.0)),
            Wall::South => (Point2::new(w * 0.5, 0.0), Vector2::new(0.0, -1.0)),
            Wall::East => (Point2::new(w, h * 0.5), Vector2::new(1.0, 0.0)),
            Wall::West => (Point2::new(0.0, h * 0.5), Vector2::new(-1.0, 0.0)),
        };
        let length = self.mm(ENTRANCE_ARROW_MM);
        let head = length * 0.3;
        let tail = tip.translate(outward.scale(length));
        let back = tip.translate(outward.scale(head));
        let across = Vector2::new(-outward.y(), outward.x());
        let side = across.scale(head * 0.6);
        let points = [
            tail,
            tip,
            back.translate(side),
            tip,
            back.translate(side.scale(-1.0)),
        ]
        .map(|point| self.at(point));
        self.document.add_polyline(points, false, layers::LABELS);

        let text_height = self.mm(AREA_HEIGHT_MM);
        let label_at = tail.translate(across.scale(length * 1.3));
        self.text(label_at, "ENTRANCE", text_height, 0.0, layers::LABELS);
        debug!(wall = plan.entrance.as_str(), "已放置入口标记");
    }

    fn dimension(&mut self, annotation: &DimensionAnnotation) {
        let offset = match annotation.tier {
            DimensionTier::Chain => self.mm(DIM_CHAIN_OFFSET_MM),
            DimensionTier::Overall => self.mm(DIM_OVERALL_OFFSET_MM),
        };
        let gap = self.mm(DIM_EXTENSION_GAP_MM);
        let tick = self.mm(DIM_TICK_MM);
        let text_height = self.mm(DIM_TEXT_MM);
        let middle = (annotation.start + annotation.end) * 0.5;

        // 测量轴方向 along、指向标注线外侧的 away（平面下方或左侧）。
        let (point_at, along, away, rotation) = match annotation.axis {
            DimensionAxis::Horizontal => (
                (|s: f64, d: f64| Point2::new(s, -d)) as fn(f64, f64) -> Point2,
                Vector2::new(1.0, 0.0),
                Vector2::new(0.0, -1.0),
                0.0,
            ),
            DimensionAxis::Vertical => (
                (|s: f64, d: f64| Point2::new(-d, s)) as fn(f64, f64) -> Point2,
                Vector2::new(0.0, 1.0),
                Vector2::new(-1.0, 0.0),
                FRAC_PI_2,
            ),
        };

        self.line(
            point_at(annotation.start, offset),
            point_at(annotation.end, offset),
            layers::DIMENSIONS,
        );
        let diagonal = Vector2::from_angle(along.angle() + FRAC_PI_4).scale(tick);
        for station in [annotation.start, annotation.end] {
            self.line(point_at(station, gap), point_at(station, offset + gap), layers::DIMENSIONS);
            let center = point_at(station, offset);
            self.line(
                center.translate(diagonal.scale(-1.0)),
                center.translate(diagonal),
                layers::DIMENSIONS,
            );
        }
        let label_at = point_at(middle, offset).translate(away.scale(-text_height * 0.4));
        self.text(label_at, annotation.label.clone(), text_height, rotation, layers::DIMENSIONS);
    }

    fn axes(&mut self, grid: &AxisGrid, plan: &FloorplanDocument) {
        let start = self.mm(AXIS_START_MM);
        let bubble = self.mm(AXIS_BUBBLE_OFFSET_MM);
        let radius = self.mm(AXIS_BUBBLE_RADIUS_MM);
        let text_height = self.mm(AXIS_TEXT_MM);
        let (w, h) = (plan.land_width, plan.land_height);

        for axis in &grid.vertical {
            let x = axis.position;
            self.line(Point2::new(x, -start), Point2::new(x, h + bubble - radius), layers::AXES);
            let center = self.at(Point2::new(x, h + bubble));
            self.document.add_circle(center, radius, layers::AXES);
            self.text(
                Point2::new(x, h + bubble - text_height * 0.5),
                axis.label.clone(),
                text_height,
                0.0,
                layers::AXES,
            );
        }
        for axis in &grid.horizontal {
            let y = axis.position;
            self.line(Point2::new(-start, y), Point2::new(w + bubble - radius, y), layers::AXES);
            let center = self.at(Point2::new(w + bubble, y));
            self.document.add_circle(center, radius, layers::AXES);
            self.text(
                Point2::new(w + bubble, y - text_height * 0.5),
                axis.label.clone(),
                text_height,
                0.0,
                layers::AXES,
            );
        }
    }

    fn title_block(&mut self, block: &TitleBlock) {
        self.document.add_rectangle(&block.frame, layers::TITLE_BLOCK);
        for (start, end) in &block.separators {
            self.document.add_line(*start, *end, layers::TITLE_BLOCK);
        }
        for cell in &block.cells {
            self.document.add_text(
                cell.insert,
                cell.content.clone(),
                cell.height,
                TextAlign::Left,
                layers::TITLE_BLOCK,
            );
        }
    }
}
