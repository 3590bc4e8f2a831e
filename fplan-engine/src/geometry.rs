use std::f64::consts::PI;

use fplan_core::geometry::{Bounds2D, Point2, Vector2};
use fplan_core::plan::{FloorplanDocument, Opening, OpeningKind, Room, RoomType, Wall};
use tracing::debug;

/// 两条墙线视为共用的距离容差。
pub const SHARED_EDGE_TOLERANCE: f64 = 0.05;
/// 内墙每侧内缩量相对墙厚的比例（外墙内缩整个墙厚）。
pub const INTERIOR_INSET_RATIO: f64 = 0.25;
pub const DOOR_SWING_DEGREES: f64 = 30.0;
pub const TREAD_DEPTH: f64 = 0.28;
pub const MIN_TREADS: usize = 3;

/// 与后端无关的基础图形，坐标位于地块坐标系。
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(Bounds2D),
    Circle { center: Point2, radius: f64 },
    Line(Point2, Point2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Bed,
    Sink,
    Toilet,
    Stove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub kind: FixtureKind,
    pub shapes: Vec<Shape>,
}

impl Fixture {
    /// 床属于家具，其余属于卫浴/厨房设备。
    pub fn is_furniture(&self) -> bool {
        matches!(self.kind, FixtureKind::Bed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StairFlight {
    pub treads: Vec<(Point2, Point2)>,
    pub landing: (Point2, Point2),
    pub arrow: Vec<Point2>,
}

/// 门：门扇线自铰点以固定角度开向室内，外加半径等于门宽的开启弧线。
#[derive(Debug, Clone, PartialEq)]
pub struct DoorSymbol {
    pub wall: Wall,
    pub hinge: Point2,
    pub leaf_end: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// 窗：墙面线与向内偏移半个墙厚的玻璃线。
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSymbol {
    pub wall: Wall,
    pub outer: (Point2, Point2),
    pub glazing: (Point2, Point2),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpeningSymbol {
    Door(DoorSymbol),
    Window(WindowSymbol),
}

/// 房间四条边是否为外墙。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExteriorEdges {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl ExteriorEdges {
    pub fn any(&self) -> bool {
        self.north || self.south || self.east || self.west
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomLabel {
    pub anchor: Point2,
    pub name: String,
    pub area: String,
}

/// 单个房间分解后的全部几何。
#[derive(Debug, Clone, PartialEq)]
pub struct RoomGeometry {
    pub index: usize,
    pub outer: Bounds2D,
    pub exterior: ExteriorEdges,
    pub inner: Option<Bounds2D>,
    /// 内外轮廓之间的墙体填充，四个四边形组成一圈。
    pub fill: Option<[[Point2; 4]; 4]>,
    pub columns: [Bounds2D; 4],
    pub fixtures: Vec<Fixture>,
    pub stairs: Option<StairFlight>,
    pub openings: Vec<OpeningSymbol>,
    pub label: RoomLabel,
}

impl RoomGeometry {
    pub fn door_count(&self) -> usize {
        self.openings
            .iter()
            .filter(|symbol| matches!(symbol, OpeningSymbol::Door(_)))
            .count()
    }

    pub fn window_count(&self) -> usize {
        self.openings
            .iter()
            .filter(|symbol| matches!(symbol, OpeningSymbol::Window(_)))
            .count()
    }

    /// 布置设备时使用的净空区域。
    pub fn interior(&self) -> Bounds2D {
        self.inner.unwrap_or(self.outer)
    }
}

/// 墙的参考角点、顺时针走向、指向室内的法线与长度。
#[derive(Debug, Clone, Copy)]
pub struct WallFrame {
    pub reference: Point2,
    pub direction: Vector2,
    pub inward: Vector2,
    pub length: f64,
}

/// 顺时针约定：北墙自西北角向东，东墙自东北角向南，南墙自东南角向西，西墙自西南角向北。
pub fn wall_frame(bounds: &Bounds2D, wall: Wall) -> WallFrame {
    let (min, max) = (bounds.min(), bounds.max());
    match wall {
        Wall::North => WallFrame {
            reference: Point2::new(min.x(), max.y()),
            direction: Vector2::new(1.0, 0.0),
            inward: Vector2::new(0.0, -1.0),
            length: bounds.width(),
        },
        Wall::East => WallFrame {
            reference: max,
            direction: Vector2::new(0.0, -1.0),
            inward: Vector2::new(-1.0, 0.0),
            length: bounds.height(),
        },
        Wall::South => WallFrame {
            reference: Point2::new(max.x(), min.y()),
            direction: Vector2::new(-1.0, 0.0),
            inward: Vector2::new(0.0, 1.0),
            length: bounds.width(),
        },
        Wall::West => WallFrame {
            reference: min,
            direction: Vector2::new(0.0, 1.0),
            inward: Vector2::new(1.0, 0.0),
            length: bounds.height(),
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeometryBuilder {
    pub door_width: f64,
    pub window_width: f64,
}

impl Default for GeometryBuilder {
    fn default() -> Self {
        Self {
            door_width: 0.9,
            window_width: 1.5,
        }
    }
}

impl GeometryBuilder {
    pub fn new(door_width: f64, window_width: f64) -> Self {
        Self {
            door_width,
            window_width,
        }
    }

    pub fn build(&self, document: &FloorplanDocument) -> Vec<RoomGeometry> {
        document
            .rooms
            .iter()
            .enumerate()
            .map(|(index, room)| self.build_room(document, index, room))
            .collect()
    }

    pub fn build_room(&self, document: &FloorplanDocument, index: usize, room: &Room) -> RoomGeometry {
        let t = document.walls_thickness;
        let outer = room.bounds();
        let exterior = exterior_edges(document, index);

        let (inner, fill) = if room.width > 2.0 * t && room.height > 2.0 * t {
            let inset = |is_exterior: bool| {
                if is_exterior { t } else { t * INTERIOR_INSET_RATIO }
            };
            match outer.inset(
                inset(exterior.west),
                inset(exterior.east),
                inset(exterior.south),
                inset(exterior.north),
            ) {
                Some(inner) => (Some(inner), Some(ring_quads(&outer, &inner))),
                None => (None, None),
            }
        } else {
            debug!(room = room.display_name(), "房间过小，跳过内墙轮廓与墙体填充");
            (None, None)
        };

        let column_size = t.min(room.width * 0.5).min(room.height * 0.5);
        let columns = column_markers(&outer, column_size);

        let mut geometry = RoomGeometry {
            index,
            outer,
            exterior,
            inner,
            fill,
            columns,
            fixtures: Vec::new(),
            stairs: None,
            openings: Vec::new(),
            label: RoomLabel {
                anchor: outer.center(),
                name: room.display_name().to_uppercase(),
                area: format!("{:.2} m2", room.area()),
            },
        };

        let interior = geometry.interior();
        geometry.fixtures = fixtures_for(room.room_type, &interior);
        if room.room_type == RoomType::Stairs {
            geometry.stairs = Some(stair_flight(&interior));
        }
        geometry.openings = room
            .openings
            .iter()
            .filter_map(|opening| self.opening_symbol(&outer, opening, t))
            .collect();
        geometry
    }

    fn opening_symbol(&self, outer: &Bounds2D, opening: &Opening, t: f64) -> Option<OpeningSymbol> {
        let frame = wall_frame(outer, opening.wall);
        let default_width = match opening.kind {
            OpeningKind::Door => self.door_width,
            OpeningKind::Window => self.window_width,
        };
        let width = opening.width_or(default_width).min(frame.length);
        if width <= 0.0 {
            return None;
        }
        let pos = opening.pos.clamp(0.0, frame.length - width);
        if (pos - opening.pos).abs() > 1e-9 {
            debug!(wall = opening.wall.as_str(), requested = opening.pos, clamped = pos, "开口超出墙长，已收回墙内");
        }
        let start = frame.reference.translate(frame.direction.scale(pos));
        let end = start.translate(frame.direction.scale(width));

        Some(match opening.kind {
            OpeningKind::Door => {
                let swing = DOOR_SWING_DEGREES.to_radians();
                let leaf = frame
                    .direction
                    .scale(swing.cos())
                    .add(frame.inward.scale(swing.sin()));
                let leaf_end = start.translate(leaf.scale(width));
                let wall_angle = frame.direction.angle();
                let leaf_angle = leaf.angle();
                // 圆弧按逆时针存储，起止角取决于室内位于墙走向的哪一侧。
                let (start_angle, end_angle) = if frame.direction.cross(frame.inward) > 0.0 {
                    (wall_angle, leaf_angle)
                } else {
                    (leaf_angle, wall_angle)
                };
                OpeningSymbol::Door(DoorSymbol {
                    wall: opening.wall,
                    hinge: start,
                    leaf_end,
                    radius: width,
                    start_angle: normalize_angle(start_angle),
                    end_angle: normalize_angle(end_angle),
                })
            }
            OpeningKind::Window => {
                let offset = frame.inward.scale(t * 0.5);
                OpeningSymbol::Window(WindowSymbol {
                    wall: opening.wall,
                    outer: (start, end),
                    glazing: (start.translate(offset), end.translate(offset)),
                })
            }
        })
    }
}

fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(2.0 * PI)
}

/// 边是否与其他房间共用：共线（容差内）且沿边方向重叠超过容差。
fn exterior_edges(document: &FloorplanDocument, index: usize) -> ExteriorEdges {
    let room = document.rooms[index].bounds();
    let others: Vec<Bounds2D> = document
        .rooms
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != index)
        .map(|(_, other)| other.bounds())
        .collect();

    let span_overlap = |a0: f64, a1: f64, b0: f64, b1: f64| a1.min(b1) - a0.max(b0);
    let shared_horizontal = |y: f64| {
        others.iter().any(|other| {
            ((other.min().y() - y).abs() <= SHARED_EDGE_TOLERANCE
                || (other.max().y() - y).abs() <= SHARED_EDGE_TOLERANCE)
                && span_overlap(room.min().x(), room.max().x(), other.min().x(), other.max().x())
                    > SHARED_EDGE_TOLERANCE
        })
    };
    let shared_vertical = |x: f64| {
        others.iter().any(|other| {
            ((other.min().x() - x).abs() <= SHARED_EDGE_TOLERANCE
                || (other.max().x() - x).abs() <= SHARED_EDGE_TOLERANCE)
                && span_overlap(room.min().y(), room.max().y(), other.min().y(), other.max().y())
                    > SHARED_EDGE_TOLERANCE
        })
    };

    ExteriorEdges {
        north: !shared_horizontal(room.max().y()),
        south: !shared_horizontal(room.min().y()),
        east: !shared_vertical(room.max().x()),
        west: !shared_vertical(room.min().x()),
    }
}

fn ring_quads(outer: &Bounds2D, inner: &Bounds2D) -> [[Point2; 4]; 4] {
    let [o_sw, o_se, o_ne, o_nw] = outer.corners();
    let [i_sw, i_se, i_ne, i_nw] = inner.corners();
    [
        [o_sw, o_se, i_se, i_sw],
        [o_se, o_ne, i_ne, i_se],
        [o_ne, o_nw, i_nw, i_ne],
        [o_nw, o_sw, i_sw, i_nw],
    ]
}

fn column_markers(outer: &Bounds2D, size: f64) -> [Bounds2D; 4] {
    let (min, max) = (outer.min(), outer.max());
    [
        Bounds2D::from_origin_size(min.x(), min.y(), size, size),
        Bounds2D::from_origin_size(max.x() - size, min.y(), size, size),
        Bounds2D::from_origin_size(max.x() - size, max.y() - size, size, size),
        Bounds2D::from_origin_size(min.x(), max.y() - size, size, size),
    ]
}

const BED_WIDTH: f64 = 1.6;
const BED_LENGTH: f64 = 2.0;
const PILLOW_WIDTH: f64 = 0.6;
const PILLOW_DEPTH: f64 = 0.35;
const WALL_GAP: f64 = 0.1;

fn fixtures_for(room_type: RoomType, interior: &Bounds2D) -> Vec<Fixture> {
    let fixtures = match room_type {
        RoomType::Bedroom => bed(interior).into_iter().collect(),
        RoomType::Bathroom => bathroom_fixtures(interior),
        RoomType::Kitchen => stove(interior).into_iter().collect(),
        _ => Vec::new(),
    };
    if fixtures.is_empty() && matches!(room_type, RoomType::Bedroom | RoomType::Bathroom | RoomType::Kitchen) {
        debug!(room_type = room_type.as_str(), "净空不足，跳过家具/设备");
    }
    fixtures
}

fn bed(interior: &Bounds2D) -> Option<Fixture> {
    if interior.width() < BED_WIDTH + 0.4 || interior.height() < BED_LENGTH + 0.4 {
        return None;
    }
    let center_x = interior.center().x();
    let head = interior.max().y() - WALL_GAP;
    let frame = Bounds2D::from_origin_size(center_x - BED_WIDTH * 0.5, head - BED_LENGTH, BED_WIDTH, BED_LENGTH);
    let pillow_y = head - WALL_GAP - PILLOW_DEPTH;
    let fold_y = head - 0.6;
    Some(Fixture {
        kind: FixtureKind::Bed,
        shapes: vec![
            Shape::Rect(frame),
            Shape::Rect(Bounds2D::from_origin_size(center_x - 0.7, pillow_y, PILLOW_WIDTH, PILLOW_DEPTH)),
            Shape::Rect(Bounds2D::from_origin_size(center_x + 0.1, pillow_y, PILLOW_WIDTH, PILLOW_DEPTH)),
            Shape::Line(
                Point2::new(frame.min().x(), fold_y),
                Point2::new(frame.max().x(), fold_y),
            ),
        ],
    })
}

fn bathroom_fixtures(interior: &Bounds2D) -> Vec<Fixture> {
    if interior.width() < 1.2 || interior.height() < 0.8 {
        return Vec::new();
    }
    let top = interior.max().y() - 0.05;
    let sink = Bounds2D::from_origin_size(interior.min().x() + WALL_GAP, top - 0.4, 0.5, 0.4);
    let tank = Bounds2D::from_origin_size(interior.max().x() - 0.6, top - 0.2, 0.5, 0.2);
    let bowl_center = Point2::new(tank.center().x(), tank.min().y() - 0.2);
    vec![
        Fixture {
            kind: FixtureKind::Sink,
            shapes: vec![
                Shape::Rect(sink),
                Shape::Circle {
                    center: sink.center(),
                    radius: 0.14,
                },
            ],
        },
        Fixture {
            kind: FixtureKind::Toilet,
            shapes: vec![
                Shape::Rect(tank),
                Shape::Circle {
                    center: bowl_center,
                    radius: 0.2,
                },
            ],
        },
    ]
}

fn stove(interior: &Bounds2D) -> Option<Fixture> {
    if interior.width() < 0.8 || interior.height() < 0.8 {
        return None;
    }
    let body = Bounds2D::from_origin_size(
        interior.max().x() - 0.7,
        interior.max().y() - 0.65,
        0.6,
        0.6,
    );
    let mut shapes = vec![Shape::Rect(body)];
    for (fx, fy) in [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)] {
        shapes.push(Shape::Circle {
            center: Point2::new(
                body.min().x() + body.width() * fx,
                body.min().y() + body.height() * fy,
            ),
            radius: 0.08,
        });
    }
    Some(Fixture {
        kind: FixtureKind::Stove,
        shapes,
    })
}

/// 踏步线沿高度方向均匀分布并横跨房间宽度，另有中间平台线与上行箭头。
pub fn stair_flight(interior: &Bounds2D) -> StairFlight {
    let (min, max) = (interior.min(), interior.max());
    let count = ((interior.height() / TREAD_DEPTH).floor() as usize).max(MIN_TREADS);
    let step = interior.height() / (count as f64 + 1.0);
    let treads = (1..=count)
        .map(|i| {
            let y = min.y() + step * i as f64;
            (Point2::new(min.x(), y), Point2::new(max.x(), y))
        })
        .collect();
    let mid_y = min.y() + interior.height() * 0.5;
    let center_x = interior.center().x();
    let tail = min.y() + interior.height() * 0.1;
    let tip = min.y() + interior.height() * 0.9;
    let head = (interior.width() / 6.0).min(0.25);
    StairFlight {
        treads,
        landing: (Point2::new(min.x(), mid_y), Point2::new(max.x(), mid_y)),
        arrow: vec![
            Point2::new(center_x, tail),
            Point2::new(center_x, tip),
            Point2::new(center_x - head, tip - head),
            Point2::new(center_x, tip),
            Point2::new(center_x + head, tip - head),
        ],
    }
}
