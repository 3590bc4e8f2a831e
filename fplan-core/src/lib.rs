pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，单位为米。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，用于开口方向、墙体法线等。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        /// 由角度（弧度）构造单位向量。
        #[inline]
        pub fn from_angle(angle: f64) -> Self {
            Self(DVec2::from_angle(angle))
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn add(self, other: Vector2) -> Self {
            Self(self.0 + other.0)
        }

        /// 返回向量的极角（弧度，范围 `(-PI, PI]`）。
        #[inline]
        pub fn angle(self) -> f64 {
            self.0.y.atan2(self.0.x)
        }

        #[inline]
        pub fn cross(self, other: Vector2) -> f64 {
            self.0.perp_dot(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，同时充当房间、图纸区域的矩形表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        /// 以左下角与宽高构造矩形。
        #[inline]
        pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
            Self {
                min: Point2::new(x, y),
                max: Point2::new(x + width, y + height),
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }

        /// 判断 `other` 是否完全位于当前矩形内（含边界）。
        pub fn contains_bounds(&self, other: &Bounds2D) -> bool {
            other.min.x() >= self.min.x()
                && other.min.y() >= self.min.y()
                && other.max.x() <= self.max.x()
                && other.max.y() <= self.max.y()
        }

        /// 计算两矩形在 X/Y 方向上的重叠量；任一方向不重叠时返回 `None`。
        pub fn overlap_extent(&self, other: &Bounds2D) -> Option<(f64, f64)> {
            let overlap_w = self.max.x().min(other.max.x()) - self.min.x().max(other.min.x());
            let overlap_h = self.max.y().min(other.max.y()) - self.min.y().max(other.min.y());
            if overlap_w > 0.0 && overlap_h > 0.0 {
                Some((overlap_w, overlap_h))
            } else {
                None
            }
        }

        /// 按四边分别内缩，结果退化（宽或高不为正）时返回 `None`。
        pub fn inset(&self, left: f64, right: f64, bottom: f64, top: f64) -> Option<Bounds2D> {
            let inner = Bounds2D::new(
                Point2::new(self.min.x() + left, self.min.y() + bottom),
                Point2::new(self.max.x() - right, self.max.y() - top),
            );
            if inner.width() > 0.0 && inner.height() > 0.0 {
                Some(inner)
            } else {
                None
            }
        }

        /// 逆时针顺序的四个角点，从左下角开始。
        pub fn corners(&self) -> [Point2; 4] {
            [
                self.min,
                Point2::new(self.max.x(), self.min.y()),
                self.max,
                Point2::new(self.min.x(), self.max.y()),
            ]
        }

        pub fn translate(&self, offset: Vector2) -> Bounds2D {
            Bounds2D::new(self.min.translate(offset), self.max.translate(offset))
        }
    }
}

pub mod plan {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Bounds2D;

    /// 房间类型，取值与输入 JSON 中的字符串逐字对应。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RoomType {
        Bedroom,
        LivingRoom,
        Kitchen,
        Bathroom,
        Hall,
        Stairs,
        Office,
        Gym,
        Basement,
        Terrace,
        Balcony,
        Other,
    }

    impl RoomType {
        pub const ALL: [RoomType; 12] = [
            RoomType::Bedroom,
            RoomType::LivingRoom,
            RoomType::Kitchen,
            RoomType::Bathroom,
            RoomType::Hall,
            RoomType::Stairs,
            RoomType::Office,
            RoomType::Gym,
            RoomType::Basement,
            RoomType::Terrace,
            RoomType::Balcony,
            RoomType::Other,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                RoomType::Bedroom => "bedroom",
                RoomType::LivingRoom => "living_room",
                RoomType::Kitchen => "kitchen",
                RoomType::Bathroom => "bathroom",
                RoomType::Hall => "hall",
                RoomType::Stairs => "stairs",
                RoomType::Office => "office",
                RoomType::Gym => "gym",
                RoomType::Basement => "basement",
                RoomType::Terrace => "terrace",
                RoomType::Balcony => "balcony",
                RoomType::Other => "other",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Wall {
        North,
        South,
        East,
        West,
    }

    impl Wall {
        pub const ALL: [Wall; 4] = [Wall::North, Wall::South, Wall::East, Wall::West];

        pub fn as_str(self) -> &'static str {
            match self {
                Wall::North => "north",
                Wall::South => "south",
                Wall::East => "east",
                Wall::West => "west",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum OpeningKind {
        Door,
        Window,
    }

    impl OpeningKind {
        pub fn as_str(self) -> &'static str {
            match self {
                OpeningKind::Door => "door",
                OpeningKind::Window => "window",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
    pub enum Style {
        #[default]
        Modern,
        Classic,
    }

    impl Style {
        pub fn as_str(self) -> &'static str {
            match self {
                Style::Modern => "Modern",
                Style::Classic => "Classic",
            }
        }
    }

    /// 墙上的门或窗。`pos` 为沿墙、自该墙参考角点顺时针方向量取的偏移量。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Opening {
        #[serde(rename = "type")]
        pub kind: OpeningKind,
        pub wall: Wall,
        pub pos: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub width: Option<f64>,
    }

    impl Opening {
        #[inline]
        pub fn width_or(&self, default: f64) -> f64 {
            self.width.unwrap_or(default)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Room {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(rename = "type")]
        pub room_type: RoomType,
        pub x: f64,
        pub y: f64,
        pub width: f64,
        pub height: f64,
        #[serde(default)]
        pub separate: bool,
        #[serde(default)]
        pub openings: Vec<Opening>,
    }

    impl Room {
        /// 展示名称：优先使用 `name`，否则退化为房间类型。
        pub fn display_name(&self) -> &str {
            self.name
                .as_deref()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(self.room_type.as_str())
        }

        #[inline]
        pub fn area(&self) -> f64 {
            self.width * self.height
        }

        #[inline]
        pub fn bounds(&self) -> Bounds2D {
            Bounds2D::from_origin_size(self.x, self.y, self.width, self.height)
        }

        pub fn door_count(&self) -> usize {
            self.openings
                .iter()
                .filter(|opening| opening.kind == OpeningKind::Door)
                .count()
        }
    }

    /// 经过规范化与校验后的平面描述，生成阶段只读。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct FloorplanDocument {
        pub total_area: f64,
        pub land_width: f64,
        pub land_height: f64,
        pub floor_count: u32,
        pub rooms: Vec<Room>,
        pub entrance: Wall,
        pub style: Style,
        pub walls_thickness: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
    }

    impl FloorplanDocument {
        #[inline]
        pub fn land_bounds(&self) -> Bounds2D {
            Bounds2D::from_origin_size(0.0, 0.0, self.land_width, self.land_height)
        }
    }
}

pub mod document {
    use std::collections::BTreeMap;
    use std::f64::consts::{FRAC_PI_2, TAU};

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    pub enum LineType {
        #[default]
        Continuous,
        Dashed,
        Center,
    }

    impl LineType {
        pub fn dxf_name(self) -> &'static str {
            match self {
                LineType::Continuous => "CONTINUOUS",
                LineType::Dashed => "DASHED",
                LineType::Center => "CENTER",
            }
        }

        pub fn from_dxf_name(name: &str) -> Self {
            match name.trim().to_ascii_uppercase().as_str() {
                "DASHED" => LineType::Dashed,
                "CENTER" => LineType::Center,
                _ => LineType::Continuous,
            }
        }
    }

    /// 图层：名称、AutoCAD 颜色索引（ACI）与线型。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub color: i16,
        pub line_type: LineType,
        pub is_visible: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                color: 7,
                line_type: LineType::Continuous,
                is_visible: true,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Entity {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        Polyline(Polyline),
        Solid(Solid),
        Text(Text),
    }

    impl Entity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                Entity::Line(line) => &line.layer,
                Entity::Circle(circle) => &circle.layer,
                Entity::Arc(arc) => &arc.layer,
                Entity::Polyline(polyline) => &polyline.layer,
                Entity::Solid(solid) => &solid.layer,
                Entity::Text(text) => &text.layer,
            }
        }

        /// 实体类型名，与 DXF 实体关键字一致。
        pub fn kind(&self) -> &'static str {
            match self {
                Entity::Line(_) => "LINE",
                Entity::Circle(_) => "CIRCLE",
                Entity::Arc(_) => "ARC",
                Entity::Polyline(_) => "POLYLINE",
                Entity::Solid(_) => "SOLID",
                Entity::Text(_) => "TEXT",
            }
        }

        /// 计算实体的 2D 轴对齐范围，文本退化为插入点。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            match self {
                Entity::Line(line) => {
                    bounds.include_point(line.start);
                    bounds.include_point(line.end);
                }
                Entity::Circle(circle) => {
                    let radius = circle.radius.abs();
                    let center = circle.center;
                    bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
                    bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
                }
                Entity::Arc(arc) => arc_bounds(arc, &mut bounds),
                Entity::Polyline(polyline) => {
                    for point in &polyline.vertices {
                        bounds.include_point(*point);
                    }
                }
                Entity::Solid(solid) => {
                    for point in &solid.corners {
                        bounds.include_point(*point);
                    }
                }
                Entity::Text(text) => bounds.include_point(text.insert),
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub layer: String,
    }

    /// 圆弧实体，角度以弧度形式储存，自起始角逆时针扫至终止角。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
    }

    impl Arc {
        /// 逆时针扫掠角，范围 `(0, TAU]`。
        pub fn sweep(&self) -> f64 {
            let sweep = (self.end_angle - self.start_angle).rem_euclid(TAU);
            if sweep <= f64::EPSILON { TAU } else { sweep }
        }

        #[inline]
        pub fn point_at(&self, angle: f64) -> Point2 {
            Point2::new(
                self.center.x() + self.radius * angle.cos(),
                self.center.y() + self.radius * angle.sin(),
            )
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
        pub layer: String,
    }

    /// 实心四边形（对应 DXF SOLID），角点按轮廓顺序存储。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Solid {
        pub corners: [Point2; 4],
        pub layer: String,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    pub enum TextAlign {
        #[default]
        Left,
        Center,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
        pub rotation: f64,
        pub align: TextAlign,
        pub layer: String,
    }

    /// 与后端无关的图元集合。`limits` 记录图纸外框范围。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: BTreeMap<String, Layer>,
        entities: Vec<(EntityId, Entity)>,
        next_entity_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limits: Option<Bounds2D>,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        /// 定义或覆盖图层属性。
        pub fn define_layer(&mut self, name: impl Into<String>, color: i16, line_type: LineType) {
            let name = name.into();
            let layer = self
                .layers
                .entry(name.clone())
                .or_insert_with(|| Layer::new(name));
            layer.color = color;
            layer.line_type = line_type;
        }

        #[inline]
        pub fn layer(&self, name: &str) -> Option<&Layer> {
            self.layers.get(name)
        }

        #[inline]
        pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
            self.layers.get_mut(name)
        }

        pub fn add_line(
            &mut self,
            start: Point2,
            end: Point2,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.push(Entity::Line(Line { start, end, layer }))
        }

        pub fn add_circle(
            &mut self,
            center: Point2,
            radius: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.push(Entity::Circle(Circle {
                center,
                radius,
                layer,
            }))
        }

        pub fn add_arc(
            &mut self,
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.push(Entity::Arc(Arc {
                center,
                radius,
                start_angle,
                end_angle,
                layer,
            }))
        }

        pub fn add_polyline<I>(&mut self, vertices: I, is_closed: bool, layer: impl Into<String>) -> EntityId
        where
            I: IntoIterator<Item = Point2>,
        {
            let layer = layer.into();
            self.push(Entity::Polyline(Polyline {
                vertices: vertices.into_iter().collect(),
                is_closed,
                layer,
            }))
        }

        /// 以闭合多段线添加矩形。
        pub fn add_rectangle(&mut self, rect: &Bounds2D, layer: impl Into<String>) -> EntityId {
            self.add_polyline(rect.corners(), true, layer)
        }

        pub fn add_solid(&mut self, corners: [Point2; 4], layer: impl Into<String>) -> EntityId {
            let layer = layer.into();
            self.push(Entity::Solid(Solid { corners, layer }))
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            align: TextAlign,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.push(Entity::Text(Text {
                insert,
                content: content.into(),
                height,
                rotation: 0.0,
                align,
                layer,
            }))
        }

        pub fn add_entity(&mut self, entity: Entity) -> EntityId {
            self.push(entity)
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, Entity)> {
            self.entities.iter()
        }

        /// 指定图层上的实体。
        pub fn entities_on_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
            self.entities
                .iter()
                .map(|(_, entity)| entity)
                .filter(move |entity| entity.layer_name() == layer)
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&Entity> {
            self.entities
                .iter()
                .find_map(|(entity_id, entity)| (*entity_id == id).then_some(entity))
        }

        #[inline]
        pub fn set_limits(&mut self, limits: Bounds2D) {
            self.limits = Some(limits);
        }

        #[inline]
        pub fn limits(&self) -> Option<Bounds2D> {
            self.limits
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            for (_, entity) in &self.entities {
                if let Some(entity_bounds) = entity.bounds() {
                    bounds.include_bounds(&entity_bounds);
                }
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        fn push(&mut self, entity: Entity) -> EntityId {
            self.ensure_layer(entity.layer_name());
            let id = self.next_id();
            self.entities.push((id, entity));
            id
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

    fn arc_bounds(arc: &Arc, bounds: &mut Bounds2D) {
        let radius = arc.radius.abs();
        let sweep = arc.sweep();
        bounds.include_point(arc.point_at(arc.start_angle));
        bounds.include_point(arc.point_at(arc.start_angle + sweep));
        // 扫掠范围内经过的象限点同样是极值。
        let first_quadrant = (arc.start_angle / FRAC_PI_2).ceil() as i64;
        let mut k = first_quadrant;
        while (k as f64) * FRAC_PI_2 <= arc.start_angle + sweep + 1e-12 {
            let angle = k as f64 * FRAC_PI_2;
            bounds.include_point(Point2::new(
                arc.center.x() + radius * angle.cos(),
                arc.center.y() + radius * angle.sin(),
            ));
            k += 1;
        }
    }

}
