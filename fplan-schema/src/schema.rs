use serde_json::{Value, json};

/// 声明式的结构契约节点。默认值以构造函数保存，每次规范化都会生成新的值。
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub default: Option<fn() -> Value>,
    pub allowed: Option<&'static [&'static str]>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    Object(ObjectSchema),
    Array(Box<SchemaNode>),
    Number,
    Integer,
    String,
    Boolean,
}

impl SchemaKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::Object(_) => "object",
            SchemaKind::Array(_) => "array",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::String => "string",
            SchemaKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub properties: Vec<(&'static str, SchemaNode)>,
    pub required: &'static [&'static str],
}

impl SchemaNode {
    fn with_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            default: None,
            allowed: None,
            minimum: None,
            exclusive_minimum: None,
        }
    }

    pub fn object(properties: Vec<(&'static str, SchemaNode)>, required: &'static [&'static str]) -> Self {
        Self::with_kind(SchemaKind::Object(ObjectSchema {
            properties,
            required,
        }))
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::with_kind(SchemaKind::Array(Box::new(items)))
    }

    pub fn number() -> Self {
        Self::with_kind(SchemaKind::Number)
    }

    pub fn integer() -> Self {
        Self::with_kind(SchemaKind::Integer)
    }

    pub fn string() -> Self {
        Self::with_kind(SchemaKind::String)
    }

    pub fn boolean() -> Self {
        Self::with_kind(SchemaKind::Boolean)
    }

    pub fn with_default(mut self, default: fn() -> Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn at_least(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn greater_than(mut self, bound: f64) -> Self {
        self.exclusive_minimum = Some(bound);
        self
    }

    /// 生成一份新的默认值。
    #[inline]
    pub fn fresh_default(&self) -> Option<Value> {
        self.default.map(|make| make())
    }
}

pub const ROOM_TYPES: &[&str] = &[
    "bedroom",
    "living_room",
    "kitchen",
    "bathroom",
    "hall",
    "stairs",
    "office",
    "gym",
    "basement",
    "terrace",
    "balcony",
    "other",
];
pub const OPENING_KINDS: &[&str] = &["door", "window"];
pub const WALLS: &[&str] = &["north", "south", "east", "west"];
pub const STYLES: &[&str] = &["Modern", "Classic"];

pub const DEFAULT_TOTAL_AREA: f64 = 100.0;
pub const DEFAULT_FLOOR_COUNT: u32 = 1;
pub const DEFAULT_ENTRANCE: &str = "south";
pub const DEFAULT_STYLE: &str = "Modern";
pub const DEFAULT_WALLS_THICKNESS: f64 = 0.3;

fn opening_schema() -> SchemaNode {
    SchemaNode::object(
        vec![
            ("type", SchemaNode::string().one_of(OPENING_KINDS)),
            ("wall", SchemaNode::string().one_of(WALLS)),
            ("pos", SchemaNode::number().at_least(0.0)),
            ("width", SchemaNode::number().greater_than(0.0)),
        ],
        &["type", "wall", "pos"],
    )
}

fn room_schema() -> SchemaNode {
    SchemaNode::object(
        vec![
            ("name", SchemaNode::string()),
            ("type", SchemaNode::string().one_of(ROOM_TYPES)),
            ("x", SchemaNode::number()),
            ("y", SchemaNode::number()),
            ("width", SchemaNode::number().greater_than(0.0)),
            ("height", SchemaNode::number().greater_than(0.0)),
            ("separate", SchemaNode::boolean().with_default(|| json!(false))),
            (
                "openings",
                SchemaNode::array(opening_schema()).with_default(|| json!([])),
            ),
        ],
        &["type", "x", "y", "width", "height"],
    )
}

/// 平面描述文档的完整结构契约。
pub fn floorplan_schema() -> SchemaNode {
    SchemaNode::object(
        vec![
            (
                "total_area",
                SchemaNode::number().with_default(|| json!(DEFAULT_TOTAL_AREA)),
            ),
            ("land_width", SchemaNode::number().greater_than(0.0)),
            ("land_height", SchemaNode::number().greater_than(0.0)),
            (
                "floor_count",
                SchemaNode::integer()
                    .at_least(1.0)
                    .with_default(|| json!(DEFAULT_FLOOR_COUNT)),
            ),
            (
                "rooms",
                SchemaNode::array(room_schema()).with_default(|| json!([])),
            ),
            (
                "entrance",
                SchemaNode::string()
                    .one_of(WALLS)
                    .with_default(|| json!(DEFAULT_ENTRANCE)),
            ),
            (
                "style",
                SchemaNode::string()
                    .one_of(STYLES)
                    .with_default(|| json!(DEFAULT_STYLE)),
            ),
            (
                "walls_thickness",
                SchemaNode::number()
                    .greater_than(0.0)
                    .with_default(|| json!(DEFAULT_WALLS_THICKNESS)),
            ),
            ("notes", SchemaNode::string()),
        ],
        &["land_width", "land_height", "rooms"],
    )
}
