use fplan_core::plan::FloorplanDocument;

/// 小于该间距的相邻边线不单独标注。
pub const MIN_DIMENSION_GAP: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionAxis {
    /// 沿 x 方向测量，绘制在平面下方。
    Horizontal,
    /// 沿 y 方向测量，绘制在平面左侧。
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionTier {
    Chain,
    Overall,
}

/// 一段尺寸标注，`start`/`end` 为沿测量轴的地块坐标。
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionAnnotation {
    pub axis: DimensionAxis,
    pub tier: DimensionTier,
    pub start: f64,
    pub end: f64,
    pub label: String,
}

impl DimensionAnnotation {
    fn new(axis: DimensionAxis, tier: DimensionTier, start: f64, end: f64) -> Self {
        Self {
            axis,
            tier,
            start,
            end,
            label: format_length(end - start),
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// 以米为单位的长度文本，去掉多余的尾随零：`5`、`2.5`、`3.75`。
pub fn format_length(value: f64) -> String {
    let text = format!("{value:.3}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" { "0".to_string() } else { trimmed.to_string() }
}

fn unique_sorted(mut edges: Vec<f64>) -> Vec<f64> {
    edges.sort_by(f64::total_cmp);
    edges.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    edges
}

#[derive(Debug, Clone, Copy)]
pub struct DimensionChainBuilder {
    pub min_gap: f64,
}

impl Default for DimensionChainBuilder {
    fn default() -> Self {
        Self {
            min_gap: MIN_DIMENSION_GAP,
        }
    }
}

impl DimensionChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn horizontal(&self, document: &FloorplanDocument) -> Vec<DimensionAnnotation> {
        let edges = document
            .rooms
            .iter()
            .flat_map(|room| [room.x, room.x + room.width])
            .collect();
        self.chain(DimensionAxis::Horizontal, unique_sorted(edges))
    }

    pub fn vertical(&self, document: &FloorplanDocument) -> Vec<DimensionAnnotation> {
        let edges = document
            .rooms
            .iter()
            .flat_map(|room| [room.y, room.y + room.height])
            .collect();
        self.chain(DimensionAxis::Vertical, unique_sorted(edges))
    }

    /// 水平链在前、竖直链在后。
    pub fn build(&self, document: &FloorplanDocument) -> Vec<DimensionAnnotation> {
        let mut annotations = self.horizontal(document);
        annotations.extend(self.vertical(document));
        annotations
    }

    fn chain(&self, axis: DimensionAxis, edges: Vec<f64>) -> Vec<DimensionAnnotation> {
        let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
            return Vec::new();
        };
        let mut annotations: Vec<DimensionAnnotation> = edges
            .windows(2)
            .filter(|pair| pair[1] - pair[0] > self.min_gap)
            .map(|pair| DimensionAnnotation::new(axis, DimensionTier::Chain, pair[0], pair[1]))
            .collect();
        if last - first > 0.0 {
            annotations.push(DimensionAnnotation::new(axis, DimensionTier::Overall, first, last));
        }
        annotations
    }
}
