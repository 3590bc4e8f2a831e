use fplan_core::geometry::{Bounds2D, Point2};
use fplan_core::plan::FloorplanDocument;
use sha2::{Digest, Sha256};

use crate::errors::DrawingError;
use crate::layout::SheetLayout;

pub const MAX_ROW_HEIGHT_MM: f64 = 7.0;
const VALUE_COLUMN_MM: f64 = 30.0;
const NAME_COLUMN_MM: f64 = 12.0;
const AREA_COLUMN_MM: f64 = 82.0;
const CELL_PADDING_MM: f64 = 3.0;
/// 5×7 点阵字每字符前进 6 格，字宽约为字高的 6/7。
const CHAR_ADVANCE_RATIO: f64 = 6.0 / 7.0;
const ELLIPSIS: &str = "...";

/// `{preset}-{规范 JSON 的 SHA-256 前 8 位十六进制}`。
pub fn sheet_id(layout: &SheetLayout, document: &FloorplanDocument) -> Result<String, DrawingError> {
    let canonical = serde_json::to_string(&serde_json::to_value(document)?)?;
    let digest = Sha256::digest(canonical.as_bytes());
    let hex: String = digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect();
    Ok(format!("{}-{hex}", layout.preset.name))
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendRow {
    pub index: usize,
    pub name: String,
    pub area: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleCell {
    pub insert: Point2,
    pub content: String,
    pub height: f64,
}

/// 标题栏：外框、行分隔线与逐格文字，坐标均为图纸坐标。
#[derive(Debug, Clone, PartialEq)]
pub struct TitleBlock {
    pub frame: Bounds2D,
    pub row_height: f64,
    pub info: Vec<(String, String)>,
    pub legend: Vec<LegendRow>,
    pub separators: Vec<(Point2, Point2)>,
    pub cells: Vec<TitleCell>,
}

impl TitleBlock {
    pub fn row_count(&self) -> usize {
        self.info.len() + 1 + self.legend.len()
    }
}

#[derive(Debug, Clone)]
pub struct TitleBlockComposer {
    pub title: String,
}

impl TitleBlockComposer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn compose(&self, layout: &SheetLayout, document: &FloorplanDocument, sheet_id: &str) -> TitleBlock {
        let mut info = vec![
            ("TITLE".to_string(), self.title.clone()),
            ("SCALE".to_string(), layout.scale_label()),
            ("SHEET".to_string(), sheet_id.to_string()),
            (
                "LAND".to_string(),
                format!("{} x {} m", document.land_width, document.land_height),
            ),
            ("FLOORS".to_string(), document.floor_count.to_string()),
            ("STYLE".to_string(), document.style.as_str().to_uppercase()),
        ];
        if let Some(notes) = document.notes.as_deref().filter(|notes| !notes.trim().is_empty()) {
            info.push(("NOTES".to_string(), notes.trim().to_string()));
        }
        let legend: Vec<LegendRow> = document
            .rooms
            .iter()
            .enumerate()
            .map(|(index, room)| LegendRow {
                index: index + 1,
                name: room.display_name().to_string(),
                area: format!("{:.2} m2", room.area()),
            })
            .collect();

        let frame = layout.legend_area();
        let rows = info.len() + 1 + legend.len();
        let row_height = layout.paper(MAX_ROW_HEIGHT_MM).min(frame.height() / rows as f64);
        let text_height = row_height * 0.5;
        let left = frame.min().x();
        let right = frame.max().x();
        let top = frame.max().y();
        let padding = layout.paper(CELL_PADDING_MM);

        let mut cells = Vec::new();
        let mut separators = Vec::new();
        let baseline = |row: usize| top - row_height * (row as f64 + 1.0) + (row_height - text_height) * 0.5;
        let value_x = left + layout.paper(VALUE_COLUMN_MM);
        let name_x = left + layout.paper(NAME_COLUMN_MM);
        let area_x = left + layout.paper(AREA_COLUMN_MM);
        // 文字不越过本列右界（留出内边距）。
        let mut cell = |x: f64, limit: f64, row: usize, content: &str| {
            cells.push(TitleCell {
                insert: Point2::new(x, baseline(row)),
                content: fit_to_width(content, limit - padding - x, text_height),
                height: text_height,
            });
        };

        for (row, (key, value)) in info.iter().enumerate() {
            cell(left + padding, value_x, row, key);
            cell(value_x, right, row, value);
        }
        let header = info.len();
        cell(left + padding, name_x, header, "#");
        cell(name_x, area_x, header, "ROOM");
        cell(area_x, right, header, "AREA");
        for (offset, entry) in legend.iter().enumerate() {
            let row = header + 1 + offset;
            cell(left + padding, name_x, row, &entry.index.to_string());
            cell(name_x, area_x, row, &entry.name);
            cell(area_x, right, row, &entry.area);
        }

        for row in 1..=rows {
            let y = top - row_height * row as f64;
            separators.push((Point2::new(left, y), Point2::new(right, y)));
        }

        TitleBlock {
            frame,
            row_height,
            info,
            legend,
            separators,
            cells,
        }
    }
}

/// 按字符数截断到给定宽度，超出时以 `...` 结尾。
fn fit_to_width(content: &str, width: f64, height: f64) -> String {
    let advance = height * CHAR_ADVANCE_RATIO;
    if advance <= 0.0 {
        return content.to_string();
    }
    let max_chars = (width / advance).floor().max(0.0) as usize;
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return content.chars().take(max_chars).collect();
    }
    let mut fitted: String = content.chars().take(max_chars - ELLIPSIS.len()).collect();
    fitted.push_str(ELLIPSIS);
    fitted
}
