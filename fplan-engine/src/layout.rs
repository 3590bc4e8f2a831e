use fplan_core::geometry::{Bounds2D, Point2, Vector2};
use tracing::debug;

use crate::errors::DrawingError;

/// 物理图幅（横向，单位毫米）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetPreset {
    pub name: &'static str,
    pub width_mm: f64,
    pub height_mm: f64,
}

pub const SHEET_PRESETS: [SheetPreset; 3] = [
    SheetPreset {
        name: "A3",
        width_mm: 420.0,
        height_mm: 297.0,
    },
    SheetPreset {
        name: "A2",
        width_mm: 594.0,
        height_mm: 420.0,
    },
    SheetPreset {
        name: "A1",
        width_mm: 841.0,
        height_mm: 594.0,
    },
];

/// 每种图幅依次尝试的比例分母。
pub const CANDIDATE_SCALES: [u32; 2] = [50, 100];
/// 所有图幅都放不下时，最大图幅上继续尝试的比例。
pub const FALLBACK_SCALES: [u32; 3] = [200, 500, 1000];

pub const MARGIN_LEFT_MM: f64 = 20.0;
pub const MARGIN_MM: f64 = 10.0;
pub const LEGEND_COLUMN_MM: f64 = 120.0;
/// 平面四周为尺寸链与轴网保留的纸面距离。
pub const CLEARANCE_MM: f64 = 30.0;

/// 版面决策：图幅、比例以及地块原点在图纸坐标中的偏移。
///
/// 图纸坐标以米为单位（模型空间 1:1），纸面尺寸按 `mm × scale / 1000` 换算。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetLayout {
    pub preset: SheetPreset,
    pub scale: u32,
    pub offset: Vector2,
}

impl SheetLayout {
    fn new(preset: SheetPreset, scale: u32, land_width: f64, land_height: f64) -> Self {
        let mut layout = Self {
            preset,
            scale,
            offset: Vector2::new(0.0, 0.0),
        };
        let area = layout.drawing_area();
        let center = area.center();
        layout.offset = Vector2::new(
            center.x() - land_width * 0.5,
            center.y() - land_height * 0.5,
        );
        layout
    }

    /// 纸面毫米换算为图纸坐标（米）。
    #[inline]
    pub fn paper(&self, mm: f64) -> f64 {
        mm * self.scale as f64 / 1000.0
    }

    pub fn scale_label(&self) -> String {
        format!("1:{}", self.scale)
    }

    pub fn sheet_bounds(&self) -> Bounds2D {
        Bounds2D::from_origin_size(
            0.0,
            0.0,
            self.paper(self.preset.width_mm),
            self.paper(self.preset.height_mm),
        )
    }

    /// 图框（扣除页边距）。
    pub fn frame_bounds(&self) -> Bounds2D {
        let sheet = self.sheet_bounds();
        sheet
            .inset(
                self.paper(MARGIN_LEFT_MM),
                self.paper(MARGIN_MM),
                self.paper(MARGIN_MM),
                self.paper(MARGIN_MM),
            )
            .unwrap_or(sheet)
    }

    /// 可用绘图区：图框减去右侧图例栏。
    pub fn drawing_area(&self) -> Bounds2D {
        let frame = self.frame_bounds();
        Bounds2D::new(
            frame.min(),
            Point2::new(frame.max().x() - self.paper(LEGEND_COLUMN_MM), frame.max().y()),
        )
    }

    /// 右侧为标题栏保留的列。
    pub fn legend_area(&self) -> Bounds2D {
        let frame = self.frame_bounds();
        Bounds2D::new(
            Point2::new(frame.max().x() - self.paper(LEGEND_COLUMN_MM), frame.min().y()),
            frame.max(),
        )
    }

    /// 地块坐标 → 图纸坐标。
    #[inline]
    pub fn to_sheet(&self, point: Point2) -> Point2 {
        point.translate(self.offset)
    }

    #[inline]
    pub fn to_sheet_bounds(&self, bounds: &Bounds2D) -> Bounds2D {
        bounds.translate(self.offset)
    }
}

fn fits(preset: &SheetPreset, scale: u32, land_width: f64, land_height: f64) -> bool {
    let usable_w = preset.width_mm - MARGIN_LEFT_MM - MARGIN_MM - LEGEND_COLUMN_MM;
    let usable_h = preset.height_mm - 2.0 * MARGIN_MM;
    let needed_w = land_width * 1000.0 / scale as f64 + 2.0 * CLEARANCE_MM;
    let needed_h = land_height * 1000.0 / scale as f64 + 2.0 * CLEARANCE_MM;
    needed_w <= usable_w && needed_h <= usable_h
}

/// 由地块尺寸确定图幅与比例，纯函数，相同输入总得到相同结果。
#[derive(Debug, Default, Clone, Copy)]
pub struct LayoutPlanner;

impl LayoutPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, land_width: f64, land_height: f64) -> Result<SheetLayout, DrawingError> {
        if !(land_width.is_finite() && land_height.is_finite())
            || land_width <= 0.0
            || land_height <= 0.0
        {
            return Err(DrawingError::DegenerateLand {
                width: land_width,
                height: land_height,
            });
        }

        for preset in &SHEET_PRESETS {
            for scale in CANDIDATE_SCALES {
                if fits(preset, scale, land_width, land_height) {
                    debug!(preset = preset.name, scale, "选定图幅");
                    return Ok(SheetLayout::new(*preset, scale, land_width, land_height));
                }
            }
        }

        let largest = SHEET_PRESETS[SHEET_PRESETS.len() - 1];
        let scale = match FALLBACK_SCALES
            .into_iter()
            .find(|scale| fits(&largest, *scale, land_width, land_height))
        {
            Some(scale) => scale,
            None => extended_scale(&largest, land_width, land_height)?,
        };
        debug!(preset = largest.name, scale, "地块超出常规图幅，使用最大图幅");
        Ok(SheetLayout::new(largest, scale, land_width, land_height))
    }
}

/// 1:1000 仍放不下时，按 1-2-5 序列继续放大比例，直到最大图幅能容纳平面。
fn extended_scale(preset: &SheetPreset, land_width: f64, land_height: f64) -> Result<u32, DrawingError> {
    let usable_w = preset.width_mm - MARGIN_LEFT_MM - MARGIN_MM - LEGEND_COLUMN_MM - 2.0 * CLEARANCE_MM;
    let usable_h = preset.height_mm - 2.0 * MARGIN_MM - 2.0 * CLEARANCE_MM;
    let required = (land_width * 1000.0 / usable_w).max(land_height * 1000.0 / usable_h);

    let mut decade = 1000.0_f64;
    while decade <= u32::MAX as f64 {
        for step in [1.0, 2.0, 5.0] {
            let scale = decade * step;
            if scale >= required && scale <= u32::MAX as f64 {
                let scale = scale as u32;
                if fits(preset, scale, land_width, land_height) {
                    return Ok(scale);
                }
            }
        }
        decade *= 10.0;
    }
    Err(DrawingError::FootprintTooLarge {
        width: land_width,
        height: land_height,
    })
}
