pub mod axes;
pub mod dimensions;
pub mod drawing;
pub mod geometry;
pub mod layout;
pub mod title_block;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum DrawingError {
        #[error("land size {width} x {height} cannot be laid out on a sheet")]
        DegenerateLand { width: f64, height: f64 },
        #[error("land size {width} x {height} exceeds every sheet at any representable scale")]
        FootprintTooLarge { width: f64, height: f64 },
        #[error("document could not be serialized for the sheet id: {0}")]
        Fingerprint(#[from] serde_json::Error),
    }
}

/// 语义图层：名称、ACI 颜色与线型。
pub mod layers {
    use fplan_core::document::{Document, LineType};

    pub const BOUNDARY: &str = "A-BOUNDARY";
    pub const WALL_EXTERIOR: &str = "A-WALL-EXT";
    pub const WALL_INTERIOR: &str = "A-WALL-INT";
    pub const COLUMNS: &str = "S-COLS";
    pub const DOORS: &str = "A-DOOR";
    pub const WINDOWS: &str = "A-GLAZ";
    pub const STAIRS: &str = "A-FLOR-STRS";
    pub const FURNITURE: &str = "A-FURN";
    pub const FIXTURES: &str = "P-FIXT";
    pub const LABELS: &str = "A-ANNO-TEXT";
    pub const DIMENSIONS: &str = "A-ANNO-DIMS";
    pub const AXES: &str = "S-GRID";
    pub const TITLE_BLOCK: &str = "A-ANNO-TTLB";

    pub const STANDARD_LAYERS: [(&str, i16, LineType); 13] = [
        (BOUNDARY, 9, LineType::Dashed),
        (WALL_EXTERIOR, 7, LineType::Continuous),
        (WALL_INTERIOR, 8, LineType::Continuous),
        (COLUMNS, 7, LineType::Continuous),
        (DOORS, 4, LineType::Continuous),
        (WINDOWS, 5, LineType::Continuous),
        (STAIRS, 6, LineType::Continuous),
        (FURNITURE, 30, LineType::Continuous),
        (FIXTURES, 3, LineType::Continuous),
        (LABELS, 3, LineType::Continuous),
        (DIMENSIONS, 1, LineType::Continuous),
        (AXES, 8, LineType::Center),
        (TITLE_BLOCK, 7, LineType::Continuous),
    ];

    pub fn define_standard_layers(document: &mut Document) {
        for (name, color, line_type) in STANDARD_LAYERS {
            document.define_layer(name, color, line_type);
        }
    }
}

pub use drawing::{Drawing, DrawingComposer, DrawingOptions};
pub use layout::{LayoutPlanner, SheetLayout, SheetPreset};
