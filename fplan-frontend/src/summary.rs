use fplan_core::plan::FloorplanDocument;

pub const SUMMARY_HEADING: &str = "Room dimensions:";

/// 交付给最终用户的逐房间尺寸清单，每行 `• 名称: 宽m x 高m`。
pub fn dimension_summary(document: &FloorplanDocument) -> Vec<String> {
    document
        .rooms
        .iter()
        .map(|room| format!("• {}: {}m x {}m", room.display_name(), room.width, room.height))
        .collect()
}
