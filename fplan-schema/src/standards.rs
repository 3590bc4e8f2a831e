use fplan_core::plan::{FloorplanDocument, RoomType};

use crate::spatial::room_label;

/// 住宅房间最小面积（平方米），未列出的类型不设下限。
pub const MIN_ROOM_AREAS: &[(RoomType, f64)] = &[
    (RoomType::LivingRoom, 12.0),
    (RoomType::Bedroom, 9.0),
    (RoomType::Kitchen, 6.0),
    (RoomType::Bathroom, 1.8),
    (RoomType::Hall, 2.0),
    (RoomType::Stairs, 4.0),
    (RoomType::Basement, 6.0),
    (RoomType::Terrace, 4.0),
];

pub fn minimum_area(room_type: RoomType) -> f64 {
    MIN_ROOM_AREAS
        .iter()
        .find(|(candidate, _)| *candidate == room_type)
        .map(|(_, area)| *area)
        .unwrap_or(0.0)
}

pub fn check_standards(document: &FloorplanDocument) -> Vec<String> {
    document
        .rooms
        .iter()
        .enumerate()
        .filter_map(|(index, room)| {
            let area = room.area();
            let min_area = minimum_area(room.room_type);
            (area < min_area).then(|| {
                format!(
                    "{} area ({area:.1}m2) is below standard ({min_area}m2).",
                    room_label(room, index)
                )
            })
        })
        .collect()
}
