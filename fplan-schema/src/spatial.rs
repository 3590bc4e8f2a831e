use fplan_core::plan::{FloorplanDocument, Room};

/// 两房间在两个方向上的重叠都超过该值才视为冲突，共用墙线的浮点误差被容忍。
pub const OVERLAP_TOLERANCE: f64 = 0.05;

/// 边界包含判定的浮点容差。
const BOUNDARY_EPSILON: f64 = 1e-9;

/// 校验报告中的房间称呼：有名称用名称，否则使用序号。
pub fn room_label(room: &Room, index: usize) -> String {
    match room.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!("Room {index}"),
    }
}

pub fn check_overlaps(rooms: &[Room]) -> Vec<String> {
    let mut errors = Vec::new();
    for (i, first) in rooms.iter().enumerate() {
        for (j, second) in rooms.iter().enumerate().skip(i + 1) {
            let Some((overlap_w, overlap_h)) = first.bounds().overlap_extent(&second.bounds())
            else {
                continue;
            };
            if overlap_w > OVERLAP_TOLERANCE && overlap_h > OVERLAP_TOLERANCE {
                errors.push(format!(
                    "{} and {} overlap by {overlap_w:.2}m x {overlap_h:.2}m",
                    room_label(first, i),
                    room_label(second, j),
                ));
            }
        }
    }
    errors
}

/// 可达性的局部近似：每个房间至少有一扇门。
pub fn check_accessibility(rooms: &[Room]) -> Vec<String> {
    rooms
        .iter()
        .enumerate()
        .filter(|(_, room)| room.door_count() == 0)
        .map(|(index, room)| {
            format!(
                "{} has no doors - it must be accessible.",
                room_label(room, index)
            )
        })
        .collect()
}

pub fn check_boundaries(document: &FloorplanDocument) -> Vec<String> {
    let land_w = document.land_width;
    let land_h = document.land_height;
    document
        .rooms
        .iter()
        .enumerate()
        .filter(|(_, room)| {
            room.x < -BOUNDARY_EPSILON
                || room.y < -BOUNDARY_EPSILON
                || room.x + room.width > land_w + BOUNDARY_EPSILON
                || room.y + room.height > land_h + BOUNDARY_EPSILON
        })
        .map(|(index, room)| {
            format!(
                "{} is outside land boundaries ({land_w}x{land_h}).",
                room_label(room, index)
            )
        })
        .collect()
}

/// 依次执行重叠、可达性、边界三项检查，返回全部问题。
pub fn check_spatial_integrity(document: &FloorplanDocument) -> Vec<String> {
    let mut errors = check_overlaps(&document.rooms);
    errors.extend(check_accessibility(&document.rooms));
    errors.extend(check_boundaries(document));
    errors
}
