use fplan_core::plan::FloorplanDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    pub label: String,
    /// 轴线所在坐标：竖向轴为 x，横向轴为 y（地块坐标）。
    pub position: f64,
}

/// 结构轴网：竖向轴按数字编号，横向轴按字母编号。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisGrid {
    pub vertical: Vec<GridAxis>,
    pub horizontal: Vec<GridAxis>,
}

impl AxisGrid {
    pub fn from_document(document: &FloorplanDocument) -> Self {
        let xs = unique_edges(document.rooms.iter().flat_map(|room| [room.x, room.x + room.width]));
        let ys = unique_edges(document.rooms.iter().flat_map(|room| [room.y, room.y + room.height]));
        Self {
            vertical: xs
                .into_iter()
                .enumerate()
                .map(|(index, position)| GridAxis {
                    label: (index + 1).to_string(),
                    position,
                })
                .collect(),
            horizontal: ys
                .into_iter()
                .enumerate()
                .map(|(index, position)| GridAxis {
                    label: axis_letter(index),
                    position,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertical.len() + self.horizontal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unique_edges(edges: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut edges: Vec<f64> = edges.collect();
    edges.sort_by(f64::total_cmp);
    edges.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
    edges
}

/// 字母轴号，跳过易与数字混淆的 I 和 O；Z 之后依次为 AA、AB…ZZ、AAA，长度不限。
pub fn axis_letter(index: usize) -> String {
    const LETTERS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    let base = LETTERS.len();
    let mut reversed = Vec::new();
    let mut rest = index + 1;
    while rest > 0 {
        rest -= 1;
        reversed.push(LETTERS[rest % base] as char);
        rest /= base;
    }
    reversed.into_iter().rev().collect()
}
