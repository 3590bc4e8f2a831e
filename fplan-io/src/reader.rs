use fplan_core::document::{
    Arc, Circle, Document, Entity, Line, LineType, Polyline, Solid, Text, TextAlign,
};
use fplan_core::geometry::{Bounds2D, Point2};
use tracing::trace;

#[derive(Debug)]
pub(crate) enum DxfError {
    Unsupported { feature: String },
    Invalid { message: String },
}

impl DxfError {
    fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// 解析本库写出的 R12 子集：HEADER 中的图限、LAYER 表与常用实体。
pub(crate) struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    pub(crate) fn parse(mut self) -> Result<Document, DxfError> {
        let mut document = Document::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.as_str() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.as_str() {
                        "HEADER" => self.parse_header(&mut document)?,
                        "TABLES" => self.parse_tables(&mut document)?,
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_header(&mut self, document: &mut Document) -> Result<(), DxfError> {
        let mut limit_min = None;
        let mut limit_max = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value == "ENDSEC" => break,
                Some((9, variable)) => {
                    let fields = Fields::new(self.header_values()?, &variable);
                    match variable.as_str() {
                        "$LIMMIN" => limit_min = Some(fields.point(10)?),
                        "$LIMMAX" => limit_max = Some(fields.point(10)?),
                        _ => {}
                    }
                }
                Some(_) => continue,
                None => return Err(DxfError::invalid("HEADER 段提前结束")),
            }
        }
        if let (Some(min), Some(max)) = (limit_min, limit_max) {
            document.set_limits(Bounds2D::new(min, max));
        }
        Ok(())
    }

    fn parse_tables(&mut self, document: &mut Document) -> Result<(), DxfError> {
        let mut current_table = String::new();
        loop {
            let (code, value) = self
                .reader
                .next_pair()?
                .ok_or_else(|| DxfError::invalid("TABLES 段提前结束"))?;
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "TABLES 段遇到组码 {code}（期望 0 表示表或记录起始）"
                )));
            }
            match value.as_str() {
                "ENDSEC" => break,
                "TABLE" => {
                    let fields = Fields::new(self.body()?, "TABLE");
                    current_table = fields.text(2).unwrap_or_default().to_string();
                }
                "ENDTAB" => current_table.clear(),
                "LAYER" if current_table == "LAYER" => {
                    let fields = Fields::new(self.body()?, "LAYER");
                    let name = fields
                        .text(2)
                        .ok_or_else(|| DxfError::invalid("LAYER 缺少名称（组码 2）"))?
                        .trim()
                        .to_string();
                    let color = fields.i16(62)?.unwrap_or(7);
                    let line_type = fields
                        .text(6)
                        .map(LineType::from_dxf_name)
                        .unwrap_or_default();
                    document.define_layer(name.clone(), color.abs(), line_type);
                    if let Some(layer) = document.layer_mut(&name) {
                        layer.is_visible = color >= 0;
                    }
                }
                _ => {
                    self.body()?;
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, document: &mut Document) -> Result<(), DxfError> {
        loop {
            let (code, value) = self
                .reader
                .next_pair()?
                .ok_or_else(|| DxfError::invalid("ENTITIES 段提前结束"))?;
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }
            match value.as_str() {
                "ENDSEC" => break,
                "POLYLINE" => {
                    let polyline = self.parse_polyline()?;
                    document.add_entity(polyline);
                }
                kind => {
                    let entity = self.parse_entity(kind)?;
                    trace!(kind, "读取实体");
                    document.add_entity(entity);
                }
            }
        }
        Ok(())
    }

    /// 读取到下一个组码 0 之前的全部组码对。
    fn body(&mut self) -> Result<Vec<(i32, String)>, DxfError> {
        let mut pairs = Vec::new();
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(pair) => pairs.push(pair),
                None => break,
            }
        }
        Ok(pairs)
    }

    /// HEADER 变量的取值：读到下一个变量（组码 9）或组码 0 为止。
    fn header_values(&mut self) -> Result<Vec<(i32, String)>, DxfError> {
        let mut pairs = Vec::new();
        loop {
            match self.reader.next_pair()? {
                Some((code, value)) if code == 0 || code == 9 => {
                    self.reader.put_back((code, value));
                    break;
                }
                Some(pair) => pairs.push(pair),
                None => break,
            }
        }
        Ok(pairs)
    }

    fn parse_entity(&mut self, kind: &str) -> Result<Entity, DxfError> {
        let fields = Fields::new(self.body()?, kind);
        let layer = fields.layer();
        match kind {
            "LINE" => Ok(Entity::Line(Line {
                start: fields.point(10)?,
                end: fields.point(11)?,
                layer,
            })),
            "CIRCLE" => Ok(Entity::Circle(Circle {
                center: fields.point(10)?,
                radius: fields.required_f64(40, "半径")?,
                layer,
            })),
            "ARC" => Ok(Entity::Arc(Arc {
                center: fields.point(10)?,
                radius: fields.required_f64(40, "半径")?,
                start_angle: fields.required_f64(50, "起始角")?.to_radians(),
                end_angle: fields.required_f64(51, "终止角")?.to_radians(),
                layer,
            })),
            "LWPOLYLINE" => {
                let xs = fields.all_f64(10)?;
                let ys = fields.all_f64(20)?;
                if xs.len() != ys.len() {
                    return Err(DxfError::invalid("LWPOLYLINE 顶点坐标数量不一致"));
                }
                let flags = fields.i16(70)?.unwrap_or(0);
                Ok(Entity::Polyline(Polyline {
                    vertices: xs.into_iter().zip(ys).map(|(x, y)| Point2::new(x, y)).collect(),
                    is_closed: flags & 1 == 1,
                    layer,
                }))
            }
            "SOLID" => {
                let first = fields.point(10)?;
                let second = fields.point(11)?;
                let third = fields.point(12)?;
                // 三角形 SOLID 的第四点省略时与第三点重合。
                let fourth = if fields.has(13) { fields.point(13)? } else { third };
                Ok(Entity::Solid(Solid {
                    corners: [first, second, fourth, third],
                    layer,
                }))
            }
            "TEXT" => {
                let horizontal = fields.i16(72)?.unwrap_or(0);
                let align = if horizontal == 1 {
                    TextAlign::Center
                } else {
                    TextAlign::Left
                };
                let insert = if align == TextAlign::Center && fields.has(11) {
                    fields.point(11)?
                } else {
                    fields.point(10)?
                };
                let content = fields
                    .text(1)
                    .map(decode_unicode_escapes)
                    .ok_or_else(|| DxfError::invalid("TEXT 缺少文本内容（组码 1）"))?;
                Ok(Entity::Text(Text {
                    insert,
                    content,
                    height: fields.required_f64(40, "文字高度")?,
                    rotation: fields.optional_f64(50, "旋转角")?.unwrap_or(0.0).to_radians(),
                    align,
                    layer,
                }))
            }
            other => Err(DxfError::unsupported(format!("暂不支持的实体类型 {other}"))),
        }
    }

    fn parse_polyline(&mut self) -> Result<Entity, DxfError> {
        let header = Fields::new(self.body()?, "POLYLINE");
        let layer = header.layer();
        let flags = header.i16(70)?.unwrap_or(0);
        let mut vertices = Vec::new();
        loop {
            let (code, value) = self
                .reader
                .next_pair()?
                .ok_or_else(|| DxfError::invalid("POLYLINE 缺少 SEQEND"))?;
            if code != 0 {
                return Err(DxfError::invalid(format!("POLYLINE 序列中遇到组码 {code}")));
            }
            match value.as_str() {
                "VERTEX" => {
                    let vertex = Fields::new(self.body()?, "VERTEX");
                    vertices.push(vertex.point(10)?);
                }
                "SEQEND" => {
                    self.body()?;
                    break;
                }
                other => {
                    return Err(DxfError::invalid(format!(
                        "POLYLINE 序列中出现意外的实体 {other}"
                    )));
                }
            }
        }
        Ok(Entity::Polyline(Polyline {
            vertices,
            is_closed: flags & 1 == 1,
            layer,
        }))
    }
}

/// 单个实体（或记录）的组码对集合。
struct Fields<'a> {
    pairs: Vec<(i32, String)>,
    context: &'a str,
}

impl<'a> Fields<'a> {
    fn new(pairs: Vec<(i32, String)>, context: &'a str) -> Self {
        Self { pairs, context }
    }

    fn has(&self, code: i32) -> bool {
        self.pairs.iter().any(|(candidate, _)| *candidate == code)
    }

    fn text(&self, code: i32) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(candidate, _)| *candidate == code)
            .map(|(_, value)| value.as_str())
    }

    fn layer(&self) -> String {
        self.text(8)
            .map(|layer| layer.trim().to_string())
            .unwrap_or_else(|| "0".to_string())
    }

    fn all_f64(&self, code: i32) -> Result<Vec<f64>, DxfError> {
        self.pairs
            .iter()
            .filter(|(candidate, _)| *candidate == code)
            .map(|(_, raw)| parse_f64(raw, &format!("{} 组码 {code}", self.context)))
            .collect()
    }

    fn optional_f64(&self, code: i32, label: &str) -> Result<Option<f64>, DxfError> {
        let mut values = self.pairs.iter().filter(|(candidate, _)| *candidate == code);
        let Some((_, raw)) = values.next() else {
            return Ok(None);
        };
        if values.next().is_some() {
            return Err(DxfError::invalid(format!(
                "{} 遇到重复的{label}（组码 {code}）",
                self.context
            )));
        }
        parse_f64(raw, &format!("{} {label}", self.context)).map(Some)
    }

    fn required_f64(&self, code: i32, label: &str) -> Result<f64, DxfError> {
        self.optional_f64(code, label)?.ok_or_else(|| {
            DxfError::invalid(format!("{} 缺少{label}（组码 {code}）", self.context))
        })
    }

    fn point(&self, base_code: i32) -> Result<Point2, DxfError> {
        let x = self.required_f64(base_code, "X 坐标")?;
        let y = self.required_f64(base_code + 10, "Y 坐标")?;
        Ok(Point2::new(x, y))
    }

    fn i16(&self, code: i32) -> Result<Option<i16>, DxfError> {
        self.text(code)
            .map(|raw| parse_i16(raw, &format!("{} 组码 {code}", self.context)))
            .transpose()
    }
}

/// 按两行一组切分组码与取值，支持回退一个组码对。
struct DxfReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    pending: Option<(i32, String)>,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
            pending: None,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.pending.take() {
            return Ok(Some(pair));
        }
        let Some((code_index, code_line)) = self.lines.next() else {
            return Ok(None);
        };
        let code_text = code_line.trim();
        // 文件末尾的空行不算残缺组码。
        if code_text.is_empty() && self.lines.clone().all(|(_, line)| line.trim().is_empty()) {
            return Ok(None);
        }
        let Some((_, value_line)) = self.lines.next() else {
            return Err(DxfError::invalid(format!(
                "第 {} 行的组码 {code_text} 缺少取值行",
                code_index + 1
            )));
        };
        let code = code_text.parse::<i32>().map_err(|_| {
            DxfError::invalid(format!("第 {} 行不是整数组码：\"{code_text}\"", code_index + 1))
        })?;
        Ok(Some((code, value_line.trim_end_matches('\r').to_string())))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.pending.is_none(), "DXF 组码对只能回退一次");
        self.pending = Some(pair);
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, context: &str) -> Result<T, DxfError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| DxfError::invalid(format!("{context} 不是合法数值：\"{raw}\"")))
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    parse_number(raw, context)
}

fn parse_i16(raw: &str, context: &str) -> Result<i16, DxfError> {
    let wide: i64 = parse_number(raw, context)?;
    i16::try_from(wide).map_err(|_| DxfError::invalid(format!("{context} 超出颜色号范围：{wide}")))
}

/// 还原 `\U+XXXX` 转义；相邻的代理码元合并为一个字符，不成对的替换为 U+FFFD。
fn decode_unicode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::new();
    let mut rest = raw;
    while !rest.is_empty() {
        let escaped = rest
            .strip_prefix("\\U+")
            .and_then(|tail| tail.get(..4))
            .filter(|hex| hex.bytes().all(|byte| byte.is_ascii_hexdigit()))
            .and_then(|hex| u16::from_str_radix(hex, 16).ok());
        if let Some(unit) = escaped {
            units.push(unit);
            rest = &rest[7..];
            continue;
        }
        flush_utf16(&mut units, &mut out);
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    flush_utf16(&mut units, &mut out);
    out
}

fn flush_utf16(units: &mut Vec<u16>, out: &mut String) {
    out.extend(
        char::decode_utf16(units.drain(..)).map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Document, DxfError> {
        DxfParser::new(source).parse()
    }

    #[test]
    fn reads_layers_and_limits() {
        let source = "  0\nSECTION\n  2\nHEADER\n  9\n$ACADVER\n  1\nAC1009\n  9\n$LIMMIN\n 10\n0.0\n 20\n0.0\n  9\n$LIMMAX\n 10\n42.0\n 20\n29.7\n  0\nENDSEC\n  0\nSECTION\n  2\nTABLES\n  0\nTABLE\n  2\nLAYER\n 70\n1\n  0\nLAYER\n  2\nA-BOUNDARY\n 70\n0\n 62\n-9\n  6\nDASHED\n  0\nENDTAB\n  0\nENDSEC\n  0\nEOF\n";
        let doc = parse(source).expect("解析 DXF");
        let limits = doc.limits().expect("limits");
        assert!((limits.width() - 42.0).abs() < 1e-12);
        let layer = doc.layer("A-BOUNDARY").expect("layer");
        assert_eq!(layer.color, 9);
        assert_eq!(layer.line_type, LineType::Dashed);
        assert!(!layer.is_visible);
    }

    #[test]
    fn unicode_escapes_are_decoded() {
        assert_eq!(decode_unicode_escapes("Yotoqxona \\U+21161"), "Yotoqxona №1");
        assert_eq!(decode_unicode_escapes("O\\U+02BBg\\U+02bbil"), "Oʻgʻil");
        assert_eq!(decode_unicode_escapes("\\U+D83D\\U+DE00"), "😀");
        assert_eq!(decode_unicode_escapes("a\\U+005Cb"), "a\\b");
        assert_eq!(decode_unicode_escapes("\\U+D83D!"), "\u{FFFD}!");
        assert_eq!(decode_unicode_escapes("\\U+12"), "\\U+12");
        assert_eq!(decode_unicode_escapes("\\U++123"), "\\U++123");
    }

    #[test]
    fn unknown_entity_is_unsupported() {
        let source = "  0\nSECTION\n  2\nENTITIES\n  0\nSPLINE\n  8\n0\n  0\nENDSEC\n  0\nEOF\n";
        assert!(matches!(parse(source), Err(DxfError::Unsupported { .. })));
    }

    #[test]
    fn duplicate_coordinates_are_rejected() {
        let source = "  0\nSECTION\n  2\nENTITIES\n  0\nCIRCLE\n  8\n0\n 10\n1.0\n 10\n2.0\n 20\n0.0\n 40\n1.0\n  0\nENDSEC\n  0\nEOF\n";
        match parse(source) {
            Err(DxfError::Invalid { message }) => assert!(message.contains("重复"), "{message}"),
            other => panic!("expected invalid document, got {other:?}"),
        }
    }

    #[test]
    fn triangle_solid_repeats_third_corner() {
        let source = "  0\nSECTION\n  2\nENTITIES\n  0\nSOLID\n  8\n0\n 10\n0\n 20\n0\n 11\n1\n 21\n0\n 12\n0\n 22\n1\n  0\nENDSEC\n  0\nEOF\n";
        let doc = parse(source).expect("解析 DXF");
        let (_, entity) = doc.entities().next().expect("entity");
        let Entity::Solid(solid) = entity else {
            panic!("expected solid");
        };
        assert_eq!(solid.corners[2], solid.corners[3]);
    }
}
