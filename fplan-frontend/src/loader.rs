use std::fs;
use std::path::{Path, PathBuf};

use fplan_core::plan::FloorplanDocument;
use fplan_schema::validate_and_fill;
use serde_json::Value;
use tracing::info;

use crate::errors::FrontendError;
use crate::parser::{MockParser, RequirementParser, RetrySupervisor};

/// 内置演示需求，未提供输入时使用。
pub const DEMO_REQUIREMENTS: &str =
    "A 10 x 10 m single-storey house with a living room, one bedroom and a kitchen. Entrance on the south side.";

/// 候选文档的来源。
#[derive(Debug, Clone)]
pub enum PlanSource {
    /// 直接校验的 JSON 文件，不经过需求解析。
    File(PathBuf),
    /// 交给需求解析方的自然语言需求。
    Requirements(String),
    Demo,
}

impl PlanSource {
    pub fn describe(&self) -> String {
        match self {
            PlanSource::File(path) => format!("JSON 文件 {}", path.display()),
            PlanSource::Requirements(_) => "需求文本".to_string(),
            PlanSource::Demo => "内置演示需求".to_string(),
        }
    }
}

/// 读取已校验的平面描述以及所用的尝试次数。
#[derive(Debug)]
pub struct LoadedPlan {
    pub document: FloorplanDocument,
    pub source: PlanSource,
    pub attempts: u32,
}

pub fn read_candidate(path: &Path) -> Result<Value, FrontendError> {
    let text = fs::read_to_string(path).map_err(|source| FrontendError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| FrontendError::InputJson {
        path: path.to_path_buf(),
        source,
    })
}

/// 文件直接校验；需求文本与演示走解析方与有界重试。
pub fn load_plan(
    source: PlanSource,
    parser: &dyn RequirementParser,
    max_attempts: u32,
) -> Result<LoadedPlan, FrontendError> {
    info!(source = %source.describe(), "加载平面描述");
    let (document, attempts) = match &source {
        PlanSource::File(path) => (validate_and_fill(read_candidate(path)?)?, 1),
        PlanSource::Requirements(text) => {
            let plan = RetrySupervisor::new(max_attempts).run(parser, text)?;
            (plan.document, plan.attempts)
        }
        PlanSource::Demo => {
            let plan = RetrySupervisor::new(max_attempts).run(&MockParser, DEMO_REQUIREMENTS)?;
            (plan.document, plan.attempts)
        }
    };
    Ok(LoadedPlan {
        document,
        source,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::parser::ScriptedParser;

    #[test]
    fn file_source_validates_without_parser() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{}", MockParser::layout()).expect("write candidate");
        let parser = ScriptedParser::new([]);
        let loaded = load_plan(PlanSource::File(file.path().to_path_buf()), &parser, 3).expect("load");
        assert_eq!(loaded.document.rooms.len(), 3);
        assert_eq!(loaded.attempts, 1);
        assert!(parser.prompts().is_empty());
    }

    #[test]
    fn invalid_file_surfaces_full_validation_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"land_width": 5, "land_height": 5, "rooms": [{{"type": "attic"}}]}}"#).expect("write");
        let err = load_plan(PlanSource::File(file.path().to_path_buf()), &MockParser, 3).unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, FrontendError::Validation(_)));
        assert!(text.contains("rooms/0/type"), "{text}");
        assert!(text.contains("rooms/0: 'x' is a required property"), "{text}");
    }

    #[test]
    fn malformed_json_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{ not json").expect("write");
        let err = read_candidate(file.path()).unwrap_err();
        assert!(matches!(err, FrontendError::InputJson { .. }));
    }

    #[test]
    fn demo_source_uses_mock_parser() {
        let loaded = load_plan(PlanSource::Demo, &ScriptedParser::new([]), 1).expect("demo");
        assert_eq!(loaded.document.land_width, 10.0);
    }
}
