use std::path::PathBuf;

use fplan_config::AppConfig;
use tracing::info;

use crate::errors::FrontendError;
use crate::loader::{PlanSource, load_plan};
use crate::parser::RequirementParser;
use crate::pipeline::{ArtifactPaths, GenerationOptions, publish, render_artifacts};
use crate::summary::SUMMARY_HEADING;

/// 一次命令行生成请求。`out_dir` 为空时使用配置中的输出目录。
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: PlanSource,
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub paths: ArtifactPaths,
    pub sheet_id: String,
    pub preset: &'static str,
    pub scale_label: String,
    pub attempts: u32,
    pub summary: Vec<String>,
}

impl RunReport {
    /// 面向终端用户的结果文本。
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("图纸编号: {}", self.sheet_id),
            format!("图幅: {}  比例: {}", self.preset, self.scale_label),
            format!("DXF: {}", self.paths.vector.display()),
            format!("PNG: {}", self.paths.raster.display()),
            SUMMARY_HEADING.to_string(),
        ];
        lines.extend(self.summary.iter().cloned());
        lines.join("\n")
    }
}

/// 加载 → 校验 → 渲染 → 发布。任一步失败都不会留下可见的产物。
pub fn run(
    request: RunRequest,
    config: &AppConfig,
    parser: &dyn RequirementParser,
) -> Result<RunReport, FrontendError> {
    let loaded = load_plan(request.source, parser, config.generation.max_attempts)?;
    let options = GenerationOptions::from_config(&config.drawing);
    let artifacts = render_artifacts(&loaded.document, &options)?;

    let out_dir = request
        .out_dir
        .unwrap_or_else(|| config.generation.output_dir.clone());
    let paths = ArtifactPaths::new(&out_dir, &config.generation.filename_prefix, artifacts.sheet_id());
    publish(&artifacts, &paths)?;

    let layout = &artifacts.drawing.layout;
    info!(
        source = %loaded.source.describe(),
        attempts = loaded.attempts,
        sheet = %artifacts.sheet_id(),
        "生成完成"
    );
    Ok(RunReport {
        sheet_id: artifacts.sheet_id().to_string(),
        preset: layout.preset.name,
        scale_label: layout.scale_label(),
        attempts: loaded.attempts,
        summary: artifacts.summary,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{MockParser, ScriptedParser};
    use serde_json::json;

    fn config_for(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.generation.output_dir = dir.to_path_buf();
        config.generation.filename_prefix = "house".to_string();
        config.drawing.preview_width_px = 240;
        config
    }

    #[test]
    fn demo_run_publishes_named_artifacts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = config_for(dir.path());
        let request = RunRequest {
            source: PlanSource::Demo,
            out_dir: None,
        };
        let report = run(request, &config, &MockParser).expect("demo run");

        let expected = ArtifactPaths::new(dir.path(), "house", &report.sheet_id);
        assert_eq!(report.paths, expected);
        assert!(report.paths.vector.is_file());
        assert!(report.paths.raster.is_file());
        assert_eq!(report.preset, "A3");
        assert!(report.sheet_id.starts_with("A3-"));

        let text = report.render();
        assert!(text.contains("Room dimensions:"));
        assert!(text.contains("• Kitchen: 5m x 5m"), "{text}");
    }

    #[test]
    fn failed_run_writes_nothing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = config_for(dir.path());
        let overlapping = json!({
            "land_width": 10, "land_height": 10,
            "rooms": [
                { "name": "A", "type": "office", "x": 0, "y": 0, "width": 5, "height": 5,
                  "openings": [{ "type": "door", "wall": "south", "pos": 1 }] },
                { "name": "B", "type": "office", "x": 0, "y": 0, "width": 5, "height": 5,
                  "openings": [{ "type": "door", "wall": "south", "pos": 1 }] }
            ]
        });
        let parser = ScriptedParser::new(vec![Ok(overlapping); 3]);
        let request = RunRequest {
            source: PlanSource::Requirements("two offices".to_string()),
            out_dir: Some(dir.path().join("out")),
        };
        let err = run(request, &config, &parser).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("A and B overlap by 5.00m x 5.00m"), "{text}");
        assert!(!dir.path().join("out").exists());
    }
}
