use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "FPLAN_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub drawing: DrawingConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 自动发现配置文件：优先读取环境变量 `FPLAN_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        let current_dir = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_from(env::var_os(CONFIG_ENV_VAR).map(PathBuf::from), &current_dir)
    }

    /// `discover` 的可测试形式：显式给定环境变量取值与工作目录。
    pub fn discover_from(explicit: Option<PathBuf>, working_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default_path = working_dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 生成流程：需求解析的尝试次数与输出位置。
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 总尝试次数（首次 + 重试）。
    #[serde(default = "GenerationConfig::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "GenerationConfig::default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "GenerationConfig::default_filename_prefix")]
    pub filename_prefix: String,
}

impl GenerationConfig {
    fn default_max_attempts() -> u32 {
        3
    }

    fn default_output_dir() -> PathBuf {
        PathBuf::from("output")
    }

    fn default_filename_prefix() -> String {
        "plan".to_string()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            output_dir: Self::default_output_dir(),
            filename_prefix: Self::default_filename_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawingConfig {
    #[serde(default = "DrawingConfig::default_preview_width")]
    pub preview_width_px: u32,
    #[serde(default = "DrawingConfig::default_door_width")]
    pub door_width: f64,
    #[serde(default = "DrawingConfig::default_window_width")]
    pub window_width: f64,
    #[serde(default = "DrawingConfig::default_title")]
    pub title: String,
}

impl DrawingConfig {
    fn default_preview_width() -> u32 {
        1600
    }

    fn default_door_width() -> f64 {
        0.9
    }

    fn default_window_width() -> f64 {
        1.5
    }

    fn default_title() -> String {
        "FLOOR PLAN".to_string()
    }
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            preview_width_px: Self::default_preview_width(),
            door_width: Self::default_door_width(),
            window_width: Self::default_window_width(),
            title: Self::default_title(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_returned_when_file_missing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cfg = AppConfig::discover_from(None, dir.path()).expect("discover should succeed");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.generation.max_attempts, 3);
        assert_eq!(cfg.generation.output_dir, PathBuf::from("output"));
        assert_eq!(cfg.generation.filename_prefix, "plan");
        assert_eq!(cfg.drawing.preview_width_px, 1600);
        assert!((cfg.drawing.door_width - 0.9).abs() < 1e-12);
        assert!((cfg.drawing.window_width - 1.5).abs() < 1e-12);
        assert_eq!(cfg.drawing.title, "FLOOR PLAN");
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [generation]
            max_attempts = 5
            output_dir = "/tmp/plans"

            [drawing]
            preview_width_px = 800
            title = "HOUSE"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.generation.max_attempts, 5);
        assert_eq!(cfg.generation.output_dir, PathBuf::from("/tmp/plans"));
        assert_eq!(cfg.generation.filename_prefix, "plan");
        assert_eq!(cfg.drawing.preview_width_px, 800);
        assert_eq!(cfg.drawing.title, "HOUSE");
        assert!((cfg.drawing.door_width - 0.9).abs() < 1e-12);
    }

    #[test]
    fn default_toml_in_working_dir_is_discovered() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("config")).expect("create config dir");
        fs::write(
            dir.path().join("config").join("default.toml"),
            "[generation]\nfilename_prefix = \"villa\"\n",
        )
        .expect("write config");
        let cfg = AppConfig::discover_from(None, dir.path()).expect("discover");
        assert_eq!(cfg.generation.filename_prefix, "villa");
    }

    #[test]
    fn explicit_path_wins_and_reports_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("absent.toml");
        let err = AppConfig::discover_from(Some(missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[drawing]\npreview_width_px = \"wide\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("解析配置文件"));
    }
}
