use std::path::PathBuf;

use fplan_config::ConfigError;
use fplan_engine::errors::DrawingError;
use fplan_io::IoError;
use fplan_schema::ValidationError;
use thiserror::Error;

/// 需求解析协作方的失败。
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("需求解析服务调用失败: {0}")]
    Upstream(String),
    #[error("预设的解析响应已用尽")]
    ScriptExhausted,
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error("读取输入文件 {path:?} 失败: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("输入文件 {path:?} 不是合法 JSON: {source}")]
    InputJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("发布产物 {path:?} 失败: {source}")]
    Publish {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{attempts} 次尝试后仍未得到合法的平面描述:\n{last_error}")]
    RetryExhausted { attempts: u32, last_error: String },
}
