pub mod cli;
pub mod errors;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod summary;

use fplan_config::AppConfig;
use tracing::info;

pub use cli::{RunReport, RunRequest};
pub use errors::{FrontendError, ParserError};
pub use loader::PlanSource;
pub use parser::{MockParser, RequirementParser, RetrySupervisor};
pub use pipeline::{ArtifactPaths, Artifacts, GenerationOptions};

/// 以内置离线解析方执行一次命令行生成。
pub fn run_cli(request: RunRequest, config: &AppConfig) -> Result<RunReport, FrontendError> {
    info!(source = %request.source.describe(), "启动命令行生成");
    cli::run(request, config, &MockParser)
}
