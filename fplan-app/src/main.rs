use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use fplan_config::{AppConfig, ConfigError};
use fplan_frontend::{PlanSource, RunReport, RunRequest};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "fplan")]
#[command(about = "Generate a DXF floor plan and PNG preview from a floorplan description")]
struct Args {
    /// JSON floorplan description, validated directly
    #[arg(long, conflicts_with = "requirements")]
    input: Option<PathBuf>,

    /// Free-text requirements for the requirement parser
    #[arg(long)]
    requirements: Option<String>,

    /// Output directory (defaults to `generation.output_dir`)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Configuration file (defaults to FPLAN_CONFIG or ./config/default.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(report) => {
            println!("{}", report.render());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "生成失败");
            eprintln!("生成失败:\n{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<RunReport> {
    let config = load_configuration(args.config.as_deref())?;
    init_logging(&config);
    info!("启动平面图生成");

    let source = match (args.input, args.requirements) {
        (Some(path), _) => PlanSource::File(path),
        (None, Some(text)) => PlanSource::Requirements(text),
        (None, None) => PlanSource::Demo,
    };
    let description = source.describe();
    let request = RunRequest {
        source,
        out_dir: args.out_dir,
    };
    fplan_frontend::run_cli(request, &config).with_context(|| format!("无法根据{description}生成图纸"))
}

fn load_configuration(override_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = override_path {
        return AppConfig::from_file(path)
            .with_context(|| format!("加载指定配置 {} 失败", path.display()));
    }
    match AppConfig::discover() {
        Ok(cfg) => Ok(cfg),
        Err(err) => {
            match &err {
                ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                    warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                }
                ConfigError::Context { .. } => {
                    warn!(error = %err, "加载默认配置失败，使用内建默认值");
                }
            }
            Ok(AppConfig::default())
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
