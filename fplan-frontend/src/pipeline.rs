//! 生成流程：同一份已校验文档 → 一次图纸组装 → 两个后端序列化 → 全部成功后才发布。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use fplan_config::DrawingConfig;
use fplan_core::plan::FloorplanDocument;
use fplan_engine::{Drawing, DrawingComposer, DrawingOptions};
use fplan_io::{DocumentSaver, DxfFacade, IoError, PngPreview};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::errors::FrontendError;
use crate::summary::dimension_summary;

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub drawing: DrawingOptions,
    pub preview_width_px: u32,
}

impl GenerationOptions {
    pub fn from_config(config: &DrawingConfig) -> Self {
        Self {
            drawing: DrawingOptions {
                door_width: config.door_width,
                window_width: config.window_width,
                title: config.title.clone(),
            },
            preview_width_px: config.preview_width_px,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from_config(&DrawingConfig::default())
    }
}

/// 两个字节流产物，以及交付渠道需要的图纸信息与尺寸清单。
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub vector: Vec<u8>,
    pub raster: Vec<u8>,
    pub drawing: Drawing,
    pub summary: Vec<String>,
}

impl Artifacts {
    #[inline]
    pub fn sheet_id(&self) -> &str {
        &self.drawing.sheet_id
    }
}

/// 在内存中渲染两个产物；任一后端失败则整体失败。
pub fn render_artifacts(
    document: &FloorplanDocument,
    options: &GenerationOptions,
) -> Result<Artifacts, FrontendError> {
    let drawing = DrawingComposer::new(options.drawing.clone()).compose(document)?;

    let mut vector = Vec::new();
    DxfFacade::new().save(&drawing.document, &mut vector)?;
    let mut raster = Vec::new();
    PngPreview::new(options.preview_width_px).save(&drawing.document, &mut raster)?;

    info!(
        sheet = %drawing.sheet_id,
        dxf_bytes = vector.len(),
        png_bytes = raster.len(),
        "产物渲染完成"
    );
    Ok(Artifacts {
        vector,
        raster,
        summary: dimension_summary(document),
        drawing,
    })
}

/// 写入调用方提供的输出流。
pub fn write_artifacts(
    artifacts: &Artifacts,
    vector_out: &mut dyn Write,
    raster_out: &mut dyn Write,
) -> Result<(), FrontendError> {
    vector_out.write_all(&artifacts.vector).map_err(IoError::from)?;
    vector_out.flush().map_err(IoError::from)?;
    raster_out.write_all(&artifacts.raster).map_err(IoError::from)?;
    raster_out.flush().map_err(IoError::from)?;
    Ok(())
}

/// `<dir>/<prefix>_<sheet-id>.dxf` 与 `.png`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub vector: PathBuf,
    pub raster: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, prefix: &str, sheet_id: &str) -> Self {
        let stem = format!("{prefix}_{sheet_id}");
        Self {
            vector: dir.join(format!("{stem}.dxf")),
            raster: dir.join(format!("{stem}.png")),
        }
    }
}

/// 先在目标目录写入两个临时文件，两者都完整落盘后才依次改名为最终路径。
/// 第二次改名失败时撤回第一个已发布的文件。
pub fn publish(artifacts: &Artifacts, paths: &ArtifactPaths) -> Result<(), FrontendError> {
    let vector = stage(&paths.vector, &artifacts.vector)?;
    let raster = stage(&paths.raster, &artifacts.raster)?;
    let previous = previous_contents(&paths.vector)?;

    vector
        .persist(&paths.vector)
        .map_err(|err| FrontendError::Publish {
            path: paths.vector.clone(),
            source: err.error,
        })?;
    if let Err(err) = raster.persist(&paths.raster) {
        roll_back(&paths.vector, previous);
        return Err(FrontendError::Publish {
            path: paths.raster.clone(),
            source: err.error,
        });
    }

    info!(
        dxf = %paths.vector.display(),
        png = %paths.raster.display(),
        "产物已发布"
    );
    Ok(())
}

/// 目标位置已有的文件内容，回滚时据此还原而不是删除。
fn previous_contents(target: &Path) -> Result<Option<Vec<u8>>, FrontendError> {
    match fs::read(target) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FrontendError::Publish {
            path: target.to_path_buf(),
            source,
        }),
    }
}

fn roll_back(target: &Path, previous: Option<Vec<u8>>) {
    let outcome = match previous {
        Some(bytes) => stage(target, &bytes).and_then(|file| {
            file.persist(target)
                .map(drop)
                .map_err(|err| FrontendError::Publish {
                    path: target.to_path_buf(),
                    source: err.error,
                })
        }),
        None => fs::remove_file(target).map_err(|source| FrontendError::Publish {
            path: target.to_path_buf(),
            source,
        }),
    };
    match outcome {
        Ok(()) => debug!(path = %target.display(), "已撤回发布的 DXF"),
        Err(err) => warn!(path = %target.display(), error = %err, "撤回已发布的 DXF 失败"),
    }
}

fn stage(target: &Path, bytes: &[u8]) -> Result<NamedTempFile, FrontendError> {
    let publish_error = |source| FrontendError::Publish {
        path: target.to_path_buf(),
        source,
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(publish_error)?;
    let mut file = NamedTempFile::new_in(dir).map_err(publish_error)?;
    file.write_all(bytes).map_err(publish_error)?;
    file.as_file().sync_all().map_err(publish_error)?;
    debug!(target = %target.display(), temp = %file.path().display(), bytes = bytes.len(), "临时文件已写入");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MockParser;
    use fplan_schema::validate_and_fill;

    fn artifacts() -> Artifacts {
        let document = validate_and_fill(MockParser::layout()).expect("mock layout");
        let options = GenerationOptions {
            preview_width_px: 300,
            ..GenerationOptions::default()
        };
        render_artifacts(&document, &options).expect("render")
    }

    #[test]
    fn paths_follow_prefix_and_sheet_id() {
        let paths = ArtifactPaths::new(Path::new("out"), "plan", "A3-0123abcd");
        assert_eq!(paths.vector, PathBuf::from("out/plan_A3-0123abcd.dxf"));
        assert_eq!(paths.raster, PathBuf::from("out/plan_A3-0123abcd.png"));
    }

    #[test]
    fn publish_leaves_only_final_files() {
        let artifacts = artifacts();
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = ArtifactPaths::new(&dir.path().join("nested"), "plan", artifacts.sheet_id());
        publish(&artifacts, &paths).expect("publish");

        assert_eq!(fs::read(&paths.vector).expect("dxf"), artifacts.vector);
        assert_eq!(fs::read(&paths.raster).expect("png"), artifacts.raster);
        let entries = fs::read_dir(dir.path().join("nested")).expect("list").count();
        assert_eq!(entries, 2, "临时文件不应残留");
    }

    #[test]
    fn failed_raster_restores_an_existing_vector() {
        let artifacts = artifacts();
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = ArtifactPaths::new(dir.path(), "plan", artifacts.sheet_id());
        fs::write(&paths.vector, b"earlier drawing").expect("existing dxf");
        // 目标位置是目录时临时文件无法改名过去。
        fs::create_dir(&paths.raster).expect("blocking dir");

        let err = publish(&artifacts, &paths).unwrap_err();
        assert!(matches!(err, FrontendError::Publish { ref path, .. } if *path == paths.raster));
        assert_eq!(fs::read(&paths.vector).expect("dxf kept"), b"earlier drawing");
        let entries = fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(entries, 2, "临时文件不应残留");
    }

    #[test]
    fn failed_raster_removes_a_new_vector() {
        let artifacts = artifacts();
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = ArtifactPaths::new(dir.path(), "plan", artifacts.sheet_id());
        fs::create_dir(&paths.raster).expect("blocking dir");

        assert!(publish(&artifacts, &paths).is_err());
        assert!(!paths.vector.exists());
    }

    #[test]
    fn write_artifacts_copies_both_streams() {
        let artifacts = artifacts();
        let (mut dxf, mut png) = (Vec::new(), Vec::new());
        write_artifacts(&artifacts, &mut dxf, &mut png).expect("write");
        assert!(String::from_utf8_lossy(&dxf).contains("AC1009"));
        assert_eq!(&png[..4], b"\x89PNG");
        assert_eq!(artifacts.summary.len(), 3);
    }
}
