mod font;
pub mod raster;
mod reader;
mod writer;

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use fplan_core::document::Document;
use thiserror::Error;

pub use raster::PngPreview;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output stream: {0}")]
    Stream(#[from] std::io::Error),
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
    #[error("failed to encode preview image: {0}")]
    Encode(#[from] image::ImageError),
}

pub trait DocumentLoader {
    fn load(&self, source: &mut dyn Read) -> Result<Document, IoError>;

    fn load_path(&self, path: &Path) -> Result<Document, IoError> {
        let mut file = fs::File::open(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(&mut file)
    }
}

/// 序列化到调用方提供的输出流，文件命名与存放位置不由后端决定。
pub trait DocumentSaver {
    fn save(&self, document: &Document, out: &mut dyn Write) -> Result<(), IoError>;
}

/// ASCII DXF（R12）读写。
#[derive(Debug, Default, Clone, Copy)]
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, source: &mut dyn Read) -> Result<Document, IoError> {
        let mut data = String::new();
        source.read_to_string(&mut data)?;
        reader::DxfParser::new(&data).parse().map_err(|err| match err {
            reader::DxfError::Unsupported { feature } => IoError::UnsupportedFeature(feature),
            reader::DxfError::Invalid { message } => IoError::InvalidDocument(message),
        })
    }
}

impl DocumentSaver for DxfFacade {
    fn save(&self, document: &Document, out: &mut dyn Write) -> Result<(), IoError> {
        let text = writer::DxfWriter::new().write(document);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        tracing::debug!(bytes = text.len(), "DXF 写出完成");
        Ok(())
    }
}
