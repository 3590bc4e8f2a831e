//! 平面描述的规范化与校验：结构契约、空间完整性、面积标准。

pub mod normalize;
pub mod schema;
pub mod spatial;
pub mod standards;
pub mod structural;

use fplan_core::plan::FloorplanDocument;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub use normalize::normalize;
pub use schema::{SchemaNode, floorplan_schema};
pub use structural::{SchemaViolation, check_structure};

/// 结构错误：类型、枚举、必填字段的全部违规。
#[derive(Debug, Error)]
#[error("Schema errors: {}", join(.violations, "; "))]
pub struct SchemaError {
    pub violations: Vec<SchemaViolation>,
}

/// 空间错误：重叠、不可达、越界的全部问题。
#[derive(Debug, Error)]
#[error("{}", .violations.join("\n"))]
pub struct SpatialError {
    pub violations: Vec<String>,
}

/// 面积低于标准的全部房间。
#[derive(Debug, Error)]
#[error("{}", .violations.join("\n"))]
pub struct StandardsError {
    pub violations: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Spatial(#[from] SpatialError),
    #[error(transparent)]
    Standards(#[from] StandardsError),
}

impl ValidationError {
    /// 违规条目数量。
    pub fn violation_count(&self) -> usize {
        match self {
            ValidationError::Schema(err) => err.violations.len(),
            ValidationError::Spatial(err) => err.violations.len(),
            ValidationError::Standards(err) => err.violations.len(),
        }
    }
}

fn join<T: ToString>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// 持有结构契约的校验器，逐阶段执行并在每个阶段完整汇总后才返回错误。
pub struct FloorplanValidator {
    schema: SchemaNode,
}

impl FloorplanValidator {
    pub fn new() -> Self {
        Self {
            schema: floorplan_schema(),
        }
    }

    #[inline]
    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// 规范化并执行结构校验，返回强类型文档。
    pub fn parse(&self, candidate: Value) -> Result<FloorplanDocument, SchemaError> {
        let normalized = normalize(&self.schema, candidate);
        let violations = check_structure(&self.schema, &normalized);
        if !violations.is_empty() {
            debug!(count = violations.len(), "结构校验失败");
            return Err(SchemaError { violations });
        }
        serde_json::from_value(normalized).map_err(|err| SchemaError {
            violations: vec![SchemaViolation {
                path: Vec::new(),
                message: err.to_string(),
            }],
        })
    }

    /// 完整流程：规范化 → 结构 → 空间 → 标准。
    pub fn validate_and_fill(&self, candidate: Value) -> Result<FloorplanDocument, ValidationError> {
        let document = self.parse(candidate)?;

        let spatial = spatial::check_spatial_integrity(&document);
        if !spatial.is_empty() {
            debug!(count = spatial.len(), "空间完整性校验失败");
            return Err(SpatialError {
                violations: spatial,
            }
            .into());
        }

        let standards = standards::check_standards(&document);
        if !standards.is_empty() {
            debug!(count = standards.len(), "面积标准校验失败");
            return Err(StandardsError {
                violations: standards,
            }
            .into());
        }

        info!(
            rooms = document.rooms.len(),
            land_width = document.land_width,
            land_height = document.land_height,
            "平面描述校验通过"
        );
        Ok(document)
    }
}

impl Default for FloorplanValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// 便捷入口，等价于 `FloorplanValidator::new().validate_and_fill(..)`。
pub fn validate_and_fill(candidate: Value) -> Result<FloorplanDocument, ValidationError> {
    FloorplanValidator::new().validate_and_fill(candidate)
}
