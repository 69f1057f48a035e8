//! Message types exchanged across the worker boundary.

use panelcut_cabinet::{BrandResult, OptimizeRequest, OptimizerConfig, RawPanel};
use panelcut_core::{Config, Part, RunResult, Sheet};
use serde::{Deserialize, Serialize};

/// API version for compatibility checking.
pub const API_VERSION: &str = "1.0";

/// Job submitted to the worker, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    /// Full cabinet pipeline over raw panels.
    Optimize {
        #[serde(default)]
        config: OptimizerConfig,
        request: OptimizeRequest,
    },

    /// Single-material packing of already mapped parts.
    Pack {
        parts: Vec<PartRequest>,
        #[serde(default)]
        sheet: Sheet,
        #[serde(default)]
        config: Config,
    },

    /// Manual insertion into a sheet of an earlier optimize result.
    Insert {
        #[serde(default)]
        config: OptimizerConfig,
        results: Vec<BrandResult>,
        #[serde(rename = "targetSheetId")]
        target_sheet_id: String,
        panels: Vec<RawPanel>,
    },
}

impl Request {
    /// Short operation name used in logs.
    pub fn op(&self) -> &'static str {
        match self {
            Request::Optimize { .. } => "optimize",
            Request::Pack { .. } => "pack",
            Request::Insert { .. } => "insert",
        }
    }
}

/// Part description for pack requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRequest {
    /// Unique identifier.
    pub id: String,

    /// Extent along the sheet X axis.
    pub width: f64,

    /// Extent along the sheet Y axis.
    pub height: f64,

    /// Number of copies.
    #[serde(default = "default_quantity")]
    pub quantity: usize,

    /// Whether 90 degree rotation is allowed.
    #[serde(default = "default_rotate")]
    pub rotate_allowed: bool,
}

fn default_quantity() -> usize {
    1
}

fn default_rotate() -> bool {
    true
}

impl From<PartRequest> for Part {
    fn from(req: PartRequest) -> Self {
        Part::new(req.id, req.width, req.height)
            .with_quantity(req.quantity)
            .with_rotation(req.rotate_allowed)
    }
}

impl From<&Part> for PartRequest {
    fn from(part: &Part) -> Self {
        Self {
            id: part.id.clone(),
            width: part.width,
            height: part.height,
            quantity: part.quantity,
            rotate_allowed: part.rotate_allowed,
        }
    }
}

/// Payload of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Per-material results of an optimize or insert job.
    Groups(Vec<BrandResult>),
    /// Result of a pack job.
    Run(RunResult),
}

/// Reply to a [`Request`]: `{ok: true, data}` or `{ok: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// API version.
    pub version: String,

    /// Whether the job succeeded.
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,

    /// Error message if failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(data: ResponseData) -> Self {
        Self {
            version: API_VERSION.to_string(),
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            version: API_VERSION.to_string(),
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Group results, if this is a successful optimize or insert reply.
    pub fn groups(&self) -> Option<&[BrandResult]> {
        match &self.data {
            Some(ResponseData::Groups(groups)) => Some(groups),
            _ => None,
        }
    }

    /// Run result, if this is a successful pack reply.
    pub fn run(&self) -> Option<&RunResult> {
        match &self.data {
            Some(ResponseData::Run(run)) => Some(run),
            _ => None,
        }
    }
}
