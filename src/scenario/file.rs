//! 场景文件（JSON）
//!
//! ```json
//! { "schema_version": 1, "scenarios": [ { "name": "...", "output": "...", "horizon": 30.0, "flows": [...] } ] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::registry::Scenario;
use crate::error::{Error, Result};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub schema_version: u32,
    pub scenarios: Vec<Scenario>,
}

impl ScenarioFile {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            scenarios,
        }
    }

    /// 读取并检查版本号
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ScenarioFile = serde_json::from_str(&raw).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if file.schema_version != SCHEMA_VERSION {
            return Err(Error::Schema {
                path: path.to_path_buf(),
                found: file.schema_version,
            });
        }
        info!(path = %path.display(), scenarios = file.scenarios.len(), "📄 读取场景文件");
        Ok(file)
    }
}
