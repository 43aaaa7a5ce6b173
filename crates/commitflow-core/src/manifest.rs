//! Typed view of the project manifest (`package.json`).
//!
//! Only the `scripts` table matters here; every other key is ignored.

use crate::error::Result;
use crate::paths;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl Manifest {
    /// Load the manifest at `root`. Returns `Ok(None)` when the file is absent.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = paths::manifest_path(root);
        if !path.is_file() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(Self::parse(&data)?))
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }
}
