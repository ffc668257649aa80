//! User preferences, stored as RON.
//!
//! Every field is optional in the file; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::duplicate::UnmappedParentPolicy;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Folder exports are written to. Prepended verbatim to file names.
    pub export_path: String,
    /// Apply scaling/smoothing when preparing. If not, just warn about it.
    pub apply_on_export: bool,
    pub apply_scaling: bool,
    pub apply_smoothing: bool,
    pub suffix_draft: String,
    pub suffix_lp: String,
    pub suffix_hp: String,
    pub unmapped_parent: UnmappedParentPolicy,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            export_path: String::new(),
            apply_on_export: true,
            apply_scaling: true,
            apply_smoothing: true,
            suffix_draft: ".draft".to_string(),
            suffix_lp: ".lp".to_string(),
            suffix_hp: ".hp".to_string(),
            unmapped_parent: UnmappedParentPolicy::Keep,
        }
    }
}

impl Preferences {
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Loads preferences, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No preferences at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let source = std::fs::read_to_string(path)?;
        let preferences = Self::from_ron(&source)?;
        log::info!(
            "Path: {}, Scaling: {}, Smoothing: {}",
            preferences.export_path,
            preferences.apply_scaling,
            preferences.apply_smoothing
        );

        Ok(preferences)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::new().indentor("    ".to_string());
        let source = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, source)?;
        Ok(())
    }
}
