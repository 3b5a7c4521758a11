//! Invocation target rules
//!
//! Decides whether a path may be opened as a combined view.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::ViewerError;

/// Default pattern a script path must match
pub const DEFAULT_SCRIPT_PATTERN: &str = r"\.ts$";
/// Default pattern that excludes test/spec variants
pub const DEFAULT_EXCLUDE_PATTERN: &str = r"\.spec\.ts$";

/// Compiled script/exclusion patterns
#[derive(Debug, Clone)]
pub struct TargetRules {
    script: Regex,
    exclude: Regex,
}

impl TargetRules {
    pub fn new(script_pattern: &str, exclude_pattern: &str) -> Result<Self> {
        let script = Regex::new(script_pattern)
            .with_context(|| format!("Invalid script pattern: {}", script_pattern))?;
        let exclude = Regex::new(exclude_pattern)
            .with_context(|| format!("Invalid exclude pattern: {}", exclude_pattern))?;
        Ok(Self { script, exclude })
    }

    /// Whether `path` is a component script that can be opened
    pub fn accepts(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.script.is_match(&text) && !self.exclude.is_match(&text)
    }

    pub fn validate(&self, path: &Path) -> Result<(), ViewerError> {
        if self.accepts(path) {
            Ok(())
        } else {
            Err(ViewerError::InvalidTarget(path.to_path_buf()))
        }
    }
}

impl Default for TargetRules {
    fn default() -> Self {
        Self {
            script: Regex::new(DEFAULT_SCRIPT_PATTERN).expect("default script pattern is valid"),
            exclude: Regex::new(DEFAULT_EXCLUDE_PATTERN).expect("default exclude pattern is valid"),
        }
    }
}
