//! Settings and the report header.
//!
//! Every [`Settings`] field has a default, so a config file only lists what it
//! overrides:
//!
//! ```json
//! { "deep_profile": true, "prune_percentage": 0.5 }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::analysis::ViewFilter;
use crate::domain::ConfigError;
use iterscope_common::{
    DEFAULT_DEEP_SEARCH_DEPTH, DEFAULT_DIVERGENCE_PERCENTAGE, DEFAULT_FRAME_BUDGET,
    DEFAULT_MIN_IMPORT_DURATION, DEFAULT_PRUNE_PERCENTAGE, DEFAULT_SEARCH_DEPTH,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lifecycle notifications are ignored while false.
    pub capture_enabled: bool,
    /// Selects `deep_search_depth` for marker searches.
    pub deep_profile: bool,
    pub user_code_only: bool,
    pub flatten: bool,
    /// Snapshots a placeholder waits for its markers.
    pub frame_budget: u32,
    pub search_depth: usize,
    pub deep_search_depth: usize,
    /// Samples shorter than this (ms) are not imported.
    pub min_import_duration: f64,
    /// Performance report: spans below this share (%) are not expanded.
    pub prune_percentage: f64,
    /// Performance report: a child above this share of its parent's share
    /// (%) is merged into the parent's box.
    pub divergence_percentage: f64,
    /// Shown in report headers.
    pub product_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capture_enabled: true,
            deep_profile: false,
            user_code_only: false,
            flatten: false,
            frame_budget: DEFAULT_FRAME_BUDGET,
            search_depth: DEFAULT_SEARCH_DEPTH,
            deep_search_depth: DEFAULT_DEEP_SEARCH_DEPTH,
            min_import_duration: DEFAULT_MIN_IMPORT_DURATION,
            prune_percentage: DEFAULT_PRUNE_PERCENTAGE,
            divergence_percentage: DEFAULT_DIVERGENCE_PERCENTAGE,
            product_name: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds an out-of-range threshold.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a zero frame budget or search
    /// depth, a negative or non-finite import cutoff, or a percentage outside
    /// `0..=100`.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("frame_budget", self.frame_budget as usize),
            ("search_depth", self.search_depth),
            ("deep_search_depth", self.deep_search_depth),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange { field, expected: "at least 1", value: 0.0 });
            }
        }

        if !self.min_import_duration.is_finite() || self.min_import_duration < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "min_import_duration",
                expected: "finite and non-negative",
                value: self.min_import_duration,
            });
        }
        for (field, value) in [
            ("prune_percentage", self.prune_percentage),
            ("divergence_percentage", self.divergence_percentage),
        ] {
            // NaN fails the range check.
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, expected: "within 0..=100", value });
            }
        }
        Ok(())
    }

    /// Marker search depth for the current profiling mode.
    #[must_use]
    pub fn active_search_depth(&self) -> usize {
        if self.deep_profile {
            self.deep_search_depth
        } else {
            self.search_depth
        }
    }

    #[must_use]
    pub fn view_filter(&self) -> ViewFilter {
        ViewFilter { user_code_only: self.user_code_only, flatten: self.flatten }
    }
}

/// Metadata block at the top of every report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    pub generated_at: DateTime<Utc>,
    pub product_name: String,
    pub platform: String,
    pub deep_profile: bool,
    pub flatten: bool,
    pub user_code: bool,
}

impl ReportHeader {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::at(settings, Utc::now())
    }

    #[must_use]
    pub fn at(settings: &Settings, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            product_name: settings.product_name.clone(),
            platform: std::env::consts::OS.to_string(),
            deep_profile: settings.deep_profile,
            flatten: settings.flatten,
            user_code: settings.user_code_only,
        }
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Time: {} UTC", self.generated_at.format("%Y-%m-%d %H:%M:%S")),
            format!("Product Name: {}", self.product_name),
            format!("Platform: {}", self.platform),
            format!("Deep Profile: {}", self.deep_profile),
            format!("Flatten: {}", self.flatten),
            format!("User Code: {}", self.user_code),
        ]
    }

    /// Header on a single line, `; `-separated.
    #[must_use]
    pub fn single_line(&self) -> String {
        self.lines().join("; ")
    }
}

/// One `key: value` per line, each newline-terminated.
impl fmt::Display for ReportHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
