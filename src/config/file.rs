//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use crate::quality::{ScoreWeights, ThresholdSet};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".devdesc-tools.yaml",
    ".devdesc-tools.yml",
    "devdesc-tools.yaml",
    "devdesc-tools.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/devdesc-tools/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    // 1. Use explicit path if provided
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // 2. Search current directory
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(path) = find_config_in_dir(&cwd) {
            return Some(path);
        }
    }

    // 3. Search git root (if in a repo)
    if let Some(git_root) = find_git_root() {
        if let Some(path) = find_config_in_dir(&git_root) {
            return Some(path);
        }
    }

    // 4. Search user config directory
    if let Some(config_dir) = dirs::config_dir() {
        let tool_config_dir = config_dir.join("devdesc-tools");
        if let Some(path) = find_config_in_dir(&tool_config_dir) {
            return Some(path);
        }
    }

    // 5. Search home directory
    if let Some(home) = dirs::home_dir() {
        if let Some(path) = find_config_in_dir(&home) {
            return Some(path);
        }
    }

    None
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();

    loop {
        let git_dir = current.join(".git");
        if git_dir.exists() {
            return Some(current.to_path_buf());
        }

        current = current.parent()?;
    }
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug)]
pub enum ConfigFileError {
    /// File not found
    NotFound(PathBuf),
    /// IO error reading file
    Io(std::io::Error),
    /// YAML parsing error
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            Self::Io(e) => write!(f, "Failed to read config file: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigFileError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err)
    }
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// This is useful for layering CLI args over file config.
    pub fn merge(&mut self, other: &Self) {
        // Scoring config
        if other.scoring.weights != ScoreWeights::default() {
            self.scoring.weights = other.scoring.weights;
        }
        if other.scoring.include_formatting {
            self.scoring.include_formatting = true;
        }

        // Threshold rules replace wholesale; splicing individual rules
        // would reorder the gate.
        if !other.thresholds.is_empty() && other.thresholds != ThresholdSet::default() {
            self.thresholds = other.thresholds.clone();
        }

        // Synonym overrides accumulate per canonical field
        for (section, fields) in &other.synonyms.overrides {
            let target = self.synonyms.overrides.entry(section.clone()).or_default();
            for (canonical, literals) in fields {
                target.insert(canonical.clone(), literals.clone());
            }
        }

        // Output config - only override if explicitly set
        if other.output.format != crate::reports::ReportFormat::Auto {
            self.output.format = other.output.format;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.no_color {
            self.output.no_color = true;
        }

        // Batch config
        if other.batch.jobs.is_some() {
            self.batch.jobs = other.batch.jobs;
        }
        if other.batch.history.is_some() {
            self.batch.history.clone_from(&other.batch.history);
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# Device Description Tools Configuration
# Place this file at .devdesc-tools.yaml in your project root or ~/.config/devdesc-tools/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_full_example_config() -> String {
    r"# Device Description Tools Configuration File
# =============================================
#
# This file configures devdesc-tools behavior. Place it at:
#   - .devdesc-tools.yaml in your project root
#   - ~/.config/devdesc-tools/devdesc-tools.yaml for global config
#
# CLI arguments always override file settings.

# Completeness scoring
scoring:
  # Penalty weights by difference kind
  weights:
    missing: 1.0
    value_mismatch: 1.0
    extra: 0.0
  # Report formatting-only differences (they never affect the score)
  include_formatting: false

# Phase gate rules, evaluated top to bottom; the first match wins.
# Omitted conditions do not constrain.
thresholds:
  - phase: production
    min_score: 98.0
    max_errors: 0
    max_warnings: 10
  - phase: candidate
    min_score: 90.0
    max_errors: 0
  - phase: review
    min_score: 60.0
  - phase: quarantine

# Synonym overrides for the sectioned-text dialect.
# A configured list replaces the built-in list for that field; the first
# literal becomes the spelling used during reconstruction.
synonyms:
  overrides: {}
  # overrides:
  #   device:
  #     vendor_id: [VendorNo, VendCode]

# Output configuration
output:
  # Format: auto, json, summary
  format: auto
  # Output file path (omit for stdout)
  # file: report.json
  # Disable colored output
  no_color: false

# Batch processing
batch: {}
  # Worker threads (omit to use the global pool)
  # jobs: 8
  # JSONL file quality metrics are appended to
  # history: ./quality-history.jsonl
"
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::ReportFormat;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".devdesc-tools.yaml");
        std::fs::write(&config_path, "scoring:\n  include_formatting: true\n").unwrap();

        let found = find_config_in_dir(tmp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        let found = find_config_in_dir(tmp.path());
        assert_eq!(found, None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r#"
scoring:
  weights:
    missing: 2.0
  include_formatting: true
batch:
  jobs: 4
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert!(config.scoring.include_formatting);
        assert!((config.scoring.weights.missing - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.batch.jobs, Some(4));
        // Unset sections keep their defaults.
        assert_eq!(config.thresholds, ThresholdSet::default());
    }

    #[test]
    fn test_load_config_file_custom_thresholds() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r"
thresholds:
  - phase: ship
    min_score: 95.0
  - phase: hold
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.thresholds.rules.len(), 2);
        assert_eq!(config.thresholds.classify(99.0, 0, 0), "ship");
        assert_eq!(config.thresholds.classify(10.0, 0, 0), "hold");
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::default();
        let override_config = AppConfig::builder()
            .include_formatting(true)
            .output_format(ReportFormat::Json)
            .jobs(Some(2))
            .build();

        base.merge(&override_config);

        assert!(base.scoring.include_formatting);
        assert_eq!(base.output.format, ReportFormat::Json);
        assert_eq!(base.batch.jobs, Some(2));
        // Untouched settings stay at their defaults.
        assert_eq!(base.thresholds, ThresholdSet::default());
        assert!(!base.output.no_color);
    }

    #[test]
    fn test_config_merge_synonyms_accumulate() {
        let mut base = AppConfig::builder()
            .synonym("device", "vendor_id", vec!["VendorNo".to_string()])
            .build();
        let other = AppConfig::builder()
            .synonym("file", "revision", vec!["Rev".to_string()])
            .build();

        base.merge(&other);

        assert!(base.synonyms.overrides.contains_key("device"));
        assert!(base.synonyms.overrides.contains_key("file"));
    }

    #[test]
    fn test_generate_example_config() {
        let example = generate_example_config();
        assert!(example.contains("scoring:"));
        assert!(example.contains("thresholds:"));
        assert!(example.contains("production"));
    }

    #[test]
    fn test_full_example_config_parses() {
        let example = generate_full_example_config();
        let config: AppConfig = serde_yaml::from_str(&example).unwrap();
        assert_eq!(config.thresholds.rules.len(), 4);
        assert_eq!(config.output.format, ReportFormat::Auto);
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "output:\n  no_color: true").unwrap();

        let discovered = discover_config_file(Some(&config_path));
        assert_eq!(discovered, Some(config_path));
    }
}
