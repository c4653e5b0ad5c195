//! Parse configuration types (cindex.toml format).

use crate::BuildError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Languages libclang can be told to parse with `-x`.
const LANGUAGES: &[&str] = &["c", "c++", "objective-c", "objective-c++", "c-header", "c++-header"];

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CindexConfig {
    /// Options for the index every translation unit is created in.
    #[serde(default)]
    pub index: IndexConfig,

    /// Settings applied to every parsed file.
    #[serde(default)]
    pub parse: ParseConfig,

    /// Per-file overrides.
    #[serde(rename = "file", default)]
    pub files: Vec<FileConfig>,
}

/// Options for creating an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Skip declarations that come from a precompiled header.
    #[serde(default)]
    pub exclude_declarations_from_pch: bool,

    /// Let libclang print diagnostics to stderr while parsing.
    #[serde(default)]
    pub display_diagnostics: bool,

    /// Run libclang's indexing threads at background priority.
    #[serde(default)]
    pub background_indexing: bool,

    /// Run libclang's editing threads (reparse, completion) at background priority.
    #[serde(default)]
    pub background_editing: bool,
}

/// Global parse settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Source language passed as `-x <language>`.
    #[serde(default)]
    pub language: Option<String>,

    /// Language standard (e.g., "c11", "c++17").
    #[serde(default)]
    pub std: Option<String>,

    /// Include directories.
    #[serde(default)]
    pub includes: Vec<String>,

    /// Preprocessor definitions.
    #[serde(default)]
    pub defines: Vec<String>,

    /// Additional compiler flags.
    #[serde(default)]
    pub args: Vec<String>,

    /// Translation unit flags by name (e.g., "detailed_preprocessing_record").
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Overrides for one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Source file the override applies to.
    pub path: PathBuf,

    /// Replaces the global standard.
    #[serde(default)]
    pub std: Option<String>,

    /// Appended to the global include directories.
    #[serde(default)]
    pub includes: Vec<String>,

    /// Appended to the global definitions.
    #[serde(default)]
    pub defines: Vec<String>,

    /// Appended to the global flags.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Everything needed to parse one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseSettings {
    /// The main source file.
    pub file: PathBuf,

    /// Compiler arguments, without the compiler name or the source file.
    pub args: Vec<String>,

    /// Translation unit flag names.
    pub flags: Vec<String>,
}

impl ParseSettings {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Add compiler arguments.
    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Add translation unit flag names.
    pub fn with_flags(mut self, flags: &[&str]) -> Self {
        self.flags.extend(flags.iter().map(|s| s.to_string()));
        self
    }
}

impl CindexConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_str(&content)?;
        tracing::debug!(path = %path.display(), files = config.files.len(), "loaded cindex config");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: CindexConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings libclang would fail on in confusing ways.
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(language) = &self.parse.language {
            if !LANGUAGES.contains(&language.as_str()) {
                return Err(BuildError::Validation(format!(
                    "unknown language '{}' (expected one of {})",
                    language,
                    LANGUAGES.join(", ")
                )));
            }
        }
        if matches!(&self.parse.std, Some(std) if std.trim().is_empty()) {
            return Err(BuildError::Validation("parse.std is empty".to_string()));
        }
        for file in &self.files {
            if file.path.as_os_str().is_empty() {
                return Err(BuildError::Validation(
                    "[[file]] entry without a path".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Find the override for a source file.
    pub fn find_file(&self, path: &Path) -> Option<&FileConfig> {
        self.files
            .iter()
            .find(|f| f.path == path || path.ends_with(&f.path))
    }

    /// Resolve the settings for one source file (global + override).
    pub fn settings_for(&self, path: &Path) -> ParseSettings {
        let file = self.find_file(path);
        let mut args = Vec::new();

        if let Some(language) = &self.parse.language {
            args.push("-x".to_string());
            args.push(language.clone());
        }

        let std = file
            .and_then(|f| f.std.clone())
            .or_else(|| self.parse.std.clone());
        if let Some(std) = std {
            args.push(format!("-std={}", std));
        }

        let includes = self
            .parse
            .includes
            .iter()
            .chain(file.into_iter().flat_map(|f| f.includes.iter()));
        args.extend(includes.map(|i| format!("-I{}", i)));

        let defines = self
            .parse
            .defines
            .iter()
            .chain(file.into_iter().flat_map(|f| f.defines.iter()));
        args.extend(defines.map(|d| format!("-D{}", d)));

        args.extend(self.parse.args.iter().cloned());
        if let Some(file) = file {
            args.extend(file.args.iter().cloned());
        }

        ParseSettings {
            file: path.to_path_buf(),
            args,
            flags: self.parse.flags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[index]
exclude_declarations_from_pch = true
background_indexing = true

[parse]
language = "c"
std = "c11"
includes = ["include"]
defines = ["NDEBUG"]
args = ["-Wall"]
flags = ["detailed_preprocessing_record"]

[[file]]
path = "src/legacy.c"
std = "c89"
defines = ["LEGACY=1"]
        "#;

        let config = CindexConfig::from_str(toml).unwrap();

        assert!(config.index.exclude_declarations_from_pch);
        assert!(config.index.background_indexing);
        assert!(!config.index.display_diagnostics);
        assert_eq!(config.parse.std, Some("c11".to_string()));
        assert_eq!(config.files.len(), 1);
        assert!(config.find_file(Path::new("/work/src/legacy.c")).is_some());
    }

    #[test]
    fn test_settings_merge_global_and_file() {
        let config = CindexConfig::from_str(
            r#"
[parse]
language = "c"
std = "c11"
includes = ["include"]
defines = ["NDEBUG"]
args = ["-Wall"]
flags = ["skip_function_bodies"]

[[file]]
path = "legacy.c"
std = "c89"
defines = ["LEGACY=1"]
args = ["-w"]
            "#,
        )
        .unwrap();

        let legacy = config.settings_for(Path::new("legacy.c"));
        assert_eq!(
            legacy.args,
            vec!["-x", "c", "-std=c89", "-Iinclude", "-DNDEBUG", "-DLEGACY=1", "-Wall", "-w"]
        );
        assert_eq!(legacy.flags, vec!["skip_function_bodies"]);

        let main = config.settings_for(Path::new("main.c"));
        assert_eq!(
            main.args,
            vec!["-x", "c", "-std=c11", "-Iinclude", "-DNDEBUG", "-Wall"]
        );
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = CindexConfig::from_str("").unwrap();
        assert_eq!(config.index, IndexConfig::default());
        assert!(config.settings_for(Path::new("a.c")).args.is_empty());
    }

    #[test]
    fn test_unknown_language_rejected() {
        let err = CindexConfig::from_str("[parse]\nlanguage = \"fortran\"\n").unwrap_err();
        assert!(matches!(err, BuildError::Validation(_)));
    }

    #[test]
    fn test_settings_builder() {
        let settings = ParseSettings::new("main.c")
            .with_args(&["-std=c99"])
            .with_flags(&["incomplete"]);
        assert_eq!(settings.file, PathBuf::from("main.c"));
        assert_eq!(settings.args, vec!["-std=c99"]);
        assert_eq!(settings.flags, vec!["incomplete"]);
    }
}
