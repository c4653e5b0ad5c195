//! Parse settings for the cindex adapter.
//!
//! This crate provides:
//! - The `cindex.toml` configuration format (index options, global and
//!   per-file parse settings)
//! - compile_commands.json loading
//! - [`ParseSettings`]: the resolved argument list for one source file
//!
//! # Example
//!
//! ```toml
//! # cindex.toml
//! [index]
//! background_indexing = true
//!
//! [parse]
//! language = "c"
//! std = "c11"
//! includes = ["include"]
//! flags = ["detailed_preprocessing_record"]
//!
//! [[file]]
//! path = "src/legacy.c"
//! std = "c89"
//! ```

mod compile_commands;
mod config;
mod error;

pub use compile_commands::{CompileCommand, CompileCommands};
pub use config::{CindexConfig, FileConfig, IndexConfig, ParseConfig, ParseSettings};
pub use error::{BuildError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "[parse]\nlanguage = \"c\"\nstd = \"c99\"").unwrap();

        let config = CindexConfig::from_file(file.path()).expect("Failed to load config");
        let settings = config.settings_for(Path::new("main.c"));
        assert_eq!(settings.args, vec!["-x", "c", "-std=c99"]);
    }

    #[test]
    fn test_missing_config_file() {
        let err = CindexConfig::from_file(Path::new("/nonexistent/cindex.toml")).unwrap_err();
        assert!(matches!(err, BuildError::ReadConfig(_)));
    }
}
