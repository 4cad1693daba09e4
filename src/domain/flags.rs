//! Core domain models for compiler flag resolution
//!
//! Architecture: Rich Domain Models - CompilationInfo and FlagsResponse carry behavior, not just data
//! - CompilationInfo is what a database knows about one translation unit
//! - FlagsResponse is the value handed back to the completion host

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Flags and working directory recorded for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationInfo {
    /// Compiler flags, without the compiler executable, `-c`, `-o` or the source file
    pub flags: Vec<String>,
    /// Directory the compiler was invoked from
    pub working_directory: PathBuf,
}

impl CompilationInfo {
    /// Create compilation info from a flag list and working directory
    pub fn new(flags: Vec<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self { flags, working_directory: working_directory.into() }
    }

    /// Whether the database actually produced flags for this file
    pub fn has_flags(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Final answer returned to the completion host for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsResponse {
    /// Final flag list after overrides
    pub flags: Vec<String>,
    /// Directory relative include paths are resolved against
    #[serde(rename = "include_paths_relative_to_dir")]
    pub working_directory: PathBuf,
    /// Whether the host may cache these flags for the file
    pub do_cache: bool,
    /// Compilation database directory the flags came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_dir: Option<PathBuf>,
    /// Override file applied to the flags, if one was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_file: Option<PathBuf>,
}

impl FlagsResponse {
    /// Create a cacheable response
    pub fn new(flags: Vec<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            flags,
            working_directory: working_directory.into(),
            do_cache: true,
            database_dir: None,
            override_file: None,
        }
    }

    /// Record the database directory used
    pub fn with_database_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.database_dir = Some(dir.into());
        self
    }

    /// Record the override file applied
    pub fn with_override_file(mut self, path: Option<PathBuf>) -> Self {
        self.override_file = path;
        self
    }

    /// Whether a flag is present in the final list
    pub fn contains_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Error types that can occur during flag resolution
#[derive(Debug, thiserror::Error)]
pub enum FlagsError {
    /// Override file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// No compilation database above the source file
    #[error("No compilation database found above {}", .searched_from.display())]
    DatabaseNotFound { searched_from: PathBuf },

    /// Compilation database could not be read or parsed
    #[error("Compilation database error in {path}: {message}")]
    Database { path: String, message: String },

    /// The database has no usable entry for the file
    #[error("No compilation info found for {}", .file.display())]
    NoCompilationInfo { file: PathBuf },
}

impl FlagsError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a database error
    pub fn database(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Database { path: path.as_ref().display().to_string(), message: message.into() }
    }

    /// Create a missing-database error
    pub fn database_not_found(searched_from: impl Into<PathBuf>) -> Self {
        Self::DatabaseNotFound { searched_from: searched_from.into() }
    }

    /// Create a missing-entry error
    pub fn no_compilation_info(file: impl Into<PathBuf>) -> Self {
        Self::NoCompilationInfo { file: file.into() }
    }
}

/// Result type for flag resolution operations
pub type FlagsResult<T> = Result<T, FlagsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serializes_host_contract() {
        let response = FlagsResponse::new(vec!["-DX".to_string()], "/work");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["flags"][0], "-DX");
        assert_eq!(json["include_paths_relative_to_dir"], "/work");
        assert_eq!(json["do_cache"], true);
        assert!(json.get("override_file").is_none());
    }

    #[test]
    fn test_response_builders() {
        let response = FlagsResponse::new(vec!["-Wall".to_string()], "/work")
            .with_database_dir("/work/build")
            .with_override_file(Some(PathBuf::from("/work/ycm_extra_conf.yml")));

        assert!(response.contains_flag("-Wall"));
        assert!(!response.contains_flag("-Werror"));
        assert_eq!(response.database_dir, Some(PathBuf::from("/work/build")));
    }

    #[test]
    fn test_error_display() {
        let err = FlagsError::no_compilation_info("/src/a.cpp");
        assert_eq!(err.to_string(), "No compilation info found for /src/a.cpp");

        let err = FlagsError::database("/b/compile_commands.json", "bad json");
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn test_compilation_info_has_flags() {
        assert!(!CompilationInfo::new(vec![], "/w").has_flags());
        assert!(CompilationInfo::new(vec!["-O2".to_string()], "/w").has_flags());
    }
}
