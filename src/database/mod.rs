//! Compilation database loading and per-file lookup
//!
//! Architecture: Repository - CompilationDatabase answers "how was this file compiled?"
//! - `compile_commands.json` entries are indexed by normalized absolute path
//! - Headers borrow the flags of a sibling source file when they have no entry of their own

pub mod flags;

pub use flags::{extract_flags, make_relative_paths_absolute, normalize_path, split_command};

use crate::domain::flags::{CompilationInfo, FlagsError, FlagsResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of a compilation database
pub const DATABASE_FILE_NAME: &str = "compile_commands.json";

/// Source extensions tried, in order, when looking up flags for a header
pub const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cxx", "cc", "c", "m", "mm"];

/// Extensions treated as headers
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hxx", "hpp", "hh"];

/// One entry of `compile_commands.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// Working directory of the compilation
    pub directory: PathBuf,
    /// Main translation unit source, possibly relative to `directory`
    pub file: PathBuf,
    /// Compile command as a single shell-escaped string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Compile command as an argument list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
    /// Output produced by this compilation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl CompileCommand {
    /// Full argument list, preferring `arguments` over `command`
    pub fn argv(&self) -> Vec<String> {
        match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(command)) => split_command(command),
            (None, None) => Vec::new(),
        }
    }

    /// Compilation info with the working directory resolved against `database_dir`
    fn compilation_info(&self, database_dir: &Path) -> CompilationInfo {
        let working_directory = normalize_path(&database_dir.join(&self.directory));
        let source_file = normalize_path(&working_directory.join(&self.file));
        let flags = extract_flags(&self.argv(), &source_file, &working_directory);

        CompilationInfo::new(flags, working_directory)
    }
}

/// A loaded compilation database
#[derive(Debug)]
pub struct CompilationDatabase {
    /// Directory containing `compile_commands.json`
    directory: PathBuf,
    /// All entries, in file order
    entries: Vec<CompileCommand>,
    /// Normalized absolute source path to entry index
    index: HashMap<PathBuf, usize>,
    /// When the database was read
    loaded_at: DateTime<Utc>,
}

impl CompilationDatabase {
    /// Load `compile_commands.json` from a directory
    pub fn load<P: AsRef<Path>>(directory: P) -> FlagsResult<Self> {
        Self::load_file(directory.as_ref().join(DATABASE_FILE_NAME))
    }

    /// Load a compilation database file; entries resolve against the file's directory
    pub fn load_file<P: AsRef<Path>>(path: P) -> FlagsResult<Self> {
        let path = path.as_ref();
        let directory = path.parent().unwrap_or_else(|| Path::new(""));

        let content = fs::read_to_string(path)
            .map_err(|e| FlagsError::database(path, format!("Failed to read database: {e}")))?;

        let database = Self::from_json(directory, &content)
            .map_err(|e| FlagsError::database(path, e.to_string()))?;

        tracing::info!(
            "Loaded compilation database {} ({} entries)",
            path.display(),
            database.len()
        );
        Ok(database)
    }

    /// Build a database from JSON text, resolving relative entries against `directory`
    pub fn from_json<P: AsRef<Path>>(
        directory: P,
        content: &str,
    ) -> Result<Self, serde_json::Error> {
        let entries: Vec<CompileCommand> = serde_json::from_str(content)?;
        Ok(Self::from_entries(directory, entries))
    }

    /// Build a database from already parsed entries
    pub fn from_entries<P: AsRef<Path>>(directory: P, entries: Vec<CompileCommand>) -> Self {
        let directory = directory.as_ref().to_path_buf();
        let mut index = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            let source = normalize_path(&directory.join(&entry.directory).join(&entry.file));
            // First entry for a file wins
            index.entry(source).or_insert(i);
        }

        Self { directory, entries, index, loaded_at: Utc::now() }
    }

    /// Directory this database was loaded from
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// When this database was read
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the database has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in file order
    pub fn entries(&self) -> &[CompileCommand] {
        &self.entries
    }

    /// Look up compilation info for a file, falling back to sibling sources for headers
    pub fn compilation_info_for_file<P: AsRef<Path>>(
        &self,
        file: P,
        header_fallback: bool,
    ) -> Option<CompilationInfo> {
        let file = file.as_ref();

        if let Some(info) = self.lookup(file) {
            tracing::debug!("Using {} for finding compilation database flags", file.display());
            return Some(info);
        }

        if header_fallback && is_header_file(file) {
            for extension in SOURCE_EXTENSIONS {
                let replacement = file.with_extension(extension);
                if !replacement.exists() {
                    continue;
                }

                // A sibling only counts when it was compiled with real flags
                if let Some(info) = self.lookup(&replacement).filter(|info| info.has_flags()) {
                    tracing::debug!(
                        "Using {} for finding compilation database flags",
                        replacement.display()
                    );
                    return Some(info);
                }
            }
        }

        tracing::debug!("No compilation database entry for {}", file.display());
        None
    }

    /// Exact lookup by normalized path, then by canonical path
    fn lookup(&self, file: &Path) -> Option<CompilationInfo> {
        let index = self.index.get(&normalize_path(file)).or_else(|| {
            fs::canonicalize(file).ok().and_then(|canonical| self.index.get(&canonical))
        })?;

        Some(self.entries[*index].compilation_info(&self.directory))
    }
}

/// Whether a path has a header extension
pub fn is_header_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext))
}
