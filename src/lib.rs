//! ycm-flags - Compiler flags for completion engines
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Flags come from the nearest `compile_commands.json` above a source file
//! - The nearest `ycm_extra_conf.yml` removes and adds flags on top
//! - FlagResolver owns its database cache; nothing is process-global

pub mod cache;
pub mod config;
pub mod database;
pub mod discovery;
pub mod domain;
pub mod report;

// Re-export main types for convenient access
pub use domain::flags::{CompilationInfo, FlagsError, FlagsResponse, FlagsResult};

pub use config::{FlagOverrides, OverrideBuilder, OverrideConfig, OVERRIDE_FILE_NAME};

pub use database::{CompilationDatabase, CompileCommand, DATABASE_FILE_NAME};

pub use discovery::ProjectFiles;

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use cache::{CacheStatistics, DatabaseCache};

use std::fs;
use std::path::{Path, PathBuf};

/// Options controlling how flags are resolved
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Use this database directory instead of searching above each file
    pub database_dir: Option<PathBuf>,
    /// File name of the compilation database
    pub database_file_name: String,
    /// File name of the override file
    pub override_file_name: String,
    /// Whether headers may borrow flags from a sibling source file
    pub header_fallback: bool,
    /// Whether relative include paths are rebased on the working directory
    pub absolute_paths: bool,
    /// Whether override files are applied
    pub apply_overrides: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            database_dir: None,
            database_file_name: DATABASE_FILE_NAME.to_string(),
            override_file_name: OVERRIDE_FILE_NAME.to_string(),
            header_fallback: true,
            absolute_paths: true,
            apply_overrides: true,
        }
    }
}

/// Resolves final compiler flags for source files
#[derive(Debug, Default)]
pub struct FlagResolver {
    options: ResolverOptions,
    cache: DatabaseCache,
}

impl FlagResolver {
    /// Create a resolver with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with the given options
    pub fn with_options(options: ResolverOptions) -> Self {
        let cache = DatabaseCache::with_file_name(options.database_file_name.clone());
        Self { options, cache }
    }

    /// Options in effect
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// The resolver's database cache
    pub fn cache(&self) -> &DatabaseCache {
        &self.cache
    }

    /// Mutable access to the database cache, e.g. to invalidate a directory
    pub fn cache_mut(&mut self) -> &mut DatabaseCache {
        &mut self.cache
    }

    /// Get cache statistics
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    /// Find the database directory and override file that apply to a file
    pub fn discover<P: AsRef<Path>>(&self, file: P) -> FlagsResult<ProjectFiles> {
        let file = absolute(file.as_ref())?;
        let mut files = ProjectFiles::discover_with_names(
            &file,
            &self.options.database_file_name,
            &self.options.override_file_name,
        );

        if let Some(dir) = self.database_dir_option()? {
            files.database_dir = Some(dir);
        }

        Ok(files)
    }

    /// Resolve the final flag list and working directory for a source file
    pub fn resolve<P: AsRef<Path>>(&mut self, file: P) -> FlagsResult<FlagsResponse> {
        let file = absolute(file.as_ref())?;
        tracing::debug!("Resolving flags for {}", file.display());

        let database_dir = match self.database_dir_option()? {
            Some(dir) => dir,
            None => discovery::find_database_dir(&file, &self.options.database_file_name)
                .ok_or_else(|| FlagsError::database_not_found(&file))?,
        };

        let database = self.cache.get_or_load(&database_dir)?;
        let info = database
            .compilation_info_for_file(&file, self.options.header_fallback)
            .ok_or_else(|| FlagsError::no_compilation_info(&file))?;

        tracing::debug!("Flags for this file: {:?}", info.flags);
        tracing::debug!("Working directory: {}", info.working_directory.display());

        let flags = if self.options.absolute_paths {
            database::make_relative_paths_absolute(&info.flags, &info.working_directory)
        } else {
            info.flags.clone()
        };

        let (flags, override_file) = self.apply_overrides(&file, flags)?;
        tracing::debug!("Final flags: {:?}", flags);

        Ok(FlagsResponse::new(flags, info.working_directory)
            .with_database_dir(database_dir)
            .with_override_file(override_file))
    }

    /// The configured database directory, keyed the same way discovered ones are
    fn database_dir_option(&self) -> FlagsResult<Option<PathBuf>> {
        match &self.options.database_dir {
            Some(dir) => match fs::canonicalize(dir) {
                Ok(dir) => Ok(Some(dir)),
                Err(_) => absolute(dir).map(Some),
            },
            None => Ok(None),
        }
    }

    /// Apply the nearest override file, if any
    fn apply_overrides(
        &self,
        file: &Path,
        flags: Vec<String>,
    ) -> FlagsResult<(Vec<String>, Option<PathBuf>)> {
        if !self.options.apply_overrides {
            return Ok((flags, None));
        }

        match discovery::find_override_file(file, &self.options.override_file_name) {
            Some(path) => {
                let overrides = OverrideConfig::load_from_file(&path)?;
                Ok((overrides.apply(&flags), Some(path)))
            }
            None => Ok((flags, None)),
        }
    }
}

/// Resolve flags for one file with a fresh resolver
pub fn flags_for_file<P: AsRef<Path>>(file: P) -> FlagsResult<FlagsResponse> {
    FlagResolver::new().resolve(file)
}

fn absolute(path: &Path) -> FlagsResult<PathBuf> {
    if path.is_absolute() {
        Ok(database::normalize_path(path))
    } else {
        Ok(database::normalize_path(&std::env::current_dir()?.join(path)))
    }
}
