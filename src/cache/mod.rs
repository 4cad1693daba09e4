//! In-memory compilation database cache
//!
//! CDD Principle: Infrastructure Layer - Cache avoids re-reading databases without affecting resolution
//! - DatabaseCache is owned by a resolver; there is no process-wide instance
//! - Databases are keyed by the directory holding `compile_commands.json`
//! - Failed loads are not remembered so a later request can succeed

use crate::database::{CompilationDatabase, DATABASE_FILE_NAME};
use crate::domain::flags::FlagsResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache of loaded compilation databases
#[derive(Debug)]
pub struct DatabaseCache {
    /// Database file name read inside each directory
    file_name: String,
    /// Loaded databases by directory
    databases: HashMap<PathBuf, Arc<CompilationDatabase>>,
    /// Lookups answered from the cache
    hits: u64,
    /// Lookups that had to read a database
    misses: u64,
}

impl Default for DatabaseCache {
    fn default() -> Self {
        Self::with_file_name(DATABASE_FILE_NAME)
    }
}

impl DatabaseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache that reads `file_name` inside each database directory
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self { file_name: file_name.into(), databases: HashMap::new(), hits: 0, misses: 0 }
    }

    /// Return the cached database for `directory`, loading it on first use
    pub fn get_or_load<P: AsRef<Path>>(
        &mut self,
        directory: P,
    ) -> FlagsResult<Arc<CompilationDatabase>> {
        let directory = directory.as_ref();

        if let Some(database) = self.databases.get(directory) {
            self.hits += 1;
            tracing::debug!("Reusing cached compilation database for {}", directory.display());
            return Ok(Arc::clone(database));
        }

        self.misses += 1;
        let database =
            Arc::new(CompilationDatabase::load_file(directory.join(&self.file_name))?);
        self.databases.insert(directory.to_path_buf(), Arc::clone(&database));

        Ok(database)
    }

    /// Insert an already loaded database, replacing any previous one for its directory
    pub fn insert(&mut self, database: CompilationDatabase) -> Arc<CompilationDatabase> {
        let database = Arc::new(database);
        self.databases.insert(database.directory().to_path_buf(), Arc::clone(&database));
        database
    }

    /// Whether a database for `directory` is cached
    pub fn contains<P: AsRef<Path>>(&self, directory: P) -> bool {
        self.databases.contains_key(directory.as_ref())
    }

    /// Drop the cached database for `directory` so the next lookup re-reads it
    pub fn invalidate<P: AsRef<Path>>(&mut self, directory: P) -> bool {
        self.databases.remove(directory.as_ref()).is_some()
    }

    /// Drop every cached database and reset counters
    pub fn clear(&mut self) {
        self.databases.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Number of cached databases
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Get cache statistics
    pub fn statistics(&self) -> CacheStatistics {
        let lookups = self.hits + self.misses;
        CacheStatistics {
            databases: self.databases.len(),
            entries: self.databases.values().map(|db| db.len()).sum(),
            cache_hits: self.hits,
            cache_misses: self.misses,
            hit_rate: if lookups > 0 { self.hits as f64 / lookups as f64 } else { 0.0 },
        }
    }
}

/// Cache performance statistics
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub databases: usize,
    pub entries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub hit_rate: f64,
}

impl CacheStatistics {
    /// Format statistics for display
    pub fn format_display(&self) -> String {
        format!(
            "Cache: {} databases ({} entries), {:.1}% hit rate ({} hits, {} misses)",
            self.databases,
            self.entries,
            self.hit_rate * 100.0,
            self.cache_hits,
            self.cache_misses
        )
    }
}
