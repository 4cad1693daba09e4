//! Upward search for compilation databases and override files
//!
//! Architecture: Service Layer - Discovery walks parent directories the way ignore files are found
//! - Nearest file wins; the search never looks below the starting directory
//! - Absence is reported as None, never as an error

use crate::config::OVERRIDE_FILE_NAME;
use crate::database::DATABASE_FILE_NAME;
use std::fs;
use std::path::{Path, PathBuf};

/// Files that apply to one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFiles {
    /// Directory containing the compilation database
    pub database_dir: Option<PathBuf>,
    /// Nearest override file
    pub override_file: Option<PathBuf>,
}

impl ProjectFiles {
    /// Discover both files for a source file using the default names
    pub fn discover<P: AsRef<Path>>(source_file: P) -> Self {
        Self::discover_with_names(source_file, DATABASE_FILE_NAME, OVERRIDE_FILE_NAME)
    }

    /// Discover both files using custom file names
    pub fn discover_with_names<P: AsRef<Path>>(
        source_file: P,
        database_file_name: &str,
        override_file_name: &str,
    ) -> Self {
        let source_file = source_file.as_ref();
        Self {
            database_dir: find_database_dir(source_file, database_file_name),
            override_file: find_override_file(source_file, override_file_name),
        }
    }
}

/// Find the nearest directory above `source_file` that holds a compilation database
pub fn find_database_dir<P: AsRef<Path>>(
    source_file: P,
    database_file_name: &str,
) -> Option<PathBuf> {
    let dir = find_upwards(source_file.as_ref(), database_file_name)?.parent()?.to_path_buf();
    let dir = fs::canonicalize(&dir).unwrap_or(dir);

    tracing::debug!("Using {} as compilation database directory", dir.display());
    Some(dir)
}

/// Find the nearest override file above `source_file`
pub fn find_override_file<P: AsRef<Path>>(
    source_file: P,
    override_file_name: &str,
) -> Option<PathBuf> {
    let path = find_upwards(source_file.as_ref(), override_file_name)?;

    tracing::debug!("Found override file: {}", path.display());
    Some(path)
}

/// Walk from the file's directory to the filesystem root looking for `file_name`
fn find_upwards(source_file: &Path, file_name: &str) -> Option<PathBuf> {
    let mut current_dir = source_file.parent();

    while let Some(dir) = current_dir {
        tracing::trace!("Searching {} for {}", dir.display(), file_name);

        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        current_dir = dir.parent();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("compile_commands.json"), "[]").unwrap();
        fs::write(root.join("src/nested/a.cpp"), "int main() {}").unwrap();
        temp_dir
    }

    #[test]
    fn test_finds_database_in_ancestor() {
        let temp_dir = project();
        let file = temp_dir.path().join("src/nested/a.cpp");

        let dir = find_database_dir(&file, DATABASE_FILE_NAME).unwrap();
        assert_eq!(dir, fs::canonicalize(temp_dir.path()).unwrap());
    }

    #[test]
    fn test_nearest_override_wins() {
        let temp_dir = project();
        let root = temp_dir.path();
        fs::write(root.join(OVERRIDE_FILE_NAME), "flags: {}").unwrap();
        fs::write(root.join("src").join(OVERRIDE_FILE_NAME), "flags: {}").unwrap();

        let found = find_override_file(root.join("src/nested/a.cpp"), OVERRIDE_FILE_NAME).unwrap();
        assert_eq!(found, root.join("src").join(OVERRIDE_FILE_NAME));
    }

    #[test]
    fn test_override_next_to_file() {
        let temp_dir = project();
        let root = temp_dir.path();
        fs::write(root.join("src/nested").join(OVERRIDE_FILE_NAME), "").unwrap();

        let found = find_override_file(root.join("src/nested/a.cpp"), OVERRIDE_FILE_NAME);
        assert_eq!(found, Some(root.join("src/nested").join(OVERRIDE_FILE_NAME)));
    }

    #[test]
    fn test_directory_with_override_name_is_ignored() {
        let temp_dir = project();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src").join(OVERRIDE_FILE_NAME)).unwrap();

        assert_eq!(find_override_file(root.join("src/nested/a.cpp"), OVERRIDE_FILE_NAME), None);
    }

    #[test]
    fn test_discover_without_override() {
        let temp_dir = project();
        let files = ProjectFiles::discover(temp_dir.path().join("src/nested/a.cpp"));

        assert!(files.database_dir.is_some());
        assert!(files.override_file.is_none());
    }

    #[test]
    fn test_custom_names() {
        let temp_dir = project();
        let root = temp_dir.path();
        fs::write(root.join("flags.yml"), "").unwrap();

        let files = ProjectFiles::discover_with_names(
            root.join("src/nested/a.cpp"),
            "missing.json",
            "flags.yml",
        );
        assert_eq!(files.database_dir, None);
        assert_eq!(files.override_file, Some(root.join("flags.yml")));
    }
}
