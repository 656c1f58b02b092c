//! File discovery and reading.
//!
//! Settings files are looked up by name in a list of [`SearchPath`]s. Every
//! directory is checked for `{dir}/{file_name}`; all files found are returned
//! in priority order (first = lowest) and the caller deep-merges them.
//! Missing files are silently skipped. Only real I/O errors (permissions,
//! etc.) are propagated.

use std::path::{Path, PathBuf};

use crate::engine::{PatchLine, parse_lines};
use crate::error::PatchError;
use crate::types::SearchPath;

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to build the platform config
/// directory (e.g. `~/.config/{app_name}/` on Linux). Returns `None` when the
/// directory cannot be determined (e.g. no home directory).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Every settings file found along `search_paths`, lowest priority first.
pub fn load_settings_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
) -> Result<Vec<(PathBuf, String)>, PatchError> {
    let mut results = Vec::new();
    for dir in search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
    {
        let file_path = dir.join(file_name);
        match std::fs::read_to_string(&file_path) {
            Ok(content) => {
                tracing::debug!(path = %file_path.display(), "found settings file");
                results.push((file_path, content));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(PatchError::IoError {
                    path: file_path,
                    source: e,
                });
            }
        }
    }
    Ok(results)
}

/// Read a file that must exist.
pub fn read_file(path: &Path) -> Result<String, PatchError> {
    std::fs::read_to_string(path).map_err(|e| PatchError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and parse a patch file.
pub fn read_patch(path: &Path) -> Result<Vec<PatchLine>, PatchError> {
    read_file(path).map(|text| parse_lines(&text))
}
