//! Storage location resolution
//!
//! An explicit location is used as given. The default location lives in the
//! user's documents directory and its folder is created on demand:
//!
//! ```text
//! <documents>/CodableStorage/storage.db
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Folder created under the documents directory
pub const DEFAULT_DIR_NAME: &str = "CodableStorage";

/// Table file name inside the default folder
pub const DEFAULT_FILE_NAME: &str = "storage.db";

/// The default table file, or `None` if the platform has no documents directory
pub fn default_location() -> Option<PathBuf> {
    dirs::document_dir().map(|docs| default_location_in(&docs))
}

fn default_location_in(base: &Path) -> PathBuf {
    base.join(DEFAULT_DIR_NAME).join(DEFAULT_FILE_NAME)
}

/// Resolve the file an engine should open
///
/// Only the default location gets its directory created; an explicit
/// location must already have an existing parent.
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let docs = dirs::document_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no documents directory on this platform")
    })?;
    resolve_in(&docs)
}

/// The default table file under `base`, creating its folder
pub fn resolve_in(base: &Path) -> Result<PathBuf> {
    let path = default_location_in(base);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    Ok(path)
}
