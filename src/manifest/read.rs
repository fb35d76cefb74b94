use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;

use crate::manifest::ManifestError;

/// Family manifest name inside a genome folder
pub static FAMILY_MANIFEST: &str = "family_manifest.csv";
/// Batch upload manifest name inside a genome folder
pub static GENOME_MANIFEST: &str = "manifest.csv";

/// Find a named manifest among the files in `folder`
pub fn find_manifest(folder: &Path, name: &str) -> Result<PathBuf, ManifestError> {
    let found = fs::read_dir(folder)
        .map_err(|source| ManifestError::Read { path: folder.to_path_buf(), source })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .find(|path| path.file_name().map_or(false, |n| n == name));

    match found {
        Some(path) => {
            info!("Reading manifest {}", path.display());
            Ok(path)
        }
        None => Err(ManifestError::NotFound { name: name.to_string(), folder: folder.to_path_buf() }),
    }
}

pub fn open(path: &Path) -> Result<File, ManifestError> {
    File::open(path).map_err(|source| ManifestError::Read { path: path.to_path_buf(), source })
}
