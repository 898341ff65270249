use crate::models::MindMap;
use crate::parsing::ParseError;
use crate::writing::WriteOptions;
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAP_EXTENSION: &str = "mmd";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("Invalid maps directory: {0}")]
    InvalidMapsDir(String),
}

/// Read and parse a map below `maps_root`
pub fn read_map(relative_path: &RelativePath, maps_root: &Path) -> Result<MindMap, IoError> {
    read_map_file(&relative_path.to_path(maps_root))
}

/// Read and parse a map at an absolute or working directory relative path
pub fn read_map_file(path: &Path) -> Result<MindMap, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    MindMap::parse(&content).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a map below `maps_root`
pub fn write_map(
    relative_path: &RelativePath,
    maps_root: &Path,
    map: &MindMap,
    options: &WriteOptions,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(maps_root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&absolute_path, map.write_with(options))?;
    Ok(())
}

/// Scan for map files below `maps_root`, sorted
pub fn scan_map_files(maps_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    validate_maps_dir(maps_root)?;

    let mut files = Vec::new();
    scan_directory_recursive(maps_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == MAP_EXTENSION
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_maps_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidMapsDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
