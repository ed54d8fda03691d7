//! Operator-supplied key/value metrics attached to each record.
//!
//! An extensions source is a JSON object of string to string:
//!
//! ```json
//! {"foo": "bar", "baz": "qux"}
//! ```
//!
//! It can be a single file, or a directory where every regular,
//! non-hidden file is one such object.

use census_report::Extension;
use std::{
    collections::BTreeMap,
    io,
    path::{
        Path,
        PathBuf,
    },
};

#[derive(thiserror::Error, Debug)]
pub enum ExtensionsError {
    #[error("unable to stat extensions path {path:?}: {source}")]
    Stat {
        path: PathBuf,
        source: io::Error,
    },
    #[error("unable to list extensions directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: io::Error,
    },
    #[error("unable to read extensions file {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },
    #[error("extensions are not a JSON object of strings: {0}")]
    Parse(#[from] serde_json::Error),
}

pub trait ExtensionsLister: Send + Sync {
    fn list_extensions(&self) -> Result<Vec<Extension>, ExtensionsError>;
}

/// Reads extensions from a file or a directory of files.
///
/// Without a path there are no extensions. In directory mode files that fail
/// to parse are skipped so one bad drop-in can't silence the others.
#[derive(Debug, Clone, Default)]
pub struct PathExtensionsLister {
    path: Option<PathBuf>,
}

impl PathExtensionsLister {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    fn list_dir(dir: &Path) -> Result<Vec<Extension>, ExtensionsError> {
        let read_dir_err = |source| ExtensionsError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = std::fs::read_dir(dir)
            .map_err(read_dir_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_dir_err)?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut extensions = Vec::new();
        for entry in entries {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let is_dir = entry
                .file_type()
                .map_err(|source| ExtensionsError::Stat {
                    path: path.clone(),
                    source,
                })?
                .is_dir();
            if is_dir {
                continue;
            }
            let bytes = read_file(&path)?;
            match extensions_from_bytes(&bytes) {
                Ok(found) => extensions.extend(found),
                Err(err) => debug!(?path, %err, "skipping malformed extensions file"),
            }
        }
        Ok(extensions)
    }
}

impl ExtensionsLister for PathExtensionsLister {
    fn list_extensions(&self) -> Result<Vec<Extension>, ExtensionsError> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        let metadata = std::fs::metadata(path).map_err(|source| ExtensionsError::Stat {
            path: path.clone(),
            source,
        })?;
        if metadata.is_dir() {
            Self::list_dir(path)
        } else {
            extensions_from_bytes(&read_file(path)?)
        }
    }
}

/// Extensions from an in-memory JSON document.
#[derive(Debug, Clone, Default)]
pub struct BytesExtensionsLister(pub Vec<u8>);

impl ExtensionsLister for BytesExtensionsLister {
    fn list_extensions(&self) -> Result<Vec<Extension>, ExtensionsError> {
        extensions_from_bytes(&self.0)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ExtensionsError> {
    std::fs::read(path).map_err(|source| ExtensionsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Empty input means no extensions. Otherwise the bytes must be a JSON object
/// of string to string; the result is ordered by name.
fn extensions_from_bytes(bytes: &[u8]) -> Result<Vec<Extension>, ExtensionsError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let map: BTreeMap<String, String> = serde_json::from_slice(bytes)?;
    Ok(map.into_iter().map(|(name, value)| Extension::new(name, value)).collect())
}
