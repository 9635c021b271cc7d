//! The list of part files to load

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Cannot read part directory {path}: {source}")]
    UnreadableDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Part name for a mesh path: the last `/`-separated segment, trimmed.
///
/// The extension is kept, so `"models/Pons.glb"` names the part `"Pons.glb"`.
pub fn part_name_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path).trim()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSource {
    pub name: String,
    pub path: PathBuf,
}

impl PartSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.to_string_lossy().replace('\\', "/");
        Self {
            name: part_name_from_path(&display).to_string(),
            path,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PartManifest {
    sources: Vec<PartSource>,
}

impl PartManifest {
    /// Manifest from explicit paths, in the given order
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            sources: paths.into_iter().map(PartSource::new).collect(),
        }
    }

    /// Every file in `dir` whose extension matches one of `extensions`,
    /// ignoring case, sorted by file name. Subdirectories are not searched.
    pub fn scan(dir: &Path, extensions: &[String]) -> Result<Self, ManifestError> {
        let unreadable = |source| ManifestError::UnreadableDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
            if matches {
                paths.push(path);
            } else {
                tracing::debug!(path = %path.display(), "Skipping non-mesh file");
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        tracing::info!(dir = %dir.display(), count = paths.len(), "Scanned part directory");
        Ok(Self::from_paths(paths))
    }

    pub fn sources(&self) -> &[PartSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
