//! Configuration loading

use anyhow::{Context, Result};
use nucleus_core::{PartManifest, ViewerSettings, DEFAULT_LABEL_OFFSET};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub color_table: ColorTableConfig,
    #[serde(default)]
    pub parts: PartsConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory every other path is relative to
    #[serde(default = "default_assets_root")]
    pub root: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_assets_root(),
        }
    }
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorTableConfig {
    /// Color table file, relative to the assets root
    #[serde(default = "default_color_table_path")]
    pub path: PathBuf,
}

impl Default for ColorTableConfig {
    fn default() -> Self {
        Self {
            path: default_color_table_path(),
        }
    }
}

fn default_color_table_path() -> PathBuf {
    PathBuf::from("colormap.txt")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartsConfig {
    /// Directory scanned for part meshes, relative to the assets root
    #[serde(default = "default_parts_dir")]
    pub dir: PathBuf,
    /// Explicit part files; when set, `dir` is not scanned
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    /// Mesh file extensions picked up by the scan
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Uniform scale applied to every part
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Move each mesh so its bounding box is centered on the origin
    #[serde(default = "default_true")]
    pub center_geometry: bool,
}

impl Default for PartsConfig {
    fn default() -> Self {
        Self {
            dir: default_parts_dir(),
            paths: Vec::new(),
            extensions: default_extensions(),
            scale: default_scale(),
            center_geometry: true,
        }
    }
}

fn default_parts_dir() -> PathBuf {
    PathBuf::from("parts")
}

fn default_extensions() -> Vec<String> {
    vec!["stl".to_string(), "glb".to_string(), "gltf".to_string()]
}

fn default_scale() -> f32 {
    0.2
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Distance between a part and its label along Y
    #[serde(default = "default_label_offset")]
    pub offset: f32,
    /// Text shown before the part name
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            offset: default_label_offset(),
            prefix: default_prefix(),
        }
    }
}

fn default_label_offset() -> f32 {
    DEFAULT_LABEL_OFFSET
}

fn default_prefix() -> String {
    "Model: ".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default = "default_height")]
    pub height: u16,
    /// Background color as RGB (0.0-1.0)
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            clear_color: default_clear_color(),
        }
    }
}

fn default_title() -> String {
    "Nucleus".to_string()
}

fn default_width() -> u16 {
    1280
}

fn default_height() -> u16 {
    800
}

fn default_clear_color() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

impl Config {
    pub fn color_table_path(&self) -> PathBuf {
        self.assets.root.join(&self.color_table.path)
    }

    pub fn settings(&self) -> ViewerSettings {
        ViewerSettings {
            label_offset: self.annotation.offset,
            annotation_prefix: self.annotation.prefix.clone(),
        }
    }

    /// Part files to load, relative to the assets root
    pub fn manifest(&self) -> Result<PartManifest> {
        if !self.parts.paths.is_empty() {
            return Ok(PartManifest::from_paths(self.parts.paths.iter().cloned()));
        }

        let dir = self.assets.root.join(&self.parts.dir);
        let scanned = PartManifest::scan(&dir, &self.parts.extensions)?;
        let relative = scanned.sources().iter().map(|source| {
            source
                .path
                .strip_prefix(&self.assets.root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| source.path.clone())
        });
        Ok(PartManifest::from_paths(relative))
    }
}

/// Load configuration from file, falling back to defaults if it is missing
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
