//! Nucleus Core - Part metadata and interaction for multi-part mesh viewers
//!
//! This crate holds everything about a loaded model that is not rendering:
//! - Color table parsing (part name to RGB)
//! - Part registry keyed by name and by render handle
//! - Pointer picking against the registered parts
//! - Persistent per-part annotations
//! - Per-part visibility
//!
//! The renderer is reached through the [`Scene`] and [`RayCaster`] traits.

pub mod annotation;
pub mod color_table;
pub mod manifest;
pub mod pick;
pub mod registry;
pub mod scene;
pub mod state;
pub mod visibility;

pub use annotation::{Annotation, AnnotationManager, DEFAULT_LABEL_OFFSET};
pub use color_table::{ColorEntry, ColorTable, ColorTableError, Rgb};
pub use manifest::{part_name_from_path, ManifestError, PartManifest, PartSource};
pub use pick::{PickResolver, PointerPosition, Ray, RayCaster, RayHit};
pub use registry::{PartEntry, PartId, PartRegistry, RegistryError};
pub use scene::Scene;
pub use state::{PartLoadResult, ViewerError, ViewerSettings, ViewerState, IDLE_STATUS};
pub use visibility::{ToggleAffordance, VisibilityStore};
