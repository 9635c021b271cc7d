//! Viewer state - the color table, the registry and the current selection

use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::annotation::{AnnotationManager, DEFAULT_LABEL_OFFSET};
use crate::color_table::{ColorTable, Rgb};
use crate::pick::{PickResolver, PointerPosition, RayCaster};
use crate::registry::{PartEntry, PartId, PartRegistry, RegistryError};
use crate::scene::Scene;
use crate::visibility::VisibilityStore;

/// Status line shown before anything has been clicked
pub const IDLE_STATUS: &str = "Click on a model to see its name";

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Failed to load part {name:?} from {path}: {reason}")]
    PartLoadFailed {
        name: String,
        path: PathBuf,
        reason: String,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSettings {
    /// Distance between a part and its label along Y
    pub label_offset: f32,
    /// Prepended to the part name in label text
    pub annotation_prefix: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            label_offset: DEFAULT_LABEL_OFFSET,
            annotation_prefix: "Model: ".to_string(),
        }
    }
}

/// Outcome of one asynchronous mesh load
#[derive(Debug, Clone, PartialEq)]
pub enum PartLoadResult<H> {
    Loaded { name: String, handle: H },
    Failed {
        name: String,
        path: PathBuf,
        reason: String,
    },
}

#[derive(Debug)]
pub struct ViewerState<H, L> {
    colors: ColorTable,
    registry: PartRegistry<H, L>,
    annotations: AnnotationManager,
    annotation_prefix: String,
    selected: Option<PartId>,
    status: String,
}

impl<H, L> ViewerState<H, L>
where
    H: Copy + Eq + std::hash::Hash + std::fmt::Debug,
{
    pub fn new(colors: ColorTable, settings: ViewerSettings) -> Self {
        Self {
            colors,
            registry: PartRegistry::new(),
            annotations: AnnotationManager::new(settings.label_offset),
            annotation_prefix: settings.annotation_prefix,
            selected: None,
            status: IDLE_STATUS.to_string(),
        }
    }

    /// Register a finished load, or report a failed one.
    ///
    /// A loaded part gets its table color (white when the table has no row
    /// for it) and starts visible.
    pub fn apply_load_result<S>(
        &mut self,
        result: PartLoadResult<H>,
        scene: &mut S,
    ) -> Result<PartId, ViewerError>
    where
        S: Scene<Handle = H, Label = L>,
    {
        let (name, handle) = match result {
            PartLoadResult::Loaded { name, handle } => (name, handle),
            PartLoadResult::Failed { name, path, reason } => {
                error!(part = %name, path = %path.display(), %reason, "Failed to load part");
                return Err(ViewerError::PartLoadFailed { name, path, reason });
            }
        };

        let id = self.registry.register(&name, handle)?.id();
        let color = self.color_for(&name);
        scene.set_material_color(handle, color);
        if let Some(entry) = self.registry.get_mut(id) {
            VisibilityStore::set(entry, true, scene);
        }

        info!(part = %name, %id, color = ?color.to_array(), "Registered part");
        Ok(id)
    }

    /// Pick the nearest registered part under the pointer and select it.
    ///
    /// Hidden parts stay candidates, so a hidden part in front still wins.
    pub fn click<C, S>(
        &mut self,
        pointer: PointerPosition,
        caster: &mut C,
        scene: &mut S,
    ) -> Option<PartId>
    where
        C: RayCaster<Handle = H>,
        S: Scene<Handle = H, Label = L>,
    {
        let candidates: Vec<H> = self.registry.all().iter().map(PartEntry::handle).collect();
        let id = PickResolver::resolve(pointer, caster, &self.registry, &candidates)?.id();
        self.select(id, scene);
        Some(id)
    }

    /// Label the part and report it in the status line
    pub fn select<S>(&mut self, id: PartId, scene: &mut S) -> Option<&PartEntry<H, L>>
    where
        S: Scene<Handle = H, Label = L>,
    {
        let entry = self.registry.get_mut(id)?;
        let text = format!("{}{}", self.annotation_prefix, entry.name());
        self.annotations.show(entry, &text, scene);

        self.status = format!("Clicked on: {}", entry.name());
        self.selected = Some(id);
        info!(part = entry.name(), "Selected part");
        self.registry.get(id)
    }

    /// Flip a part's visibility, returning the new value
    pub fn toggle_visibility<S>(&mut self, id: PartId, scene: &mut S) -> Option<bool>
    where
        S: Scene<Handle = H, Label = L>,
    {
        let entry = self.registry.get_mut(id)?;
        Some(VisibilityStore::toggle(entry, scene))
    }

    pub fn registry(&self) -> &PartRegistry<H, L> {
        &self.registry
    }

    pub fn selected(&self) -> Option<&PartEntry<H, L>> {
        self.selected.and_then(|id| self.registry.get(id))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Table color for a part name, white when absent
    pub fn color_for(&self, name: &str) -> Rgb {
        self.colors.lookup(name).unwrap_or(Rgb::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pick::{Ray, RayHit};
    use crate::scene::fake::FakeScene;
    use glam::{Vec2, Vec3};

    /// Hits every candidate at the distance configured for its handle
    #[derive(Default)]
    struct DepthCaster {
        depths: Vec<(u32, f32)>,
    }

    impl RayCaster for DepthCaster {
        type Handle = u32;

        fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
            Some(Ray {
                origin: ndc.extend(20.0),
                direction: Vec3::NEG_Z,
            })
        }

        fn intersect(&mut self, _ray: &Ray, candidates: &[u32]) -> Vec<RayHit<u32>> {
            let mut hits: Vec<RayHit<u32>> = self
                .depths
                .iter()
                .filter(|(h, _)| candidates.contains(h))
                .map(|&(handle, distance)| RayHit { handle, distance })
                .collect();
            hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            hits
        }
    }

    const TABLE: &str = "7,1.0,0.0,0.0,,,,\"Thalamus\"\n8,0.0,0.5,1.0,,,,Pons\n";

    fn state() -> ViewerState<u32, usize> {
        ViewerState::new(ColorTable::parse(TABLE), ViewerSettings::default())
    }

    fn loaded(name: &str, handle: u32) -> PartLoadResult<u32> {
        PartLoadResult::Loaded {
            name: name.to_string(),
            handle,
        }
    }

    fn pointer() -> PointerPosition {
        PointerPosition::new(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0))
    }

    #[test]
    fn test_loaded_part_gets_table_color() {
        let mut state = state();
        let mut scene = FakeScene::default();

        let id = state.apply_load_result(loaded("Thalamus", 1), &mut scene).unwrap();
        let entry = state.registry().get(id).unwrap();

        assert_eq!(entry.name(), "Thalamus");
        assert!(entry.is_visible());
        assert_eq!(scene.colors[&1], Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(scene.is_visible(1), Some(true));
    }

    #[test]
    fn test_unknown_part_is_white() {
        let mut state = state();
        let mut scene = FakeScene::default();

        state.apply_load_result(loaded("Unknown", 2), &mut scene).unwrap();
        assert_eq!(scene.colors[&2], Rgb::WHITE);
        assert_eq!(state.color_for("Unknown"), Rgb::WHITE);
    }

    #[test]
    fn test_failed_load_creates_no_entry() {
        let mut state = state();
        let mut scene = FakeScene::default();

        let err = state
            .apply_load_result(
                PartLoadResult::Failed {
                    name: "Pons.glb".to_string(),
                    path: PathBuf::from("parts/Pons.glb"),
                    reason: "file not found".to_string(),
                },
                &mut scene,
            )
            .unwrap_err();

        assert!(matches!(err, ViewerError::PartLoadFailed { ref name, .. } if name == "Pons.glb"));
        assert!(state.registry().is_empty());
        assert!(scene.colors.is_empty());
    }

    #[test]
    fn test_duplicate_load_is_rejected() {
        let mut state = state();
        let mut scene = FakeScene::default();

        state.apply_load_result(loaded("Pons", 1), &mut scene).unwrap();
        let err = state.apply_load_result(loaded("Pons", 2), &mut scene).unwrap_err();

        assert!(matches!(err, ViewerError::Registry(RegistryError::DuplicateName(_))));
        assert_eq!(state.registry().len(), 1);
        assert!(!scene.colors.contains_key(&2));
    }

    #[test]
    fn test_click_selects_and_labels_nearest() {
        let mut state = state();
        let mut scene = FakeScene::default().with_position(2, Vec3::new(0.0, 1.0, 0.0));
        state.apply_load_result(loaded("Thalamus", 1), &mut scene).unwrap();
        state.apply_load_result(loaded("Pons", 2), &mut scene).unwrap();
        assert_eq!(state.status(), IDLE_STATUS);

        let mut caster = DepthCaster {
            depths: vec![(1, 5.0), (2, 2.0)],
        };
        let id = state.click(pointer(), &mut caster, &mut scene).unwrap();

        let selected = state.selected().unwrap();
        assert_eq!(selected.id(), id);
        assert_eq!(selected.name(), "Pons");
        assert_eq!(state.status(), "Clicked on: Pons");

        let annotation = selected.annotation().unwrap();
        assert_eq!(annotation.text(), "Model: Pons");
        assert_eq!(annotation.anchor(), Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(scene.labels.len(), 1);
    }

    #[test]
    fn test_click_miss_keeps_status() {
        let mut state = state();
        let mut scene = FakeScene::default();
        state.apply_load_result(loaded("Pons", 1), &mut scene).unwrap();

        let mut caster = DepthCaster::default();
        assert!(state.click(pointer(), &mut caster, &mut scene).is_none());
        assert_eq!(state.status(), IDLE_STATUS);
        assert!(state.selected().is_none());
    }

    #[test]
    fn test_hidden_parts_stay_pickable() {
        let mut state = state();
        let mut scene = FakeScene::default();
        let front = state.apply_load_result(loaded("Thalamus", 1), &mut scene).unwrap();
        state.apply_load_result(loaded("Pons", 2), &mut scene).unwrap();

        assert_eq!(state.toggle_visibility(front, &mut scene), Some(false));
        assert_eq!(scene.is_visible(1), Some(false));

        let mut caster = DepthCaster {
            depths: vec![(1, 1.0), (2, 9.0)],
        };
        assert_eq!(state.click(pointer(), &mut caster, &mut scene), Some(front));
        assert_eq!(state.status(), "Clicked on: Thalamus");
        assert!(!state.registry().get(front).unwrap().is_visible());
    }

    #[test]
    fn test_lone_hidden_part_is_picked() {
        let mut state = state();
        let mut scene = FakeScene::default();
        let id = state.apply_load_result(loaded("Pons", 1), &mut scene).unwrap();
        state.toggle_visibility(id, &mut scene);

        let mut caster = DepthCaster {
            depths: vec![(1, 3.0)],
        };
        assert_eq!(state.click(pointer(), &mut caster, &mut scene), Some(id));
        assert_eq!(state.status(), "Clicked on: Pons");
    }

    #[test]
    fn test_reselect_updates_single_label() {
        let mut state = state();
        let mut scene = FakeScene::default();
        let id = state.apply_load_result(loaded("Pons", 1), &mut scene).unwrap();

        state.select(id, &mut scene);
        state.select(id, &mut scene);
        assert_eq!(scene.labels.len(), 1);

        // Labels survive hiding their part
        state.toggle_visibility(id, &mut scene);
        assert!(state.registry().get(id).unwrap().annotation().is_some());
        assert_eq!(scene.labels.len(), 1);
    }

    #[test]
    fn test_custom_prefix() {
        let settings = ViewerSettings {
            label_offset: 1.0,
            annotation_prefix: "Part: ".to_string(),
        };
        let mut state: ViewerState<u32, usize> = ViewerState::new(ColorTable::new(), settings);
        let mut scene = FakeScene::default();
        let id = state.apply_load_result(loaded("Pons", 1), &mut scene).unwrap();

        let entry = state.select(id, &mut scene).unwrap();
        assert_eq!(entry.annotation().unwrap().text(), "Part: Pons");
        assert_eq!(entry.annotation().unwrap().anchor(), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut state = state();
        let mut scene = FakeScene::default();

        assert!(state.select(PartId(3), &mut scene).is_none());
        assert_eq!(state.toggle_visibility(PartId(3), &mut scene), None);
    }
}
