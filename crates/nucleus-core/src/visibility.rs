//! Per-part visibility toggling

use crate::registry::PartEntry;
use crate::scene::Scene;

/// Sidebar affordance for a part's visibility toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAffordance {
    Shown,
    Hidden,
}

impl ToggleAffordance {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Self::Shown
        } else {
            Self::Hidden
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Shown => "👁",
            Self::Hidden => "🚫",
        }
    }
}

/// Keeps `PartEntry::visible` and the rendered handle in lock-step
pub struct VisibilityStore;

impl VisibilityStore {
    /// Flip the part's visibility and return the new value
    pub fn toggle<S: Scene>(entry: &mut PartEntry<S::Handle, S::Label>, scene: &mut S) -> bool {
        let visible = !entry.visible;
        Self::set(entry, visible, scene);
        visible
    }

    pub fn set<S: Scene>(entry: &mut PartEntry<S::Handle, S::Label>, visible: bool, scene: &mut S) {
        scene.set_visible(entry.handle(), visible);
        entry.visible = visible;
        tracing::debug!(part = entry.name(), visible, "Part visibility changed");
    }
}
