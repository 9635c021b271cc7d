//! Floating labels attached to parts
//!
//! A part gets its label the first time it is selected. Every later
//! selection rewrites the same label in place, so a part never carries more
//! than one. Labels stay up for the whole session, including while their
//! part is hidden.

use glam::Vec3;

use crate::registry::PartEntry;
use crate::scene::Scene;

/// Default distance between a part and its label along Y
pub const DEFAULT_LABEL_OFFSET: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation<L> {
    text: String,
    /// Signed Y offset applied to the part position
    anchor_offset: f32,
    anchor: Vec3,
    label: L,
}

impl<L> Annotation<L> {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchor_offset(&self) -> f32 {
        self.anchor_offset
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn label(&self) -> &L {
        &self.label
    }
}

/// Label above parts with positive Y, below everything else
pub fn anchor_offset(local_y: f32, offset: f32) -> f32 {
    if local_y > 0.0 {
        offset
    } else {
        -offset
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnnotationManager {
    offset: f32,
}

impl Default for AnnotationManager {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_OFFSET)
    }
}

impl AnnotationManager {
    pub fn new(offset: f32) -> Self {
        Self {
            offset: offset.abs(),
        }
    }

    /// Show `text` on the part's label, creating the label if needed.
    ///
    /// Placement reads the part's local position, which only equals its
    /// world position while parts have no transformed ancestors.
    pub fn show<'a, S: Scene>(
        &self,
        entry: &'a mut PartEntry<S::Handle, S::Label>,
        text: &str,
        scene: &mut S,
    ) -> &'a Annotation<S::Label> {
        let handle = entry.handle();
        let position = scene.local_position(handle);
        let anchor_offset = anchor_offset(position.y, self.offset);
        let anchor = position + Vec3::Y * anchor_offset;

        match &mut entry.annotation {
            Some(annotation) => {
                scene.update_label(&annotation.label, text, anchor);
                annotation.text = text.to_string();
                annotation.anchor_offset = anchor_offset;
                annotation.anchor = anchor;
                annotation
            }
            slot @ None => {
                let label = scene.attach_label(handle, text, anchor);
                tracing::debug!(?handle, ?label, "Created part label");
                slot.insert(Annotation {
                    text: text.to_string(),
                    anchor_offset,
                    anchor,
                    label,
                })
            }
        }
    }
}
