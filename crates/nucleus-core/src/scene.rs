//! The seam between part state and whatever renders it

use glam::Vec3;
use std::fmt::Debug;
use std::hash::Hash;

use crate::color_table::Rgb;

/// Operations the core needs from the external scene.
///
/// Handles are non-owning references: the core never creates or destroys
/// the objects behind them, it only reads positions and writes visibility,
/// color and labels.
pub trait Scene {
    /// Reference to a rendered part (e.g. an ECS entity)
    type Handle: Copy + Eq + Hash + Debug;
    /// Reference to a floating label object
    type Label: Debug;

    fn set_visible(&mut self, handle: Self::Handle, visible: bool);

    /// Position of the part in its parent's space
    fn local_position(&self, handle: Self::Handle) -> Vec3;

    /// Create a label showing `text` at `position` and attach it to the part
    fn attach_label(&mut self, handle: Self::Handle, text: &str, position: Vec3) -> Self::Label;

    /// Change an existing label in place
    fn update_label(&mut self, label: &Self::Label, text: &str, position: Vec3);

    fn set_material_color(&mut self, handle: Self::Handle, color: Rgb);
}
